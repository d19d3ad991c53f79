//! IRIs of the vocabularies the normalizers and the shape validator read.

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

pub const RDFS_CLASS: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Asset Administration Shell metamodel namespace (V3.0).
pub const AAS: &str = "https://admin-shell.io/aas/3/0/";

/// SHACL vocabulary terms, relative to [`SH`].
pub const SH: &str = "http://www.w3.org/ns/shacl#";

/// Build a SHACL term IRI.
pub fn sh(local: &str) -> String {
    format!("{SH}{local}")
}

/// Build an AAS term IRI.
pub fn aas(local: &str) -> String {
    format!("{AAS}{local}")
}
