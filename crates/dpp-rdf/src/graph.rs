//! # RDF Graph Model
//!
//! Parsing goes through sophia; the parsed triples are then copied into an
//! owned [`RdfGraph`] of [`Node`] values. Validators pattern-match on plain
//! enums and strings rather than on sophia's borrowed term types, and graphs
//! from different parsers (Turtle, JSON-LD, the AAS projection) compare
//! equal when they carry the same statements.
//!
//! Quoted triples and variables have no counterpart in [`Node`] and are
//! dropped at conversion. So are statements whose predicate is not an IRI
//! (generalized RDF).

use std::collections::HashSet;
use std::fmt;

use sophia_api::graph::MutableGraph;
use sophia_api::parser::{QuadParser, TripleParser};
use sophia_api::quad::Quad as _;
use sophia_api::serializer::{Stringifier, TripleSerializer};
use sophia_api::source::{QuadSource, TripleSource};
use sophia_api::term::{BnodeId, IriRef, LanguageTag, SimpleTerm, Term, TermKind};
use sophia_api::triple::Triple as _;
use sophia_inmem::graph::LightGraph;
use sophia_jsonld::JsonLdParser;
use sophia_turtle::parser::nq::NQuadsParser;
use sophia_turtle::parser::nt::NTriplesParser;
use sophia_turtle::parser::turtle::TurtleParser;
use sophia_turtle::serializer::turtle::TurtleSerializer;

use crate::error::RdfError;
use crate::vocab::{RDF_LANG_STRING, XSD_STRING};

/// Concrete syntax of an RDF document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdfSyntax {
    Turtle,
    NTriples,
    /// Graph names are dropped; all quads land in one graph.
    NQuads,
    JsonLd,
}

impl RdfSyntax {
    /// Pick a syntax from a media type, falling back to the URI suffix.
    pub fn detect(content_type: Option<&str>, uri: &str) -> Option<Self> {
        if let Some(ct) = content_type {
            let ct = ct.to_ascii_lowercase();
            if ct.contains("turtle") {
                return Some(Self::Turtle);
            }
            if ct.contains("n-triples") {
                return Some(Self::NTriples);
            }
            if ct.contains("n-quads") {
                return Some(Self::NQuads);
            }
            if ct.contains("ld+json") {
                return Some(Self::JsonLd);
            }
        }
        let path = uri.split(['?', '#']).next().unwrap_or(uri).to_ascii_lowercase();
        if path.ends_with(".ttl") {
            Some(Self::Turtle)
        } else if path.ends_with(".nt") {
            Some(Self::NTriples)
        } else if path.ends_with(".nq") {
            Some(Self::NQuads)
        } else if path.ends_with(".jsonld") || path.ends_with(".json-ld") || path.ends_with(".json") {
            Some(Self::JsonLd)
        } else {
            None
        }
    }
}

impl fmt::Display for RdfSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Turtle => "Turtle",
            Self::NTriples => "N-Triples",
            Self::NQuads => "N-Quads",
            Self::JsonLd => "JSON-LD",
        })
    }
}

/// A literal value. Language-tagged literals carry `rdf:langString`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub lexical: String,
    pub datatype: String,
    pub language: Option<String>,
}

impl Literal {
    /// An `xsd:string` literal.
    pub fn string(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: XSD_STRING.to_string(),
            language: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: datatype.into(),
            language: None,
        }
    }
}

/// An RDF term in subject or object position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Node::Iri(iri.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Node::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }

    fn from_term<T: Term>(term: T) -> Option<Self> {
        match term.kind() {
            TermKind::Iri => term.iri().map(|iri| Node::Iri(iri.as_str().to_string())),
            TermKind::BlankNode => term.bnode_id().map(|id| Node::Blank(id.as_str().to_string())),
            TermKind::Literal => {
                let lexical = term.lexical_form()?.to_string();
                let language = term.language_tag().map(|tag| tag.as_str().to_string());
                let datatype = match (&language, term.datatype()) {
                    (Some(_), _) => RDF_LANG_STRING.to_string(),
                    (None, Some(dt)) => dt.as_str().to_string(),
                    (None, None) => XSD_STRING.to_string(),
                };
                Some(Node::Literal(Literal {
                    lexical,
                    datatype,
                    language,
                }))
            }
            _ => None,
        }
    }

    fn as_term(&self) -> SimpleTerm<'_> {
        match self {
            Node::Iri(iri) => SimpleTerm::Iri(IriRef::new_unchecked(iri.as_str().into())),
            Node::Blank(id) => SimpleTerm::BlankNode(BnodeId::new_unchecked(id.as_str().into())),
            Node::Literal(lit) => match &lit.language {
                Some(tag) => SimpleTerm::LiteralLanguage(
                    lit.lexical.as_str().into(),
                    LanguageTag::new_unchecked(tag.as_str().into()),
                ),
                None => SimpleTerm::LiteralDatatype(
                    lit.lexical.as_str().into(),
                    IriRef::new_unchecked(lit.datatype.as_str().into()),
                ),
            },
        }
    }
}

/// Compact form used in findings: `<iri>`, `_:id`, `"lex"^^<dt>`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{iri}>"),
            Node::Blank(id) => write!(f, "_:{id}"),
            Node::Literal(lit) => match &lit.language {
                Some(tag) => write!(f, "{:?}@{tag}", lit.lexical),
                None if lit.datatype == XSD_STRING => write!(f, "{:?}", lit.lexical),
                None => write!(f, "{:?}^^<{}>", lit.lexical, lit.datatype),
            },
        }
    }
}

/// One statement. Predicates are always IRIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Node,
    pub predicate: String,
    pub object: Node,
}

impl Triple {
    pub fn new(subject: Node, predicate: impl Into<String>, object: Node) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }

    fn from_terms<S: Term, P: Term, O: Term>(s: S, p: P, o: O) -> Option<Self> {
        let predicate = p.iri()?.as_str().to_string();
        Some(Self {
            subject: Node::from_term(s)?,
            predicate,
            object: Node::from_term(o)?,
        })
    }
}

/// A set of triples with insertion order preserved.
#[derive(Debug, Clone, Default)]
pub struct RdfGraph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
}

impl RdfGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    pub fn extend(&mut self, other: &RdfGraph) {
        for t in &other.triples {
            self.insert(t.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn contains(&self, subject: &Node, predicate: &str, object: &Node) -> bool {
        self.triples
            .iter()
            .any(|t| t.predicate == predicate && &t.subject == subject && &t.object == object)
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(
        &'a self,
        subject: &'a Node,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.predicate == predicate && &t.subject == subject)
            .map(|t| &t.object)
    }

    /// Subjects of `(?, predicate, object)`.
    pub fn subjects<'a>(
        &'a self,
        predicate: &'a str,
        object: &'a Node,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.predicate == predicate && &t.object == object)
            .map(|t| &t.subject)
    }

    /// All `(subject, object)` pairs for a predicate.
    pub fn with_predicate<'a>(
        &'a self,
        predicate: &'a str,
    ) -> impl Iterator<Item = (&'a Node, &'a Node)> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.predicate == predicate)
            .map(|t| (&t.subject, &t.object))
    }

    /// First object of `(subject, predicate, ?)`.
    pub fn object(&self, subject: &Node, predicate: &str) -> Option<&Node> {
        self.triples
            .iter()
            .find(|t| t.predicate == predicate && &t.subject == subject)
            .map(|t| &t.object)
    }

    /// Parse `text` in the given syntax.
    ///
    /// `base` resolves relative IRIs in Turtle documents and must be an
    /// absolute URL; anything else is ignored. `uri` only labels errors.
    pub fn parse(
        text: &str,
        syntax: RdfSyntax,
        base: Option<&str>,
        uri: &str,
    ) -> Result<Self, RdfError> {
        let mut graph = RdfGraph::new();
        let mut push = |t: Option<Triple>| {
            if let Some(t) = t {
                graph.insert(t);
            }
        };
        let parse_error = |reason: String| RdfError::Parse {
            uri: uri.to_string(),
            syntax,
            reason,
        };

        match syntax {
            RdfSyntax::Turtle => {
                let text = match base.and_then(|b| url::Url::parse(b).ok()) {
                    // A later @base in the document still takes precedence.
                    Some(base) => format!("@base <{base}> .\n{text}"),
                    None => text.to_string(),
                };
                TurtleParser::default()
                    .parse_str(&text)
                    .for_each_triple(|t| push(Triple::from_terms(t.s(), t.p(), t.o())))
                    .map_err(|e| parse_error(e.to_string()))?;
            }
            RdfSyntax::NTriples => {
                NTriplesParser::default()
                    .parse_str(text)
                    .for_each_triple(|t| push(Triple::from_terms(t.s(), t.p(), t.o())))
                    .map_err(|e| parse_error(e.to_string()))?;
            }
            RdfSyntax::NQuads => {
                NQuadsParser::default()
                    .parse_str(text)
                    .for_each_quad(|q| push(Triple::from_terms(q.s(), q.p(), q.o())))
                    .map_err(|e| parse_error(e.to_string()))?;
            }
            RdfSyntax::JsonLd => {
                JsonLdParser::new()
                    .parse_str(text)
                    .for_each_quad(|q| push(Triple::from_terms(q.s(), q.p(), q.o())))
                    .map_err(|e| parse_error(e.to_string()))?;
            }
        }
        Ok(graph)
    }

    /// Copy into a sophia in-memory graph.
    pub fn to_light_graph(&self) -> Result<LightGraph, RdfError> {
        let mut graph = LightGraph::new();
        for t in &self.triples {
            let predicate = SimpleTerm::Iri(IriRef::new_unchecked(t.predicate.as_str().into()));
            graph
                .insert(t.subject.as_term(), predicate, t.object.as_term())
                .map_err(|e| RdfError::Serialize(e.to_string()))?;
        }
        Ok(graph)
    }

    /// Serialize as Turtle.
    pub fn to_turtle(&self) -> Result<String, RdfError> {
        let graph = self.to_light_graph()?;
        let mut serializer = TurtleSerializer::new_stringifier();
        serializer
            .serialize_graph(&graph)
            .map_err(|e| RdfError::Serialize(e.to_string()))?;
        Ok(serializer.as_str().to_string())
    }
}

impl PartialEq for RdfGraph {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl Eq for RdfGraph {}

impl FromIterator<Triple> for RdfGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = RdfGraph::new();
        for t in iter {
            graph.insert(t);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::RDF_TYPE;

    const TTL: &str = r#"
        @prefix ex: <https://example.org/> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        ex:p1 a ex:Product ;
            ex:name "Widget"@en ;
            ex:mass "1.5"^^xsd:decimal ;
            ex:part [ ex:name "bolt" ] .
    "#;

    #[test]
    fn parses_turtle_into_owned_nodes() {
        let g = RdfGraph::parse(TTL, RdfSyntax::Turtle, None, "t.ttl").unwrap();
        assert_eq!(g.len(), 6);
        let p1 = Node::iri("https://example.org/p1");
        assert!(g.contains(&p1, RDF_TYPE, &Node::iri("https://example.org/Product")));
        let name = g.object(&p1, "https://example.org/name").unwrap();
        assert_eq!(
            name.as_literal().unwrap().language.as_deref(),
            Some("en")
        );
        let mass = g.object(&p1, "https://example.org/mass").unwrap().as_literal().unwrap();
        assert_eq!(mass.datatype, "http://www.w3.org/2001/XMLSchema#decimal");
        assert!(matches!(g.object(&p1, "https://example.org/part"), Some(Node::Blank(_))));
    }

    #[test]
    fn resolves_relative_iris_against_base() {
        let g = RdfGraph::parse(
            "<a> <https://example.org/p> <b> .",
            RdfSyntax::Turtle,
            Some("https://example.org/doc/"),
            "t.ttl",
        )
        .unwrap();
        assert_eq!(g.triples()[0].subject, Node::iri("https://example.org/doc/a"));
    }

    #[test]
    fn nquads_drop_graph_names() {
        let nq = "<https://e.org/s> <https://e.org/p> \"o\" <https://e.org/g1> .\n\
                  <https://e.org/s> <https://e.org/p> \"o\" <https://e.org/g2> .\n";
        let g = RdfGraph::parse(nq, RdfSyntax::NQuads, None, "t.nq").unwrap();
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn jsonld_with_inline_context() {
        let doc = r#"{"@context": {"@vocab": "https://schema.org/"}, "@id": "https://e.org/p", "name": "Widget"}"#;
        let g = RdfGraph::parse(doc, RdfSyntax::JsonLd, None, "p.jsonld").unwrap();
        let s = Node::iri("https://e.org/p");
        assert_eq!(
            g.object(&s, "https://schema.org/name"),
            Some(&Node::Literal(Literal::string("Widget")))
        );
    }

    #[test]
    fn invalid_turtle_is_parse_error() {
        let err = RdfGraph::parse("ex:a ex:b", RdfSyntax::Turtle, None, "bad.ttl").unwrap_err();
        assert!(matches!(err, RdfError::Parse { syntax: RdfSyntax::Turtle, .. }));
    }

    #[test]
    fn turtle_serialization_reparses_to_same_graph() {
        let g = RdfGraph::parse(TTL, RdfSyntax::Turtle, None, "t.ttl").unwrap();
        let text = g.to_turtle().unwrap();
        let again = RdfGraph::parse(&text, RdfSyntax::Turtle, None, "again.ttl").unwrap();
        assert_eq!(again.len(), g.len());
        let p1 = Node::iri("https://example.org/p1");
        assert!(again.contains(&p1, RDF_TYPE, &Node::iri("https://example.org/Product")));
    }

    #[test]
    fn syntax_detection() {
        assert_eq!(RdfSyntax::detect(Some("text/turtle; charset=utf-8"), "x"), Some(RdfSyntax::Turtle));
        assert_eq!(RdfSyntax::detect(Some("application/ld+json"), "x"), Some(RdfSyntax::JsonLd));
        assert_eq!(RdfSyntax::detect(None, "file:///s/shapes.ttl"), Some(RdfSyntax::Turtle));
        assert_eq!(RdfSyntax::detect(None, "https://e.org/g.nq?x=1"), Some(RdfSyntax::NQuads));
        assert_eq!(RdfSyntax::detect(Some("application/octet-stream"), "blob"), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Node::iri("https://e.org/a").to_string(), "<https://e.org/a>");
        assert_eq!(Node::Literal(Literal::string("x")).to_string(), "\"x\"");
        assert_eq!(
            Node::Literal(Literal::typed("1", "http://www.w3.org/2001/XMLSchema#integer")).to_string(),
            "\"1\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn insert_deduplicates() {
        let t = Triple::new(Node::iri("s"), "p", Node::iri("o"));
        let mut g = RdfGraph::new();
        assert!(g.insert(t.clone()));
        assert!(!g.insert(t));
        assert_eq!(g.len(), 1);
    }
}
