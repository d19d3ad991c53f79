//! File adapter: `read(path) -> Artifact`.

use std::path::Path;

use dpp_core::{sniff_json_kind, Artifact, ArtifactKind};

use crate::error::IngestError;

/// Read a local file into an artifact.
///
/// The URI is the path as given; the caller passes the classifier's
/// canonical (absolute) form.
pub fn read_file(path: &Path) -> Result<Artifact, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let kind = kind_for_path(path, &bytes);
    let content_type = guess_content_type(path).map(str::to_string);
    tracing::debug!(path = %path.display(), kind = %kind, bytes = bytes.len(), "read file");
    Ok(Artifact::new(path.display().to_string(), content_type, kind, bytes))
}

/// Infer a kind from a file extension, sniffing JSON bodies.
pub fn kind_for_path(path: &Path, bytes: &[u8]) -> ArtifactKind {
    match extension(path).as_deref() {
        Some("aasx") => ArtifactKind::AasxPackage,
        Some("ttl" | "nt" | "nq") => ArtifactKind::RdfGraph,
        Some("xml") => ArtifactKind::AasPayload,
        Some("jwt") => ArtifactKind::CredentialToken,
        Some("json" | "jsonld" | "json-ld") => sniff_json_kind(bytes),
        _ => ArtifactKind::PayloadDocument,
    }
}

/// Media type for a file extension.
pub fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ct = match extension(path)?.as_str() {
        "json" => "application/json",
        "jsonld" | "json-ld" => "application/ld+json",
        "xml" => "application/xml",
        "ttl" => "text/turtle",
        "nt" => "application/n-triples",
        "nq" => "application/n-quads",
        "aasx" => "application/asset-administration-shell-package",
        "jwt" => "application/jwt",
        "yaml" | "yml" => "application/yaml",
        _ => return None,
    };
    Some(ct)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_payload_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passport.json");
        std::fs::write(&path, br#"{"id": "example-1", "name": "Example"}"#).unwrap();
        let a = read_file(&path).unwrap();
        assert_eq!(a.kind(), ArtifactKind::PayloadDocument);
        assert_eq!(a.content_type(), Some("application/json"));
        assert_eq!(a.uri(), path.display().to_string());
    }

    #[test]
    fn sniffs_aas_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.json");
        std::fs::write(&path, br#"{"assetAdministrationShells": [], "submodels": []}"#).unwrap();
        assert_eq!(read_file(&path).unwrap().kind(), ArtifactKind::AasPayload);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = read_file(Path::new("/nonexistent/dppkit/passport.json")).unwrap_err();
        assert!(matches!(err, IngestError::NotFound { .. }));
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(kind_for_path(Path::new("a.AASX"), b""), ArtifactKind::AasxPackage);
        assert_eq!(kind_for_path(Path::new("a.ttl"), b""), ArtifactKind::RdfGraph);
        assert_eq!(kind_for_path(Path::new("a.xml"), b""), ArtifactKind::AasPayload);
        assert_eq!(kind_for_path(Path::new("a.bin"), b""), ArtifactKind::PayloadDocument);
        assert_eq!(guess_content_type(Path::new("a.jsonld")), Some("application/ld+json"));
        assert_eq!(guess_content_type(Path::new("a.bin")), None);
    }
}
