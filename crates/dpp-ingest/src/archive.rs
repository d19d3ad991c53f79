//! # Archive Adapter: AASX Package Expansion
//!
//! An AASX package is an OPC zip container. Expansion walks its entries and
//! emits one artifact per contained document:
//!
//! | entry suffix | kind | content type |
//! |--------------|------|--------------|
//! | `.json` | AAS payload | `application/json` |
//! | `.xml` | AAS payload | `application/xml` |
//! | `.aasx` | AASX package | `application/asset-administration-shell-package` |
//!
//! Other entries (thumbnails, `.rels`, binaries) are skipped silently, as is
//! the OPC `[Content_Types].xml` manifest. Entry artifacts are named
//! `<package-uri>#<entry-name>`. Nested packages are expanded up to
//! `max_depth` levels; deeper ones are kept as artifacts and listed in
//! [`Expansion::depth_limited`].

use std::io::{Cursor, Read};

use dpp_core::{Artifact, ArtifactKind};
use zip::ZipArchive;

use crate::error::IngestError;

const OPC_CONTENT_TYPES: &str = "[Content_Types].xml";

/// Result of expanding one package.
#[derive(Debug, Default)]
pub struct Expansion {
    /// Extracted document artifacts, nested packages included.
    pub artifacts: Vec<Artifact>,
    /// Entries that matched a document suffix but could not be extracted.
    pub failures: Vec<EntryFailure>,
    /// Nested packages left unexpanded because `max_depth` was reached.
    pub depth_limited: Vec<String>,
}

/// A document entry that could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub uri: String,
    pub reason: String,
}

/// Walks AASX packages.
#[derive(Debug, Clone)]
pub struct ArchiveExpander {
    pub max_entry_bytes: u64,
    pub max_depth: usize,
}

impl Default for ArchiveExpander {
    fn default() -> Self {
        Self {
            max_entry_bytes: 64 * 1024 * 1024,
            max_depth: 2,
        }
    }
}

impl ArchiveExpander {
    /// Expand a package-kind artifact.
    ///
    /// Fails only when `package` is not a package or its container cannot be
    /// opened; per-entry problems are collected in [`Expansion::failures`].
    pub fn expand(&self, package: &Artifact) -> Result<Expansion, IngestError> {
        if package.kind() != ArtifactKind::AasxPackage {
            return Err(IngestError::KindMismatch {
                uri: package.uri().to_string(),
                expected: ArtifactKind::AasxPackage,
                actual: package.kind(),
            });
        }
        let mut expansion = Expansion::default();
        self.expand_into(package, 1, &mut expansion)?;
        Ok(expansion)
    }

    fn expand_into(
        &self,
        package: &Artifact,
        depth: usize,
        out: &mut Expansion,
    ) -> Result<(), IngestError> {
        let mut archive =
            ZipArchive::new(Cursor::new(package.bytes())).map_err(|e| IngestError::Archive {
                uri: package.uri().to_string(),
                reason: e.to_string(),
            })?;

        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    out.failures.push(EntryFailure {
                        uri: format!("{}#<entry {index}>", package.uri()),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let Some((kind, content_type)) = classify_entry(&name) else {
                tracing::trace!(entry = %name, "skipping non-document entry");
                continue;
            };
            let entry_uri = format!("{}#{}", package.uri(), name);

            if entry.size() > self.max_entry_bytes {
                out.failures.push(EntryFailure {
                    uri: entry_uri,
                    reason: format!("entry exceeds {} bytes", self.max_entry_bytes),
                });
                continue;
            }
            let mut bytes = Vec::new();
            let read = (&mut entry)
                .take(self.max_entry_bytes + 1)
                .read_to_end(&mut bytes);
            if let Err(e) = read {
                out.failures.push(EntryFailure {
                    uri: entry_uri,
                    reason: e.to_string(),
                });
                continue;
            }
            if bytes.len() as u64 > self.max_entry_bytes {
                out.failures.push(EntryFailure {
                    uri: entry_uri,
                    reason: format!("entry exceeds {} bytes", self.max_entry_bytes),
                });
                continue;
            }

            let artifact = package
                .derive(&name, Some(content_type.to_string()), kind, bytes)
                .with_metadata("filename", name.clone());
            tracing::debug!(entry = %name, kind = %kind, "extracted package entry");

            if kind == ArtifactKind::AasxPackage {
                if depth < self.max_depth {
                    if let Err(e) = self.expand_into(&artifact, depth + 1, out) {
                        out.failures.push(EntryFailure {
                            uri: artifact.uri().to_string(),
                            reason: e.to_string(),
                        });
                    }
                } else {
                    tracing::warn!(entry = %artifact.uri(), max_depth = self.max_depth, "nested package not expanded");
                    out.depth_limited.push(artifact.uri().to_string());
                }
            }
            out.artifacts.push(artifact);
        }
        Ok(())
    }
}

fn classify_entry(name: &str) -> Option<(ArtifactKind, &'static str)> {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    if file_name.eq_ignore_ascii_case(OPC_CONTENT_TYPES) {
        return None;
    }
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".json") {
        Some((ArtifactKind::AasPayload, "application/json"))
    } else if lower.ends_with(".xml") {
        Some((ArtifactKind::AasPayload, "application/xml"))
    } else if lower.ends_with(".aasx") {
        Some((
            ArtifactKind::AasxPackage,
            "application/asset-administration-shell-package",
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn package(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            writer.start_file(*name, opts).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn aasx(uri: &str, bytes: Vec<u8>) -> Artifact {
        Artifact::new(uri, Some("application/asset-administration-shell-package".into()), ArtifactKind::AasxPackage, bytes)
    }

    #[test]
    fn extracts_json_and_skips_binary() {
        let bytes = package(&[
            ("aasx/env.json", &br#"{"submodels": []}"#[..]),
            ("aasx/blob.bin", &b"\x00\x01"[..]),
        ]);
        let out = ArchiveExpander::default().expand(&aasx("file:///p.aasx", bytes)).unwrap();
        assert_eq!(out.artifacts.len(), 1);
        assert!(out.failures.is_empty());
        let a = &out.artifacts[0];
        assert_eq!(a.uri(), "file:///p.aasx#aasx/env.json");
        assert_eq!(a.kind(), ArtifactKind::AasPayload);
        assert_eq!(a.content_type(), Some("application/json"));
        assert_eq!(a.metadata()["filename"], "aasx/env.json");
    }

    #[test]
    fn skips_opc_manifest_and_keeps_xml() {
        let bytes = package(&[
            ("[Content_Types].xml", &b"<Types/>"[..]),
            ("aasx/env.xml", &b"<environment/>"[..]),
        ]);
        let out = ArchiveExpander::default().expand(&aasx("p.aasx", bytes)).unwrap();
        assert_eq!(out.artifacts.len(), 1);
        assert_eq!(out.artifacts[0].content_type(), Some("application/xml"));
    }

    #[test]
    fn expands_nested_packages() {
        let inner = package(&[("inner.json", &b"{}"[..])]);
        let outer = package(&[("nested.aasx", inner.as_slice())]);
        let out = ArchiveExpander::default().expand(&aasx("p.aasx", outer)).unwrap();
        let uris: Vec<&str> = out.artifacts.iter().map(|a| a.uri()).collect();
        assert_eq!(out.artifacts.len(), 2);
        assert!(uris.contains(&"p.aasx#nested.aasx"));
        assert!(uris.contains(&"p.aasx#nested.aasx#inner.json"));
        assert!(out.depth_limited.is_empty());
    }

    #[test]
    fn nested_package_past_depth_limit_is_reported() {
        let inner = package(&[("inner.json", &b"{}"[..])]);
        let outer = package(&[("nested.aasx", inner.as_slice()), ("env.json", &b"{}"[..])]);
        let expander = ArchiveExpander { max_depth: 1, ..ArchiveExpander::default() };
        let out = expander.expand(&aasx("p.aasx", outer)).unwrap();
        let uris: Vec<&str> = out.artifacts.iter().map(|a| a.uri()).collect();
        assert_eq!(out.artifacts.len(), 2);
        assert!(uris.contains(&"p.aasx#nested.aasx"));
        assert!(!uris.contains(&"p.aasx#nested.aasx#inner.json"));
        assert_eq!(out.depth_limited, vec!["p.aasx#nested.aasx".to_string()]);
        assert!(out.failures.is_empty());
    }

    #[test]
    fn oversized_entry_is_a_failure() {
        let bytes = package(&[("big.json", &[b' '; 64][..])]);
        let expander = ArchiveExpander { max_entry_bytes: 16, max_depth: 1 };
        let out = expander.expand(&aasx("p.aasx", bytes)).unwrap();
        assert!(out.artifacts.is_empty());
        assert_eq!(out.failures.len(), 1);
    }

    #[test]
    fn corrupt_container_is_an_error() {
        let err = ArchiveExpander::default().expand(&aasx("p.aasx", b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, IngestError::Archive { .. }));
    }

    #[test]
    fn non_package_is_rejected() {
        let a = Artifact::new("x.json", None, ArtifactKind::PayloadDocument, b"{}".to_vec());
        assert!(matches!(ArchiveExpander::default().expand(&a), Err(IngestError::KindMismatch { .. })));
    }
}
