//! # Structured-Identifier Links
//!
//! GS1 Digital Link style URIs encode product identity in their path as
//! `/<AI>/<value>` pairs, where the AI (application identifier) is a short
//! numeric code. Only the codes below are recognised.

use std::collections::BTreeMap;

use url::Url;

/// Recognised application identifiers.
pub const APPLICATION_IDENTIFIERS: [&str; 7] = ["00", "01", "10", "17", "21", "22", "8004"];

/// Host suffix of the GS1 resolver.
pub const GS1_RESOLVER_HOST: &str = "id.gs1.org";

/// The attribute set carried by a structured-identifier link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DigitalLink {
    attributes: BTreeMap<String, String>,
}

impl DigitalLink {
    /// Parse attributes out of an `http(s)` URL string.
    ///
    /// Returns `None` when the string is not an http(s) URL or carries no
    /// recognised AI segment.
    pub fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        Self::from_url(&url)
    }

    pub(crate) fn from_url(url: &Url) -> Option<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let mut attributes = BTreeMap::new();
        let mut i = 0;
        while i + 1 < segments.len() {
            let (ai, value) = (segments[i], segments[i + 1]);
            if APPLICATION_IDENTIFIERS.contains(&ai) && is_valid_value(ai, value) {
                attributes.insert(ai.to_string(), value.to_string());
                i += 2;
            } else {
                i += 1;
            }
        }
        if attributes.is_empty() {
            return None;
        }
        for (key, value) in url.query_pairs() {
            if !value.is_empty() {
                attributes
                    .entry(key.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        Some(Self { attributes })
    }

    /// All attributes, keyed by AI (path) or parameter name (query).
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// The GTIN (AI 01), if present.
    pub fn gtin(&self) -> Option<&str> {
        self.attributes.get("01").map(String::as_str)
    }

    /// The serial number (AI 21), if present.
    pub fn serial(&self) -> Option<&str> {
        self.attributes.get("21").map(String::as_str)
    }
}

fn is_valid_value(ai: &str, value: &str) -> bool {
    match ai {
        "01" => (8..=14).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit()),
        "00" => value.len() == 18 && value.bytes().all(|b| b.is_ascii_digit()),
        _ => !value.is_empty(),
    }
}

/// True when `url` should be treated as a structured-identifier link.
pub fn is_digital_link(url: &Url) -> bool {
    let on_resolver = url
        .host_str()
        .is_some_and(|h| h.to_ascii_lowercase().ends_with(GS1_RESOLVER_HOST));
    on_resolver || DigitalLink::from_url(url).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gtin_and_serial() {
        let dl = DigitalLink::parse("https://id.gs1.org/01/01234567890128/21/SER123").unwrap();
        assert_eq!(dl.gtin(), Some("01234567890128"));
        assert_eq!(dl.serial(), Some("SER123"));
        assert_eq!(dl.attributes().len(), 2);
    }

    #[test]
    fn test_query_parameters_are_attributes() {
        let dl = DigitalLink::parse("https://brand.example/01/09506000134352?17=251231&linkType=gs1:pip")
            .unwrap();
        assert_eq!(dl.attributes().get("17").map(String::as_str), Some("251231"));
        assert_eq!(dl.attributes().get("linkType").map(String::as_str), Some("gs1:pip"));
    }

    #[test]
    fn test_prefix_path_before_identifiers() {
        let dl = DigitalLink::parse("https://brand.example/products/01/09506000134352/10/LOT7").unwrap();
        assert_eq!(dl.gtin(), Some("09506000134352"));
        assert_eq!(dl.attributes().get("10").map(String::as_str), Some("LOT7"));
    }

    #[test]
    fn test_gtin_length_is_checked() {
        assert!(DigitalLink::parse("https://example.com/01/123").is_none());
    }

    #[test]
    fn test_plain_url_is_not_a_link() {
        assert!(DigitalLink::parse("https://example.com/dpp").is_none());
        assert!(DigitalLink::parse("ftp://example.com/01/09506000134352").is_none());
    }

    #[test]
    fn test_resolver_host_is_a_link() {
        let url = Url::parse("https://id.gs1.org/").unwrap();
        assert!(is_digital_link(&url));
    }
}
