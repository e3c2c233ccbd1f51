use crate::error::{DepwizError, LookupError, Result};
use crate::registry::{Packument, RegistryLookup};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";
const ABBREVIATED_METADATA: &str =
    "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8";
const MAX_PACKUMENT_BYTES: usize = 50 * 1024 * 1024;

/// npm registry client
pub struct NpmRegistry {
    client: Client,
    base_url: String,
}

impl NpmRegistry {
    pub fn new(registry: &str, timeout: Duration) -> Result<Self> {
        let base_url = Self::validate_registry_url(registry)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("depwiz/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DepwizError::Io(std::io::Error::other(e)))?;

        Ok(Self { client, base_url })
    }

    /// URL of a package document; the slash of a scoped name is escaped.
    fn packument_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.replace('/', "%2f"))
    }

    fn validate_registry_url(url: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|_| DepwizError::Config(format!("Invalid registry URL: {url}")))?;

        match parsed.scheme() {
            "https" | "http" => {}
            scheme => {
                return Err(DepwizError::Config(format!(
                    "Unsupported registry scheme: {scheme}"
                )));
            }
        }

        if parsed.host_str().is_none() {
            return Err(DepwizError::Config(format!(
                "Registry URL has no host: {url}"
            )));
        }

        Ok(url.trim_end_matches('/').to_string())
    }
}

impl RegistryLookup for NpmRegistry {
    fn packument(&self, name: &str) -> std::result::Result<Packument, LookupError> {
        let url = self.packument_url(name);
        tracing::debug!("Fetching: {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, ABBREVIATED_METADATA)
            .send()
            .map_err(|e| LookupError::Request {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(LookupError::NotFound(name.to_string())),
            status => {
                tracing::debug!("HTTP {}: {}", status, url);
                return Err(LookupError::Status {
                    name: name.to_string(),
                    status: status.as_u16(),
                });
            }
        }

        let content_length = response.content_length();
        let body = read_body(name, response, content_length, MAX_PACKUMENT_BYTES)?;

        parse_packument(name, &body)
    }
}

#[derive(Debug, Deserialize)]
struct RawPackument {
    #[serde(default)]
    versions: BTreeMap<String, serde::de::IgnoredAny>,
    #[serde(rename = "dist-tags", default)]
    dist_tags: BTreeMap<String, String>,
}

/// Reads at most `limit` bytes, rejecting larger bodies before buffering them.
fn read_body(
    name: &str,
    reader: impl Read,
    content_length: Option<u64>,
    limit: usize,
) -> std::result::Result<Vec<u8>, LookupError> {
    let too_large = || LookupError::Malformed {
        name: name.to_string(),
        reason: format!("response exceeded {}MB limit", limit / (1024 * 1024)),
    };

    if content_length.is_some_and(|len| len > limit as u64) {
        return Err(too_large());
    }

    let mut body = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| LookupError::Request {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    if body.len() > limit {
        return Err(too_large());
    }
    Ok(body)
}

fn parse_packument(name: &str, body: &[u8]) -> std::result::Result<Packument, LookupError> {
    let raw: RawPackument = serde_json::from_slice(body).map_err(|e| LookupError::Malformed {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Packument {
        versions: raw.versions.into_keys().collect(),
        dist_tags: raw.dist_tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NpmRegistry {
        NpmRegistry::new(DEFAULT_REGISTRY, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn accepts_https_registry() {
        assert!(NpmRegistry::validate_registry_url("https://registry.npmjs.org/").is_ok());
        assert!(NpmRegistry::validate_registry_url("http://localhost:4873").is_ok());
    }

    #[test]
    fn rejects_invalid_scheme() {
        let err = NpmRegistry::validate_registry_url("ftp://example.com").unwrap_err();
        assert!(matches!(err, DepwizError::Config(_)));
    }

    #[test]
    fn scoped_names_are_escaped() {
        let registry = registry();
        assert_eq!(
            registry.packument_url("@types/node"),
            "https://registry.npmjs.org/@types%2fnode"
        );
        assert_eq!(
            registry.packument_url("chalk"),
            "https://registry.npmjs.org/chalk"
        );
    }

    #[test]
    fn parses_abbreviated_document() {
        let body = r#"{
            "name": "chalk",
            "dist-tags": { "latest": "5.3.0", "next": "6.0.0-beta.1" },
            "versions": { "4.1.2": { "name": "chalk" }, "5.3.0": {} }
        }"#;
        let packument = parse_packument("chalk", body.as_bytes()).unwrap();
        assert_eq!(packument.latest(), Some("5.3.0"));
        assert!(packument.versions.contains("4.1.2"));
        assert_eq!(packument.versions.len(), 2);
    }

    #[test]
    fn oversized_body_is_rejected() {
        let body = "x".repeat(32);

        let err = read_body("chalk", body.as_bytes(), Some(32), 16).unwrap_err();
        assert!(matches!(err, LookupError::Malformed { .. }));

        let err = read_body("chalk", body.as_bytes(), None, 16).unwrap_err();
        assert!(matches!(err, LookupError::Malformed { .. }));

        let read = read_body("chalk", &body.as_bytes()[..16], None, 16).unwrap();
        assert_eq!(read.len(), 16);
    }

    #[test]
    fn malformed_document_is_lookup_error() {
        let err = parse_packument("chalk", b"<html>").unwrap_err();
        assert!(matches!(err, LookupError::Malformed { .. }));
    }

    #[test]
    #[ignore] // Requires network access
    fn fetches_real_packument() {
        let packument = registry().packument("left-pad").unwrap();
        assert!(packument.latest().is_some());
    }
}
