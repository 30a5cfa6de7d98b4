//! Access to the chat archive server.
//!
//! The pipeline only talks to [`ArchiveSource`], so tests can swap the HTTP
//! client for an in-memory archive.
use crate::importer::{Contact, Message};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5030";

const CONTACTS_TIMEOUT: Duration = Duration::from_secs(10);
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("request to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

/// A read-only view over the archive server's two endpoints.
pub trait ArchiveSource {
    fn contacts(&self) -> Result<Vec<Contact>, ArchiveError>;

    /// One page of a single conversation. An empty page means end of data.
    fn messages(&self, talker: &str, limit: usize, offset: usize)
    -> Result<Vec<Message>, ArchiveError>;
}

/// Blocking HTTP client for `chatlog server`.
pub struct HttpArchive {
    base_url: Url,
    client: Client,
}

impl HttpArchive {
    pub fn new(base_url: Url) -> Result<Self, ArchiveError> {
        let client = Client::builder()
            .build()
            .map_err(|source| ArchiveError::Connect {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self { base_url, client })
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        timeout: Duration,
    ) -> Result<T, ArchiveError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .map_err(|source| ArchiveError::Connect {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.json::<T>().map_err(|source| ArchiveError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl ArchiveSource for HttpArchive {
    fn contacts(&self) -> Result<Vec<Contact>, ArchiveError> {
        let url = self.base_url.join("api/v1/contact")?;
        self.get_json(url, CONTACTS_TIMEOUT)
    }

    fn messages(
        &self,
        talker: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, ArchiveError> {
        let mut url = self.base_url.join("api/v1/chatlog")?;
        url.query_pairs_mut()
            .append_pair("talker", talker)
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string())
            .append_pair("format", "json");
        self.get_json(url, PAGE_TIMEOUT)
    }
}

/// Parse a user supplied base URL, making sure relative joins keep its path.
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = parse_base_url("http://127.0.0.1:5030/proxy").unwrap();
        assert_eq!(
            url.join("api/v1/contact").unwrap().as_str(),
            "http://127.0.0.1:5030/proxy/api/v1/contact"
        );
    }

    #[test]
    fn default_base_url_joins_endpoints() {
        let url = parse_base_url(DEFAULT_BASE_URL).unwrap();
        assert_eq!(
            url.join("api/v1/chatlog").unwrap().as_str(),
            "http://127.0.0.1:5030/api/v1/chatlog"
        );
    }

    #[test]
    fn garbage_base_url_is_rejected() {
        assert!(parse_base_url("not a url").is_err());
    }
}
