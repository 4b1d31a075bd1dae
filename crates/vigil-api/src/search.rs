// Search (question answering) backend client
//
// The search service runs separately from the monitoring backend and
// reports failures in-band as `{status, message}`, often with a non-2xx
// HTTP status. The body is interpreted before the status code.

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{STATUS_SUCCESS, SearchRequest, SearchResponse};
use crate::transport::{TransportConfig, truncate};

/// Path of the search endpoint. The trailing slash is significant.
pub const SEARCH_PATH: &str = "/search/";

/// Number of retrieved passages requested when the caller has no preference.
pub const DEFAULT_TOP_K: u32 = 3;

/// Fallback message when the backend fails without saying why.
pub const QUERY_FAILED: &str = "查询失败";

/// HTTP client for the question-answering backend.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SearchClient {
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /search/` with `{query, k}`, returning the answer text.
    ///
    /// A `status` other than `"success"` becomes [`Error::Upstream`] carrying
    /// the backend's `message` (or [`QUERY_FAILED`]).
    pub async fn ask(&self, query: &str, k: u32) -> Result<String, Error> {
        let url = self.base_url.join(SEARCH_PATH)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(&SearchRequest { query, k })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        let parsed: SearchResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(Error::Http {
                    status: status.as_u16(),
                    message: truncate(&body, 200),
                });
            }
            Err(e) => {
                return Err(Error::Deserialization {
                    message: e.to_string(),
                    body,
                });
            }
        };

        if parsed.status == STATUS_SUCCESS {
            Ok(parsed.answer.unwrap_or_default())
        } else {
            Err(Error::Upstream {
                message: parsed
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| QUERY_FAILED.into()),
            })
        }
    }
}
