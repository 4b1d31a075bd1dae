// Monitoring backend HTTP client
//
// Wraps `reqwest::Client` with backend-specific URL construction and
// `{ status, ... }` envelope checking. Also derives the live channel and
// warning clip URLs from the same base so every consumer agrees on them.

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    AlertPayload, AlertsResponse, BehaviorData, BehaviorDataResponse, STATUS_SUCCESS,
};
use crate::transport::{TransportConfig, read_json};
use crate::websocket;

/// Path of the live video/behavior channel.
pub const VIDEO_FEED_PATH: &str = "/video_feed";
/// Path of the live alert channel (and of the bulk alert fetch).
pub const ALERTS_PATH: &str = "/alerts";
/// Path of the behavior report endpoint.
pub const BEHAVIOR_DATA_PATH: &str = "/api/behavior-data";
/// Path of the most recent warning clip.
pub const WARNING_CLIP_PATH: &str = "/video_warning/output.mp4";

/// Raw HTTP client for the monitoring backend.
///
/// All methods return unwrapped payloads; a `status` other than
/// `"success"` becomes [`Error::Upstream`].
pub struct MonitorClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MonitorClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root, e.g. `http://192.168.1.20:8000`.
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

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// `ws(s)://{host}/video_feed`
    pub fn video_feed_url(&self) -> Result<Url, Error> {
        websocket::channel_url(&self.base_url, VIDEO_FEED_PATH)
    }

    /// `ws(s)://{host}/alerts`
    pub fn alerts_url(&self) -> Result<Url, Error> {
        websocket::channel_url(&self.base_url, ALERTS_PATH)
    }

    /// Warning clip URL with a cache-busting `t` query parameter.
    pub fn warning_clip_url(&self, cache_buster_millis: i64) -> Result<Url, Error> {
        let mut url = self.url(WARNING_CLIP_PATH)?;
        url.query_pairs_mut()
            .append_pair("t", &cache_buster_millis.to_string());
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /alerts`: the historical alert batch, in backend order.
    pub async fn list_alerts(&self) -> Result<Vec<AlertPayload>, Error> {
        let url = self.url(ALERTS_PATH)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let body: AlertsResponse = read_json(resp).await?;

        if body.status != STATUS_SUCCESS {
            return Err(Error::Upstream {
                message: body
                    .message
                    .unwrap_or_else(|| format!("status={}", body.status)),
            });
        }
        Ok(body.alerts)
    }

    /// `GET /api/behavior-data`: aggregate behavior statistics.
    pub async fn behavior_data(&self) -> Result<BehaviorData, Error> {
        let url = self.url(BEHAVIOR_DATA_PATH)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let body: BehaviorDataResponse = read_json(resp).await?;

        match (body.status.as_str(), body.data) {
            (STATUS_SUCCESS, Some(data)) => Ok(data),
            (STATUS_SUCCESS, None) => Err(Error::Upstream {
                message: "response carried no data".into(),
            }),
            (status, _) => Err(Error::Upstream {
                message: body.message.unwrap_or_else(|| format!("status={status}")),
            }),
        }
    }
}
