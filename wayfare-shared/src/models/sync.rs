use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::trip::{TripRecord, SELF_TRAVELER};
use crate::pii::Masked;

pub const SYNC_DOCUMENT_VERSION: &str = "1.0";

/// Endpoint of the ticket recognition service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub token: Masked<String>,
}

impl AiConfig {
    pub fn is_complete(&self) -> bool {
        !self.base_url.is_empty() && !self.model.is_empty() && !self.token.expose().is_empty()
    }
}

/// Remote file store used for sync
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebDavConfig {
    pub url: String,
    pub username: String,
    pub password: Masked<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub use_proxy: bool,
}

impl WebDavConfig {
    pub fn is_usable(&self) -> bool {
        self.enabled
            && !self.url.is_empty()
            && !self.username.is_empty()
            && !self.password.expose().is_empty()
    }

    /// URL the client should talk to. With the proxy on, Koofr endpoints are
    /// rewritten to the same-origin relay; other hosts are used directly.
    pub fn effective_url(&self) -> String {
        if !self.use_proxy || !self.url.contains("app.koofr.net") {
            return self.url.clone();
        }
        let service_path = self
            .url
            .find("/dav/")
            .map(|idx| &self.url[idx + "/dav/".len()..])
            .unwrap_or("");
        format!("/api/webdav-proxy?path={}", urlencoding::encode(service_path))
    }
}

/// Known traveler names as exchanged in sync documents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TravelerConfig {
    pub available_travelers: Vec<String>,
}

impl Default for TravelerConfig {
    fn default() -> Self {
        Self {
            available_travelers: vec![SELF_TRAVELER.to_string()],
        }
    }
}

/// Full snapshot pushed to / pulled from the remote store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncDocument {
    pub trips: Vec<TripRecord>,
    #[serde(default)]
    pub ai_config: Option<AiConfig>,
    #[serde(default)]
    pub traveler_config: Option<TravelerConfig>,
    pub export_date: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    SYNC_DOCUMENT_VERSION.to_string()
}

impl SyncDocument {
    pub fn new(
        trips: Vec<TripRecord>,
        ai_config: Option<AiConfig>,
        traveler_config: Option<TravelerConfig>,
    ) -> Self {
        Self {
            trips,
            ai_config,
            traveler_config,
            export_date: Utc::now(),
            version: default_version(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn koofr(use_proxy: bool) -> WebDavConfig {
        WebDavConfig {
            url: "https://app.koofr.net/dav/Koofr".to_string(),
            username: "me@example.com".to_string(),
            password: Masked::from("app-password"),
            enabled: true,
            use_proxy,
        }
    }

    #[test]
    fn test_proxy_rewrites_koofr_only() {
        assert_eq!(koofr(true).effective_url(), "/api/webdav-proxy?path=Koofr");
        assert_eq!(koofr(false).effective_url(), "https://app.koofr.net/dav/Koofr");

        let mut other = koofr(true);
        other.url = "https://dav.example.com/remote.php".to_string();
        assert_eq!(other.effective_url(), "https://dav.example.com/remote.php");
    }

    #[test]
    fn test_document_tolerates_missing_optionals() {
        let json = r#"{ "trips": [], "exportDate": "2025-08-01T12:00:00Z" }"#;
        let doc: SyncDocument = serde_json::from_str(json).unwrap();
        assert!(doc.ai_config.is_none());
        assert!(doc.traveler_config.is_none());
        assert_eq!(doc.version, SYNC_DOCUMENT_VERSION);
    }

    #[test]
    fn test_debug_output_masks_credentials() {
        let rendered = format!("{:?}", koofr(true));
        assert!(!rendered.contains("app-password"));
    }
}
