use fantoccini::ClientBuilder;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use trawl_common::{Result, TrawlError};
use webdriver::capabilities::Capabilities;

use crate::appium::session::AppiumSession;

/// Owns at most one Appium session, created on first use.
///
/// Creation and teardown are serialized, so concurrent callers of
/// [`get_session`](Self::get_session) share a single session.
pub struct SessionProvider {
    server_url: String,
    capabilities: Capabilities,
    slot: Mutex<Option<Arc<AppiumSession>>>,
}

impl SessionProvider {
    /// `server_url` is the Appium base URL, e.g. `http://localhost:4723/`.
    pub fn new(server_url: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            server_url: server_url.into(),
            capabilities,
            slot: Mutex::new(None),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Return the live session, connecting if there is none yet.
    pub async fn get_session(&self) -> Result<Arc<AppiumSession>> {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }

        info!(target: "trawl.session", url = %self.server_url, "connecting to Appium server");
        let client = ClientBuilder::native()
            .capabilities(self.capabilities.clone())
            .connect(&self.server_url)
            .await
            .map_err(|e| TrawlError::Session(format!("{}: {e}", self.server_url)))?;
        info!(target: "trawl.session", "Appium session created");

        let session = Arc::new(AppiumSession::new(client));
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Delete the session if one exists. Safe to call repeatedly.
    pub async fn end_session(&self) -> Result<()> {
        let session = self.slot.lock().await.take();
        match session {
            Some(session) => {
                info!(target: "trawl.session", "closing Appium session");
                let result = session.close().await;
                match &result {
                    Ok(()) => info!(target: "trawl.session", "Appium session closed"),
                    Err(err) => warn!(target: "trawl.session", error = %err, "closing Appium session failed"),
                }
                result
            }
            None => Ok(()),
        }
    }

    pub async fn has_session(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn caps() -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert("platformName".into(), json!("Android"));
        caps
    }

    #[tokio::test]
    async fn end_session_without_session_is_a_no_op() {
        let provider = SessionProvider::new("http://127.0.0.1:1/", caps());
        assert!(!provider.has_session().await);
        provider.end_session().await.unwrap();
        provider.end_session().await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_server_is_a_session_error() {
        let provider = SessionProvider::new("http://127.0.0.1:1/", caps());
        let err = provider.get_session().await.err().unwrap();
        assert!(matches!(err, TrawlError::Session(_)));
        assert!(!provider.has_session().await);
    }
}
