// src/client/mirror.rs

use async_trait::async_trait;
use url::Url;

use super::SharedSession;
use crate::{
    device::{CompletionRecord, DeviceError, RemoteMirror},
    models::completion::CompletionRequest,
};

/// Mirrors completion records to `POST /api/completions` with the current
/// session's token.
pub struct HttpCompletionMirror {
    http: reqwest::Client,
    endpoint: Url,
    session: SharedSession,
}

impl HttpCompletionMirror {
    pub fn new(http: reqwest::Client, base_url: &Url, session: SharedSession) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            endpoint: base_url.join("/api/completions")?,
            session,
        })
    }

    fn token(&self) -> Result<String, DeviceError> {
        let session = self
            .session
            .read()
            .map_err(|_| DeviceError::Mirror("session lock poisoned".to_string()))?;

        session
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(DeviceError::Mirror("no signed-in session".to_string()))
    }
}

#[async_trait]
impl RemoteMirror for HttpCompletionMirror {
    async fn record_completion(&self, record: &CompletionRecord) -> Result<(), DeviceError> {
        let token = self.token()?;

        let body = CompletionRequest {
            user_id: record.user_id.clone(),
            device_fingerprint: record.device_fingerprint.clone(),
            completed_at: Some(record.completed_at),
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeviceError::Mirror(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DeviceError::Mirror(format!(
                "record store answered {}",
                response.status()
            )));
        }

        Ok(())
    }
}
