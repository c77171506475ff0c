// src/client/mod.rs

//! HTTP client for the quiz API that also owns the device gate.
//!
//! A run goes: [`QuizClient::device_status`], then [`QuizClient::guest_login`]
//! or [`QuizClient::login`], one [`QuizClient::answer`] per scenario,
//! [`QuizClient::complete_quiz`], [`QuizClient::submit_survey`] and finally
//! [`QuizClient::results`].

pub mod mirror;

use std::sync::{Arc, RwLock};

use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

use crate::{
    config::GUEST_SESSION_STORAGE_KEY,
    device::{
        CompletionTracker, DeviceError, DeviceFingerprint, EnvironmentProbe, LocalStorage,
        ReturningUser,
    },
    models::{
        response::{AnswerFeedback, AnswerRequest, ResultSummary},
        scenario::PublicScenario,
        survey::{SurveyRequest, SurveyResponse},
        user::AuthResponse,
    },
};

pub use mirror::HttpCompletionMirror;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("server answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("this device has already completed the quiz")]
    AlreadyCompleted,

    #[error("not signed in")]
    NotSignedIn,

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("session lock poisoned")]
    SessionPoisoned,
}

/// A signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub display_name: String,
    pub is_guest: bool,
}

impl From<AuthResponse> for Session {
    fn from(auth: AuthResponse) -> Self {
        Self {
            token: auth.token,
            user_id: auth.user_id,
            display_name: auth.display_name,
            is_guest: auth.is_guest,
        }
    }
}

/// Session shared between the client and its completion mirror.
pub type SharedSession = Arc<RwLock<Option<Session>>>;

/// What the device gate says before signing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub fingerprint: DeviceFingerprint,
    pub previously_completed: bool,
    pub returning: ReturningUser,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct QuizClient {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn LocalStorage>,
    tracker: CompletionTracker,
    session: SharedSession,
}

impl QuizClient {
    /// Builds a client for the API at `base_url`, gating on `storage` and
    /// fingerprinting whatever `probe` describes.
    pub fn new(
        base_url: &str,
        storage: Arc<dyn LocalStorage>,
        probe: Arc<dyn EnvironmentProbe>,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::Client::new();
        let session: SharedSession = Arc::default();

        let mirror = HttpCompletionMirror::new(http.clone(), &base_url, Arc::clone(&session))?;
        let tracker = CompletionTracker::new(Arc::clone(&storage), Arc::new(mirror), probe);

        Ok(Self {
            http,
            base_url,
            storage,
            tracker,
            session,
        })
    }

    pub fn tracker(&self) -> &CompletionTracker {
        &self.tracker
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    /// Fingerprint plus the completion and returning-device checks.
    pub fn device_status(&self) -> Result<DeviceStatus, ClientError> {
        Ok(DeviceStatus {
            fingerprint: self.tracker.current_fingerprint()?,
            previously_completed: self.tracker.has_completed_quiz(),
            returning: self.tracker.is_returning_user()?,
        })
    }

    /// Starts a guest attempt. Refused when this device already finished one.
    pub async fn guest_login(&self) -> Result<Session, ClientError> {
        if self.tracker.has_completed_quiz() {
            tracing::warn!("guest attempt refused, device already completed the quiz");
            return Err(ClientError::AlreadyCompleted);
        }

        let auth: AuthResponse = self.send(self.http.post(self.url("/api/auth/guest")?)).await?;
        let session = Session::from(auth);

        self.storage
            .set_item(GUEST_SESSION_STORAGE_KEY, &serde_json::to_string(&session)?)?;
        self.set_session(Some(session.clone()))?;

        tracing::info!(user_id = %session.user_id, "guest session started");
        Ok(session)
    }

    /// Restores the guest session of a returning device so its results can be
    /// viewed again. Returns `None` when the device is not returning or the
    /// stored guest does not match the stored completion.
    pub fn resume_guest(&self) -> Result<Option<Session>, ClientError> {
        let ReturningUser {
            is_returning: true,
            previous_user_id: Some(previous),
        } = self.tracker.is_returning_user()?
        else {
            return Ok(None);
        };

        let stored = match self.storage.get_item(GUEST_SESSION_STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Session>(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Error reading guest session: {}", e);
                None
            }
        };

        match stored {
            Some(session) if session.user_id == previous => {
                self.set_session(Some(session.clone()))?;
                Ok(Some(session))
            }
            _ => Ok(None),
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let _: serde_json::Value = self
            .send(self.http.post(self.url("/api/auth/register")?).json(&body))
            .await?;
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let auth: AuthResponse = self
            .send(self.http.post(self.url("/api/auth/login")?).json(&body))
            .await?;

        let session = Session::from(auth);
        self.set_session(Some(session.clone()))?;
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.set_session(None)
    }

    pub async fn scenarios(&self) -> Result<Vec<PublicScenario>, ClientError> {
        self.send(self.http.get(self.url("/api/scenarios")?)).await
    }

    pub async fn answer(&self, scenario_id: i64, answer: &str) -> Result<AnswerFeedback, ClientError> {
        let body = AnswerRequest {
            scenario_id,
            answer: answer.to_string(),
        };
        let req = self.http.post(self.url("/api/quiz/answers")?).json(&body);
        self.send(self.authorized(req)?).await
    }

    /// Marks this device as done for the signed-in participant.
    ///
    /// The local gate is set before this returns; the returned handle tracks
    /// the best-effort remote copy and may be dropped.
    pub fn complete_quiz(&self) -> Result<Option<JoinHandle<()>>, ClientError> {
        let session = self.session().ok_or(ClientError::NotSignedIn)?;
        let fingerprint = self.tracker.current_fingerprint()?;

        Ok(self.tracker.mark_completed(&session.user_id, &fingerprint)?)
    }

    pub async fn submit_survey(&self, survey: &SurveyRequest) -> Result<SurveyResponse, ClientError> {
        let req = self.http.post(self.url("/api/survey")?).json(survey);
        self.send(self.authorized(req)?).await
    }

    pub async fn results(&self) -> Result<ResultSummary, ClientError> {
        let req = self.http.get(self.url("/api/results")?);
        self.send(self.authorized(req)?).await
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn set_session(&self, session: Option<Session>) -> Result<(), ClientError> {
        let mut guard = self.session.write().map_err(|_| ClientError::SessionPoisoned)?;
        *guard = session;
        Ok(())
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let session = self.session().ok_or(ClientError::NotSignedIn)?;
        Ok(req.bearer_auth(session.token))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let response = req.send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        let body = response.text().await?;
        return Ok(serde_json::from_str(&body)?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
