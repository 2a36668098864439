use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Note visibility as understood by `notes/create`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Home,
    Followers,
}

/// Who a published note reaches.
///
/// - `Local` → public, but only on this instance
/// - `Home` → home timeline, federated
/// - `Followers` → followers only, federated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryScope {
    #[default]
    Local,
    Home,
    Followers,
}

impl DeliveryScope {
    pub fn visibility(self) -> Visibility {
        match self {
            DeliveryScope::Local => Visibility::Public,
            DeliveryScope::Home => Visibility::Home,
            DeliveryScope::Followers => Visibility::Followers,
        }
    }

    pub fn local_only(self) -> bool {
        matches!(self, DeliveryScope::Local)
    }
}

impl FromStr for DeliveryScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(DeliveryScope::Local),
            "home" => Ok(DeliveryScope::Home),
            "followers" => Ok(DeliveryScope::Followers),
            other => Err(format!(
                "unknown delivery scope '{}' (expected local, home or followers)",
                other
            )),
        }
    }
}

/// Request body for `POST /api/notes/create`
#[derive(Debug, Serialize)]
pub struct CreateNoteRequest<'a> {
    pub i: &'a str,
    pub text: &'a str,
    #[serde(rename = "localOnly")]
    pub local_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

/// Publishing failures. Never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishError {
    /// The request could not be sent or the client could not be built
    Request(String),
    /// The sink answered with status >= 400
    Status { status: u16, body: String },
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Request(reason) => write!(f, "note request failed: {}", reason),
            PublishError::Status { status, body } => {
                write!(f, "notes/create returned {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for PublishError {}

/// HTTP client for the Misskey notes API.
///
/// Authenticates with the `i` field of the JSON body, as the Misskey API
/// expects.
pub struct NoteClient {
    endpoint: String,
    token: String,
    http_client: Client,
}

impl NoteClient {
    /// `endpoint` is the full `notes/create` URL.
    pub fn new(endpoint: String, token: String) -> Result<Self, PublishError> {
        let http_client = Client::builder()
            .user_agent(concat!("emoji-notifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::Request(e.to_string()))?;
        Ok(Self {
            endpoint,
            token,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Create a note. Any status below 400 counts as success.
    pub async fn post_note(
        &self,
        text: &str,
        visibility: Option<Visibility>,
        local_only: bool,
    ) -> Result<(), PublishError> {
        let request = CreateNoteRequest {
            i: &self.token,
            text,
            local_only,
            visibility,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| PublishError::Request(e.to_string()))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), chars = text.chars().count(), "Note created");
        Ok(())
    }

    pub async fn post_local(&self, text: &str) -> Result<(), PublishError> {
        self.publish(text, DeliveryScope::Local).await
    }

    pub async fn post_home(&self, text: &str) -> Result<(), PublishError> {
        self.publish(text, DeliveryScope::Home).await
    }

    pub async fn post_followers(&self, text: &str) -> Result<(), PublishError> {
        self.publish(text, DeliveryScope::Followers).await
    }

    pub async fn publish(&self, text: &str, scope: DeliveryScope) -> Result<(), PublishError> {
        self.post_note(text, Some(scope.visibility()), scope.local_only())
            .await
    }
}
