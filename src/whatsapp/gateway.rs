//! Outbound WhatsApp Cloud API client.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// The text-message envelope the Cloud API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub messaging_product: String,
    pub recipient_type: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: TextBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBody {
    pub preview_url: bool,
    pub body: String,
}

impl OutgoingMessage {
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            recipient_type: "individual".to_string(),
            to: to.into(),
            kind: "text".to_string(),
            text: TextBody {
                preview_url: false,
                body: body.into(),
            },
        }
    }
}

/// What the API answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// `{"status": "error", "message": ...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
}

/// Transport failure turned into an error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSend {
    /// 408 on timeout, 500 otherwise.
    pub status_code: u16,
    pub body: ErrorBody,
}

impl FailedSend {
    fn timed_out() -> Self {
        Self {
            status_code: 408,
            body: ErrorBody {
                status: "error".into(),
                message: "Request timed out".into(),
            },
        }
    }

    fn request_failed() -> Self {
        Self {
            status_code: 500,
            body: ErrorBody {
                status: "error".into(),
                message: "Failed to send message".into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered(Delivery),
    Failed(FailedSend),
}

impl SendOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            SendOutcome::Delivered(d) => d.status,
            SendOutcome::Failed(f) => f.status_code,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered(_))
    }
}

#[derive(Debug)]
pub enum GatewayError {
    /// The API answered with a non-2xx status.
    Status { status: u16, body: String },
    /// The HTTP client could not be built.
    Client(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, body } => write!(f, "WhatsApp API returned {status}: {body}"),
            Self::Client(e) => write!(f, "failed to build HTTP client: {e}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Delivery of outgoing envelopes.
pub trait Messenger {
    fn send(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<SendOutcome, GatewayError>> + Send;
}

/// Connection details for the Graph API messages endpoint.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_version: String,
    pub phone_number_id: String,
    pub access_token: String,
    pub timeout: Duration,
}

pub struct WhatsAppGateway {
    url: String,
    access_token: String,
    client: reqwest::Client,
}

impl WhatsAppGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        let url = format!(
            "{}/{}/{}/messages",
            config.base_url.trim_end_matches('/'),
            config.api_version,
            config.phone_number_id
        );

        Ok(Self {
            url,
            access_token: config.access_token,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn transport_failure(e: reqwest::Error) -> SendOutcome {
    if e.is_timeout() {
        error!("Timeout occurred while sending message");
        SendOutcome::Failed(FailedSend::timed_out())
    } else {
        error!("Request failed due to: {e}");
        SendOutcome::Failed(FailedSend::request_failed())
    }
}

impl Messenger for WhatsAppGateway {
    async fn send(&self, message: &OutgoingMessage) -> Result<SendOutcome, GatewayError> {
        let response = match self
            .client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .json(message)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(transport_failure(e)),
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Ok(transport_failure(e)),
        };

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!("Status: {}", status.as_u16());
        info!("Content-type: {}", content_type.as_deref().unwrap_or("-"));
        info!("Body: {body}");

        Ok(SendOutcome::Delivered(Delivery {
            status: status.as_u16(),
            content_type,
            body,
        }))
    }
}
