//! Routes one inbound webhook event: classify, then store or answer, then reply.

use std::fmt;

use serde_json::Value;
use tracing::{info, warn};

use crate::classifier::{self, Classification};
use crate::expense::{self, ExpenseError};
use crate::llm::{self, Completion};
use crate::store::{RecordStore, StoreError};
use crate::whatsapp::{
    GatewayError, InboundMessage, Messenger, OutgoingMessage, PayloadError, SendOutcome,
    process_text_for_whatsapp,
};

/// Reply sent when the classifier answers neither expense nor query.
pub const FALLBACK_REPLY: &str = "Error Occured";

#[derive(Debug)]
pub enum DispatchError {
    Payload(PayloadError),
    Llm(llm::Error),
    Store(StoreError),
    Gateway(GatewayError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload(e) => write!(f, "{e}"),
            Self::Llm(e) => write!(f, "LLM call failed: {e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::Gateway(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Payload(e) => Some(e),
            Self::Llm(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Gateway(e) => Some(e),
        }
    }
}

impl From<PayloadError> for DispatchError {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

impl From<llm::Error> for DispatchError {
    fn from(e: llm::Error) -> Self {
        Self::Llm(e)
    }
}

impl From<StoreError> for DispatchError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<GatewayError> for DispatchError {
    fn from(e: GatewayError) -> Self {
        Self::Gateway(e)
    }
}

impl From<ExpenseError> for DispatchError {
    fn from(e: ExpenseError) -> Self {
        match e {
            ExpenseError::Llm(e) => Self::Llm(e),
            ExpenseError::Store(e) => Self::Store(e),
        }
    }
}

/// What happened to one event.
#[derive(Debug)]
pub struct DispatchReport {
    pub sender: InboundMessage,
    pub classification: Classification,
    pub reply: String,
    pub outcome: SendOutcome,
}

pub struct Dispatcher<L, M> {
    llm: L,
    store: RecordStore,
    messenger: M,
    /// Replies go here, not necessarily to the sender.
    recipient: String,
    whatsapp_formatting: bool,
}

impl<L: Completion, M: Messenger> Dispatcher<L, M> {
    pub fn new(llm: L, store: RecordStore, messenger: M, recipient: impl Into<String>) -> Self {
        Self {
            llm,
            store,
            messenger,
            recipient: recipient.into(),
            whatsapp_formatting: false,
        }
    }

    /// Rewrite replies with [`process_text_for_whatsapp`] before sending.
    pub fn with_whatsapp_formatting(mut self, enabled: bool) -> Self {
        self.whatsapp_formatting = enabled;
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Handle one event. The payload is expected to have passed
    /// [`crate::whatsapp::is_valid_whatsapp_message`] already.
    pub async fn dispatch(&self, payload: &Value) -> Result<DispatchReport, DispatchError> {
        let sender = InboundMessage::extract(payload)?;
        let preview: String = sender.text.chars().take(100).collect();
        info!("📨 Message from {} ({}): \"{preview}\"", sender.name, sender.wa_id);

        let classification = classifier::classify(&sender.text, &self.llm).await?;
        info!("Classified as {:?}", classification);

        let reply = match &classification {
            Classification::Expense => {
                let formatted = expense::format_expense(&self.llm, &sender.text).await?;
                self.store.append(&formatted)?;
                formatted
            }
            Classification::Query => {
                expense::answer_query(&self.llm, &self.store, &sender.text).await?
            }
            Classification::Unrecognized(raw) => {
                warn!("Unrecognized classification {raw:?}, replying with fallback");
                FALLBACK_REPLY.to_string()
            }
        };

        let reply = if self.whatsapp_formatting {
            process_text_for_whatsapp(&reply)
        } else {
            reply
        };

        let message = OutgoingMessage::text(&self.recipient, &reply);
        let outcome = self.messenger.send(&message).await?;
        if !outcome.is_delivered() {
            warn!("Reply to {} not delivered ({})", self.recipient, outcome.status_code());
        }

        Ok(DispatchReport {
            sender,
            classification,
            reply,
            outcome,
        })
    }
}
