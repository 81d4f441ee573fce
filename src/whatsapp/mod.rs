//! WhatsApp Cloud API: inbound webhook payloads, outbound messages.

pub mod format;
pub mod gateway;
pub mod payload;

pub use format::process_text_for_whatsapp;
pub use gateway::{
    GatewayConfig, GatewayError, Messenger, OutgoingMessage, SendOutcome, WhatsAppGateway,
};
pub use payload::{InboundMessage, PayloadError, is_valid_whatsapp_message};
