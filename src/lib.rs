//! WhatsApp expense assistant: logs expenses stated in chat and answers
//! questions about them, with an LLM doing the reading.

pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod expense;
pub mod llm;
pub mod logging;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod whatsapp;

#[cfg(test)]
mod testutil;

pub use classifier::{Classification, classify};
pub use config::{Config, ConfigError};
pub use dispatcher::{DispatchError, DispatchReport, Dispatcher, FALLBACK_REPLY};
pub use store::{ExpenseRecord, RecordStore, StoreError};
