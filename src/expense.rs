//! LLM-backed expense normalization and question answering over the store.

use std::fmt;

use tracing::debug;

use crate::llm::{self, Completion};
use crate::store::{self, RecordStore, StoreError};

#[derive(Debug)]
pub enum ExpenseError {
    Llm(llm::Error),
    Store(StoreError),
}

impl fmt::Display for ExpenseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Llm(e) => write!(f, "LLM call failed: {e}"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ExpenseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Llm(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<llm::Error> for ExpenseError {
    fn from(e: llm::Error) -> Self {
        Self::Llm(e)
    }
}

impl From<StoreError> for ExpenseError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

pub fn expense_prompt(message: &str) -> String {
    format!(
        "Convert this expense message into a short, structured string format: 'ITEM:AMOUNT'. \n \n \n\n    \
         Note : Only print Item: Amount nothig else (it is very important for my career) \n \n \n \
         Message: '{message}'"
    )
}

pub fn query_prompt(query: &str, context: &str) -> String {
    format!(
        "Query: {query}\n\nContext:\n{context}\n\n\n    \
         Based on the above context, please answer the query. \n\n\n    \
         Note : Only print the final answer in concise format (This is very important for my career)"
    )
}

/// Normalize an expense statement to `ITEM:AMOUNT`. The shape is not checked.
pub async fn format_expense<C: Completion>(llm: &C, message: &str) -> Result<String, llm::Error> {
    llm.complete(&expense_prompt(message)).await
}

/// Answer `query` with the whole stored history as context.
pub async fn answer_query<C: Completion>(
    llm: &C,
    store: &RecordStore,
    query: &str,
) -> Result<String, ExpenseError> {
    let records = store.load_all()?;
    debug!("Answering query over {} record(s)", records.len());

    let context = store::records_as_context(&records);
    Ok(llm.complete(&query_prompt(query, &context)).await?)
}
