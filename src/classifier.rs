//! Expense-or-query classification of incoming messages.

use crate::llm::{Completion, Error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// "Type 1": the message states an expense, e.g. "bought coffee for 400".
    Expense,
    /// "Type 2": the message asks about past spending.
    Query,
    /// The model answered something other than "1" or "2".
    Unrecognized(String),
}

impl Classification {
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim() {
            "1" => Classification::Expense,
            "2" => Classification::Query,
            other => Classification::Unrecognized(other.to_string()),
        }
    }
}

/// Prompt wording is what the classifier was tuned with, typos included.
pub fn classification_prompt(message: &str) -> String {
    format!(
        "Following is a message it can be of \n Type 1 : stating an expense like bought coffee for 400 \n \
         Type 2 : query like how much i spent on ceratin things or in total \
         (example : How much i spent on coffee in january) \n \n \
         Classify the following message into Type 1 or Type 2 \n \n \
         Note : Only return a single number if it is type 1 just return 1 else 2 \
         (This is very important for my career) \n \n \n Message is : '{message}'"
    )
}

pub async fn classify<C: Completion>(message: &str, llm: &C) -> Result<Classification, Error> {
    let answer = llm.complete(&classification_prompt(message)).await?;
    Ok(Classification::from_answer(&answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    #[test]
    fn test_from_answer() {
        assert_eq!(Classification::from_answer("1"), Classification::Expense);
        assert_eq!(Classification::from_answer(" 2\n"), Classification::Query);
        assert_eq!(
            Classification::from_answer("Type 1"),
            Classification::Unrecognized("Type 1".into())
        );
        assert_eq!(
            Classification::from_answer(""),
            Classification::Unrecognized(String::new())
        );
    }

    #[test]
    fn test_prompt_wording_is_stable() {
        assert_eq!(
            classification_prompt("coffee 400"),
            "Following is a message it can be of \n Type 1 : stating an expense like bought coffee for 400 \n \
             Type 2 : query like how much i spent on ceratin things or in total (example : How much i spent on coffee in january) \n \n \
             Classify the following message into Type 1 or Type 2 \n \n \
             Note : Only return a single number if it is type 1 just return 1 else 2 (This is very important for my career) \n \n \n \
             Message is : 'coffee 400'"
        );
    }

    #[test]
    fn test_prompt_quotes_message() {
        let prompt = classification_prompt("bought tea for 50");
        assert!(prompt.contains("Message is : 'bought tea for 50'"));
        assert!(prompt.contains("Type 1"));
        assert!(prompt.contains("Type 2"));
    }

    #[tokio::test]
    async fn test_classify_uses_llm_answer() {
        let llm = ScriptedLlm::new(["2"]);
        let result = classify("how much did I spend on coffee?", &llm).await.unwrap();
        assert_eq!(result, Classification::Query);
        assert!(llm.prompts()[0].contains("'how much did I spend on coffee?'"));
    }

    #[tokio::test]
    async fn test_classify_propagates_llm_error() {
        let llm = ScriptedLlm::new(Vec::<&str>::new());
        assert!(classify("anything", &llm).await.is_err());
    }
}
