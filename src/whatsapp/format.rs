//! Text cleanup for WhatsApp's formatting conventions.

use std::sync::LazyLock;

use regex::Regex;

static CITATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"【.*?】").unwrap());
static DOUBLE_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

/// Rewrite model output for WhatsApp: drop `【…】` citation markers and turn
/// markdown `**bold**` into WhatsApp `*bold*`.
pub fn process_text_for_whatsapp(text: &str) -> String {
    let stripped = CITATION.replace_all(text, "");
    DOUBLE_STAR.replace_all(stripped.trim(), "*$1*").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_citations() {
        assert_eq!(
            process_text_for_whatsapp("You spent 400 on coffee【4:0†source】."),
            "You spent 400 on coffee."
        );
        assert_eq!(process_text_for_whatsapp("【1】 total 【2】"), "total");
    }

    #[test]
    fn test_converts_bold() {
        assert_eq!(
            process_text_for_whatsapp("**Total:** 450 and **Coffee** 400"),
            "*Total:* 450 and *Coffee* 400"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(process_text_for_whatsapp("Coffee:400"), "Coffee:400");
        assert_eq!(process_text_for_whatsapp("*already* fine"), "*already* fine");
    }
}
