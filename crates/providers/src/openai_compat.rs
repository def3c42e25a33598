//! Request shape shared by the OpenAI-compatible hosted APIs.
//! Deepseek and ChatGPT differ only in endpoint, model id and key.

use crate::online::OutboundRequest;
use crate::wire::{self, Seg};

pub const DEEPSEEK_ENDPOINT: &str = "https://api.deepseek.com/chat/completions";
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Reply location, same layout as the local server's.
pub const REPLY_PATH: &[Seg] = &[
    Seg::Key("choices"),
    Seg::Index(0),
    Seg::Key("message"),
    Seg::Key("content"),
];

/// Hosted requests are stateless: only the new message goes out,
/// never the running history.
pub fn build_request(
    endpoint: &str,
    wire_model: &str,
    key: String,
    message: &str,
) -> OutboundRequest {
    let body = format!(
        "{{\"model\": \"{}\", \"messages\": [{{\"role\": \"user\", \"content\": \"{}\"}}], \"stream\": false}}",
        wire_model,
        wire::escape(message)
    );
    OutboundRequest {
        url: endpoint.to_string(),
        bearer: Some(key),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_valid_json_with_single_message() {
        let req = build_request(
            DEEPSEEK_ENDPOINT,
            "deepseek-chat",
            "sk-test".to_string(),
            "say \"hi\"\nplease",
        );
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "say \"hi\"\nplease");
    }

    #[test]
    fn test_key_travels_as_bearer() {
        let req = build_request(OPENAI_ENDPOINT, "gpt-3.5-turbo", "sk-abc".to_string(), "Hi");
        assert_eq!(req.url, OPENAI_ENDPOINT);
        assert_eq!(req.bearer.as_deref(), Some("sk-abc"));
        assert!(!req.body.contains("sk-abc"));
    }
}
