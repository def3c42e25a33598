//! Local inference server backend. The server speaks an OpenAI-style
//! HTTP API: chat completions under `/v1/chat/completions`, model
//! listing under `/v1/models`.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;

use shared::transcript::Turn;

use crate::wire::{self, Seg};

// Listing should answer fast or not at all; chat requests get their
// own longer window in the dispatcher.
const LIST_TIMEOUT_SECS: u64 = 10;

const MAX_TOKENS: u32 = 16000;
const TEMPERATURE: f64 = 0.7;

pub const REPLY_PATH: &[Seg] = &[
    Seg::Key("choices"),
    Seg::Index(0),
    Seg::Key("message"),
    Seg::Key("content"),
];

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(LIST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(LIST_TIMEOUT_SECS))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// Strings the model picker shows when no real model list is
/// available. None of them may ever be sent as a model name.
pub mod placeholder {
    pub const LOADING: &str = "Loading...";
    pub const CONNECTION_FAILED: &str = "Connection failed";
    pub const NO_MODELS: &str = "No models found";
    pub const NO_RESPONSE: &str = "No response";

    pub const ALL: &[&str] = &[LOADING, CONNECTION_FAILED, NO_MODELS, NO_RESPONSE];
}

pub fn is_placeholder(model: &str) -> bool {
    placeholder::ALL.contains(&model)
}

/// Chat request body: the complete history plus generation settings,
/// streaming disabled.
pub fn chat_body(model: &str, turns: &[Turn]) -> String {
    let messages = turns.iter().map(turn_json).collect::<Vec<_>>().join(",");
    format!(
        "{{\"model\": \"{model}\", \"messages\": [{messages}], \
         \"max_tokens\": {MAX_TOKENS}, \"temperature\": {TEMPERATURE}, \"stream\": false}}"
    )
}

fn turn_json(turn: &Turn) -> String {
    format!(
        "{{\"role\": \"{}\", \"content\": \"{}\"}}",
        turn.role.as_str(),
        wire::escape(&turn.content)
    )
}

pub struct LocalClient {
    http: Client,
    base: String,
}

impl LocalClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base)
    }

    pub fn models_url(&self) -> String {
        format!("{}/v1/models", self.base)
    }

    /// Fetch the raw model-listing body.
    pub async fn list_models_raw(&self) -> Result<String> {
        let resp = self
            .http
            .get(self.models_url())
            .header("Accept", "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(anyhow!("model listing failed: {}", resp.status()));
        }
        Ok(resp.text().await?)
    }
}

/// Pull model ids out of a listing body. Entries without an id are
/// skipped rather than aborting the whole list.
pub fn parse_model_ids(body: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut i = 0;
    while let Some(element) = wire::extract(body, &[Seg::Key("data"), Seg::Index(i)]) {
        if let Some(id) = wire::extract(&element, &[Seg::Key("id")]) {
            if !id.is_empty() {
                ids.push(id);
            }
        }
        i += 1;
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_body_exact_layout() {
        let body = chat_body("llama", &[Turn::user("Hi")]);
        assert_eq!(
            body,
            "{\"model\": \"llama\", \"messages\": [{\"role\": \"user\", \"content\": \"Hi\"}], \
             \"max_tokens\": 16000, \"temperature\": 0.7, \"stream\": false}"
        );
    }

    #[test]
    fn test_chat_body_escapes_and_stays_valid_json() {
        let turns = vec![
            Turn::user("path is C:\\tools"),
            Turn::assistant("Noted \"C:\\tools\"."),
            Turn::user("line one\nline two"),
        ];
        let body: serde_json::Value = serde_json::from_str(&chat_body("m", &turns)).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "path is C:\\tools");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"], "Noted \"C:\\tools\".");
        assert_eq!(messages[2]["content"], "line one\nline two");
        assert_eq!(body["max_tokens"], 16000);
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_urls_tolerate_trailing_slash() {
        let client = LocalClient::new("http://127.0.0.1:8080/");
        assert_eq!(client.chat_url(), "http://127.0.0.1:8080/v1/chat/completions");
        assert_eq!(client.models_url(), "http://127.0.0.1:8080/v1/models");
        let bare = LocalClient::new("http://127.0.0.1:8080");
        assert_eq!(bare.models_url(), "http://127.0.0.1:8080/v1/models");
    }

    #[test]
    fn test_parse_model_ids() {
        let body = r#"{"object":"list","data":[{"id":"llama-3.1-8b","object":"model","created":1736112000},{"id":"qwen-2.5","object":"model"}]}"#;
        assert_eq!(parse_model_ids(body), vec!["llama-3.1-8b", "qwen-2.5"]);
    }

    #[test]
    fn test_parse_model_ids_skips_incomplete_entries() {
        let body = r#"{"data":[{"object":"model"},{"id":"kept"}]}"#;
        assert_eq!(parse_model_ids(body), vec!["kept"]);
    }

    #[test]
    fn test_parse_model_ids_malformed_is_empty() {
        assert!(parse_model_ids("not json at all").is_empty());
        assert!(parse_model_ids(r#"{"data":"oops"}"#).is_empty());
        assert!(parse_model_ids(r#"{"data":[]}"#).is_empty());
    }

    #[test]
    fn test_placeholders_are_never_models() {
        for p in placeholder::ALL {
            assert!(is_placeholder(p));
        }
        assert!(!is_placeholder("llama-3.1-8b"));
    }
}
