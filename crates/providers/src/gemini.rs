//! Gemini wire shape: the key rides as a query parameter and the
//! message text nests under `contents[].parts[].text`.

use crate::online::OutboundRequest;
use crate::wire::{self, Seg};

const ENDPOINT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const REPLY_PATH: &[Seg] = &[
    Seg::Key("candidates"),
    Seg::Index(0),
    Seg::Key("content"),
    Seg::Key("parts"),
    Seg::Index(0),
    Seg::Key("text"),
];

pub fn build_request(wire_model: &str, key: String, message: &str) -> OutboundRequest {
    let url = format!("{ENDPOINT_BASE}/{wire_model}:generateContent?key={key}");
    let body = format!(
        "{{\"contents\": [{{\"role\": \"user\", \"parts\": [{{\"text\": \"{}\"}}]}}]}}",
        wire::escape(message)
    );
    OutboundRequest {
        url,
        bearer: None,
        body,
    }
}
