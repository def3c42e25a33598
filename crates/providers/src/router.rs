//! One user turn, end to end: pick the backend, send the request,
//! and normalize whatever comes back into text the transcript can
//! show. Exactly one attempt per user action; every failure is
//! reported, never retried here.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use shared::error::ChatError;
use shared::transcript::{self, Turn};

use crate::online::OnlineProvider;
use crate::{local, online, wire};

const CHAT_TIMEOUT_SECS: u64 = 120;

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(CHAT_TIMEOUT_SECS))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// Where a message goes. Built from interface state at the moment the
/// user clicks send, so a dispatch never reads live widget state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    Local {
        base_url: String,
        model: Option<String>,
    },
    Online {
        provider: String,
    },
}

/// How the reply text was recovered from the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    KeyPath,
    ContentScan,
    RawBody,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Transcript label for the speaker ("AI" or the provider name).
    pub label: String,
    pub text: String,
    /// Untouched response body, for the raw panel.
    pub raw: String,
    pub source: ReplySource,
    /// The reply hit the token limit and was cut short.
    pub truncated: bool,
}

/// Run one chat turn against the selected backend.
///
/// `transcript_so_far` is the flattened transcript as it stood when
/// the user hit send; for the local backend it is reconstructed into
/// turns and sent as history, hosted backends get the new message
/// alone.
pub async fn dispatch(
    message: &str,
    target: &ChatTarget,
    transcript_so_far: &str,
) -> Result<ChatReply, ChatError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ChatError::EmptyInput);
    }
    match target {
        ChatTarget::Local { base_url, model } => {
            dispatch_local(message, base_url, model.as_deref(), transcript_so_far).await
        }
        ChatTarget::Online { provider } => dispatch_online(message, provider).await,
    }
}

async fn dispatch_local(
    message: &str,
    base_url: &str,
    model: Option<&str>,
    transcript_so_far: &str,
) -> Result<ChatReply, ChatError> {
    let model = match model {
        Some(m) if !m.is_empty() && !local::is_placeholder(m) => m,
        _ => return Err(ChatError::NoModelSelected),
    };
    let history = local_history(transcript_so_far, message);
    let client = local::LocalClient::new(base_url);
    let body = local::chat_body(model, &history);
    debug!(model, turns = history.len(), "sending local chat request");
    let raw = post_json(&client.chat_url(), None, &body).await?;
    Ok(normalize(transcript::LOCAL_ASSISTANT_LABEL, local::REPLY_PATH, raw))
}

async fn dispatch_online(message: &str, provider_name: &str) -> Result<ChatReply, ChatError> {
    let provider = OnlineProvider::from_name(provider_name)
        .ok_or_else(|| ChatError::UnsupportedProvider(provider_name.to_string()))?;
    let request = provider.build_request(message)?;
    debug!(provider = provider.display_name(), "sending hosted chat request");
    let raw = post_json(&request.url, request.bearer.as_deref(), &request.body).await?;
    Ok(normalize(provider.display_name(), provider.reply_path(), raw))
}

/// Reconstruct turns from the transcript snapshot and append the new
/// user turn. Hosted reply labels count as assistant speakers so a
/// conversation that switched backends still reads back whole.
fn local_history(transcript_so_far: &str, message: &str) -> Vec<Turn> {
    let labels = online::display_names();
    let mut turns = transcript::reconstruct(transcript_so_far, &labels);
    turns.push(Turn::user(message));
    turns
}

async fn post_json(url: &str, bearer: Option<&str>, body: &str) -> Result<String, ChatError> {
    let mut request = SHARED_HTTP
        .post(url)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .body(body.to_string());
    if let Some(key) = bearer {
        request = request.bearer_auth(key);
    }
    let resp = request.send().await.map_err(request_error)?;
    let status = resp.status();
    let text = resp.text().await.map_err(request_error)?;
    if !status.is_success() {
        return Err(ChatError::Transport {
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(text)
}

fn request_error(err: reqwest::Error) -> ChatError {
    if err.is_timeout() {
        ChatError::Timeout
    } else {
        ChatError::Network(err.to_string())
    }
}

/// Shape-tolerance ladder: the adapter's key path first, then a bare
/// `"content"` scan, then the raw body itself. The user always gets
/// something to read.
fn normalize(label: &str, path: &[wire::Seg], raw: String) -> ChatReply {
    let truncated = raw.contains("\"finish_reason\":\"length\"");
    let (text, source) = match wire::extract(&raw, path) {
        Some(text) => (text, ReplySource::KeyPath),
        None => match wire::first_content_string(&raw) {
            Some(text) => {
                warn!(label, "reply path missed, fell back to content scan");
                (text, ReplySource::ContentScan)
            }
            None => {
                warn!(label, "response shape unrecognized, passing raw body through");
                (raw.clone(), ReplySource::RawBody)
            }
        },
    };
    ChatReply {
        label: label.to_string(),
        text,
        raw,
        source,
        truncated,
    }
}
