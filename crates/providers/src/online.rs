//! The hosted providers: a small closed set, each knowing its
//! endpoint family, wire model id and credential variable.

use std::env;

use shared::error::ChatError;

use crate::wire::Seg;
use crate::{gemini, openai_compat};

/// One ready-to-send chat request.
pub struct OutboundRequest {
    pub url: String,
    /// Key for the `Authorization: Bearer` header, when the provider
    /// wants it there instead of in the URL.
    pub bearer: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlineProvider {
    Deepseek,
    Gemini,
    ChatGpt,
}

impl OnlineProvider {
    /// Picker order.
    pub fn all() -> &'static [OnlineProvider] {
        &[Self::Deepseek, Self::Gemini, Self::ChatGpt]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Deepseek => "Deepseek",
            Self::Gemini => "Gemini",
            Self::ChatGpt => "ChatGPT",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.display_name() == name)
    }

    /// Environment variable holding this provider's API key.
    pub fn credential_env(&self) -> &'static str {
        match self {
            Self::Deepseek => "DEEPSEEK_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::ChatGpt => "CHATGPT_API_KEY",
        }
    }

    /// Model identifier sent on the wire.
    pub fn wire_model(&self) -> &'static str {
        match self {
            Self::Deepseek => "deepseek-chat",
            Self::Gemini => "gemini-2.5-flash",
            Self::ChatGpt => "gpt-3.5-turbo",
        }
    }

    fn credential(&self) -> Result<String, ChatError> {
        let env_var = self.credential_env();
        match env::var(env_var) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(ChatError::MissingCredential { env_var }),
        }
    }

    /// Build the full request. Fails before any network work when the
    /// credential is unset or empty.
    pub fn build_request(&self, message: &str) -> Result<OutboundRequest, ChatError> {
        let key = self.credential()?;
        Ok(match self {
            Self::Deepseek => openai_compat::build_request(
                openai_compat::DEEPSEEK_ENDPOINT,
                self.wire_model(),
                key,
                message,
            ),
            Self::ChatGpt => openai_compat::build_request(
                openai_compat::OPENAI_ENDPOINT,
                self.wire_model(),
                key,
                message,
            ),
            Self::Gemini => gemini::build_request(self.wire_model(), key, message),
        })
    }

    /// Where the reply text lives in this provider's response body.
    pub fn reply_path(&self) -> &'static [Seg] {
        match self {
            Self::Deepseek | Self::ChatGpt => openai_compat::REPLY_PATH,
            Self::Gemini => gemini::REPLY_PATH,
        }
    }
}

/// Display names in picker order; these double as the transcript
/// labels for hosted replies.
pub fn display_names() -> Vec<&'static str> {
    OnlineProvider::all().iter().map(|p| p.display_name()).collect()
}
