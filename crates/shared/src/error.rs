use thiserror::Error;

/// Everything that can stop a chat dispatch before a reply is produced.
///
/// Display text is written for the status line: each message makes
/// sense on its own, with no wrapping context.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Whitespace-only input. Callers treat this as "nothing to do",
    /// not as a failure worth showing.
    #[error("message is empty")]
    EmptyInput,
    /// The model picker holds a placeholder, not a real model id.
    #[error("no usable model is selected")]
    NoModelSelected,
    #[error("{env_var} environment variable is not set")]
    MissingCredential { env_var: &'static str },
    #[error("unsupported online provider: {0}")]
    UnsupportedProvider(String),
    #[error("request timed out")]
    Timeout,
    /// Non-2xx reply. `body` is the provider's error text, verbatim.
    #[error("API error {status}: {body}")]
    Transport { status: u16, body: String },
    /// Could not reach the backend at all (DNS, refused, TLS, ...).
    #[error("network error: {0}")]
    Network(String),
}
