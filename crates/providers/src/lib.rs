//! Chat backends: the local OpenAI-style server plus the hosted
//! providers, and the dispatcher that routes one user message to
//! whichever backend is selected.

pub mod gemini;
pub mod local;
pub mod online;
pub mod openai_compat;
pub mod router;
pub mod wire;

pub use online::OnlineProvider;
pub use router::{dispatch, ChatReply, ChatTarget, ReplySource};
