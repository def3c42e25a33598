//! Collaborators around the chat core: conversation files on disk
//! and administration of the local inference backend.

pub mod model_admin;
pub mod transcript_io;
