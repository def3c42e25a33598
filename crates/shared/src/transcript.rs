//! Conversation turns and the flattened transcript text.
//!
//! A conversation is an ordered list of [`Turn`]s, but the form the
//! user sees, saves and loads is a flat string where every turn is
//! rendered as `"<Label>: <content>"` followed by a blank line.
//! [`reconstruct`] is the one place that parses that text back into
//! turns; the dispatcher runs it on its transcript snapshot and the
//! import path runs it on freshly loaded files. The parse is a
//! heuristic over line prefixes and is kept bit-for-bit stable so old
//! saved conversations keep reading the same way.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire-format role string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Label rendered in front of the user's turns.
pub const USER_LABEL: &str = "You";
/// Label rendered in front of replies from the local backend.
pub const LOCAL_ASSISTANT_LABEL: &str = "AI";

/// Append one rendered turn to a transcript string.
pub fn append_entry(transcript: &mut String, label: &str, content: &str) {
    transcript.push_str(label);
    transcript.push_str(": ");
    transcript.push_str(content);
    transcript.push_str("\n\n");
}

/// Render turns into transcript text, using `assistant_label` for
/// every assistant turn.
pub fn flatten(turns: &[Turn], assistant_label: &str) -> String {
    let mut out = String::new();
    for turn in turns {
        let label = match turn.role {
            Role::User => USER_LABEL,
            Role::Assistant => assistant_label,
        };
        append_entry(&mut out, label, &turn.content);
    }
    out
}

/// Parse transcript text back into turns.
///
/// A line opens a new turn when it starts with `"You: "`, with
/// `"AI: "`, or with `"<label>: "` for one of
/// `known_assistant_labels`; the rest of the line is the turn's first
/// content line. Any other non-blank line continues the current turn,
/// joined with a single newline. Blank lines only separate. When a
/// turn ends, its content is trimmed; a turn whose content trims to
/// nothing is dropped. Content that happens to start with a known
/// label pattern is indistinguishable from a real turn boundary; that
/// ambiguity is inherent to the text form and is deliberately left
/// as-is.
pub fn reconstruct(transcript: &str, known_assistant_labels: &[&str]) -> Vec<Turn> {
    let mut turns = Vec::new();
    if transcript.trim().is_empty() {
        return turns;
    }

    let mut current_role: Option<Role> = None;
    let mut buffer = String::new();

    for line in transcript.split('\n') {
        let started = if let Some(rest) = line.strip_prefix("You: ") {
            Some((Role::User, rest))
        } else if let Some(rest) = line.strip_prefix("AI: ") {
            Some((Role::Assistant, rest))
        } else {
            known_assistant_labels.iter().find_map(|label| {
                line.strip_prefix(label)
                    .and_then(|rest| rest.strip_prefix(": "))
                    .map(|rest| (Role::Assistant, rest))
            })
        };

        match started {
            Some((role, rest)) => {
                flush(&mut turns, current_role, &buffer);
                current_role = Some(role);
                buffer.clear();
                buffer.push_str(rest);
            }
            None => {
                if !line.trim().is_empty() {
                    if !buffer.is_empty() {
                        buffer.push('\n');
                    }
                    buffer.push_str(line);
                }
            }
        }
    }
    flush(&mut turns, current_role, &buffer);

    turns
}

fn flush(turns: &mut Vec<Turn>, role: Option<Role>, buffer: &str) {
    if let Some(role) = role {
        let content = buffer.trim();
        if !content.is_empty() {
            turns.push(Turn {
                role,
                content: content.to_string(),
            });
        }
    }
}
