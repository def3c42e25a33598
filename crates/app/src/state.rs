//! Application state and the background tasks that feed it.
//!
//! Network work never runs on the interface thread. Each action
//! spawns a worker thread with its own tokio runtime and hands back a
//! `Receiver`; the frame loop drains the receivers with `try_recv`.
//! Whatever the interface needs for a request is snapshotted into the
//! worker up front, so a task never reads live widget state.

use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use anyhow::anyhow;
use tracing::{info, warn};

use providers::local::{self, placeholder, LocalClient};
use providers::online;
use providers::router::{dispatch, ChatReply, ChatTarget, ReplySource};
use services::model_admin::{ModelAdmin, UnloadOutcome};
use services::transcript_io;
use shared::error::ChatError;
use shared::settings::{AppSettings, BackendKind};
use shared::transcript;

use crate::utils::load_settings_or_default;

/// Result of one model-list scan.
pub enum ModelScan {
    Found(Vec<String>),
    /// Listing answered but no model ids could be read from it.
    Empty { raw: String },
    /// Listing answered with an empty body.
    NoResponse,
    Failed(String),
}

pub struct AppState {
    pub settings: AppSettings,

    /// Flattened conversation, the only persistent form it has.
    pub transcript: String,
    pub input_text: String,
    pub status: String,

    pub raw_label: String,
    pub raw_response: String,

    pub local_models: Vec<String>,
    pub selected_model: Option<String>,
    pub selected_provider: String,

    pub dispatch_rx: Option<Receiver<Result<ChatReply, ChatError>>>,
    pub models_rx: Option<Receiver<ModelScan>>,
    pub admin_rx: Option<Receiver<anyhow::Result<UnloadOutcome>>>,
}

impl AppState {
    pub fn new() -> Self {
        let settings = load_settings_or_default();
        let selected_provider = if settings.last_provider.is_empty() {
            online::OnlineProvider::all()[0].display_name().to_string()
        } else {
            settings.last_provider.clone()
        };
        Self {
            settings,
            transcript: String::new(),
            input_text: String::new(),
            status: "Ready".to_string(),
            raw_label: String::new(),
            raw_response: String::new(),
            local_models: vec![placeholder::LOADING.to_string()],
            selected_model: Some(placeholder::LOADING.to_string()),
            selected_provider,
            dispatch_rx: None,
            models_rx: None,
            admin_rx: None,
        }
    }

    /// Copy current picks back into the settings before persisting.
    pub fn sync_settings(&mut self) {
        if let Some(model) = &self.selected_model {
            if !local::is_placeholder(model) {
                self.settings.last_local_model = model.clone();
            }
        }
        self.settings.last_provider = self.selected_provider.clone();
    }

    /// Backend choice as it stands right now, for snapshotting into a
    /// dispatch.
    pub fn current_target(&self) -> ChatTarget {
        match self.settings.backend {
            BackendKind::LocalServer => ChatTarget::Local {
                base_url: self.settings.base_url.trim().to_string(),
                model: self.selected_model.clone(),
            },
            BackendKind::Hosted => ChatTarget::Online {
                provider: self.selected_provider.clone(),
            },
        }
    }

    // ── Chat dispatch ───────────────────────────────────────────────

    pub fn send_message(&mut self) {
        if self.dispatch_rx.is_some() {
            return; // one request at a time
        }
        let message = self.input_text.trim().to_string();
        if message.is_empty() {
            return;
        }
        let target = self.current_target();
        // The snapshot must not include the line we are about to
        // append, or the new message would be sent twice.
        let snapshot = self.transcript.clone();

        transcript::append_entry(&mut self.transcript, transcript::USER_LABEL, &message);
        self.input_text.clear();
        self.status = "Sending...".to_string();

        let (tx, rx) = channel();
        self.dispatch_rx = Some(rx);
        run_dispatch(message, target, snapshot, tx);
    }

    pub fn poll_dispatch(&mut self) {
        let Some(rx) = &self.dispatch_rx else { return };
        let Ok(result) = rx.try_recv() else { return };
        self.dispatch_rx = None;

        match result {
            Ok(reply) => {
                info!(
                    label = reply.label.as_str(),
                    source = ?reply.source,
                    chars = reply.text.len(),
                    "chat reply received"
                );
                transcript::append_entry(&mut self.transcript, &reply.label, &reply.text);
                let source_note = match reply.source {
                    ReplySource::KeyPath => "",
                    ReplySource::ContentScan => ", fallback parse",
                    ReplySource::RawBody => ", raw passthrough",
                };
                self.raw_label = format!(
                    "Raw Response ({}, length: {}{})",
                    reply.label,
                    reply.raw.len(),
                    source_note
                );
                self.raw_response = reply.raw;
                self.status = if reply.truncated {
                    "Reply was truncated by the token limit and may be incomplete".to_string()
                } else {
                    "Ready".to_string()
                };
            }
            // Blank input is silently ignored, not an error.
            Err(ChatError::EmptyInput) => self.status = "Ready".to_string(),
            Err(err) => {
                warn!(%err, "chat dispatch failed");
                self.status = err.to_string();
                self.raw_label = "Error".to_string();
                self.raw_response = err.to_string();
            }
        }
    }

    // ── Model list ──────────────────────────────────────────────────

    pub fn refresh_models(&mut self) {
        if self.models_rx.is_some() {
            return;
        }
        let base = self.settings.base_url.trim().to_string();
        if base.is_empty() {
            return;
        }
        self.local_models = vec![placeholder::LOADING.to_string()];
        self.selected_model = Some(placeholder::LOADING.to_string());
        self.status = "Scanning for models...".to_string();

        let (tx, rx) = channel();
        self.models_rx = Some(rx);
        run_model_scan(base, tx);
    }

    pub fn poll_models(&mut self) {
        let Some(rx) = &self.models_rx else { return };
        let Ok(scan) = rx.try_recv() else { return };
        self.models_rx = None;

        match scan {
            ModelScan::Found(ids) => {
                info!(count = ids.len(), "model scan finished");
                self.status = format!("Found {} models", ids.len());
                let remembered = self.settings.last_local_model.clone();
                self.selected_model = if !remembered.is_empty() && ids.contains(&remembered) {
                    Some(remembered)
                } else {
                    ids.first().cloned()
                };
                self.local_models = ids;
            }
            ModelScan::Empty { raw } => {
                self.local_models = vec![placeholder::NO_MODELS.to_string()];
                self.selected_model = Some(placeholder::NO_MODELS.to_string());
                self.raw_label = "Raw model listing".to_string();
                self.raw_response = raw;
                self.status = placeholder::NO_MODELS.to_string();
            }
            ModelScan::NoResponse => {
                self.local_models = vec![placeholder::NO_RESPONSE.to_string()];
                self.selected_model = Some(placeholder::NO_RESPONSE.to_string());
                self.status = "No response from the server".to_string();
            }
            ModelScan::Failed(err) => {
                self.local_models = vec![placeholder::CONNECTION_FAILED.to_string()];
                self.selected_model = Some(placeholder::CONNECTION_FAILED.to_string());
                self.status = format!("Error scanning for models: {err}");
            }
        }
    }

    // ── Model admin ─────────────────────────────────────────────────

    pub fn unload_model(&mut self) {
        if self.admin_rx.is_some() {
            return;
        }
        let model = match &self.selected_model {
            Some(m) if !local::is_placeholder(m) => m.clone(),
            _ => {
                self.status = "No usable model is selected".to_string();
                return;
            }
        };
        let base = self.settings.base_url.trim().to_string();
        let container = self.settings.backend_container.clone();
        self.status = format!("Unloading {model}...");

        let (tx, rx) = channel();
        self.admin_rx = Some(rx);
        run_unload(base, model, container, tx);
    }

    pub fn poll_admin(&mut self) {
        let Some(rx) = &self.admin_rx else { return };
        let Ok(result) = rx.try_recv() else { return };
        self.admin_rx = None;

        self.status = match result {
            Ok(UnloadOutcome::NotLoaded) => "Model was not loaded".to_string(),
            Ok(UnloadOutcome::Verified) => "Model unloaded and verified".to_string(),
            Ok(UnloadOutcome::Restarted) => {
                "Container restarted; the server should be back shortly".to_string()
            }
            Err(err) => format!("Unload failed: {err}"),
        };
    }

    // ── Conversation files ──────────────────────────────────────────

    pub fn load_conversation(&mut self, path: &Path) {
        match transcript_io::load(path) {
            Ok(text) => {
                self.transcript = text.trim().to_string();
                // Keep the turn separator so the next append starts a
                // fresh line instead of gluing onto the last one.
                if !self.transcript.is_empty() {
                    self.transcript.push_str("\n\n");
                }
                let labels = online::display_names();
                let turns = transcript::reconstruct(&self.transcript, &labels);
                self.status = format!(
                    "Loaded {} ({} turns recognized)",
                    path.display(),
                    turns.len()
                );
            }
            Err(err) => self.status = format!("Load failed: {err}"),
        }
    }

    pub fn save_conversation(&mut self, path: &Path) {
        match transcript_io::save(path, &self.transcript) {
            Ok(()) => self.status = format!("Saved {}", path.display()),
            Err(err) => self.status = format!("Save failed: {err}"),
        }
    }
}

// ── Background workers ──────────────────────────────────────────────

fn run_dispatch(
    message: String,
    target: ChatTarget,
    snapshot: String,
    tx: Sender<Result<ChatReply, ChatError>>,
) {
    thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(Err(ChatError::Network(format!(
                    "failed to start async runtime: {e}"
                ))));
                return;
            }
        };
        let result = rt.block_on(dispatch(&message, &target, &snapshot));
        let _ = tx.send(result);
    });
}

fn run_model_scan(base: String, tx: Sender<ModelScan>) {
    thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(ModelScan::Failed(format!(
                    "failed to start async runtime: {e}"
                )));
                return;
            }
        };
        let scan = rt.block_on(async {
            let client = LocalClient::new(&base);
            match client.list_models_raw().await {
                Ok(body) if body.is_empty() => ModelScan::NoResponse,
                Ok(body) => {
                    let ids = local::parse_model_ids(&body);
                    if ids.is_empty() {
                        ModelScan::Empty { raw: body }
                    } else {
                        ModelScan::Found(ids)
                    }
                }
                Err(e) => ModelScan::Failed(e.to_string()),
            }
        });
        let _ = tx.send(scan);
    });
}

fn run_unload(
    base: String,
    model: String,
    container: Option<String>,
    tx: Sender<anyhow::Result<UnloadOutcome>>,
) {
    thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(Err(anyhow!("failed to start async runtime: {e}")));
                return;
            }
        };
        let result = rt.block_on(async {
            let admin = ModelAdmin::new(&base);
            admin.force_unload(&model, container.as_deref()).await
        });
        let _ = tx.send(result);
    });
}
