//! Administration of the local inference backend: unload a model via
//! the management API, verify it actually went away, and as a last
//! resort restart the whole container.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::Client;
use tokio::process::Command;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT_SECS: u64 = 15;
const VERIFY_ATTEMPTS: u32 = 5;
const VERIFY_DELAY_MS: u64 = 1000;
const RESTART_WAIT_SECS: u64 = 10;

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadOutcome {
    /// Nothing to do, the model was not loaded in the first place.
    NotLoaded,
    /// Shutdown accepted and the listing no longer shows the model.
    Verified,
    /// Management API could not free it; the container was restarted.
    Restarted,
}

pub struct ModelAdmin {
    http: Client,
    base: String,
}

impl ModelAdmin {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn shutdown_url(&self, model: &str) -> String {
        format!("{}/backend/shutdown/{}", self.base, model)
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.base)
    }

    /// The listing quotes every loaded model id, so a quoted match is
    /// enough to tell loaded from unloaded.
    pub async fn is_model_loaded(&self, model: &str) -> bool {
        match self.list_models_body().await {
            Ok(body) => listing_mentions(&body, model),
            Err(err) => {
                debug!(%err, "could not check loaded models");
                false
            }
        }
    }

    async fn list_models_body(&self) -> Result<String> {
        let resp = self
            .http
            .get(self.models_url())
            .header("Accept", "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("model listing failed: {}", resp.status());
        }
        Ok(resp.text().await?)
    }

    async fn request_shutdown(&self, model: &str) -> Result<()> {
        let url = self.shutdown_url(model);
        debug!(%url, "posting backend shutdown");
        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .send()
            .await?;
        let status = resp.status();
        // Some server versions answer 200, others 204.
        if status.as_u16() == 200 || status.as_u16() == 204 {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        let detail: String = body.chars().take(800).collect();
        bail!("backend shutdown failed with status {status}: {detail}")
    }

    /// Unload `model` and poll the listing until it disappears.
    pub async fn unload(&self, model: &str) -> Result<UnloadOutcome> {
        if self.base.is_empty() || model.trim().is_empty() {
            bail!("base URL or model name is missing");
        }
        if !self.is_model_loaded(model).await {
            info!(model, "model is not currently loaded");
            return Ok(UnloadOutcome::NotLoaded);
        }

        info!(model, "model is loaded, requesting backend shutdown");
        self.request_shutdown(model).await?;

        for attempt in 1..=VERIFY_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(Duration::from_millis(VERIFY_DELAY_MS)).await;
            }
            debug!(attempt, "verifying unload");
            if !self.is_model_loaded(model).await {
                info!(model, "unload verified");
                return Ok(UnloadOutcome::Verified);
            }
        }
        bail!(
            "model '{model}' still appears loaded after {VERIFY_ATTEMPTS} checks; \
             the server may auto-reload it, try a container restart"
        )
    }

    /// [`unload`](Self::unload), then fall back to restarting the
    /// container when one is configured.
    pub async fn force_unload(&self, model: &str, container: Option<&str>) -> Result<UnloadOutcome> {
        match self.unload(model).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let container = container.map(str::trim).filter(|c| !c.is_empty());
                let Some(name) = container else {
                    return Err(err);
                };
                warn!(%err, container = name, "unload failed, restarting container");
                restart_container(name).await?;
                Ok(UnloadOutcome::Restarted)
            }
        }
    }
}

/// Restart the backend's docker container and give the server time to
/// come back up before anyone talks to it again.
pub async fn restart_container(name: &str) -> Result<()> {
    info!(container = name, "restarting docker container");
    let status = Command::new("docker").args(["restart", name]).status().await?;
    if !status.success() {
        bail!("docker restart {name} failed ({status}); restart the container manually");
    }
    tokio::time::sleep(Duration::from_secs(RESTART_WAIT_SECS)).await;
    Ok(())
}

fn listing_mentions(body: &str, model: &str) -> bool {
    body.contains(&format!("\"{model}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_built_from_trimmed_base() {
        let admin = ModelAdmin::new("http://127.0.0.1:8080/");
        assert_eq!(
            admin.shutdown_url("llama-3.1-8b"),
            "http://127.0.0.1:8080/backend/shutdown/llama-3.1-8b"
        );
        assert_eq!(admin.models_url(), "http://127.0.0.1:8080/v1/models");
    }

    #[test]
    fn test_listing_match_requires_quoted_name() {
        let body = r#"{"data":[{"id":"llama-3.1-8b","object":"model"}]}"#;
        assert!(listing_mentions(body, "llama-3.1-8b"));
        // Substrings of a longer id must not count as loaded.
        assert!(!listing_mentions(body, "llama-3.1"));
        assert!(!listing_mentions(body, "qwen"));
    }

    #[tokio::test]
    async fn test_unload_rejects_missing_inputs() {
        let admin = ModelAdmin::new("");
        assert!(admin.unload("llama").await.is_err());

        let admin = ModelAdmin::new("http://127.0.0.1:8080");
        assert!(admin.unload("   ").await.is_err());
    }
}
