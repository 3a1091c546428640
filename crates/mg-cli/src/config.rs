use std::env;
use std::time::Duration;
use anyhow::Context;
use log::debug;
use mg_gradio::{GradioConfig, DEFAULT_SPACE, DEFAULT_TIMEOUT};

pub const SPACE_VAR: &str = "MESHGEN_SPACE";
pub const TOKEN_VAR: &str = "HF_TOKEN";
pub const TIMEOUT_VAR: &str = "MESHGEN_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshgenConfig {
    pub space: String,
    pub hf_token: Option<String>,
    pub timeout: Duration,
}

impl MeshgenConfig {
    /// Environment, with an optional `.env` in the working directory filling gaps
    pub fn load() -> anyhow::Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).context("Failed to read .env"),
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let space = non_empty(SPACE_VAR).unwrap_or_else(|| DEFAULT_SPACE.to_string());
        let hf_token = non_empty(TOKEN_VAR);
        let timeout = match non_empty(TIMEOUT_VAR) {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .with_context(|| format!("{} must be a number of seconds, got '{}'", TIMEOUT_VAR, secs))?,
            ),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            space,
            hf_token,
            timeout,
        })
    }

    pub fn with_space(mut self, space: Option<String>) -> Self {
        if let Some(space) = space {
            self.space = space;
        }
        self
    }

    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }

    pub fn gradio(&self) -> GradioConfig {
        GradioConfig {
            space: self.space.clone(),
            hf_token: self.hf_token.clone(),
            timeout: self.timeout,
        }
    }
}
