//! Runtime configuration for crop-predict.
//!
//! Configuration can be loaded from a JSON file or constructed programmatically.
//! CLI flags override the file for the handful of knobs an operator touches
//! at deploy time (listen address, model path, verbosity).

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "crop-predict", about = "Top-3 crop recommendation scoring server")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Path to the serialized model artifact (overrides the config file).
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Verbose (debug-level) logging. On by default; pass `--verbose false` in production.
    #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Model configuration.
    pub model: ModelConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:5001").
    pub listen: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Attach a permissive CORS layer (the mobile client calls the service directly).
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5001".to_string(),
            max_body_bytes: 64 * 1024,
            permissive_cors: true,
        }
    }
}

/// Model-related settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the serialized model artifact (JSON, optionally zstd-compressed).
    pub model_path: PathBuf,

    /// Number of features every request must carry.
    pub n_features: usize,

    /// Number of ranked classes returned per prediction.
    pub top_k: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            n_features: 7,
            top_k: 3,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply CLI overrides on top of the loaded file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(model) = &cli.model {
            self.model.model_path = model.clone();
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.model.n_features == 0 {
            anyhow::bail!("model.n_features must be at least 1");
        }
        if self.model.top_k == 0 {
            anyhow::bail!("model.top_k must be at least 1");
        }
        Ok(())
    }
}
