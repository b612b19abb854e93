//! Client-side context management.
//!
//! Reads/writes `~/.h10cm/config.toml`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use h10cm_core::TrackerConfig;
use serde::{Deserialize, Serialize};

/// A single context: one backend plus the identity used against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Context {
    /// Context name (e.g. "plant-a").
    pub name: String,

    /// Backend base URL (e.g. "http://localhost:3000/api").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Bearer token obtained from the backend's login flow.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    /// Name recorded as `completedBy` and on stock transactions.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,

    /// Local state directory (pending-orders cart).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_dir: String,

    /// Extra `--key=value` settings passed to [`TrackerConfig::from_args`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<String>,
}

impl Context {
    /// Runtime configuration for this context.
    pub fn tracker_config(&self) -> TrackerConfig {
        let data_dir = if self.data_dir.is_empty() {
            dirs_path().join(&self.name)
        } else {
            PathBuf::from(&self.data_dir)
        };
        let mut args = vec![format!("--data-dir={}", data_dir.display())];
        if !self.server.is_empty() {
            args.push(format!("--server={}", self.server));
        }
        args.extend(self.settings.iter().cloned());
        TrackerConfig::from_args(&args)
    }
}

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the currently active context.
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl ClientConfig {
    /// ~/.h10cm/config.toml
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// A missing file is an empty config.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).with_context(|| format!("parsing {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("writing {}", path.display()))
    }

    pub fn current(&self) -> Option<&Context> {
        self.context(&self.current_context)
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Insert `ctx`, replacing any context with the same name in place.
    pub fn upsert_context(&mut self, ctx: Context) {
        match self.contexts.iter().position(|c| c.name == ctx.name) {
            Some(i) => self.contexts[i] = ctx,
            None => self.contexts.push(ctx),
        }
    }

    /// Drop a context; the current context is unset if it was this one.
    pub fn remove_context(&mut self, name: &str) -> Option<Context> {
        let i = self.contexts.iter().position(|c| c.name == name)?;
        if self.current_context == name {
            self.current_context.clear();
        }
        Some(self.contexts.remove(i))
    }
}

/// The H10CM config directory (~/.h10cm).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".h10cm")
}
