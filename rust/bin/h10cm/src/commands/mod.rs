pub mod cart;
pub mod context;
pub mod inventory;
pub mod projects;
pub mod status;
pub mod steps;
pub mod units;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use h10cm_client::{EnvToken, H10Client, StaticToken, TokenSource};
use h10cm_core::{Timestamp, TrackerConfig};
use h10cm_tracking::BatchReport;
use serde::Serialize;

use crate::config::{ClientConfig, Context};

/// Output format selected with `-o`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Table,
    Json,
}

impl FromStr for Output {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Output::Table),
            "json" => Ok(Output::Json),
            other => Err(format!("unknown output format \"{other}\" (expected table or json)")),
        }
    }
}

impl Output {
    pub fn is_json(&self) -> bool {
        *self == Output::Json
    }
}

/// The current context resolved into a ready client.
pub struct Session {
    pub context: Context,
    pub config: TrackerConfig,
    pub client: Arc<H10Client>,
}

impl Session {
    pub fn load(client_config_path: &Path) -> Result<Self> {
        let config = ClientConfig::load(client_config_path)?;
        let ctx = config
            .current()
            .ok_or_else(|| anyhow::anyhow!("No current context. Run `h10cm context create <name> --server <url>`."))?
            .clone();
        if ctx.server.is_empty() {
            anyhow::bail!("No server URL set for context \"{}\".", ctx.name);
        }

        let tracker = ctx.tracker_config();
        // Without a stored token, fall back to $H10CM_TOKEN (or anonymous).
        let tokens: Arc<dyn TokenSource> = if ctx.token.is_empty() {
            Arc::new(EnvToken::default())
        } else {
            Arc::new(StaticToken::new(ctx.token.clone()))
        };
        let client = H10Client::new(&tracker, tokens)?;
        Ok(Self {
            context: ctx,
            config: tracker,
            client: Arc::new(client),
        })
    }

    /// Name recorded on completions and stock transactions.
    pub fn actor(&self) -> &str {
        if self.context.user.is_empty() {
            "h10cm"
        } else {
            &self.context.user
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn fmt_date(ts: Option<Timestamp>) -> String {
    ts.map(|t| t.date_string()).unwrap_or_else(|| "-".to_string())
}

pub fn or_dash(s: Option<&str>) -> &str {
    match s {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

/// Print a batch outcome and fail the command if any unit failed.
pub fn report_batch(action: &str, report: &BatchReport, output: Output) -> Result<()> {
    if output.is_json() {
        print_json(report)?;
    } else {
        println!("{}: {} succeeded, {} failed.", action, report.succeeded.len(), report.failed.len());
        for f in &report.failed {
            println!("  {:12} {}", f.id, f.reason);
        }
    }
    if !report.is_complete_success() {
        anyhow::bail!("{} of {} units failed", report.failed.len(), report.total());
    }
    Ok(())
}
