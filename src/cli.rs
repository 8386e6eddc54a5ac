use crate::config::Overrides;
use crate::diff::{DiffBody, EQUAL_MESSAGE, LineKind, render};
use crate::domain::SecretRef;
use crate::infra::SecretStore;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::style::Stylize;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "vault-diff",
    about = "Shows secret changes in a Vault KV store in diff format like git",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Vault address
    #[arg(long, global = true, env = "VD_URL")]
    pub url: Option<String>,

    /// Vault token
    #[arg(long, global = true, env = "VD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Mount path of the KV v2 engine
    #[arg(long = "path", global = true, env = "VD_PATH")]
    pub mount_path: Option<String>,

    /// Enable debug level logging
    #[arg(
        long,
        global = true,
        env = "VD_DEBUG",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub debug: bool,

    /// Config file (defaults to <config dir>/vault-diff/config.toml)
    #[arg(long, global = true, env = "VD_CONFIG")]
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            token: self.token.clone(),
            mount_path: self.mount_path.clone(),
            debug: self.debug,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the diff between two secret versions
    Diff {
        /// Left side to compare, in 'name:version' format
        #[arg(short, long)]
        left: String,

        /// Right side to compare, in 'name:version' format
        #[arg(short, long)]
        right: String,
    },

    /// Browse the store and pick secrets and versions to compare
    Ui,
}

/// Both references are validated before `connect` is called.
pub fn run_diff<W: Write>(
    left: &str,
    right: &str,
    connect: impl FnOnce() -> Result<Box<dyn SecretStore>>,
    color: bool,
    out: &mut W,
) -> Result<()> {
    let left_ref: SecretRef = left.parse()?;
    let right_ref: SecretRef = right.parse()?;

    let store = connect()?;
    debug!(%left_ref, %right_ref, "fetching secrets");
    let left_text = store
        .content(&left_ref.name, left_ref.version)
        .with_context(|| format!("failed to read {left_ref}"))?;
    let right_text = store
        .content(&right_ref.name, right_ref.version)
        .with_context(|| format!("failed to read {right_ref}"))?;

    match render(left, right, &left_text, &right_text) {
        DiffBody::Equal => writeln!(out, "{EQUAL_MESSAGE}")?,
        DiffBody::Lines(lines) => {
            for line in lines {
                if color {
                    writeln!(out, "{}", paint(line.kind, &line.text))?;
                } else {
                    writeln!(out, "{}", line.text)?;
                }
            }
        }
    }

    Ok(())
}

fn paint(kind: LineKind, text: &str) -> String {
    match kind {
        LineKind::Addition => text.green().to_string(),
        LineKind::Deletion => text.red().to_string(),
        LineKind::HunkHeader => text.cyan().to_string(),
        LineKind::Context => text.to_string(),
    }
}
