//! `ident`: command-line client for the Ident identity service.
//!
//! # Usage
//!
//! ```text
//! ident identify --email doc@hillvalley.edu --phone 123456
//! ident --url http://localhost:3000 identity 7
//! ident --config ~/.config/ident/config.toml health
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::ApiClient;
use ident_core::{contact::ContactId, identity::IdentifyRequest};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:3000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ident", about = "Client for the Ident identity service")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the ident server (default: http://localhost:3000).
  #[arg(long, env = "IDENT_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Reconcile an email and/or phone number and print the identity.
  Identify {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
  },
  /// Print a single contact record.
  Contact { id: i64 },
  /// Print the consolidated identity of the group containing a contact.
  Identity { id: i64 },
  /// Check that the server is up.
  Health,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

/// CLI flag, then config file, then the built-in default.
fn resolve_base_url(flag: Option<String>, file: &ConfigFile) -> String {
  flag
    .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let base_url = resolve_base_url(args.url, &file_cfg);
  tracing::debug!(%base_url, "using server");
  let client = ApiClient::new(base_url)?;

  match args.command {
    Command::Identify { email, phone } => {
      let request = IdentifyRequest::new(email, phone);
      if request.is_empty() {
        anyhow::bail!("pass at least one of --email or --phone");
      }
      print_json(&client.identify(&request).await?)
    }
    Command::Contact { id } => print_json(&client.get_contact(ContactId(id)).await?),
    Command::Identity { id } => print_json(&client.identity(ContactId(id)).await?),
    Command::Health => print_json(&client.health().await?),
  }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!(
    "{}",
    serde_json::to_string_pretty(value).context("serialising response")?
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flag_overrides_file_overrides_default() {
    let file = ConfigFile { url: "http://from-file".into() };
    assert_eq!(
      resolve_base_url(Some("http://from-flag".into()), &file),
      "http://from-flag"
    );
    assert_eq!(resolve_base_url(None, &file), "http://from-file");
    assert_eq!(resolve_base_url(None, &ConfigFile::default()), DEFAULT_URL);
  }

  #[test]
  fn config_file_parses() {
    let cfg: ConfigFile = toml::from_str("url = \"http://x:1\"").unwrap();
    assert_eq!(cfg.url, "http://x:1");
  }

  #[test]
  fn args_parse_identify() {
    let args = Args::try_parse_from(["ident", "identify", "--email", "a@x.com"]).unwrap();
    assert!(matches!(
      args.command,
      Command::Identify { email: Some(ref e), phone: None } if e == "a@x.com"
    ));
  }
}
