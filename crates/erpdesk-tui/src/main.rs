//! `erpdesk-tui`: terminal front end for the ERP desk lists.
//!
//! One tab per catalog resource (applicants, product masters, MRF
//! products, vendors, companies). Each tab is a live list controller:
//! search, filters and paging refetch in the background, records open
//! in an edit overlay, and the current view exports to CSV.
//!
//! Logs go to a file (default under the data directory) so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use secrecy::SecretString;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use erpdesk_config::Profile;
use erpdesk_core::config::TlsMode;
use erpdesk_core::{BackendConfig, Session};

use crate::app::App;
use crate::screen::ScreenId;
use crate::screens::create_screens;

/// Browse, filter, edit and export ERP desk lists.
#[derive(Parser, Debug)]
#[command(name = "erpdesk-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "ERPDESK_PROFILE")]
    profile: Option<String>,

    /// Backend URL, overriding the profile
    #[arg(short = 'u', long, env = "ERPDESK_URL")]
    url: Option<String>,

    /// Bearer token, overriding the profile
    #[arg(short = 't', long, env = "ERPDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// List to open first (e.g. `vendors`)
    #[arg(short = 'r', long)]
    resource: Option<String>,

    /// Log file path (defaults to erpdesk-tui.log in the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may log to stdout/stderr while the
/// terminal is in raw mode. Hold the guard until exit so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "erpdesk_tui={log_level},erpdesk_core={log_level},erpdesk_api={log_level}"
        ))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| erpdesk_config::data_dir().join("erpdesk-tui.log"));
    let log_dir = log_file
        .parent()
        .map_or_else(std::env::temp_dir, std::path::Path::to_path_buf);
    let log_name = log_file
        .file_name()
        .map_or_else(|| "erpdesk-tui.log".into(), std::ffi::OsStr::to_os_string);

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Profile from the config file with flags layered on top. A bare
/// `--url` works without any config file.
fn resolve_backend(cli: &Cli) -> Result<BackendConfig> {
    let cfg = erpdesk_config::load_config_or_default();
    let name = cfg.active_profile_name(cli.profile.as_deref());

    let profile = match cfg.profiles.get(&name) {
        Some(profile) => Profile {
            base_url: cli.url.clone().unwrap_or_else(|| profile.base_url.clone()),
            ..profile.clone()
        },
        None => {
            let url = cli.url.clone().ok_or_else(|| {
                eyre!(
                    "no profile '{name}' in {} and no --url given",
                    erpdesk_config::config_path().display()
                )
            })?;
            Profile {
                base_url: url,
                ..Profile::default()
            }
        }
    };

    let token = match cli.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => erpdesk_config::resolve_token(&profile, &name)?,
    };
    let mut backend = erpdesk_config::profile_to_backend_config_with(&profile, Some(token))?;
    if cli.insecure {
        backend.tls = TlsMode::DangerAcceptInvalid;
    }
    Ok(backend)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks first, so a panic during setup still restores the terminal.
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let initial = match cli.resource.as_deref() {
        Some(key) => ScreenId::from_key(key).ok_or_else(|| eyre!("unknown resource '{key}'"))?,
        None => ScreenId::default(),
    };

    let config = resolve_backend(&cli)?;
    info!(url = %config.url, "starting erpdesk-tui");

    let client = Arc::new(config.client()?);
    let postal = match config.postal_client() {
        Ok(postal) => Some(Arc::new(postal)),
        Err(e) => {
            warn!(error = %e, "pincode autofill disabled");
            None
        }
    };
    let session = match Session::load(client.as_ref()).await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "could not load the user profile");
            Session::anonymous()
        }
    };

    let user = match session.user().display_name() {
        name if name.is_empty() => "anonymous".to_owned(),
        name => name,
    };
    let identity = format!("{user}@{}", config.url.host_str().unwrap_or("backend"));

    let screens = create_screens(&client, &session, postal.as_ref());
    let mut app = App::new(screens, initial, identity);
    app.run().await
}
