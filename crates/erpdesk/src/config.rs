//! CLI configuration: thin wrapper around `erpdesk_config` that layers
//! `GlobalOpts` flag overrides (--url, --token, --insecure, --timeout)
//! on top of the selected profile.

use std::time::Duration;

use secrecy::SecretString;

use erpdesk_core::config::TlsMode;
use erpdesk_core::{BackendConfig, CoreError, DEFAULT_POSTAL_URL, PostalClient, TransportConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use erpdesk_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_token,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build the backend configuration for this invocation.
///
/// Flags override the profile. Without a profile, `--url` and a token
/// (flag or `ERPDESK_TOKEN`) are enough.
pub fn resolve_backend(global: &GlobalOpts) -> Result<BackendConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let (profile, token) = match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            let token = match global.token {
                Some(ref t) => SecretString::from(t.clone()),
                None => erpdesk_config::resolve_token(profile, &profile_name)?,
            };
            (profile.clone(), token)
        }
        None => {
            let url = global.url.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let token = global
                .token
                .clone()
                .map(SecretString::from)
                .ok_or(CliError::NoCredentials {
                    profile: profile_name,
                })?;
            let profile = Profile {
                base_url: url,
                ..Profile::default()
            };
            (profile, token)
        }
    };

    let profile = Profile {
        base_url: global.url.clone().unwrap_or(profile.base_url),
        ..profile
    };
    let mut backend = erpdesk_config::profile_to_backend_config_with(&profile, Some(token))?;
    if global.insecure {
        backend.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        backend.timeout = Duration::from_secs(secs);
    }
    Ok(backend)
}

/// Client for the pincode service; needs no token.
pub fn resolve_postal(global: &GlobalOpts) -> Result<PostalClient, CliError> {
    let cfg = load_config_or_default();
    let profile = cfg.profiles.get(&active_profile_name(global, &cfg));
    let base = profile
        .and_then(|p| p.postal_url.as_deref())
        .unwrap_or(DEFAULT_POSTAL_URL);
    let transport = TransportConfig {
        tls: if global.insecure || profile.and_then(|p| p.insecure).unwrap_or(false) {
            TlsMode::DangerAcceptInvalid
        } else {
            TlsMode::System
        },
        timeout: Duration::from_secs(
            global
                .timeout
                .or_else(|| profile.and_then(|p| p.timeout))
                .unwrap_or(cfg.defaults.timeout),
        ),
    };
    Ok(PostalClient::new(base, &transport).map_err(CoreError::from)?)
}
