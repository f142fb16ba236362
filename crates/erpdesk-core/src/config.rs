// ── Runtime backend configuration ──
//
// Describes how to reach the ERP backend and the postal service.
// Built by the CLI/TUI from profiles; core never reads config files.

use std::time::Duration;

use erpdesk_api::{DEFAULT_POSTAL_URL, ErpClient, PostalClient, TransportConfig};
pub use erpdesk_api::TlsMode;
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API root, e.g. `https://erp.example.com/`.
    pub url: Url,
    /// Bearer token. `None` only for unauthenticated endpoints.
    pub token: Option<SecretString>,
    pub tls: TlsMode,
    pub timeout: Duration,
    pub postal_url: Url,
}

impl BackendConfig {
    pub fn new(url: Url, token: Option<SecretString>) -> Result<Self, CoreError> {
        let postal_url = Url::parse(DEFAULT_POSTAL_URL).map_err(|e| CoreError::Config {
            message: format!("postal url: {e}"),
        })?;
        Ok(Self {
            url,
            token,
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            postal_url,
        })
    }

    fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }

    pub fn client(&self) -> Result<ErpClient, CoreError> {
        Ok(ErpClient::new(
            self.url.as_str(),
            self.token.as_ref(),
            &self.transport(),
        )?)
    }

    pub fn postal_client(&self) -> Result<PostalClient, CoreError> {
        Ok(PostalClient::new(self.postal_url.as_str(), &self.transport())?)
    }
}
