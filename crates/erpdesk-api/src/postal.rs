// Client for the public India Post pincode lookup service.
//
// GET {base}/pincode/{pin} -> [{Status, PostOffice: [{State, District, ...}] | null}]

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{Error, TransportConfig};

pub const DEFAULT_POSTAL_URL: &str = "https://api.postalpincode.in/";

/// Locality resolved from a pincode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostalPlace {
    pub state: String,
    pub district: String,
}

#[derive(Deserialize)]
struct LookupEntry {
    #[serde(rename = "PostOffice", default)]
    post_office: Option<Vec<PostOffice>>,
}

#[derive(Deserialize)]
struct PostOffice {
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "District", default)]
    district: String,
}

#[derive(Debug, Clone)]
pub struct PostalClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PostalClient {
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Self::with_client(base_url, transport.build_client()?)
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    /// Look up the first post office for `pincode`.
    ///
    /// Returns `Ok(None)` when the service knows no post office for it.
    pub async fn lookup(&self, pincode: &str) -> Result<Option<PostalPlace>, Error> {
        let url = self.base_url.join(&format!("pincode/{}", pincode.trim()))?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }

        let body = resp.text().await?;
        let entries: Vec<LookupEntry> =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        Ok(entries
            .into_iter()
            .next()
            .and_then(|e| e.post_office)
            .and_then(|offices| offices.into_iter().next())
            .map(|po| PostalPlace {
                state: po.state,
                district: po.district,
            }))
    }
}
