// Async HTTP client for the erpdesk REST backend.
//
// Base path: whatever the profile's base_url points at (usually `https://host/`)
// Auth: `Authorization: Bearer <token>` header

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::types::{ErrorEnvelope, FieldErrors, ListQuery, ListResponse, Page};
use crate::{Error, TransportConfig};

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the ERP backend.
///
/// Every list, retrieve, create and update call used by the list
/// controllers goes through here. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ErpClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl ErpClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, an optional bearer token and a transport config.
    pub fn new(
        base_url: &str,
        token: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::InvalidToken {
                    message: e.to_string(),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout_secs: 30,
        })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"api/hr/applicant/"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.send(self.http.get(url).query(params)).await?;
        Self::handle_response(resp).await
    }

    /// GET an absolute URL, as handed out in a page's `next`/`previous`.
    async fn get_absolute<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let url = Url::parse(url)?;
        debug!("GET {url}");

        let resp = self.send(self.http.get(url)).await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url).json(body)).await?;
        Self::handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PATCH {url}");

        let resp = self.send(self.http.patch(url).json(body)).await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.send(self.http.put(url).json(body)).await?;
        Self::handle_response(resp).await
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            // 204 and empty 200s decode as JSON null.
            let body = if body.trim().is_empty() {
                "null".to_owned()
            } else {
                body
            };
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            let path = resp.url().path().to_owned();
            Err(Self::parse_error(status, path, resp).await)
        }
    }

    async fn parse_error(
        status: reqwest::StatusCode,
        path: String,
        resp: reqwest::Response,
    ) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let envelope = serde_json::from_str::<ErrorEnvelope>(&raw).ok();
        debug!(status = status.as_u16(), %path, "backend returned error");

        match status {
            reqwest::StatusCode::BAD_REQUEST => {
                let errors = envelope
                    .and_then(|env| {
                        env.errors.or_else(|| {
                            env.detail
                                .map(|d| FieldErrors::single(FieldErrors::NON_FIELD, d))
                        })
                    })
                    .unwrap_or_else(|| FieldErrors::single(FieldErrors::NON_FIELD, raw));
                Error::Validation { errors }
            }
            reqwest::StatusCode::UNAUTHORIZED => {
                let code = envelope
                    .and_then(|env| {
                        env.errors
                            .as_ref()
                            .and_then(|e| e.first("code").map(str::to_owned))
                            .or(env.detail)
                    })
                    .unwrap_or_else(|| status.to_string());
                Error::Unauthorized { code }
            }
            reqwest::StatusCode::NOT_FOUND => Error::NotFound { path },
            _ => Error::Http {
                status: status.as_u16(),
                message: envelope
                    .and_then(|env| env.detail)
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| {
                        if raw.is_empty() {
                            status.to_string()
                        } else {
                            raw
                        }
                    }),
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Lists ────────────────────────────────────────────────────────

    /// Fetch one server page of a list endpoint.
    pub async fn list_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &ListQuery,
    ) -> Result<Page<T>, Error> {
        let resp: ListResponse<T> = self.get_with_params(endpoint, &query.to_params()).await?;
        Ok(resp.into_page())
    }

    /// Fetch every record matching `query`, ignoring its page number.
    ///
    /// Accepts a bare array or a paginated body; paginated bodies are
    /// followed through `next` until exhausted.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &ListQuery,
    ) -> Result<Vec<T>, Error> {
        let query = ListQuery {
            page: None,
            ..query.clone()
        };
        let first: ListResponse<T> = self.get_with_params(endpoint, &query.to_params()).await?;
        let mut page = match first {
            ListResponse::Bare(items) => return Ok(items),
            ListResponse::Paged(page) => page,
        };

        let mut all = Vec::with_capacity(usize::try_from(page.count).unwrap_or(0));
        loop {
            all.append(&mut page.results);
            let Some(next) = page.next.take() else {
                break;
            };
            page = self.get_absolute(&next).await?;
        }
        Ok(all)
    }

    /// GET an arbitrary path, used for option lists and dashboards.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        self.get_with_params(path, params).await
    }

    // ── Records ──────────────────────────────────────────────────────

    pub async fn create<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.post(endpoint, body).await
    }

    /// Partial update (`PATCH {endpoint}{id}/`).
    pub async fn update<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        id: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.patch(&format!("{endpoint}{id}/"), body).await
    }

    /// Full replacement (`PUT {endpoint}{id}/`).
    pub async fn replace<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        id: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.put(&format!("{endpoint}{id}/"), body).await
    }

    /// PATCH an explicit path (sub-resources such as a company's bank tab).
    pub async fn patch_path<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.patch(path, body).await
    }

    /// POST to a non-CRUD action path (bulk assign, invoice creation).
    pub async fn action<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.post(path, body).await
    }
}
