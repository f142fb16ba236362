// ── Backend seam ──
//
// Controllers talk to the REST backend only through `Backend`, so the
// LFPE engine can be driven by `ErpClient` in production and by an
// in-memory fake in tests.

use std::future::Future;

use erpdesk_api::{ErpClient, ListQuery, Page, PostalClient, PostalPlace};
use serde_json::Value;

use crate::error::CoreError;
use crate::model::Record;

/// Everything the list, edit and export operations need from the backend.
pub trait Backend: Send + Sync + 'static {
    /// One server page.
    fn list_page(
        &self,
        endpoint: &str,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Record>, CoreError>> + Send;

    /// Every record matching `query`, unpaginated.
    fn list_all(
        &self,
        endpoint: &str,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Vec<Record>, CoreError>> + Send;

    fn get(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> impl Future<Output = Result<Value, CoreError>> + Send;

    fn post(&self, path: &str, body: &Value) -> impl Future<Output = Result<Value, CoreError>> + Send;

    fn patch(&self, path: &str, body: &Value)
    -> impl Future<Output = Result<Value, CoreError>> + Send;
}

impl Backend for ErpClient {
    async fn list_page(&self, endpoint: &str, query: &ListQuery) -> Result<Page<Record>, CoreError> {
        Ok(ErpClient::list_page(self, endpoint, query).await?)
    }

    async fn list_all(&self, endpoint: &str, query: &ListQuery) -> Result<Vec<Record>, CoreError> {
        Ok(ErpClient::list_all(self, endpoint, query).await?)
    }

    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value, CoreError> {
        Ok(self.get_json(path, params).await?)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, CoreError> {
        Ok(self.action(path, body).await?)
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, CoreError> {
        Ok(ErpClient::patch_path(self, path, body).await?)
    }
}

/// Pincode lookup used by postal auto-fill.
pub trait PostalLookup: Send + Sync + 'static {
    fn lookup(
        &self,
        pincode: &str,
    ) -> impl Future<Output = Result<Option<PostalPlace>, CoreError>> + Send;
}

impl PostalLookup for PostalClient {
    async fn lookup(&self, pincode: &str) -> Result<Option<PostalPlace>, CoreError> {
        Ok(PostalClient::lookup(self, pincode).await?)
    }
}
