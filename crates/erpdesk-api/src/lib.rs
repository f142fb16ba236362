// erpdesk-api: Async Rust client for the erpdesk REST backend and postal lookup

pub mod client;
pub mod error;
pub mod postal;
pub mod transport;
pub mod types;

pub use client::ErpClient;
pub use error::Error;
pub use postal::{DEFAULT_POSTAL_URL, PostalClient, PostalPlace};
pub use transport::{TlsMode, TransportConfig};
pub use types::{FieldErrors, ListQuery, ListResponse, Page};
