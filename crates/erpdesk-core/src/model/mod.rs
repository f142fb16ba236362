pub mod record;
pub mod record_id;

pub use record::{Record, display_value};
pub use record_id::RecordId;
