pub mod builder;
pub mod record;

pub use builder::{organization_id_from_key, MetadataBuilder};
pub use record::{DocumentRecord, FileMetadata, SourceLocation};
