pub mod matcher;
pub mod taxonomy;

pub use matcher::{CategorizationResult, Categorizer};
pub use taxonomy::{Category, DocumentType, Hazard, Role, Taxonomy, UnknownCategory};
