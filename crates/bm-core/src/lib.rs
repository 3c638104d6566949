pub mod envelope;
pub mod id;
pub mod model;

pub use envelope::{ImportError, export_document, import_document};
pub use id::ObjectId;
pub use model::*;
