pub mod backend;
pub mod structured;
pub mod text;
pub mod types;

pub use backend::{extract_document, BackendError, ExtractionBackend, MockBackend};
pub use structured::{IngestError, StructuredIngestor};
pub use text::{clean_item_name, title_case, TextExtractor};
pub use types::{parse, ExtractionOutput};
