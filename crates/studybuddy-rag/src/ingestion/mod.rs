//! Document ingestion: loading, splitting and indexing

mod loader;
mod pipeline;
mod splitter;

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;
pub use loader::{DocumentLoader, LoadedText, LoaderRegistry, PageText, TextLoader};
pub use pipeline::{hash_content, IngestPipeline, ScanReport};
pub use splitter::{RecursiveTextSplitter, DEFAULT_SEPARATORS};
