//! StageCtl IO - Show Data Loading
//!
//! Reads YAML and JSON documents from a data directory into a
//! [`stagectl_core::DataStore`].

pub mod document;
pub mod error;
pub mod loader;

pub use document::DataDocument;
pub use error::{LoadError, Result};
pub use loader::{parse_document, DirectoryLoader, DocumentFormat, MAX_DATA_FILE_SIZE};
