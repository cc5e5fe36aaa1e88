//! Conversion between studio projects and Lottie documents.

pub mod error;
pub mod export;
pub mod import;
pub mod validate;

pub use error::ImportError;
pub use export::{export_project, ExportOptions};
pub use import::{import_document, import_str, import_value, ImportedProject};
pub use validate::{validate, ValidationReport, ValidationStatus};
