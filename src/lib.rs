pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod tessellation;
pub mod topology;

pub use error::{ExportError, ExportResult, KernelError, Result};
