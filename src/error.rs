use thiserror::Error;

/// Errors raised by the geometry kernel model.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to the kernel topology arena.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("wire is not closed")]
    WireNotClosed,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to kernel construction operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation parameters: {0}")]
    InvalidParameters(String),

    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for kernel results.
pub type Result<T> = std::result::Result<T, KernelError>;

/// Errors raised while re-encoding a body as a representation item.
///
/// The first five variants are modeled failures: a strategy that hits one of
/// them rolls back and lets the cascade try the next strategy. The remaining
/// variants are unexpected and abort the export of the current element.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("geometry extraction failed: {0}")]
    GeometryExtraction(String),

    #[error("topology error: {0}")]
    Topology(String),

    #[error("unsupported surface: {0}")]
    UnsupportedSurface(String),

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("strategy not applicable: {0}")]
    NotApplicable(&'static str),

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("document error: {0}")]
    Document(String),
}

impl ExportError {
    /// Returns `true` if the cascade may advance to the next strategy.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::GeometryExtraction(_)
                | Self::Topology(_)
                | Self::UnsupportedSurface(_)
                | Self::DegenerateInput(_)
                | Self::NotApplicable(_)
        )
    }

    /// Maps a kernel geometry failure to [`ExportError::DegenerateInput`].
    ///
    /// Used where the kernel evaluates caller geometry (normals, frames) and a
    /// failure means the input is degenerate rather than the arena corrupt.
    #[must_use]
    pub fn degenerate(err: KernelError) -> Self {
        match err {
            KernelError::Geometry(e) => Self::DegenerateInput(e.to_string()),
            KernelError::Tessellation(e) => Self::GeometryExtraction(e.to_string()),
            other => Self::Kernel(other),
        }
    }
}

impl From<TopologyError> for ExportError {
    fn from(err: TopologyError) -> Self {
        Self::Kernel(err.into())
    }
}

/// Result alias for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
