use thiserror::Error;

/// Top-level error type for the planar geometry kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to kernel operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("geometry is not coplanar")]
    NotCoplanar,

    #[error("region is not planar (deviation {deviation})")]
    NotPlanar { deviation: f64 },

    #[error("region is self-intersecting near ({x}, {y}, {z})")]
    SelfIntersecting { x: f64, y: f64, z: f64 },

    #[error("no offset normal could be derived from an open curve")]
    NormalUndetermined,
}

/// Non-fatal conditions reported next to a best-effort result.
///
/// Every warning is also logged through `tracing` at the point it is raised.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// The offset engine hit its iteration cap; the result is the last state reached.
    IterationLimit { iterations: usize, reached: f64 },

    /// Pairwise region union stopped making progress before every region was merged.
    UnionStagnated { remaining: usize },

    /// A connected component of segments was skipped because it is not planar.
    NonCoplanarCluster { cluster: usize, deviation: f64 },

    /// Points were projected onto a fitted plane because they were only
    /// approximately coplanar.
    ProjectedToPlane { deviation: f64 },
}

/// Convenience type alias for results using [`KernelError`].
pub type Result<T> = std::result::Result<T, KernelError>;
