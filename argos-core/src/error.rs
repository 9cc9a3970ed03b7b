use thiserror::Error;

/// Problems found while normalizing a metric declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("all metrics must have a name")]
    MissingName,
    #[error("metric help must not be empty")]
    MissingHelp,
    #[error("only vectors may have variable tags")]
    UnexpectedVariableTags,
    #[error("vectors must have variable tags")]
    MissingVariableTags,
    #[error("duplicate constant tag name {0:?}")]
    DuplicateTag(String),
    #[error("duplicate variable tag name {0:?}")]
    DuplicateVariableTag(String),
    #[error("variable tag name {0:?} is also a constant tag name")]
    TagOverlap(String),
    #[error("duration unit must be positive")]
    NonPositiveUnit,
    #[error("must specify some buckets")]
    EmptyBuckets,
    #[error("bucket upper bounds must be sorted in increasing order")]
    UnsortedBuckets,
    #[error("push interval must be positive")]
    NonPositiveTick,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a metric with name {name:?} and different tag names is already registered")]
    InconsistentDimensions { name: String },
    #[error(
        "a metric with name {name:?} and the same constant tag names and values is already registered"
    )]
    DuplicateIdentity { name: String },
    #[error("inconsistent tag cardinality (expected {expected} tags, got {actual})")]
    CardinalityMismatch { expected: usize, actual: usize },
    #[error(
        "variable tag #{index} doesn't match vector definition: expected {expected}, got {actual}"
    )]
    TagOrderMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("already pushing")]
    AlreadyPushing,
    #[error("failed to spawn push thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("failed to encode metrics: {0}")]
    Exposition(#[from] prometheus::Error),
}

impl Error {
    /// True for the two registration failures: a name reused with different
    /// tag names, or an exact duplicate of an existing metric.
    pub fn is_identity_conflict(&self) -> bool {
        matches!(
            self,
            Error::InconsistentDimensions { .. } | Error::DuplicateIdentity { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
