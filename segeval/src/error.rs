use thiserror::Error;

/// The error type for `segeval` operations.
///
/// Every failure in the evaluation core surfaces through this enum and is
/// propagated unmodified to the caller; nothing in the library retries or
/// recovers locally.
#[derive(Error, Debug)]
pub enum SegEvalError {
    /// Error for when an invalid configuration is provided.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error for when ground-truth and prediction tensors disagree in shape.
    #[error("Invalid input tensor shape: expected {expected}, got {actual}")]
    InvalidTensorShape {
        /// The expected tensor shape.
        expected: String,
        /// The actual tensor shape.
        actual: String,
    },

    /// Error for when a tensor operation fails.
    #[error("Tensor operation failed: {operation}")]
    TensorOperationFailed {
        /// A description of the failed tensor operation.
        operation: String,
    },

    /// The test set yielded no batches, so no mean loss or FPS can be computed.
    #[error("Evaluation dataset is empty")]
    EmptyDataset,

    /// Error for when dataset operations fail.
    #[error("Dataset error: {message}")]
    DatasetError {
        /// The error message.
        message: String,
    },

    /// Error for when loading model weights fails.
    #[error("Failed to load weights: {reason}")]
    WeightLoadingFailed {
        /// The reason for the weight loading failure.
        reason: String,
    },

    /// A reported class has no entry in the class-name lookup.
    #[error("No class name for class {class_id}")]
    MissingClassName {
        /// The class id without a name.
        class_id: usize,
    },

    /// Filesystem failure while writing results.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// CSV serialization failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// A specialized `Result` type for `segeval` operations.
pub type SegEvalResult<T> = Result<T, SegEvalError>;
