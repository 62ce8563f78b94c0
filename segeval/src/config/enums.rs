//! Enumeration types for evaluation configuration.

use burn::prelude::*;
use burn::tensor::{DType, Element};

/// Numeric precision used for inference.
///
/// In Burn the float precision is a property of the backend's float element,
/// so `Half` is honoured by running the model on a half-precision backend.
/// It never changes control flow or the argmax class predictions.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Precision {
    /// Full 32-bit float inference.
    Full,
    /// Reduced-precision (f16/bf16) inference.
    Half,
}

impl Precision {
    /// Map a mixed-precision on/off flag to a precision mode.
    pub const fn from_mixed_precision(enabled: bool) -> Self {
        if enabled {
            Self::Half
        } else {
            Self::Full
        }
    }

    /// Whether the float element of backend `B` provides this precision.
    pub fn is_provided_by<B: Backend>(&self) -> bool {
        let half = matches!(
            <B::FloatElem as Element>::dtype(),
            DType::F16 | DType::BF16
        );
        match self {
            Self::Full => !half,
            Self::Half => half,
        }
    }
}
