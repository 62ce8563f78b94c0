//! Utilities shared by the evaluation binaries.

pub mod backend;
pub mod logging;

pub use backend::{
    create_device, get_backend_name, SelectedBackend, SelectedDevice, SelectedHalfBackend,
};
pub use logging::setup_logging;
