//! Backend selection for the evaluation binaries.
//!
//! The backend is picked at compile time from the enabled feature. Each
//! backend also names a half-precision variant sharing the same device type,
//! so mixed-precision runs can be chosen at runtime from the configuration.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "cuda")] {
        use burn::backend::cuda::{Cuda, CudaDevice};
        use burn::tensor::f16;

        /// Selected backend type
        pub type SelectedBackend = Cuda;
        /// Half-precision variant of the selected backend
        pub type SelectedHalfBackend = Cuda<f16, i32>;
        /// Selected device type
        pub type SelectedDevice = CudaDevice;

        /// Creates the appropriate device for the selected backend
        pub fn create_device() -> SelectedDevice {
            CudaDevice::default()
        }

        /// Gets the backend name for logging purposes
        pub const fn get_backend_name() -> &'static str {
            "CUDA (NVIDIA GPU)"
        }
    } else if #[cfg(feature = "wgpu")] {
        use burn::backend::wgpu::{Wgpu, WgpuDevice};
        use burn::tensor::f16;

        /// Selected backend type
        pub type SelectedBackend = Wgpu;
        /// Half-precision variant of the selected backend
        pub type SelectedHalfBackend = Wgpu<f16, i32>;
        /// Selected device type
        pub type SelectedDevice = WgpuDevice;

        /// Creates the appropriate device for the selected backend
        pub fn create_device() -> SelectedDevice {
            WgpuDevice::default()
        }

        /// Gets the backend name for logging purposes
        pub const fn get_backend_name() -> &'static str {
            "WGPU (GPU)"
        }
    } else {
        // Default to ndarray backend
        use burn::backend::ndarray::{NdArray, NdArrayDevice};

        /// Selected backend type
        pub type SelectedBackend = NdArray;
        /// NdArray has no half-precision float element; runs stay in f32.
        pub type SelectedHalfBackend = NdArray;
        /// Selected device type
        pub type SelectedDevice = NdArrayDevice;

        /// Creates the appropriate device for the selected backend
        pub fn create_device() -> SelectedDevice {
            NdArrayDevice::default()
        }

        /// Gets the backend name for logging purposes
        pub const fn get_backend_name() -> &'static str {
            "NdArray (CPU)"
        }
    }
}
