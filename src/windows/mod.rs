//! Windows API layer
//!
//! All unsafe FFI calls are contained in [`bindings`]; [`NativeApi`] exposes
//! them through [`SystemApi`](crate::system::SystemApi). Only [`utils`] is
//! available on other targets.

#[cfg(windows)]
pub mod bindings;
#[cfg(windows)]
pub mod native;
pub mod utils;

#[cfg(windows)]
pub use native::NativeApi;
pub use utils::ErrorCode;
