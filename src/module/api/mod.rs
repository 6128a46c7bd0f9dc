//! Consumer access
//!
//! How code outside the engine reaches the resolved capability map.

pub mod handle;

pub use handle::{FxHandle, Status};
