//! Named state stores
//!
//! Small observable state containers and the registry that owns them. One
//! registry belongs to each engine instance and is reached through its
//! consumer handle; it is emptied when the engine is torn down.

pub mod registry;
pub mod store;

pub use registry::{StoreError, StoreRegistry};
pub use store::Store;
