//! Service layer
//!
//! - `SimpleServices`: the explicit application context holding the loaded
//!   configuration and the shared lyrics service with its caches

pub mod simple_container;

pub use simple_container::SimpleServices;
