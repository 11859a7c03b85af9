//! # rabbitmon-core - Core Types
//!
//! Foundation crate for rabbitmon. Provides the error type shared by every
//! layer, the dotted [`Version`] used to select request dialects, and
//! logging setup.
//!
//! This crate has **zero internal dependencies**.
//!
//! ## Public API
//!
//! - [`Error`] - Error enum; every adapter failure names its operation
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//! - [`Version`] - Dotted-integer version with fill-value comparison
//! - [`logging`] - `tracing` subscriber setup
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use rabbitmon_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod version;

/// Prelude for common imports used throughout all rabbitmon crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use version::Version;
