//! Errors raised while binding the vendor driver library.
//!
//! Individual driver calls never produce these; their outcome is a
//! [`DriverResult`](crate::driver::DriverResult) consumed by the session.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    /// The shared library could not be opened.
    #[error("Failed to load driver library {}: {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The library was opened but lacks one of the expected exports.
    #[error("Driver library is missing export `{name}`: {source}")]
    MissingSymbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },
}
