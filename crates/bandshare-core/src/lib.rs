//! Core data model for bandshare.
//!
//! This crate defines the band/musician social model (users, groups,
//! genres, instruments, locations, artists, songs, setlists), field
//! validation, the SQLite schema with its migration log, and the
//! relationship managers used to link entities together.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;
pub mod validation;

pub use error::{Error, Result};
pub use validation::{Validate, ValidationErrors};
