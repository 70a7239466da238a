//! Storage module
//!
//! Object storage access for the lake: clearing table directories, listing
//! written files and dropping `_SUCCESS` markers. The query engine reads and
//! writes the data itself through [`StorageLocation::engine_url`].
//!
//! # Overview
//!
//! This module provides:
//! - `StorageLocation` - A bucket or directory plus key prefix (S3, R2, GCS, Azure, local)

mod location;

pub use location::{Access, StorageLocation};
