//! Data models for the upload server.
//!
//! There is no metadata store: a `StoredFile` describes one upload only for
//! the lifetime of the request that produced it.

pub mod stored_file;
