//! Represents a file written to the storage directory.

use std::path::PathBuf;

/// A single upload persisted under a generated name.
///
/// Only the bytes on disk outlive the request; the mapping back to
/// `original_name` is never recorded anywhere.
#[derive(Clone, Debug)]
pub struct StoredFile {
    /// Multipart field the file arrived under; prefixes `generated_name`.
    pub field_name: String,

    /// Filename as supplied by the client.
    pub original_name: String,

    /// Content type declared by the client, unchecked.
    pub content_type: Option<String>,

    /// `<field>-<millis>-<random><ext>`, the only identifier of the file.
    pub generated_name: String,

    /// Full path of the payload on disk.
    pub path: PathBuf,

    /// Number of bytes written.
    pub size_bytes: u64,
}
