//! Storage backend for bucketeer

pub mod s3;

pub use s3::S3Store;

/// Completed multipart upload part info
#[derive(Debug, Clone)]
pub struct CompletedPart {
    /// Part number (1-indexed)
    pub part_number: i32,
    /// ETag of the uploaded part
    pub etag: String,
}

/// Metadata for a remote object
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// ETag with surrounding quotes stripped
    pub etag: Option<String>,
}
