//! Transfer-mode selection and part sizing

/// Largest object transferred in a single request (5 GiB)
pub const SINGLE_REQUEST_LIMIT: u64 = 5 * 1024 * 1024 * 1024;

/// S3 minimum part size (5 MiB)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Preferred part size for chunked transfers (8 MiB)
pub const DEFAULT_PART_SIZE: u64 = 8 * 1024 * 1024;

/// S3 maximum number of parts per multipart upload
pub const MAX_PARTS: u64 = 10_000;

/// How a transfer is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// One PUT or GET request
    Single,
    /// Sequential multipart upload / ranged download
    Multipart,
    /// Multipart with checkpoint state so an interrupted transfer continues
    Resumable,
}

impl TransferMode {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            TransferMode::Single => "single",
            TransferMode::Multipart => "multipart",
            TransferMode::Resumable => "resumable",
        }
    }

    /// Whether this mode splits the object into parts
    pub fn is_chunked(&self) -> bool {
        !matches!(self, TransferMode::Single)
    }
}

/// Pick the upload mode for a file of `size` bytes
pub fn select_upload_mode(size: u64, resumable: bool) -> TransferMode {
    if size <= SINGLE_REQUEST_LIMIT {
        TransferMode::Single
    } else if resumable {
        TransferMode::Resumable
    } else {
        TransferMode::Multipart
    }
}

/// Pick the download mode for an object of `size` bytes.
///
/// Large downloads always checkpoint so an interruption does not restart
/// the whole transfer.
pub fn select_download_mode(size: u64) -> TransferMode {
    if size <= SINGLE_REQUEST_LIMIT {
        TransferMode::Single
    } else {
        TransferMode::Resumable
    }
}

/// Determine the part size for a chunked transfer of `total` bytes.
///
/// Starts from the preferred size and doubles until the part count fits the
/// 10,000-part limit. Never below the S3 5 MiB minimum.
pub fn determine_part_size(total: u64) -> u64 {
    let mut part_size = DEFAULT_PART_SIZE.max(MIN_PART_SIZE);
    while total.div_ceil(part_size) > MAX_PARTS {
        part_size = part_size.saturating_mul(2);
    }
    part_size
}

/// The (offset, length) byte ranges of a chunked transfer, in part order.
///
/// Every range but the last spans exactly `part_size` bytes.
pub fn part_ranges(total: u64, part_size: u64) -> impl Iterator<Item = (u64, u64)> {
    (0..total.div_ceil(part_size)).map(move |i| {
        let offset = i * part_size;
        (offset, part_size.min(total - offset))
    })
}
