//! AWS S3 multipart upload limits
//!
//! # References
//! - [S3 Quotas](https://docs.aws.amazon.com/AmazonS3/latest/userguide/qfacts.html)
//! - [Multipart Upload Overview](https://docs.aws.amazon.com/AmazonS3/latest/userguide/mpuoverview.html)

/// Maximum number of parts in a multipart upload (10,000)
///
/// Parts are numbered 1 to 10,000, part numbers are kept as `u16`.
pub const MAX_PARTS_PER_UPLOAD: u64 = 10_000;

/// Minimum size of a multipart upload part (5 MiB)
///
/// The last part can be smaller than this minimum. Also the default part size.
pub const MIN_PART_SIZE_BYTES: u64 = 5_242_880;

/// Maximum size of a single multipart upload part (5 GiB)
pub const MAX_PART_SIZE_BYTES: u64 = 5_368_709_120;
