use crate::s3::{UploadError, limits::MAX_PARTS_PER_UPLOAD};
use std::cmp::min;

/// Half-open byte range `[start, end)` of a file, `number` starts at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub number: u16,
    pub start: u64,
    pub end: u64,
}

impl Part {
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Part size for a file: `default` unless the file would need more than
/// `MAX_PARTS_PER_UPLOAD` parts, then `ceil(file_size / MAX_PARTS_PER_UPLOAD)`
#[must_use]
pub const fn part_size(file_size: u64, default: u64) -> u64 {
    if file_size > default.saturating_mul(MAX_PARTS_PER_UPLOAD) {
        file_size.div_ceil(MAX_PARTS_PER_UPLOAD)
    } else {
        default
    }
}

/// Splits a file into parts of `part_size` bytes, the last one may be shorter
#[derive(Debug, Clone)]
pub struct Chunker {
    file_size: u64,
    part_size: u64,
    part_count: u64,
    // None before the first part
    cursor: Option<u64>,
}

impl Chunker {
    /// # Errors
    ///
    /// Will return `Err` if `part_size` is 0 or the file needs more than
    /// `MAX_PARTS_PER_UPLOAD` parts
    pub fn new(file_size: u64, part_size: u64) -> Result<Self, UploadError> {
        if part_size == 0 {
            return Err(UploadError::Config("part size must be positive".to_string()));
        }

        let part_count = file_size.div_ceil(part_size);

        if part_count > MAX_PARTS_PER_UPLOAD {
            return Err(UploadError::Config(format!(
                "{part_count} parts of {part_size} bytes exceed the maximum of {MAX_PARTS_PER_UPLOAD}"
            )));
        }

        Ok(Self {
            file_size,
            part_size,
            part_count,
            cursor: None,
        })
    }

    #[must_use]
    pub const fn part_count(&self) -> u64 {
        self.part_count
    }

    #[must_use]
    pub const fn part_size(&self) -> u64 {
        self.part_size
    }

    /// The part at a 0-based cursor position, `None` past the last part
    #[must_use]
    pub fn blob_at(&self, cursor: u64) -> Option<Part> {
        if cursor >= self.part_count {
            return None;
        }

        let start = cursor.saturating_mul(self.part_size);
        let end = min(start.saturating_add(self.part_size), self.file_size);
        let number = u16::try_from(cursor + 1).ok()?;

        log::debug!("part {number}: [{start}, {end})");

        Some(Part { number, start, end })
    }

    /// Move to the next part, returns false when there are no more parts
    pub fn advance(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);

        if next < self.part_count {
            self.cursor = Some(next);
            true
        } else {
            false
        }
    }

    /// The part under the cursor, `None` before the first `advance`
    #[must_use]
    pub fn current(&self) -> Option<Part> {
        self.cursor.and_then(|c| self.blob_at(c))
    }

    /// Back to before the first part
    pub const fn reset(&mut self) {
        self.cursor = None;
    }
}
