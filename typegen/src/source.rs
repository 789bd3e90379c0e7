//! Byte-offset spans into source files.

use std::fmt;
use std::ops::Range;

use crate::files::FileId;

/// Byte offsets into source files.
pub type BytePos = u32;

/// A half-open byte range in a specific source file.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ByteRange {
    file_id: FileId,
    start: BytePos,
    end: BytePos,
}

impl ByteRange {
    pub const fn new(file_id: FileId, start: BytePos, end: BytePos) -> ByteRange {
        ByteRange {
            file_id,
            start,
            end,
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub const fn start(&self) -> BytePos {
        self.start
    }

    pub const fn end(&self) -> BytePos {
        self.end
    }

    /// Create a range that spans from the start of `self` to the end of
    /// `other`. Both ranges must belong to the same file.
    pub fn merge(&self, other: &ByteRange) -> ByteRange {
        debug_assert_eq!(self.file_id, other.file_id);
        ByteRange::new(
            self.file_id,
            self.start.min(other.start),
            self.end.max(other.end),
        )
    }
}

impl fmt::Debug for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ByteRange({}, {}..{})",
            self.file_id, self.start, self.end
        )
    }
}

impl From<ByteRange> for Range<usize> {
    fn from(range: ByteRange) -> Range<usize> {
        (range.start as usize)..(range.end as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// `ByteRange` is carried on every AST node. Ensure it doesn't grow
    /// accidentally.
    fn byte_range_size() {
        assert_eq!(std::mem::size_of::<ByteRange>(), 12);
    }

    #[test]
    fn merge_spans_both_ranges() {
        let file_id = FileId::try_from(1).unwrap();
        let a = ByteRange::new(file_id, 4, 8);
        let b = ByteRange::new(file_id, 10, 12);
        let merged = a.merge(&b);
        assert_eq!(merged.start(), 4);
        assert_eq!(merged.end(), 12);
    }
}
