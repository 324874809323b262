// Supersede window: the "RAM shadow" of content already overwritten.
//
// As pages are accepted by the device, the bytes they replaced are appended
// here. The window only grows, one page at a time, so its length is always
// `pages * page_size`. It is a second, more recent compression source: a
// COPY tagged RAM reads from it, a COPY tagged ROM reads from the reference
// image. A RAM COPY may never reference content not yet superseded, which
// the bounds check on `slice` enforces.

use crate::error::DiffError;

#[derive(Debug, Clone)]
pub struct SupersedeWindow {
    data: Vec<u8>,
    page_size: usize,
}

impl SupersedeWindow {
    /// Empty window for a run with the given flash page size.
    pub fn new(page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        Self {
            data: Vec::new(),
            page_size,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of pages appended so far.
    pub fn pages(&self) -> usize {
        self.data.len() / self.page_size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Append exactly one page's worth of superseded bytes.
    pub fn append_page(&mut self, bytes: &[u8]) -> Result<(), DiffError> {
        if bytes.len() != self.page_size {
            return Err(DiffError::SizeMismatch {
                expected: self.page_size,
                actual: bytes.len(),
            });
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Borrow `length` bytes starting at `offset`; the range must lie inside
    /// what has already been superseded.
    pub fn slice(&self, offset: usize, length: usize) -> Result<&[u8], DiffError> {
        let end = offset.checked_add(length).filter(|&e| e <= self.data.len());
        match end {
            Some(end) => Ok(&self.data[offset..end]),
            None => Err(DiffError::OutOfRange {
                offset,
                len: length,
                buf_len: self.data.len(),
            }),
        }
    }
}
