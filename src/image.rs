// Firmware image buffer.
//
// An `Image` is a fixed-length byte buffer holding one firmware image. The
// encoder owns two of them per run: the reference image ("ROM", what the
// device currently holds) and the target image. Both are normalized to the
// same length before diffing so the match search never indexes past either
// buffer.
//
// The only sanctioned mutation is `commit_page`, which the encoder uses to
// model the device's flash after a page has been accepted.

use crate::error::DiffError;

/// Fill byte used when a shorter image is padded to a longer one; matches
/// the erased-flash value of the target MCU.
pub const FILL_ERASED: u8 = 0xFF;

/// Immutable-length firmware image buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
}

impl Image {
    /// Wrap raw image bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Return a new image of exactly `length` bytes: the overlap is copied,
    /// the remainder (if any) is filled with `fill`.
    pub fn normalized_to(&self, length: usize, fill: u8) -> Self {
        let mut data = vec![fill; length];
        let n = self.data.len().min(length);
        data[..n].copy_from_slice(&self.data[..n]);
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Single-byte access with bounds checking.
    pub fn byte_at(&self, offset: usize) -> Result<u8, DiffError> {
        self.data
            .get(offset)
            .copied()
            .ok_or(DiffError::OutOfRange {
                offset,
                len: 1,
                buf_len: self.data.len(),
            })
    }

    /// Borrow `length` bytes starting at `offset`.
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

    /// CRC32 over the whole image.
    pub fn crc32(&self) -> u32 {
        crc32fast::hash(&self.data)
    }

    /// Overwrite one page's region with new content. This is the "commit new
    /// page" step: after the device accepts a page, the in-core reference
    /// image is updated to reflect what the flash now holds.
    pub(crate) fn commit_page(&mut self, offset: usize, bytes: &[u8]) -> Result<(), DiffError> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&e| e <= self.data.len());
        match end {
            Some(end) => {
                self.data[offset..end].copy_from_slice(bytes);
                Ok(())
            }
            None => Err(DiffError::OutOfRange {
                offset,
                len: bytes.len(),
                buf_len: self.data.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pads_with_fill_byte() {
        let img = Image::from_bytes(vec![1, 2, 3]);
        let n = img.normalized_to(6, FILL_ERASED);
        assert_eq!(n.as_bytes(), &[1, 2, 3, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn normalize_truncates_longer_images() {
        let img = Image::from_bytes(vec![1, 2, 3, 4, 5]);
        let n = img.normalized_to(2, 0x00);
        assert_eq!(n.as_bytes(), &[1, 2]);
    }

    #[test]
    fn slice_rejects_out_of_range() {
        let img = Image::from_bytes(vec![0u8; 8]);
        assert!(img.slice(0, 8).is_ok());
        assert!(matches!(
            img.slice(4, 5),
            Err(DiffError::OutOfRange { offset: 4, len: 5, buf_len: 8 })
        ));
        // offset+len overflow must not panic
        assert!(img.slice(usize::MAX, 2).is_err());
    }

    #[test]
    fn commit_page_replaces_region() {
        let mut img = Image::from_bytes(vec![0u8; 8]);
        img.commit_page(4, &[9, 9, 9, 9]).unwrap();
        assert_eq!(img.as_bytes(), &[0, 0, 0, 0, 9, 9, 9, 9]);
        assert!(img.commit_page(6, &[1, 2, 3]).is_err());
    }
}
