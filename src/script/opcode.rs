// Edit-script opcode byte layout.
//
// First byte of every operation:
//
//   bit 7   kind       0 = RAW, 1 = COPY
//   bit 6   form       0 = short (length in low 6 bits),
//                      1 = long (+1 length byte, length = low6 << 8 | next)
//   bits 5:0           length (short form) or high 6 bits of length (long)
//
// A COPY is followed by exactly 3 address bytes [low, mid, high]; the top
// bit of the high byte selects the source: 1 = supersede window (RAM),
// 0 = reference image (ROM).

use crate::error::DiffError;

/// Kind bit: set for COPY, clear for RAW.
pub const CMD_COPY: u8 = 0b1000_0000;
/// Form bit: set when a second length byte follows.
pub const FLAG_LONG: u8 = 0b0100_0000;
/// Top bit of the high address byte: set when the source is the window.
pub const ADDR_FROM_RAM: u8 = 0b1000_0000;
/// Low 6 bits of the command byte.
pub const LEN6_MASK: u8 = 0b0011_1111;

/// Shortest COPY worth emitting; below this the opcode overhead exceeds
/// the literal bytes it replaces.
pub const MIN_MATCH: usize = 6;
/// Longest single operation the encoder emits (11 bits; the long header
/// form could express more, but the on-device staging buffer caps it here).
pub const MAX_COPY_LEN: usize = 2047;
/// Longest length expressible in the 1-byte short form.
pub const MAX_RAW_SHORT: usize = 63;

/// Number of address bytes following a COPY header.
pub const COPY_ADDR_BYTES: usize = 3;

/// Largest image the codec can address: COPY offsets are 3 bytes with the
/// top bit reserved for the RAM flag, so offsets stop at 2^23 - 1.
pub const MAX_IMAGE_LEN: usize = 1 << 23;

/// Source of a COPY operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopySource {
    /// Reference image: content not yet superseded at this point of the run.
    Rom,
    /// Supersede window: content already overwritten by earlier pages.
    Ram,
}

/// One decoded edit operation, borrowing literal bytes from the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp<'a> {
    Raw(&'a [u8]),
    Copy {
        source: CopySource,
        offset: usize,
        len: usize,
    },
}

// ---------------------------------------------------------------------------
// Header encoding
// ---------------------------------------------------------------------------

/// Append the 1- or 2-byte header for an operation of `len` bytes.
fn push_header(kind: u8, len: usize, out: &mut Vec<u8>) {
    debug_assert!(len >= 1 && len <= MAX_COPY_LEN);
    if len <= MAX_RAW_SHORT {
        out.push(kind | (len as u8 & LEN6_MASK));
    } else {
        out.push(kind | FLAG_LONG | ((len >> 8) as u8 & LEN6_MASK));
        out.push(len as u8);
    }
}

/// Append a RAW operation carrying `bytes` verbatim.
pub(crate) fn push_raw(bytes: &[u8], out: &mut Vec<u8>) {
    push_header(0, bytes.len(), out);
    out.extend_from_slice(bytes);
}

/// Append a COPY operation of `len` bytes from `offset` in `source`.
pub(crate) fn push_copy(len: usize, offset: usize, source: CopySource, out: &mut Vec<u8>) {
    debug_assert!(offset < 1 << 23, "copy offset exceeds 3-byte addressing");
    push_header(CMD_COPY, len, out);
    out.push(offset as u8);
    out.push((offset >> 8) as u8);
    let mut high = (offset >> 16) as u8 & !ADDR_FROM_RAM;
    if source == CopySource::Ram {
        high |= ADDR_FROM_RAM;
    }
    out.push(high);
}

// ---------------------------------------------------------------------------
// Header decoding (shared by the decoder state machine and the iterator)
// ---------------------------------------------------------------------------

/// Number of parameter bytes that follow a first command byte.
pub(crate) fn param_bytes(first: u8) -> usize {
    let mut n = 0;
    if first & CMD_COPY != 0 {
        n += COPY_ADDR_BYTES;
    }
    if first & FLAG_LONG != 0 {
        n += 1;
    }
    n
}

/// Operation length from a complete command buffer.
pub(crate) fn op_length(cmd: &[u8]) -> usize {
    if cmd[0] & FLAG_LONG != 0 {
        ((cmd[0] & LEN6_MASK) as usize) << 8 | cmd[1] as usize
    } else {
        (cmd[0] & LEN6_MASK) as usize
    }
}

/// COPY source from a complete command buffer.
pub(crate) fn copy_source(cmd: &[u8]) -> CopySource {
    let high = if cmd[0] & FLAG_LONG != 0 { cmd[4] } else { cmd[3] };
    if high & ADDR_FROM_RAM != 0 {
        CopySource::Ram
    } else {
        CopySource::Rom
    }
}

/// COPY source offset from a complete command buffer.
pub(crate) fn copy_offset(cmd: &[u8]) -> usize {
    let addr = if cmd[0] & FLAG_LONG != 0 {
        &cmd[2..5]
    } else {
        &cmd[1..4]
    };
    addr[0] as usize | (addr[1] as usize) << 8 | ((addr[2] & !ADDR_FROM_RAM) as usize) << 16
}

// ---------------------------------------------------------------------------
// Script op iterator
// ---------------------------------------------------------------------------

/// Iterates over the operations of a finished edit script.
///
/// Used by tests and diagnostics to inspect what the encoder emitted; the
/// live decode path is the byte-driven `ScriptDecoder`.
pub struct OpIterator<'a> {
    script: &'a [u8],
    pos: usize,
}

impl<'a> OpIterator<'a> {
    pub fn new(script: &'a [u8]) -> Self {
        Self { script, pos: 0 }
    }

    /// Report a truncated script and fuse the iterator.
    fn truncated(&mut self, needed: usize) -> DiffError {
        let err = DiffError::OutOfRange {
            offset: self.pos,
            len: needed,
            buf_len: self.script.len(),
        };
        self.pos = self.script.len();
        err
    }
}

impl<'a> Iterator for OpIterator<'a> {
    type Item = Result<EditOp<'a>, DiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.script.len() {
            return None;
        }
        let first = self.script[self.pos];
        let cmd_len = 1 + param_bytes(first);
        let Some(cmd) = self.script.get(self.pos..self.pos + cmd_len) else {
            return Some(Err(self.truncated(cmd_len)));
        };
        let len = op_length(cmd);
        if first & CMD_COPY != 0 {
            self.pos += cmd_len;
            Some(Ok(EditOp::Copy {
                source: copy_source(cmd),
                offset: copy_offset(cmd),
                len,
            }))
        } else {
            let start = self.pos + cmd_len;
            let Some(bytes) = self.script.get(start..start + len) else {
                return Some(Err(self.truncated(cmd_len + len)));
            };
            self.pos = start + len;
            Some(Ok(EditOp::Raw(bytes)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(script: &[u8]) -> Vec<EditOp<'_>> {
        OpIterator::new(script).map(|op| op.unwrap()).collect()
    }

    #[test]
    fn raw_short_form_is_one_header_byte() {
        let mut out = Vec::new();
        push_raw(&[0xAB; 63], &mut out);
        assert_eq!(out.len(), 1 + 63);
        assert_eq!(out[0], 63); // kind=RAW, short, length in low 6 bits
        assert_eq!(ops(&out), vec![EditOp::Raw(&[0xAB; 63])]);
    }

    #[test]
    fn raw_long_form_starts_at_64() {
        let mut out = Vec::new();
        push_raw(&[0xCD; 64], &mut out);
        assert_eq!(out.len(), 2 + 64);
        assert_eq!(out[0], FLAG_LONG); // high 6 bits of 64 are 0
        assert_eq!(out[1], 64);
        assert_eq!(ops(&out), vec![EditOp::Raw(&[0xCD; 64])]);
    }

    #[test]
    fn copy_short_form_roundtrips() {
        let mut out = Vec::new();
        push_copy(63, 0x012345, CopySource::Rom, &mut out);
        assert_eq!(out.len(), 1 + 3);
        assert_eq!(out[0], CMD_COPY | 63);
        assert_eq!(&out[1..], &[0x45, 0x23, 0x01]); // low, mid, high
        assert_eq!(
            ops(&out),
            vec![EditOp::Copy {
                source: CopySource::Rom,
                offset: 0x012345,
                len: 63
            }]
        );
    }

    #[test]
    fn copy_long_form_tags_ram_in_high_address_byte() {
        let mut out = Vec::new();
        push_copy(MAX_COPY_LEN, 0x7FFFFF, CopySource::Ram, &mut out);
        assert_eq!(out.len(), 2 + 3);
        assert_eq!(out[0], CMD_COPY | FLAG_LONG | (MAX_COPY_LEN >> 8) as u8);
        assert_eq!(out[1], (MAX_COPY_LEN & 0xFF) as u8);
        assert_eq!(out[4], 0x7F | ADDR_FROM_RAM);
        assert_eq!(
            ops(&out),
            vec![EditOp::Copy {
                source: CopySource::Ram,
                offset: 0x7FFFFF,
                len: MAX_COPY_LEN
            }]
        );
    }

    #[test]
    fn iterator_reports_truncated_scripts() {
        // COPY header claims 3 address bytes but only 1 follows
        let script = [CMD_COPY | 6, 0x00];
        let got: Vec<_> = OpIterator::new(&script).collect();
        assert_eq!(got.len(), 1);
        assert!(got[0].is_err());
    }
}
