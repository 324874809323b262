// Error taxonomy for the update codec.
//
// Buffer and encoding errors are contract violations: the current run is
// corrupt and must be aborted, never resumed. Transport failures are opaque
// to the codec; retry policy (if any) lives in the transport collaborator
// before it returns control here.

use thiserror::Error;

/// Opaque failure reported by the page transmitter (timeout, link loss, NACK).
#[derive(Debug, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised by the image/window buffers and the diff encoder/decoder.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A buffer access reached past the end of an image or the supersede
    /// window (e.g. a COPY referencing bytes not yet superseded).
    #[error("range {offset}+{len} out of bounds (buffer length {buf_len})")]
    OutOfRange {
        offset: usize,
        len: usize,
        buf_len: usize,
    },

    /// A non-page-sized chunk was appended to the supersede window.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The target image is larger than COPY addressing can reference.
    #[error("image of {len} bytes exceeds the {max}-byte addressing limit")]
    ImageTooLarge { len: usize, max: usize },

    /// An edit script tried to write past the end of the destination page.
    #[error("edit script overflows the {page_size}-byte page at cursor {cursor} (write of {len})")]
    ScriptOverflow {
        cursor: usize,
        len: usize,
        page_size: usize,
    },

    /// The run was cancelled between page iterations.
    #[error("update run cancelled")]
    Cancelled,

    /// The page transmitter failed; the whole run aborts.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors raised by the telegram-level protocol codec.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The response telegram's command byte is not the expected
    /// SEND_LAST_ERROR code for the active profile.
    #[error("framing error: expected command byte {expected:#04X}, got {actual:#04X}")]
    Framing { expected: u8, actual: u8 },

    /// The telegram is shorter than the fixed layout requires.
    #[error("telegram too short: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    /// Device-reported checksum disagrees with the locally computed one.
    #[error("CRC32 mismatch: device reported {device:#010X}, host computed {host:#010X}")]
    CrcMismatch { device: u32, host: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_are_stable() {
        let e = DiffError::OutOfRange {
            offset: 10,
            len: 20,
            buf_len: 16,
        };
        assert_eq!(
            e.to_string(),
            "range 10+20 out of bounds (buffer length 16)"
        );

        let e = ProtocolError::Framing {
            expected: 0xDC,
            actual: 0x01,
        };
        assert_eq!(
            e.to_string(),
            "framing error: expected command byte 0xDC, got 0x01"
        );
    }

    #[test]
    fn transport_error_wraps_into_diff_error() {
        let e: DiffError = TransportError::new("link closed").into();
        assert_eq!(e.to_string(), "transport failure: link closed");
    }
}
