// Response-telegram checking.
//
// Every command round-trip ends with a SEND_LAST_ERROR response whose data
// field carries the result code. The legacy tooling silently returned 0 and
// only logged when the command byte did not match; here that is an explicit
// framing error, since a mismatched response means the caller is reading
// the wrong telegram.

use log::{debug, error};

use super::profile::ProtocolProfile;
use super::result::UpdResult;
use crate::error::ProtocolError;

/// Byte offset of the command id in a response telegram.
pub const COMMAND_POSITION: usize = 2;
/// Byte offset of the first data byte in a response telegram.
pub const DATA_POSITION: usize = 3;

/// Outcome of [`check_result`]: the resolved result plus the raw wire value
/// for callers that branch on generation-specific codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedResult {
    pub result: UpdResult,
    pub raw: u32,
}

impl CheckedResult {
    pub fn is_error(&self) -> bool {
        self.result.is_error()
    }
}

/// Validate a SEND_LAST_ERROR response telegram and extract its result.
///
/// The telegram's command byte must be the profile's SEND_LAST_ERROR code;
/// anything else is a framing error. The result code (one byte in V2, four
/// little-endian bytes in V0/V1) is resolved through the profile's table;
/// unknown values come back as [`UpdResult::Invalid`], not as `Err`.
pub fn check_result(
    profile: ProtocolProfile,
    telegram: &[u8],
) -> Result<CheckedResult, ProtocolError> {
    let needed = DATA_POSITION + profile.result_width();
    if telegram.len() < needed {
        return Err(ProtocolError::Truncated {
            needed,
            got: telegram.len(),
        });
    }

    let expected = profile.send_last_error_code();
    let actual = telegram[COMMAND_POSITION];
    if actual != expected {
        error!("response is not SEND_LAST_ERROR: expected {expected:#04X}, got {actual:#04X}");
        return Err(ProtocolError::Framing { expected, actual });
    }

    let raw = match profile.result_width() {
        1 => telegram[DATA_POSITION] as u32,
        _ => u32::from_le_bytes(
            telegram[DATA_POSITION..DATA_POSITION + 4]
                .try_into()
                .unwrap_or([0; 4]),
        ),
    };
    let result = UpdResult::from_wire(profile, raw);
    if result.is_error() {
        error!("device reported {result} (code {raw:#X})");
    } else {
        debug!("device reported success ({raw:#X})");
    }
    Ok(CheckedResult { result, raw })
}
