// Semantic bootloader results and their per-generation wire tables.
//
// Results travel as 32-bit little-endian values in the V0/V1 generations
// (flash-controller codes in the low decimal range, protocol codes in the
// 0x100..=0x111 extended range) and as a single dense byte in V2. Wire
// values with no table entry resolve to the `Invalid` sentinel, which is
// itself an error.

use std::fmt;

use super::profile::ProtocolProfile;

/// Semantic result set across all bootloader generations.
///
/// `Iap`-prefixed variants are statuses of the MCU's in-application
/// programming interface, passed through by the bootloader; the rest are
/// protocol-level results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdResult {
    IapSuccess,
    IapInvalidCommand,
    IapSrcAddrError,
    IapDstAddrError,
    IapSrcAddrNotMapped,
    IapDstAddrNotMapped,
    IapCountError,
    IapInvalidSector,
    IapSectorNotBlank,
    IapSectorNotPrepared,
    IapCompareError,
    IapBusy,
    /// Unmappable flash-controller status (V2 only).
    IapUnknown,
    UnknownCommand,
    CrcError,
    AddressNotAllowedToFlash,
    SectorNotAllowedToErase,
    RamBufferOverflow,
    WrongDescriptorBlock,
    ApplicationNotStartable,
    DeviceLocked,
    UidMismatch,
    EraseFailed,
    /// Telegram payload failed validation (V2 only).
    InvalidData,
    /// Telegram carried no payload (V2 only).
    NoData,
    FlashError,
    PageNotAllowedToErase,
    AddressRangeNotAllowedToErase,
    NotImplemented,
    /// Sentinel for wire values not present in the active profile's table.
    Invalid,
}

/// 32-bit result table of the decimal generations (V0 and V1 share it).
const TABLE_V0: &[(UpdResult, u32)] = &[
    (UpdResult::IapSuccess, 0),
    (UpdResult::IapInvalidCommand, 1),
    (UpdResult::IapSrcAddrError, 2),
    (UpdResult::IapDstAddrError, 3),
    (UpdResult::IapSrcAddrNotMapped, 4),
    (UpdResult::IapDstAddrNotMapped, 5),
    (UpdResult::IapCountError, 6),
    (UpdResult::IapInvalidSector, 7),
    (UpdResult::IapSectorNotBlank, 8),
    (UpdResult::IapSectorNotPrepared, 9),
    (UpdResult::IapCompareError, 10),
    (UpdResult::IapBusy, 11),
    (UpdResult::UnknownCommand, 0x100),
    (UpdResult::CrcError, 0x101),
    (UpdResult::AddressNotAllowedToFlash, 0x102),
    (UpdResult::SectorNotAllowedToErase, 0x103),
    (UpdResult::RamBufferOverflow, 0x104),
    (UpdResult::WrongDescriptorBlock, 0x105),
    (UpdResult::ApplicationNotStartable, 0x106),
    (UpdResult::DeviceLocked, 0x107),
    (UpdResult::UidMismatch, 0x108),
    (UpdResult::EraseFailed, 0x109),
    (UpdResult::FlashError, 0x110),
    (UpdResult::PageNotAllowedToErase, 0x111),
    (UpdResult::NotImplemented, 0xFFFF),
];

/// Dense byte table of the current generation.
const TABLE_V2: &[(UpdResult, u32)] = &[
    (UpdResult::IapSuccess, 0x7F),
    (UpdResult::IapInvalidCommand, 0x7E),
    (UpdResult::IapSrcAddrError, 0x7D),
    (UpdResult::IapDstAddrError, 0x7C),
    (UpdResult::IapSrcAddrNotMapped, 0x7B),
    (UpdResult::IapDstAddrNotMapped, 0x7A),
    (UpdResult::IapCountError, 0x79),
    (UpdResult::IapInvalidSector, 0x78),
    (UpdResult::IapSectorNotBlank, 0x77),
    (UpdResult::IapSectorNotPrepared, 0x76),
    (UpdResult::IapCompareError, 0x75),
    (UpdResult::IapBusy, 0x74),
    (UpdResult::IapUnknown, 0x73),
    (UpdResult::UnknownCommand, 0x5F),
    (UpdResult::CrcError, 0x5E),
    (UpdResult::AddressNotAllowedToFlash, 0x5D),
    (UpdResult::SectorNotAllowedToErase, 0x5C),
    (UpdResult::RamBufferOverflow, 0x5B),
    (UpdResult::WrongDescriptorBlock, 0x5A),
    (UpdResult::ApplicationNotStartable, 0x59),
    (UpdResult::DeviceLocked, 0x58),
    (UpdResult::UidMismatch, 0x57),
    (UpdResult::EraseFailed, 0x56),
    (UpdResult::InvalidData, 0x55),
    (UpdResult::NoData, 0x54),
    (UpdResult::FlashError, 0x53),
    (UpdResult::PageNotAllowedToErase, 0x52),
    (UpdResult::AddressRangeNotAllowedToErase, 0x51),
    (UpdResult::NotImplemented, 0x02),
    (UpdResult::Invalid, 0x01),
];

fn table(profile: ProtocolProfile) -> &'static [(UpdResult, u32)] {
    match profile {
        ProtocolProfile::V0 | ProtocolProfile::V1 => TABLE_V0,
        ProtocolProfile::V2 => TABLE_V2,
    }
}

impl UpdResult {
    /// Wire value of this result under `profile`; `None` when the
    /// generation has no encoding for it.
    pub fn wire_id(self, profile: ProtocolProfile) -> Option<u32> {
        table(profile)
            .iter()
            .find(|(r, _)| *r == self)
            .map(|&(_, id)| id)
    }

    /// Resolve a received wire value under `profile`; unmapped values
    /// become [`UpdResult::Invalid`].
    pub fn from_wire(profile: ProtocolProfile, value: u32) -> UpdResult {
        table(profile)
            .iter()
            .find(|&&(_, id)| id == value)
            .map_or(UpdResult::Invalid, |&(r, _)| r)
    }

    /// Everything except a successful flash-controller status is an error.
    pub fn is_error(self) -> bool {
        self != UpdResult::IapSuccess
    }

    /// Human-readable description, as reported to the operator.
    pub fn description(self) -> &'static str {
        match self {
            Self::IapSuccess => "flash command executed successfully",
            Self::IapInvalidCommand => "flash controller: invalid command",
            Self::IapSrcAddrError => "flash controller: source address not on a word boundary",
            Self::IapDstAddrError => "flash controller: destination address not on a correct boundary",
            Self::IapSrcAddrNotMapped => "flash controller: source address not mapped",
            Self::IapDstAddrNotMapped => "flash controller: destination address not mapped",
            Self::IapCountError => "flash controller: byte count is not a valid multiple",
            Self::IapInvalidSector => "flash controller: sector number invalid",
            Self::IapSectorNotBlank => "flash controller: sector not blank",
            Self::IapSectorNotPrepared => "flash controller: sector not prepared for write",
            Self::IapCompareError => "flash controller: source and destination differ",
            Self::IapBusy => "flash controller busy",
            Self::IapUnknown => "unknown flash controller status",
            Self::UnknownCommand => "command unknown",
            Self::CrcError => "CRC error, a full flash may be required",
            Self::AddressNotAllowedToFlash => "address not allowed to flash",
            Self::SectorNotAllowedToErase => "sector not allowed to be erased",
            Self::RamBufferOverflow => "RAM buffer overflow",
            Self::WrongDescriptorBlock => "boot descriptor block wrong",
            Self::ApplicationNotStartable => "application not startable",
            Self::DeviceLocked => "device locked, programming mode must be active",
            Self::UidMismatch => "UID mismatch",
            Self::EraseFailed => "flash page erase failed",
            Self::InvalidData => "data received is invalid",
            Self::NoData => "no data received in telegram",
            Self::FlashError => "flash page could not be programmed",
            Self::PageNotAllowedToErase => "flash page not allowed to erase",
            Self::AddressRangeNotAllowedToErase => "address range not allowed to erase",
            Self::NotImplemented => "command not implemented",
            Self::Invalid => "unknown error",
        }
    }
}

impl fmt::Display for UpdResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
