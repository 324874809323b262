// Semantic bootloader commands and their per-generation wire tables.
//
// A command is a semantic value; the byte it travels as depends on the
// active protocol profile. Lookups go through immutable `'static` tables;
// wire bytes with no entry decode to `Command::Unknown` so callers can
// degrade gracefully when talking to a newer or older device.

use super::profile::ProtocolProfile;

/// Semantic command set across all bootloader generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Erase one flash sector (deprecated in favor of EraseAddressRange).
    EraseSector,
    /// Copy literal bytes into the device's RAM staging buffer.
    SendData,
    /// Program staged bytes into flash, with byte count and CRC32.
    Program,
    /// Flash an application boot descriptor block.
    UpdateBootDesc,
    /// Feed edit-script bytes to the on-device decompressor.
    SendDataToDecompress,
    /// Flash the decompressed staging page.
    ProgramDecompressedData,
    /// Erase the whole application flash area.
    EraseCompleteFlash,
    /// Erase an explicit start..end address range.
    EraseAddressRange,
    /// Read back bytes from flash (not implemented by any bootloader).
    ReqData,
    /// Dump a flash range to the MCU's serial port (debug builds).
    DumpFlash,
    RequestStatistic,
    ResponseStatistic,
    /// Ask for the last error (merged into responses in the V2 tables).
    GetLastError,
    /// Response carrying the last error; anchor for `check_result`.
    SendLastError,
    UnlockDevice,
    RequestUid,
    ResponseUid,
    AppVersionRequest,
    AppVersionResponse,
    /// Reset the device (dropped from the V2 tables).
    Reset,
    RequestBootDesc,
    ResponseBootDesc,
    RequestBlIdentity,
    ResponseBlIdentity,
    /// Device requires a newer updater (V2 only).
    ResponseBlVersionMismatch,
    SetEmulation,
    /// Sentinel for wire bytes not present in the active profile's table.
    Unknown,
}

/// Decimal table shared by the first generation.
const TABLE_V0: &[(Command, u8)] = &[
    (Command::EraseSector, 0),
    (Command::SendData, 1),
    (Command::Program, 2),
    (Command::UpdateBootDesc, 3),
    (Command::SendDataToDecompress, 4),
    (Command::ProgramDecompressedData, 5),
    (Command::EraseCompleteFlash, 7),
    (Command::EraseAddressRange, 8),
    (Command::ReqData, 10),
    (Command::GetLastError, 20),
    (Command::SendLastError, 21),
    (Command::UnlockDevice, 30),
    (Command::RequestUid, 31),
    (Command::ResponseUid, 32),
    (Command::AppVersionRequest, 33),
    (Command::AppVersionResponse, 34),
    (Command::Reset, 35),
    (Command::RequestBootDesc, 36),
    (Command::ResponseBootDesc, 37),
    (Command::RequestBlIdentity, 40),
    (Command::ResponseBlIdentity, 41),
    (Command::SetEmulation, 100),
];

/// Second generation: V0 plus flash-dump and statistics commands.
const TABLE_V1: &[(Command, u8)] = &[
    (Command::EraseSector, 0),
    (Command::SendData, 1),
    (Command::Program, 2),
    (Command::UpdateBootDesc, 3),
    (Command::SendDataToDecompress, 4),
    (Command::ProgramDecompressedData, 5),
    (Command::EraseCompleteFlash, 7),
    (Command::EraseAddressRange, 8),
    (Command::ReqData, 10),
    (Command::DumpFlash, 11),
    (Command::RequestStatistic, 12),
    (Command::ResponseStatistic, 13),
    (Command::GetLastError, 20),
    (Command::SendLastError, 21),
    (Command::UnlockDevice, 30),
    (Command::RequestUid, 31),
    (Command::ResponseUid, 32),
    (Command::AppVersionRequest, 33),
    (Command::AppVersionResponse, 34),
    (Command::Reset, 35),
    (Command::RequestBootDesc, 36),
    (Command::ResponseBootDesc, 37),
    (Command::RequestBlIdentity, 40),
    (Command::ResponseBlIdentity, 41),
    (Command::SetEmulation, 100),
];

/// Current generation: dense byte ids counting down from 0xEF.
const TABLE_V2: &[(Command, u8)] = &[
    (Command::SendData, 0xEF),
    (Command::Program, 0xEE),
    (Command::UpdateBootDesc, 0xED),
    (Command::SendDataToDecompress, 0xEC),
    (Command::ProgramDecompressedData, 0xEB),
    (Command::EraseCompleteFlash, 0xEA),
    (Command::EraseAddressRange, 0xE9),
    (Command::ReqData, 0xE8),
    (Command::DumpFlash, 0xE7),
    (Command::RequestStatistic, 0xDF),
    (Command::ResponseStatistic, 0xDE),
    (Command::SendLastError, 0xDC),
    (Command::UnlockDevice, 0xBF),
    (Command::RequestUid, 0xBE),
    (Command::ResponseUid, 0xBD),
    (Command::AppVersionRequest, 0xBC),
    (Command::AppVersionResponse, 0xBB),
    (Command::RequestBootDesc, 0xBA),
    (Command::ResponseBootDesc, 0xB9),
    (Command::RequestBlIdentity, 0xB8),
    (Command::ResponseBlIdentity, 0xB7),
    (Command::ResponseBlVersionMismatch, 0xB6),
    (Command::SetEmulation, 0x01),
];

fn table(profile: ProtocolProfile) -> &'static [(Command, u8)] {
    match profile {
        ProtocolProfile::V0 => TABLE_V0,
        ProtocolProfile::V1 => TABLE_V1,
        ProtocolProfile::V2 => TABLE_V2,
    }
}

impl Command {
    /// Wire byte of this command under `profile`; `None` when the
    /// generation has no encoding for it.
    pub fn wire_id(self, profile: ProtocolProfile) -> Option<u8> {
        table(profile)
            .iter()
            .find(|(cmd, _)| *cmd == self)
            .map(|&(_, id)| id)
    }

    /// Resolve a received wire byte under `profile`. Unknown bytes decode
    /// to [`Command::Unknown`] rather than failing.
    pub fn from_wire(profile: ProtocolProfile, byte: u8) -> Command {
        table(profile)
            .iter()
            .find(|&&(_, id)| id == byte)
            .map_or(Command::Unknown, |&(cmd, _)| cmd)
    }
}
