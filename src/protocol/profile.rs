// Protocol profiles: the bootloader generations this codec can talk to.
//
// The same logical command set has had three numeric encodings over the
// bootloader's history. The active profile is identified once per run (from
// the bootloader's reported version) and threaded explicitly through every
// wire conversion; nothing here is global or mutable.

/// One bootloader protocol generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolProfile {
    /// First generation: low decimal command ids (0..=41), 32-bit result
    /// codes (decimal flash-controller range plus the 0x100..=0x111
    /// extended range). No statistics or flash-dump commands.
    V0,
    /// Second generation: same decimal tables as [`ProtocolProfile::V0`]
    /// extended with flash-dump and link-statistics commands.
    V1,
    /// Current generation: dense single-byte ids (0x01..=0xEF) for both
    /// commands and results.
    V2,
}

/// Which fixed layout the identity record uses (see `records`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityLayout {
    /// 8 bytes: major, minor, u16 features, u32 application start.
    Compact,
    /// 10 bytes: major, minor, u32 features, u32 application start.
    Wide,
}

impl ProtocolProfile {
    /// Wire id of the SEND_LAST_ERROR response command; every generation
    /// defines one, it is the anchor `check_result` validates against.
    pub fn send_last_error_code(self) -> u8 {
        match self {
            Self::V0 | Self::V1 => 21,
            Self::V2 => 0xDC,
        }
    }

    /// Width in bytes of a result code on the wire.
    pub fn result_width(self) -> usize {
        match self {
            Self::V0 | Self::V1 => 4,
            Self::V2 => 1,
        }
    }

    /// Identity record layout used by this generation.
    pub fn identity_layout(self) -> IdentityLayout {
        match self {
            Self::V0 | Self::V1 => IdentityLayout::Wide,
            Self::V2 => IdentityLayout::Compact,
        }
    }
}
