// Fixed-offset binary records exchanged with the bootloader.
//
// All records are parsed once from a response telegram's data field and are
// immutable value objects from then on. Integers are little-endian.

use std::fmt;

use bitflags::bitflags;

use super::profile::IdentityLayout;
use crate::error::ProtocolError;

/// Address value marking a field as unprogrammed (erased flash).
pub const INVALID_ADDRESS: u32 = 0xFFFF_FFFF;

bitflags! {
    /// Bootloader feature mask reported in the identity record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        /// Differential (edit-script) updates are supported.
        const DIFF_UPDATE = 0x0100;
        /// Debug build of the bootloader.
        const DEBUG_BUILD = 0x8000;
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn require(bytes: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if bytes.len() < needed {
        Err(ProtocolError::Truncated {
            needed,
            got: bytes.len(),
        })
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bootloader identity
// ---------------------------------------------------------------------------

/// Who we are talking to: version, features, and where application flash
/// begins. Two fixed layouts exist across generations, selected by the
/// active profile's [`IdentityLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootloaderIdentity {
    pub version_major: u8,
    pub version_minor: u8,
    pub features: Features,
    pub app_first_address: u32,
}

impl BootloaderIdentity {
    /// Record size in bytes for `layout`.
    pub fn wire_len(layout: IdentityLayout) -> usize {
        match layout {
            IdentityLayout::Compact => 8,
            IdentityLayout::Wide => 10,
        }
    }

    pub fn from_bytes(layout: IdentityLayout, bytes: &[u8]) -> Result<Self, ProtocolError> {
        require(bytes, Self::wire_len(layout))?;
        let (features, addr_offset) = match layout {
            IdentityLayout::Compact => (read_u16(bytes, 2) as u32, 4),
            IdentityLayout::Wide => (read_u32(bytes, 2), 6),
        };
        Ok(Self {
            version_major: bytes[0],
            version_minor: bytes[1],
            features: Features::from_bits_retain(features),
            app_first_address: read_u32(bytes, addr_offset),
        })
    }

    /// Serialize back to the same fixed layout.
    pub fn to_bytes(&self, layout: IdentityLayout) -> Vec<u8> {
        let mut out = vec![self.version_major, self.version_minor];
        match layout {
            IdentityLayout::Compact => {
                out.extend_from_slice(&(self.features.bits() as u16).to_le_bytes())
            }
            IdentityLayout::Wide => out.extend_from_slice(&self.features.bits().to_le_bytes()),
        }
        out.extend_from_slice(&self.app_first_address.to_le_bytes());
        out
    }

    /// Version as reported to the operator.
    pub fn version(&self) -> String {
        format!("{}.{:02}", self.version_major, self.version_minor)
    }
}

impl fmt::Display for BootloaderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "version {}, features {:#06X}, app start {:#010X}",
            self.version(),
            self.features.bits(),
            self.app_first_address
        )
    }
}

// ---------------------------------------------------------------------------
// Boot descriptor
// ---------------------------------------------------------------------------

/// On-device record describing the installed application: address range,
/// CRC32 over that range, and a pointer to its embedded version string.
///
/// Validity is derived, never stored: a descriptor is valid when its start
/// address is programmed and precedes its end address. The bootloader uses
/// this to refuse to start a half-flashed application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootDescriptor {
    pub start_address: u32,
    pub end_address: u32,
    pub crc32: u32,
    pub app_version_address: u32,
}

impl BootDescriptor {
    /// Record size in bytes.
    pub const WIRE_LEN: usize = 16;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        require(bytes, Self::WIRE_LEN)?;
        Ok(Self {
            start_address: read_u32(bytes, 0),
            end_address: read_u32(bytes, 4),
            crc32: read_u32(bytes, 8),
            app_version_address: read_u32(bytes, 12),
        })
    }

    /// Serialize to the 16-byte wire layout (used when flashing a new
    /// descriptor).
    pub fn to_bytes(&self) -> [u8; Self::WIRE_LEN] {
        let mut out = [0u8; Self::WIRE_LEN];
        out[0..4].copy_from_slice(&self.start_address.to_le_bytes());
        out[4..8].copy_from_slice(&self.end_address.to_le_bytes());
        out[8..12].copy_from_slice(&self.crc32.to_le_bytes());
        out[12..16].copy_from_slice(&self.app_version_address.to_le_bytes());
        out
    }

    pub fn valid(&self) -> bool {
        self.start_address != INVALID_ADDRESS && self.start_address < self.end_address
    }

    /// Application length in bytes (inclusive address range).
    pub fn length(&self) -> u32 {
        self.end_address.wrapping_sub(self.start_address).wrapping_add(1)
    }
}

impl fmt::Display for BootDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {:#010X}-{:#010X}, {} byte(s), crc32 {:#010X}",
            if self.valid() { "valid" } else { "invalid" },
            self.start_address,
            self.end_address,
            self.length(),
            self.crc32
        )
    }
}

// ---------------------------------------------------------------------------
// Connection statistics
// ---------------------------------------------------------------------------

/// Link-quality counters reported by the bootloader; purely observational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootloaderStatistic {
    pub disconnect_count: u16,
    pub repeated_ack_count: u16,
}

impl BootloaderStatistic {
    /// Record size in bytes.
    pub const WIRE_LEN: usize = 4;

    /// Counters above these values suggest a noisy bus.
    pub const THRESHOLD_DISCONNECT: u16 = 1;
    pub const THRESHOLD_REPEATED_ACK: u16 = 1;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        require(bytes, Self::WIRE_LEN)?;
        Ok(Self {
            disconnect_count: read_u16(bytes, 0),
            repeated_ack_count: read_u16(bytes, 2),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::WIRE_LEN] {
        let mut out = [0u8; Self::WIRE_LEN];
        out[0..2].copy_from_slice(&self.disconnect_count.to_le_bytes());
        out[2..4].copy_from_slice(&self.repeated_ack_count.to_le_bytes());
        out
    }

    /// Whether either counter exceeds its link-quality threshold.
    pub fn is_noisy(&self) -> bool {
        self.disconnect_count > Self::THRESHOLD_DISCONNECT
            || self.repeated_ack_count > Self::THRESHOLD_REPEATED_ACK
    }
}

impl fmt::Display for BootloaderStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#disconnects: {}, #repeated acks: {}",
            self.disconnect_count, self.repeated_ack_count
        )
    }
}
