// Telegram-level protocol codec.
//
// Commands, results and the fixed-offset records exchanged with the
// bootloader. The numeric encoding of commands and results is NOT stable
// across bootloader generations: three incompatible tables exist for the
// same semantic values, so every wire conversion is parameterized by an
// explicit protocol profile selected once per run.
//
// # Modules
//
// - `profile`:  the three protocol generations and their framing constants
// - `command`:  semantic command enum + per-profile wire tables
// - `result`:   semantic result enum, classification, per-profile tables
// - `telegram`: response checking (`check_result`)
// - `records`:  identity / boot descriptor / statistics record layouts

pub mod command;
pub mod profile;
pub mod records;
pub mod result;
pub mod telegram;

pub use command::Command;
pub use profile::{IdentityLayout, ProtocolProfile};
pub use records::{BootDescriptor, BootloaderIdentity, BootloaderStatistic, Features};
pub use result::UpdResult;
pub use telegram::{CheckedResult, check_result};
