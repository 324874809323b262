//! fwdelta: differential firmware updates for field-bus bootloaders.
//!
//! Updates transfer only the bytes that changed between the image on the
//! device and the new one, as a per-page edit script of RAW/COPY
//! operations. The crate provides:
//!
//! - The edit-script codec (`script`): a page-bounded diff encoder and the
//!   byte-driven decoder state machine mirroring the on-device bootloader
//! - The telegram protocol codec (`protocol`): command/result tables for
//!   three incompatible bootloader generations and the fixed-offset
//!   identity, boot-descriptor and statistics records
//! - The buffers both build on (`image`, `window`)
//!
//! The bus transport itself is a collaborator: the encoder hands each
//! finished page to a [`script::PageTransmitter`] and blocks until it is
//! acknowledged.
//!
//! # Quick Start
//!
//! ```
//! use fwdelta::image::Image;
//! use fwdelta::script::{DiffEncoder, ScriptDecoder};
//!
//! let old = Image::from_bytes(vec![0xAA; 512]);
//! let new_fw: Vec<u8> = (0..512).map(|i| (i % 7) as u8).collect();
//!
//! // Collect the per-page scripts instead of sending them over the bus.
//! let mut pages: Vec<Vec<u8>> = Vec::new();
//! DiffEncoder::new(old.clone(), Image::from_bytes(new_fw.clone()), 256)
//!     .run(&mut |script: &[u8], _crc: u32| {
//!         pages.push(script.to_vec());
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! // Replay them through the decoder, seeded with the same reference image.
//! let mut reconstructed = Vec::new();
//! let rom = old.normalized_to(new_fw.len(), fwdelta::image::FILL_ERASED);
//! let mut dec = ScriptDecoder::new(rom, 256, |page: &[u8]| {
//!     reconstructed.extend_from_slice(page)
//! });
//! for page in &pages {
//!     dec.push_script(page).unwrap();
//!     dec.page_completed().unwrap();
//! }
//! assert_eq!(&reconstructed[..new_fw.len()], &new_fw[..]);
//! ```

pub mod error;
pub mod image;
pub mod protocol;
pub mod script;
pub mod window;

pub use error::{DiffError, ProtocolError, TransportError};
pub use image::Image;
pub use script::{DiffEncoder, EncodeStats, PageTransmitter, ScriptDecoder};
pub use window::SupersedeWindow;
