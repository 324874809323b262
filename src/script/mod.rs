// Edit-script codec: the differential-update core.
//
// An edit script is the RAW/COPY opcode sequence describing how to
// transform one flash page's old content into its new content. The encoder
// produces one script per destination page and hands it to the page
// transmitter; the decoder is a byte-at-a-time state machine mirroring what
// the bootloader runs on-device, used host-side as a correctness oracle.
//
// # Modules
//
// - `opcode`:  opcode byte layout, header encoding, script op iterator
// - `encoder`: page-bounded diff encoder and the PageTransmitter seam
// - `decoder`: byte-driven script decoder / page reconstruction

pub mod decoder;
pub mod encoder;
pub mod opcode;

pub use decoder::ScriptDecoder;
pub use encoder::{DiffEncoder, EncodeStats, PageTransmitter};
pub use opcode::{
    CopySource, EditOp, OpIterator, MAX_COPY_LEN, MAX_IMAGE_LEN, MAX_RAW_SHORT, MIN_MATCH,
};
