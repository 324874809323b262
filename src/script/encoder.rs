// Diff encoder: computes a page-bounded edit script between two images.
//
// Per output position the encoder searches two candidate sources for the
// longest run matching the target from that position on:
//
//   - forward/ROM:  anywhere in the reference image, scanned from offset 0
//   - backward/RAM: anywhere in the supersede window (pages already sent)
//
// The strictly longer candidate wins; ties go to the RAM window. Candidates
// shorter than MIN_MATCH become literal bytes in a pending RAW buffer.
// Whenever the destination offset crosses a page boundary the script is
// flushed, CRC32'd over the completed target page, and handed to the page
// transmitter. After a page is accepted, its old bytes are folded into the
// window and the reference image is committed to the new content, modeling
// the device's flash.
//
// The transmitter call is the sole I/O boundary: it blocks until the device
// acknowledges and at most one page is ever in flight, because the
// bootloader's RAM staging buffer is single-slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use super::opcode::{self, CopySource, MAX_COPY_LEN, MAX_IMAGE_LEN, MIN_MATCH};
use crate::error::{DiffError, TransportError};
use crate::image::{FILL_ERASED, Image};
use crate::window::SupersedeWindow;

// ---------------------------------------------------------------------------
// Collaborator seam
// ---------------------------------------------------------------------------

/// Accepts one finished compressed page and performs the bus exchange.
///
/// Invoked once per destination page, in page order, synchronously; the
/// implementation encapsulates the wait for the device's acknowledgement.
/// A failure aborts the whole run; retry policy, if any, belongs inside
/// the transport before it returns.
pub trait PageTransmitter {
    fn send_page(&mut self, script: &[u8], page_crc32: u32) -> Result<(), TransportError>;
}

impl<F> PageTransmitter for F
where
    F: FnMut(&[u8], u32) -> Result<(), TransportError>,
{
    fn send_page(&mut self, script: &[u8], page_crc32: u32) -> Result<(), TransportError> {
        self(script, page_crc32)
    }
}

// ---------------------------------------------------------------------------
// Run statistics
// ---------------------------------------------------------------------------

/// Byte accounting for one encoder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Total edit-script bytes handed to the transmitter.
    pub script_bytes: usize,
    /// Pages sent (including a final partial page, if any).
    pub pages_sent: usize,
    /// Target bytes carried literally in RAW operations.
    pub literal_bytes: usize,
    /// Target bytes reproduced by COPY operations.
    pub copied_bytes: usize,
}

// ---------------------------------------------------------------------------
// Match search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct RunMatch {
    offset: usize,
    len: usize,
}

/// Longest run in `haystack` equal to `target[pattern_offset..]`, scanning
/// every haystack offset from 0. The run is capped at MAX_COPY_LEN and
/// truncated so it never extends past the destination page that
/// `pattern_offset` falls into.
fn longest_common_run(
    haystack: &[u8],
    target: &[u8],
    pattern_offset: usize,
    page_size: usize,
) -> RunMatch {
    let mut best = RunMatch { offset: 0, len: 0 };
    for i in 0..haystack.len() {
        let mut j = 0;
        while pattern_offset + j < target.len()
            && i + j < haystack.len()
            && haystack[i + j] == target[pattern_offset + j]
            && j < MAX_COPY_LEN
        {
            j += 1;
        }
        if j > best.len {
            best = RunMatch { offset: i, len: j };
        }
    }
    if best.len > 0 {
        let first_page = pattern_offset / page_size;
        let last_page = (pattern_offset + best.len - 1) / page_size;
        if last_page != first_page {
            // confine the match to a single destination page
            best.len = (first_page + 1) * page_size - pattern_offset;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// One differential-update run over an old and a new firmware image.
///
/// Owns its buffers for the duration of the run; `run` consumes the encoder
/// and drives the transmitter to completion.
///
/// # Example
/// ```
/// use fwdelta::script::encoder::DiffEncoder;
/// use fwdelta::image::Image;
///
/// let old = Image::from_bytes(vec![0xAA; 512]);
/// let new = Image::from_bytes(vec![0xAB; 512]);
/// let mut pages = Vec::new();
/// let stats = DiffEncoder::new(old, new, 256)
///     .run(&mut |script: &[u8], crc: u32| {
///         pages.push((script.to_vec(), crc));
///         Ok(())
///     })
///     .unwrap();
/// assert_eq!(stats.pages_sent, 2);
/// ```
pub struct DiffEncoder {
    old: Image,
    new: Image,
    window: SupersedeWindow,
    page_size: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl DiffEncoder {
    /// Set up a run. The old image is normalized to the new image's length
    /// (padded with the erased-flash byte, or truncated) so the match search
    /// never indexes past either buffer.
    pub fn new(old: Image, new: Image, page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        let old = old.normalized_to(new.len(), FILL_ERASED);
        Self {
            old,
            new,
            window: SupersedeWindow::new(page_size),
            page_size,
            cancel: None,
        }
    }

    /// Cooperative cancellation: the flag is checked between page
    /// iterations, aborting before the next send. The device is left
    /// partially updated; its boot descriptor keeps a half-flashed
    /// application from being started.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Execute the encoder loop to completion, calling the transmitter once
    /// per page. Returns byte accounting for the run.
    pub fn run<T: PageTransmitter>(mut self, tx: &mut T) -> Result<EncodeStats, DiffError> {
        let target_len = self.new.len();
        // COPY addresses are 3 bytes with the RAM flag in bit 23: beyond
        // this, an offset would silently alias into the flag or lose bits.
        if target_len > MAX_IMAGE_LEN {
            return Err(DiffError::ImageTooLarge {
                len: target_len,
                max: MAX_IMAGE_LEN,
            });
        }
        let mut script: Vec<u8> = Vec::new();
        let mut raw_buf: Vec<u8> = Vec::new();
        let mut stats = EncodeStats::default();
        let mut i = 0;

        while i < target_len {
            let ram = longest_common_run(
                self.window.as_bytes(),
                self.new.as_bytes(),
                i,
                self.page_size,
            );
            let rom =
                longest_common_run(self.old.as_bytes(), self.new.as_bytes(), i, self.page_size);
            // strictly longer ROM run wins; equality keeps the RAM candidate
            let (best, source) = if rom.len > ram.len {
                (rom, CopySource::Rom)
            } else {
                (ram, CopySource::Ram)
            };

            if best.len >= MIN_MATCH {
                flush_raw(&mut raw_buf, &mut script, &mut stats);
                trace!(
                    "{i:08x} copy {:?} offset={:#08x} len={}",
                    source, best.offset, best.len
                );
                opcode::push_copy(best.len, best.offset, source, &mut script);
                stats.copied_bytes += best.len;
                i += best.len;
            } else {
                trace!("{i:08x} raw {:02x}", self.new.as_bytes()[i]);
                raw_buf.push(self.new.as_bytes()[i]);
                i += 1;
                // a single RAW op cannot express more than MAX_COPY_LEN bytes
                if raw_buf.len() == MAX_COPY_LEN {
                    flush_raw(&mut raw_buf, &mut script, &mut stats);
                }
            }

            if i % self.page_size == 0 {
                flush_raw(&mut raw_buf, &mut script, &mut stats);
                let page_start = i - self.page_size;
                self.transmit(tx, &mut script, page_start, self.page_size, &mut stats)?;

                // Model the device: back the superseded page up into the RAM
                // window, then commit the new content to the in-core flash.
                let old_page = self.old.slice(page_start, self.page_size)?.to_vec();
                self.window.append_page(&old_page)?;
                let new_page = self.new.slice(page_start, self.page_size)?.to_vec();
                self.old.commit_page(page_start, &new_page)?;

                if let Some(flag) = &self.cancel {
                    if flag.load(Ordering::Relaxed) {
                        return Err(DiffError::Cancelled);
                    }
                }
            }
        }

        // Final partial page, if the image is not page-aligned.
        flush_raw(&mut raw_buf, &mut script, &mut stats);
        if !script.is_empty() {
            let tail_len = target_len % self.page_size;
            let tail_start = target_len - tail_len;
            self.transmit(tx, &mut script, tail_start, tail_len, &mut stats)?;
        }

        debug!(
            "diff complete: {} pages, {} script bytes ({} literal, {} copied)",
            stats.pages_sent, stats.script_bytes, stats.literal_bytes, stats.copied_bytes
        );
        Ok(stats)
    }

    fn transmit<T: PageTransmitter>(
        &self,
        tx: &mut T,
        script: &mut Vec<u8>,
        page_start: usize,
        page_len: usize,
        stats: &mut EncodeStats,
    ) -> Result<(), DiffError> {
        let crc = crc32fast::hash(self.new.slice(page_start, page_len)?);
        debug!(
            "page {}: {} script bytes for {} target bytes, crc32 {crc:#010X}",
            stats.pages_sent,
            script.len(),
            page_len
        );
        tx.send_page(script, crc)?;
        stats.script_bytes += script.len();
        stats.pages_sent += 1;
        script.clear();
        Ok(())
    }
}

fn flush_raw(raw_buf: &mut Vec<u8>, script: &mut Vec<u8>, stats: &mut EncodeStats) {
    if raw_buf.is_empty() {
        return;
    }
    trace!("flush raw buffer, {} bytes", raw_buf.len());
    opcode::push_raw(raw_buf, script);
    stats.literal_bytes += raw_buf.len();
    raw_buf.clear();
}
