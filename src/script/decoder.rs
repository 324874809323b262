// Script decoder: byte-at-a-time reconstruction of one flash page.
//
// Mirrors the state machine the bootloader runs on-device, so it doubles as
// a host-side correctness oracle for the encoder. Driven one byte at a time
// for the lifetime of a page; the caller owns the page-boundary logic (the
// decoder cannot know when a telegram sequence ends) and signals completion
// explicitly, which delivers the scratch page to the listener.
//
//   ExpectCommandByte -> ExpectCommandParams -> (copy executed)
//                     -> ExpectRawData       -> (literals collected)
//
// The scratch page is an owned buffer with an explicit write cursor; the
// reference image and the supersede window are never aliased by it.

use log::trace;

use super::opcode::{self, CMD_COPY, CopySource};
use crate::error::DiffError;
use crate::image::Image;
use crate::window::SupersedeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectCommandByte,
    ExpectCommandParams,
    ExpectRawData,
}

/// Reconstructs pages from an edit-script byte stream.
///
/// `rom` must be the same normalized reference image the encoder was seeded
/// with. The listener receives each completed page (the final page
/// zero-padded to `page_size` if the image is not page-aligned), after
/// which the decoder folds the superseded page into its own window and
/// commits the new content to its reference image, exactly as the device
/// would.
pub struct ScriptDecoder<F: FnMut(&[u8])> {
    state: State,
    cmd_buf: [u8; 5],
    cmd_len: usize,
    expected_cmd_len: usize,
    scratch: Vec<u8>,
    cursor: usize,
    raw_received: usize,
    rom: Image,
    window: SupersedeWindow,
    page_size: usize,
    page_index: usize,
    listener: F,
}

impl<F: FnMut(&[u8])> ScriptDecoder<F> {
    pub fn new(rom: Image, page_size: usize, listener: F) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        Self {
            state: State::ExpectCommandByte,
            cmd_buf: [0; 5],
            cmd_len: 0,
            expected_cmd_len: 0,
            scratch: vec![0; page_size],
            cursor: 0,
            raw_received: 0,
            rom,
            window: SupersedeWindow::new(page_size),
            page_size,
            page_index: 0,
            listener,
        }
    }

    /// Bytes written into the current page so far.
    pub fn bytes_in_page(&self) -> usize {
        self.cursor
    }

    /// Pages delivered so far.
    pub fn pages_completed(&self) -> usize {
        self.page_index
    }

    /// Feed one script byte into the state machine.
    pub fn push_byte(&mut self, byte: u8) -> Result<(), DiffError> {
        trace!("decoder byte {byte:#04x} state {:?}", self.state);
        match self.state {
            State::ExpectCommandByte => {
                self.cmd_buf[0] = byte;
                self.cmd_len = 1;
                self.expected_cmd_len = 1 + opcode::param_bytes(byte);
                if self.expected_cmd_len > 1 {
                    self.state = State::ExpectCommandParams;
                } else {
                    self.begin_raw();
                }
                Ok(())
            }
            State::ExpectCommandParams => {
                self.cmd_buf[self.cmd_len] = byte;
                self.cmd_len += 1;
                if self.cmd_len < self.expected_cmd_len {
                    return Ok(());
                }
                if self.cmd_buf[0] & CMD_COPY != 0 {
                    self.execute_copy()?;
                    self.state = State::ExpectCommandByte;
                } else {
                    self.begin_raw();
                }
                Ok(())
            }
            State::ExpectRawData => {
                if self.cursor >= self.page_size {
                    return Err(DiffError::ScriptOverflow {
                        cursor: self.cursor,
                        len: 1,
                        page_size: self.page_size,
                    });
                }
                self.scratch[self.cursor] = byte;
                self.cursor += 1;
                self.raw_received += 1;
                if self.raw_received >= opcode::op_length(&self.cmd_buf[..self.cmd_len]) {
                    self.state = State::ExpectCommandByte;
                }
                Ok(())
            }
        }
    }

    /// Feed a whole script (convenience over `push_byte`).
    pub fn push_script(&mut self, script: &[u8]) -> Result<(), DiffError> {
        for &b in script {
            self.push_byte(b)?;
        }
        Ok(())
    }

    /// Page-boundary signal from the caller: deliver the scratch page, fold
    /// it into the window/reference pair, and reset for the next page.
    pub fn page_completed(&mut self) -> Result<(), DiffError> {
        trace!(
            "page {} completed, {} bytes written",
            self.page_index, self.cursor
        );
        (self.listener)(&self.scratch);

        // Fold only full pages that lie inside the reference image: a final
        // partial page can never be a later COPY source, because the encoder
        // stops right after sending it.
        let page_start = self.page_index * self.page_size;
        if page_start + self.page_size <= self.rom.len() {
            let old_page = self.rom.slice(page_start, self.page_size)?.to_vec();
            self.window.append_page(&old_page)?;
            self.rom.commit_page(page_start, &self.scratch)?;
        }

        self.page_index += 1;
        self.cursor = 0;
        self.scratch.fill(0);
        self.state = State::ExpectCommandByte;
        Ok(())
    }

    fn begin_raw(&mut self) {
        self.raw_received = 0;
        // a zero-length RAW header carries no data; never emitted by the
        // encoder, but must not wedge the machine
        if opcode::op_length(&self.cmd_buf[..self.cmd_len]) == 0 {
            self.state = State::ExpectCommandByte;
        } else {
            self.state = State::ExpectRawData;
        }
    }

    fn execute_copy(&mut self) -> Result<(), DiffError> {
        let cmd = &self.cmd_buf[..self.cmd_len];
        let len = opcode::op_length(cmd);
        let offset = opcode::copy_offset(cmd);
        let source = opcode::copy_source(cmd);
        trace!("copy from {source:?} offset={offset:#08x} len={len} cursor={}", self.cursor);

        if self.cursor + len > self.page_size {
            return Err(DiffError::ScriptOverflow {
                cursor: self.cursor,
                len,
                page_size: self.page_size,
            });
        }
        let dst = &mut self.scratch[self.cursor..self.cursor + len];
        match source {
            CopySource::Ram => dst.copy_from_slice(self.window.slice(offset, len)?),
            CopySource::Rom => dst.copy_from_slice(self.rom.slice(offset, len)?),
        }
        self.cursor += len;
        Ok(())
    }
}
