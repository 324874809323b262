// End-to-end tests for the edit-script codec.
//
// These drive the encoder exactly the way an update run would (one
// transmitter call per page) and replay every script through the decoder
// state machine seeded with the same reference image, byte by byte, the
// way telegrams arrive on the device.

use fwdelta::image::{FILL_ERASED, Image};
use fwdelta::script::{CopySource, DiffEncoder, EditOp, OpIterator, ScriptDecoder, MIN_MATCH};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

// ===========================================================================
// Helpers
// ===========================================================================

/// Route encoder/decoder trace output through `RUST_LOG` during test runs.
fn init_trace() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Run the encoder, collecting each page's script and checksum.
fn encode_pages(old: &[u8], new: &[u8], page_size: usize) -> Vec<(Vec<u8>, u32)> {
    init_trace();
    let mut pages = Vec::new();
    DiffEncoder::new(
        Image::from_bytes(old.to_vec()),
        Image::from_bytes(new.to_vec()),
        page_size,
    )
    .run(&mut |script: &[u8], crc: u32| {
        pages.push((script.to_vec(), crc));
        Ok(())
    })
    .unwrap();
    pages
}

/// Replay page scripts through the decoder and return the reconstruction,
/// truncated to `target_len`.
fn decode_pages(
    old: &[u8],
    pages: &[(Vec<u8>, u32)],
    page_size: usize,
    target_len: usize,
) -> Vec<u8> {
    let rom = Image::from_bytes(old.to_vec()).normalized_to(target_len, FILL_ERASED);
    let mut out = Vec::new();
    {
        let mut dec = ScriptDecoder::new(rom, page_size, |page: &[u8]| {
            out.extend_from_slice(page);
        });
        for (script, _) in pages {
            for &b in script {
                dec.push_byte(b).unwrap();
            }
            dec.page_completed().unwrap();
        }
        assert_eq!(dec.pages_completed(), pages.len());
    }
    out.truncate(target_len);
    out
}

fn assert_roundtrip(old: &[u8], new: &[u8], page_size: usize) -> Vec<(Vec<u8>, u32)> {
    let pages = encode_pages(old, new, page_size);
    let got = decode_pages(old, &pages, page_size, new.len());
    assert_eq!(got, new, "roundtrip mismatch");
    pages
}

fn page_ops(script: &[u8]) -> Vec<EditOp<'_>> {
    OpIterator::new(script).map(|op| op.unwrap()).collect()
}

fn random_bytes(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let mut v = vec![0u8; len];
    rng.fill_bytes(&mut v);
    v
}

// ===========================================================================
// Update scenarios
// ===========================================================================

#[test]
fn mostly_equal_images_compress_to_copies_plus_raw_tail() {
    let old = vec![0xAA; 512];
    let mut new = vec![0xAA; 500];
    new.extend_from_slice(&[0xBB; 12]);

    let pages = assert_roundtrip(&old, &new, 256);
    assert_eq!(pages.len(), 2);

    // First page: one COPY spanning the whole page, confined to it.
    let ops = page_ops(&pages[0].0);
    assert_eq!(
        ops,
        vec![EditOp::Copy {
            source: CopySource::Rom,
            offset: 0,
            len: 256
        }]
    );

    // Second page: one COPY for the matching 244 bytes, then the 0xBB tail
    // as literals. The superseded first page ties with the reference image
    // and the tie goes to the RAM window.
    let ops = page_ops(&pages[1].0);
    assert_eq!(ops.len(), 2);
    assert!(matches!(
        ops[0],
        EditOp::Copy {
            source: CopySource::Ram,
            len: 244,
            ..
        }
    ));
    assert_eq!(ops[1], EditOp::Raw(&[0xBB; 12]));
}

#[test]
fn blank_device_yields_raw_only_scripts() {
    let old = vec![0xFF; 600];
    let new: Vec<u8> = (0..600).map(|i| (i % 251) as u8).collect();

    let pages = assert_roundtrip(&old, &new, 256);
    assert_eq!(pages.len(), 3); // 256 + 256 + 88

    for (script, _) in &pages {
        for op in page_ops(script) {
            assert!(matches!(op, EditOp::Raw(_)), "expected RAW only, got {op:?}");
        }
    }
}

#[test]
fn page_checksums_cover_the_target_page() {
    let old = vec![0xFF; 520];
    let new: Vec<u8> = (0..520).map(|i| (i as u8).wrapping_mul(31)).collect();
    let pages = encode_pages(&old, &new, 256);
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].1, crc32fast::hash(&new[0..256]));
    assert_eq!(pages[1].1, crc32fast::hash(&new[256..512]));
    // final partial page: CRC over the remaining 8 bytes only
    assert_eq!(pages[2].1, crc32fast::hash(&new[512..520]));
}

#[test]
fn equal_length_tie_selects_the_ram_window() {
    // Pattern P appears in the reference image both inside page 1 (which
    // ends up in the supersede window) and inside page 2 (still ROM when
    // page 2 is encoded), with the same match length: the RAM candidate
    // must win.
    let p = [1u8, 2, 3, 4, 5, 6];
    let mut old = Vec::new();
    old.extend_from_slice(&p);
    old.extend_from_slice(&[90, 91]);
    old.extend_from_slice(&p);
    old.extend_from_slice(&[92, 93]);

    let mut new = vec![10, 11, 12, 13, 14, 15, 16, 17];
    new.extend_from_slice(&p);
    new.extend_from_slice(&[99, 98]);

    let pages = assert_roundtrip(&old, &new, 8);
    assert_eq!(pages.len(), 2);

    let ops = page_ops(&pages[1].0);
    assert_eq!(
        ops[0],
        EditOp::Copy {
            source: CopySource::Ram,
            offset: 0,
            len: 6
        }
    );
}

// ===========================================================================
// Header forms
// ===========================================================================

#[test]
fn raw_of_63_bytes_uses_the_short_header() {
    let new: Vec<u8> = (0..63).collect();
    let pages = assert_roundtrip(&[], &new, 256);
    assert_eq!(pages.len(), 1);
    let script = &pages[0].0;
    assert_eq!(script.len(), 1 + 63);
    assert_eq!(script[0], 63);
}

#[test]
fn raw_of_64_bytes_uses_the_long_header() {
    let new: Vec<u8> = (0..64).collect();
    let pages = assert_roundtrip(&[], &new, 256);
    assert_eq!(pages.len(), 1);
    let script = &pages[0].0;
    assert_eq!(script.len(), 2 + 64);
    assert_eq!(script[0], 0x40); // RAW | LONG, high length bits zero
    assert_eq!(script[1], 64);
}

// ===========================================================================
// Invariants over random images
// ===========================================================================

#[test]
fn copy_ops_respect_min_match_and_page_confinement() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    // low-entropy bytes so COPY candidates actually occur
    let old: Vec<u8> = random_bytes(&mut rng, 1024)
        .iter()
        .map(|b| b % 8)
        .collect();
    let new: Vec<u8> = random_bytes(&mut rng, 1024)
        .iter()
        .map(|b| b % 8)
        .collect();
    let page_size = 128;

    let pages = assert_roundtrip(&old, &new, page_size);
    let mut saw_copy = false;
    for (script, _) in &pages {
        let mut cursor = 0usize; // destination offset within the page
        for op in page_ops(script) {
            match op {
                EditOp::Raw(bytes) => cursor += bytes.len(),
                EditOp::Copy { len, .. } => {
                    saw_copy = true;
                    assert!(len >= MIN_MATCH, "COPY of {len} below minimum");
                    assert!(
                        cursor + len <= page_size,
                        "COPY crosses the destination page boundary"
                    );
                    cursor += len;
                }
            }
        }
        assert!(cursor <= page_size);
    }
    assert!(saw_copy, "test inputs produced no COPY at all");
}

#[test]
fn roundtrip_across_length_combinations() {
    let mut rng = StdRng::seed_from_u64(42);
    let cases = [
        (300usize, 700usize), // old shorter, padded with 0xFF
        (700, 300),           // old longer, truncated
        (512, 512),           // equal, page aligned
        (500, 500),           // equal, trailing partial page
        (0, 256),             // no old image at all
        (256, 0),             // empty target
    ];
    for (old_len, new_len) in cases {
        let old = random_bytes(&mut rng, old_len);
        let new = random_bytes(&mut rng, new_len);
        assert_roundtrip(&old, &new, 256);
    }
}

#[test]
fn identical_images_transfer_almost_nothing() {
    let mut rng = StdRng::seed_from_u64(7);
    let image = random_bytes(&mut rng, 1024);
    let pages = assert_roundtrip(&image, &image, 256);
    assert_eq!(pages.len(), 4);
    for (script, _) in &pages {
        // one COPY per page: at most 2 header bytes + 3 address bytes
        assert!(script.len() <= 5, "script unexpectedly large: {script:?}");
    }
}
