use fwdelta::image::{FILL_ERASED, Image};
use fwdelta::script::{DiffEncoder, EditOp, OpIterator, ScriptDecoder, MIN_MATCH};
use proptest::prelude::*;

fn init_trace() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn encode(old: &[u8], new: &[u8], page_size: usize) -> Vec<Vec<u8>> {
    init_trace();
    let mut pages = Vec::new();
    DiffEncoder::new(
        Image::from_bytes(old.to_vec()),
        Image::from_bytes(new.to_vec()),
        page_size,
    )
    .run(&mut |script: &[u8], _: u32| {
        pages.push(script.to_vec());
        Ok(())
    })
    .unwrap();
    pages
}

fn decode(old: &[u8], pages: &[Vec<u8>], page_size: usize, target_len: usize) -> Vec<u8> {
    let rom = Image::from_bytes(old.to_vec()).normalized_to(target_len, FILL_ERASED);
    let mut out = Vec::new();
    let mut dec = ScriptDecoder::new(rom, page_size, |page: &[u8]| {
        out.extend_from_slice(page);
    });
    for script in pages {
        dec.push_script(script).unwrap();
        dec.page_completed().unwrap();
    }
    drop(dec);
    out.truncate(target_len);
    out
}

proptest! {
    #[test]
    fn prop_encode_decode_roundtrip(
        old in proptest::collection::vec(any::<u8>(), 0..512),
        new in proptest::collection::vec(any::<u8>(), 0..512),
        page_size in prop_oneof![Just(32usize), Just(64), Just(128), Just(256)],
    ) {
        let pages = encode(&old, &new, page_size);
        let decoded = decode(&old, &pages, page_size, new.len());
        prop_assert_eq!(decoded, new);
    }

    // Low-entropy inputs so the encoder actually emits COPY operations.
    #[test]
    fn prop_copies_are_economical_and_page_confined(
        old in proptest::collection::vec(0u8..4, 64..512),
        new in proptest::collection::vec(0u8..4, 64..512),
        page_size in prop_oneof![Just(32usize), Just(64), Just(128)],
    ) {
        for script in encode(&old, &new, page_size) {
            let mut cursor = 0usize;
            for op in OpIterator::new(&script) {
                match op.unwrap() {
                    EditOp::Raw(bytes) => cursor += bytes.len(),
                    EditOp::Copy { len, .. } => {
                        prop_assert!(len >= MIN_MATCH);
                        prop_assert!(cursor + len <= page_size);
                        cursor += len;
                    }
                }
            }
            prop_assert!(cursor <= page_size);
        }
    }

    #[test]
    fn prop_blank_device_scripts_are_one_raw_op_per_page(
        // no 0xFF bytes, so nothing can match the erased reference image
        new in proptest::collection::vec(0u8..255, 1..512),
    ) {
        let page_size = 64usize;
        let pages = encode(&[], &new, page_size);
        prop_assert_eq!(pages.len(), new.len().div_ceil(page_size));
        let total: usize = pages.iter().map(Vec::len).sum();
        // exactly one RAW op per page, whose header is at most 2 bytes
        prop_assert!(total <= new.len() + pages.len() * 2);
        for script in &pages {
            let ops: Vec<_> = OpIterator::new(script).collect();
            prop_assert_eq!(ops.len(), 1);
        }
    }
}
