#![no_main]

use libfuzzer_sys::fuzz_target;
use tpad_core::decoder::{SeqEvent, SequenceDecoder};

fuzz_target!(|data: &[u8]| {
    // Batch decode.
    let mut batch_decoder = SequenceDecoder::new();
    let mut batch = Vec::new();
    batch_decoder.feed_all(data, &mut batch);

    // Byte-at-a-time decode, the way the driver actually feeds it.
    let mut decoder = SequenceDecoder::new();
    let mut incremental: Vec<SeqEvent> = Vec::new();
    let mut step = Vec::new();
    for &byte in data {
        step.clear();
        decoder.feed(byte, &mut step);
        incremental.extend(step.iter().cloned());
    }

    assert_eq!(batch, incremental, "batch and incremental decoding diverged");

    // Resolving a (possibly absent) pending escape must never panic.
    decoder.resolve_escape(&mut incremental);
});
