//! Tests for the stream bootstrap handshake through a decoder session

use h26x_sans_io::{CodecKind, DecoderModule};

use super::support::{feed, init_tracing, SyntheticDecoder};

fn stream(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

#[test]
fn test_get_before_put_is_not_ready() {
    init_tracing();
    let module = DecoderModule::new(SyntheticDecoder::new());
    let mut decoder = module.create_decoder(CodecKind::H264).unwrap();

    assert_eq!(decoder.get().unwrap(), None);
    assert!(!decoder.stream_info_ready());
    assert_eq!(module.native().first_context().scans, vec![Vec::<u8>::new()]);
}

#[test]
fn test_second_scan_sees_first_scan_bytes_again() {
    init_tracing();
    let module = DecoderModule::new(SyntheticDecoder::new().with_header_len(16));
    let mut decoder = module.create_decoder(CodecKind::H264).unwrap();
    let data = stream(20);

    decoder.put(&data[..10]).unwrap();
    assert_eq!(decoder.get().unwrap(), None);
    assert!(!decoder.stream_info_ready());

    decoder.put(&data[10..]).unwrap();
    assert_eq!(decoder.get().unwrap(), None);
    assert!(decoder.stream_info_ready());

    let native = module.native();
    let ctx = native.first_context();
    assert_eq!(ctx.scans.len(), 2);
    assert_eq!(ctx.scans[0], &data[..10]);
    assert_eq!(ctx.scans[1], data);
    // The first decode starts from byte 0.
    assert_eq!(ctx.decoded, data);
}

#[test]
fn test_module_ready_on_first_query_replays_held_bytes() {
    init_tracing();
    let module = DecoderModule::new(SyntheticDecoder::new().with_header_len(16));
    let mut decoder = module.create_decoder(CodecKind::H264).unwrap();
    let data = stream(30);

    decoder.put(&data[..10]).unwrap();
    assert_eq!(decoder.get().unwrap(), None);
    assert!(!decoder.stream_info_ready());

    // The module finishes parsing on its own, so the next query succeeds
    // without another scan.
    module.native_mut().contexts.get_mut(&1).unwrap().ready = true;
    decoder.put(&data[10..]).unwrap();
    assert_eq!(decoder.get().unwrap(), None);
    assert!(decoder.stream_info_ready());

    let native = module.native();
    let ctx = native.first_context();
    assert_eq!(ctx.scans.len(), 1);
    assert_eq!(ctx.decoded, data);
    assert_eq!(decoder.consumed_bytes(), 10 + 30);
}

#[test]
fn test_every_byte_decoded_exactly_once() {
    init_tracing();
    let native = SyntheticDecoder::new().with_header_len(16).with_frame_bytes(64);
    let module = DecoderModule::new(native);
    let mut decoder = module.create_decoder(CodecKind::H265).unwrap();
    let data = stream(200);

    let frames = feed(&mut decoder, &data, 5);

    assert_eq!(frames.len(), 3);
    assert_eq!(decoder.frames_decoded(), 3);
    let native = module.native();
    let ctx = native.first_context();
    assert_eq!(ctx.decoded, data);
    let scan_lens: Vec<usize> = ctx.scans.iter().map(Vec::len).collect();
    assert_eq!(scan_lens, vec![5, 10, 15, 20]);
}

#[test]
fn test_no_replay_after_resolution() {
    init_tracing();
    let module = DecoderModule::new(SyntheticDecoder::new().with_header_len(16));
    let mut decoder = module.create_decoder(CodecKind::H264).unwrap();
    let data = stream(200);

    feed(&mut decoder, &data, 5);

    // Scans replay 5 + 10 + 15 + 20 bytes; after that each byte is pulled once.
    assert_eq!(decoder.consumed_bytes(), 50 + 200);
    assert_eq!(decoder.queued_bytes(), 0);
}

#[test]
fn test_single_scan_when_header_arrives_at_once() {
    init_tracing();
    let module = DecoderModule::new(SyntheticDecoder::new().with_header_len(4));
    let mut decoder = module.create_decoder(CodecKind::H264).unwrap();
    let data = stream(100);

    decoder.put(&data).unwrap();
    let mut frames = 0;
    while decoder.get().unwrap().is_some() {
        frames += 1;
    }

    assert_eq!(frames, 1);
    let native = module.native();
    let ctx = native.first_context();
    assert_eq!(ctx.scans.len(), 1);
    assert_eq!(ctx.scans[0], data);
    assert_eq!(ctx.decoded, data);
}
