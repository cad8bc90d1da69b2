//! Tests for copying frames out of native memory

use h26x_sans_io::{
    extract_frame, write_frame, CodecKind, DecoderError, DecoderModule, LinearMemory,
    MemoryError, NativeMemory, FRAME_HEADER_LEN,
};

use super::support::{feed, init_tracing, SyntheticDecoder};

#[test]
fn test_extract_4x2_rgba_frame() {
    let mut mem = LinearMemory::new(4096);
    let pixels: Vec<u8> = (0..32).map(|i| i * 3).collect();
    let addr = write_frame(&mut mem, 4, 2, &pixels).unwrap();

    // The packed header is width then height, little-endian.
    let mut header = [0u8; FRAME_HEADER_LEN];
    mem.read(addr, &mut header).unwrap();
    assert_eq!(header, [4, 0, 0, 0, 2, 0, 0, 0]);

    let frame = extract_frame(&mut mem, addr).unwrap();
    assert_eq!((frame.width, frame.height), (4, 2));
    assert_eq!(frame.data.len(), 32);
    assert_eq!(frame.data, pixels);
    assert_eq!(frame.pixel(1, 1), Some([60, 63, 66, 69]));
}

#[test]
fn test_native_allocation_freed_exactly_once() {
    let mut mem = LinearMemory::new(4096);
    let addr = write_frame(&mut mem, 2, 2, &[7; 16]).unwrap();
    assert!(mem.is_allocated(addr));

    extract_frame(&mut mem, addr).unwrap();
    assert!(!mem.is_allocated(addr));

    // A second extraction would be a double free.
    let err = extract_frame(&mut mem, addr).unwrap_err();
    assert_eq!(err, DecoderError::Memory(MemoryError::InvalidFree(addr)));
}

#[test]
fn test_session_frames_leave_no_native_allocations() {
    init_tracing();
    let native = SyntheticDecoder::new().with_header_len(8).with_frame_bytes(16);
    let module = DecoderModule::new(native);
    let mut decoder = module.create_decoder(CodecKind::H264).unwrap();
    let data: Vec<u8> = (0..128u8).collect();

    let frames = feed(&mut decoder, &data, 12);

    assert_eq!(frames.len(), 8);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!((frame.width, frame.height), (4, 2));
        assert!(frame.data.iter().all(|&b| b == i as u8), "frame {i} has wrong pixels");
    }
    assert_eq!(module.native().memory.live_allocations(), 0);
}

#[test]
fn test_frames_returned_in_decode_order() {
    init_tracing();
    let module = DecoderModule::new(SyntheticDecoder::new().with_header_len(1).with_frame_bytes(4));
    let mut decoder = module.create_decoder(CodecKind::H265).unwrap();

    decoder.put(&[0; 12]).unwrap();
    let first = decoder.get().unwrap().unwrap();
    let second = decoder.get().unwrap().unwrap();
    let third = decoder.get().unwrap().unwrap();

    assert_eq!(first.data[0], 0);
    assert_eq!(second.data[0], 1);
    assert_eq!(third.data[0], 2);
    assert_eq!(decoder.get().unwrap(), None);
}
