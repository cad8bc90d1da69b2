//! Tests for the native log threshold and forwarding into tracing

use std::io;
use std::sync::{Arc, Mutex};

use h26x_sans_io::{DecoderError, DecoderModule, LogLevel, NATIVE_LOG_TARGET};

use super::support::SyntheticDecoder;

/// In-memory tracing writer.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that records everything it is given.
fn capture(f: impl FnOnce()) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    captured.text()
}

#[test]
fn test_logging_starts_disabled() {
    let module = DecoderModule::new(SyntheticDecoder::new());
    assert_eq!(module.log_level(), None);
    assert!(!module.forward_native_log(LogLevel::Panic.as_i32(), "dropped"));
}

#[test]
fn test_set_log_level_enables_native_logging() {
    let module = DecoderModule::new(SyntheticDecoder::new());
    module.set_log_level("debug").unwrap();

    assert_eq!(module.log_level(), Some(LogLevel::Debug));
    assert_eq!(module.native().log_calls, vec![Some(LogLevel::Debug)]);
}

#[test]
fn test_quiet_disables_native_logging() {
    let module = DecoderModule::new(SyntheticDecoder::new());
    module.set_log_level("info").unwrap();
    module.set_log_level("quiet").unwrap();

    assert_eq!(module.log_level(), None);
    assert_eq!(module.native().log_calls, vec![Some(LogLevel::Info), None]);
}

#[test]
fn test_unknown_level_changes_nothing() {
    let module = DecoderModule::new(SyntheticDecoder::new());
    module.set_log_level("warning").unwrap();

    let err = module.set_log_level("chatty").unwrap_err();
    assert_eq!(err, DecoderError::UnknownLogLevel("chatty".to_string()));
    assert_eq!(module.log_level(), Some(LogLevel::Warning));
    assert_eq!(module.native().log_calls.len(), 1);
}

#[test]
fn test_set_log_level_while_borrowed_is_busy() {
    let module = DecoderModule::new(SyntheticDecoder::new());
    let held = module.native();

    assert_eq!(module.set_log_level("debug"), Err(DecoderError::Busy));
    assert_eq!(module.log_level(), None);
    drop(held);

    module.set_log_level("debug").unwrap();
    assert_eq!(module.log_level(), Some(LogLevel::Debug));
}

#[test]
fn test_threshold_filters_forwarded_lines() {
    let module = DecoderModule::new(SyntheticDecoder::new());
    module.set_log_level("warning").unwrap();

    assert!(module.forward_native_log(LogLevel::Error.as_i32(), "bad"));
    assert!(module.forward_native_log(LogLevel::Warning.as_i32(), "meh"));
    assert!(!module.forward_native_log(LogLevel::Info.as_i32(), "fyi"));
    assert!(!module.forward_native_log(LogLevel::Trace.as_i32(), "noise"));
}

#[test]
fn test_forwarded_line_is_tagged() {
    let module = DecoderModule::new(SyntheticDecoder::new());
    module.set_log_level("trace").unwrap();

    let out = capture(|| {
        module.forward_native_log(LogLevel::Error.as_i32(), "no frame header\n");
        module.forward_native_log(LogLevel::Warning.as_i32(), "concealing errors");
        module.forward_native_log(LogLevel::Debug.as_i32(), "nal unit 7");
    });

    assert!(out.contains(NATIVE_LOG_TARGET));
    assert!(out.contains("[err] no frame header"));
    assert!(out.contains("[warn] concealing errors"));
    assert!(out.contains("[debug] nal unit 7"));
    assert!(!out.contains("header\n\n"));
}

#[test]
fn test_filtered_line_not_emitted() {
    let module = DecoderModule::new(SyntheticDecoder::new());
    module.set_log_level("error").unwrap();

    let out = capture(|| {
        module.forward_native_log(LogLevel::Info.as_i32(), "should not appear");
    });
    assert!(!out.contains("should not appear"));
}
