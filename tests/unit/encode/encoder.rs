use super::*;

fn cfg(width: u32, height: u32, format: ExportFormat) -> EncoderConfig {
    EncoderConfig {
        width,
        height,
        fps: Fps::whole(30).unwrap(),
        bitrate_bps: 2_500_000,
        format,
    }
}

fn frame(width: u32, height: u32, v: u8) -> FrameRGBA {
    FrameRGBA {
        width,
        height,
        data: [v, v, v, 255].repeat((width * height) as usize),
        premultiplied: true,
    }
}

#[test]
fn config_validation_catches_bad_values() {
    assert!(cfg(0, 10, ExportFormat::Mp4).validate().is_err());
    assert!(cfg(11, 10, ExportFormat::Mp4).validate().is_err());
    assert!(cfg(11, 10, ExportFormat::Gif).validate().is_ok());
    assert!(
        EncoderConfig {
            bitrate_bps: 0,
            ..cfg(10, 10, ExportFormat::WebM)
        }
        .validate()
        .is_err()
    );
    assert_eq!(cfg(4, 2, ExportFormat::Mp4).frame_len(), 32);
}

#[test]
fn in_memory_encoder_cuts_chunks_per_timeslice() {
    let mut enc = InMemoryEncoder::new(2);
    let log = enc.log();
    enc.begin(&cfg(4, 2, ExportFormat::Mp4)).unwrap();

    enc.push_frame(FrameIndex(0), &frame(4, 2, 1)).unwrap();
    assert!(enc.poll_chunks().unwrap().is_empty());
    enc.push_frame(FrameIndex(1), &frame(4, 2, 2)).unwrap();
    let first = enc.poll_chunks().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].seq, 0);
    assert!(first[0].bytes.starts_with(b"BDRPmp4"));

    enc.push_frame(FrameIndex(2), &frame(4, 2, 3)).unwrap();
    let rest = enc.finish().unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].seq, 1);
    assert_eq!(rest[0].bytes.len(), 8);

    let log = log.lock().unwrap();
    assert_eq!(log.frame_sizes, vec![(4, 2); 3]);
    assert!(log.finished);
    assert!(!log.aborted);
}

#[test]
fn in_memory_encoder_rejects_misuse() {
    let mut enc = InMemoryEncoder::default();
    assert!(enc.push_frame(FrameIndex(0), &frame(2, 2, 0)).is_err());
    assert!(enc.finish().is_err());

    enc.begin(&cfg(2, 2, ExportFormat::Mp4)).unwrap();
    assert!(enc.begin(&cfg(2, 2, ExportFormat::Mp4)).is_err());
    let err = enc.push_frame(FrameIndex(0), &frame(4, 2, 0)).unwrap_err();
    assert!(matches!(err, BackdropError::Encoding(_)));
}

#[test]
fn closures_act_as_encoder_factories() {
    let factory = || -> BackdropResult<Box<dyn StreamEncoder>> {
        Ok(Box::new(InMemoryEncoder::default()))
    };
    let mut enc = EncoderFactory::create(&factory).unwrap();
    enc.begin(&cfg(2, 2, ExportFormat::Mov)).unwrap();
    enc.abort();
}
