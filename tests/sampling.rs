//! End-to-end sampling tests.
//!
//! Tests that decode real media are guarded on the fixture files produced by
//! `tests/fixtures/generate_fixtures.sh` (a 30 s and a 20 s test pattern)
//! and skip silently when they are absent.

use std::path::Path;
use std::time::Duration;

use stepframe::{
    DEFAULT_SELECTION, FailurePolicy, FrameSampler, OFFSET_SCHEDULE, SampleRequest,
    SamplerOptions, StepframeError, VideoSource,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video_30s.mp4"
}

fn short_video_path() -> &'static str {
    "tests/fixtures/sample_video_20s.mp4"
}

#[test]
fn sample_returns_three_ordered_candidates() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = VideoSource::from_path(path);
    let request = SampleRequest::new(source, 10.0).expect("valid request");
    let set = FrameSampler::new().sample(&request).expect("sample failed");

    assert_eq!(set.len(), 3);
    assert!(set.is_complete());
    assert_eq!(set.default_selection(), DEFAULT_SELECTION);

    let offsets: Vec<f64> = set.frames().iter().map(|f| f.offset_seconds()).collect();
    assert_eq!(offsets, OFFSET_SCHEDULE.to_vec());

    let seeks: Vec<f64> = set.frames().iter().map(|f| f.seek_seconds()).collect();
    assert_eq!(seeks, vec![8.5, 10.0, 11.5]);
}

#[test]
fn early_seek_clamps_to_zero() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = VideoSource::from_path(path);
    let request = SampleRequest::new(source, 0.5).expect("valid request");
    let set = FrameSampler::new().sample(&request).expect("sample failed");

    let seeks: Vec<f64> = set.frames().iter().map(|f| f.seek_seconds()).collect();
    assert_eq!(seeks, vec![0.0, 0.5, 2.0]);
}

#[test]
fn target_beyond_duration_resolves_to_final_frame() {
    let path = short_video_path();
    if !Path::new(path).exists() {
        return;
    }

    // 100 s target on a 20 s video: all three seeks drain to the end.
    let source = VideoSource::from_path(path);
    let request = SampleRequest::new(source, 100.0).expect("valid request");
    let set = FrameSampler::new().sample(&request).expect("sample failed");

    assert_eq!(set.len(), 3);
    let seeks: Vec<f64> = set.frames().iter().map(|f| f.seek_seconds()).collect();
    assert_eq!(seeks, vec![98.5, 100.0, 101.5]);
}

#[test]
fn repeated_sampling_is_structurally_idempotent() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = VideoSource::from_path(path);
    let sampler = FrameSampler::new();

    let first = sampler
        .sample(&SampleRequest::new(source.clone(), 6.0).expect("valid request"))
        .expect("first sample");
    let second = sampler
        .sample(&SampleRequest::new(source, 6.0).expect("valid request"))
        .expect("second sample");

    // Same decode, same encode settings: structure must match even if the
    // encoder is not byte-deterministic.
    assert_eq!(first.len(), second.len());
    for (a, b) in first.frames().iter().zip(second.frames()) {
        assert_eq!(a.offset_seconds(), b.offset_seconds());
        assert_eq!(a.seek_seconds(), b.seek_seconds());
        assert_eq!(a.still().width(), b.still().width());
        assert_eq!(a.still().height(), b.still().height());
    }
}

#[test]
fn stills_are_jpeg_at_native_resolution() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = VideoSource::from_path(path);
    let metadata = FrameSampler::new().probe(&source).expect("probe failed");

    let request = SampleRequest::new(source, 3.0).expect("valid request");
    let set = FrameSampler::new().sample(&request).expect("sample failed");

    for frame in set.frames() {
        assert_eq!(frame.still().width(), metadata.video.width);
        assert_eq!(frame.still().height(), metadata.video.height);
        assert_eq!(&frame.still().bytes()[..2], &[0xFF, 0xD8]);
    }
}

#[test]
fn in_memory_source_samples_like_a_file() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let bytes = std::fs::read(path).expect("read fixture");
    let source = VideoSource::from_bytes(bytes, "video/mp4");
    let request = SampleRequest::new(source, 10.0).expect("valid request");
    let set = FrameSampler::new().sample(&request).expect("sample failed");
    assert_eq!(set.len(), 3);
}

#[test]
fn probe_reports_container_metadata() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = VideoSource::from_path(path);
    let metadata = FrameSampler::new().probe(&source).expect("probe failed");

    assert!(metadata.video.width > 0);
    assert!(metadata.video.height > 0);
    assert!(metadata.video.frames_per_second > 0.0);
    assert!(metadata.duration.as_secs_f64() > 25.0);
}

#[test]
fn expired_seek_bound_aborts_the_sample() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    // A zero bound elapses before the first seek can settle; under the
    // default Abort policy that fails the whole sample.
    let sampler =
        FrameSampler::with_options(SamplerOptions::new().with_seek_timeout(Duration::ZERO));
    let source = VideoSource::from_path(path);
    let request = SampleRequest::new(source, 10.0).expect("valid request");

    assert!(matches!(
        sampler.sample(&request),
        Err(StepframeError::SeekTimeout { .. })
    ));
}

#[test]
fn partial_policy_with_no_frames_still_errors() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    // Partial skips failed offsets, but when every offset times out there
    // is nothing to show and the last error comes back.
    let sampler = FrameSampler::with_options(
        SamplerOptions::new()
            .with_seek_timeout(Duration::ZERO)
            .with_failure_policy(FailurePolicy::Partial),
    );
    let source = VideoSource::from_path(path);
    let request = SampleRequest::new(source, 10.0).expect("valid request");

    assert!(matches!(
        sampler.sample(&request),
        Err(StepframeError::SeekTimeout { .. })
    ));
}

#[test]
fn partial_policy_keeps_complete_sets_complete() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    // Opting into Partial must not change the outcome on healthy media.
    let sampler = FrameSampler::with_options(
        SamplerOptions::new().with_failure_policy(FailurePolicy::Partial),
    );
    let source = VideoSource::from_path(path);
    let request = SampleRequest::new(source, 10.0).expect("valid request");
    let set = sampler.sample(&request).expect("sample failed");

    assert_eq!(set.len(), 3);
    assert!(set.is_complete());
}

#[test]
fn cancelled_token_stops_sampling() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let token = stepframe::CancellationToken::new();
    token.cancel();

    let sampler =
        FrameSampler::with_options(SamplerOptions::new().with_cancellation(token));
    let source = VideoSource::from_path(path);
    let request = SampleRequest::new(source, 5.0).expect("valid request");

    assert!(matches!(
        sampler.sample(&request),
        Err(stepframe::StepframeError::Cancelled)
    ));
}
