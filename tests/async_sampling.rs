//! Async sampling and supersession tests (feature = "async").
#![cfg(feature = "async")]

use std::path::Path;
use std::sync::Arc;

use stepframe::{
    FrameSampler, SampleRequest, SampleSession, StepframeError, VideoSource, spawn_sample,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video_30s.mp4"
}

#[tokio::test(flavor = "multi_thread")]
async fn spawned_sample_commits_into_the_session() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let session = Arc::new(SampleSession::new());
    let source = VideoSource::from_path(path);
    let request = SampleRequest::new(source, 10.0).expect("valid request");

    spawn_sample(session.clone(), FrameSampler::new(), request)
        .await
        .expect("sample and commit");

    let state = session.displayed().expect("committed state");
    assert_eq!(state.set().len(), 3);
    assert_eq!(state.selection(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn later_request_supersedes_an_unfinished_one() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let session = Arc::new(SampleSession::new());
    let source = VideoSource::from_path(path);

    // Start A, then issue B before awaiting A's completion.
    let request_a = SampleRequest::new(source.clone(), 5.0).expect("valid request");
    let a = tokio::spawn(spawn_sample(
        session.clone(),
        FrameSampler::new(),
        request_a,
    ));
    // B begins a newer generation; whichever order decoding finishes in,
    // only the latest generation may land.
    let request_b = SampleRequest::new(source, 15.0).expect("valid request");
    let b = spawn_sample(session.clone(), FrameSampler::new(), request_b).await;

    let a = a.await.expect("join");

    // The generations race, so either task may have begun last; the
    // contract is only that the displayed state belongs to the latest
    // generation and the stale one reports `Superseded`.
    let state = session.displayed().expect("state");
    match (a, b) {
        (Err(StepframeError::Superseded { .. }), Ok(())) => {
            assert_eq!(state.set().target_seconds(), 15.0);
        }
        (Ok(()), Err(StepframeError::Superseded { .. })) => {
            assert_eq!(state.set().target_seconds(), 5.0);
        }
        // The two requests did not overlap at all; whichever began last
        // holds the display.
        (Ok(()), Ok(())) => {
            assert!([5.0, 15.0].contains(&state.set().target_seconds()));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}
