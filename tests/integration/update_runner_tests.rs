//! Update runner and streaming fetcher against simulation adapters.

use ota_basic::adapters::http_source::HttpImageSource;
use ota_basic::adapters::ota_partition::{OtaPartition, SlotState};
use ota_basic::app::events::AppEvent;
use ota_basic::app::ports::FirmwareFetcher;
use ota_basic::config::{OtaRequest, TaskConfig};
use ota_basic::drivers::task_pin::Core;
use ota_basic::ota::job::UpdateJob;
use ota_basic::ota::runner::{UpdateRunner, UpdateState};
use ota_basic::ota::stream::StreamingFetcher;
use ota_basic::ota::{OtaError, UpdateOutcome};

use crate::mock_ports::{CountingSystem, RecordingSink, ScriptedFetcher};

fn request() -> OtaRequest {
    OtaRequest::new("http://192.168.1.10:8000/firmware.bin").unwrap()
}

#[test]
fn second_attempt_is_refused_without_fetching() {
    let fetcher = ScriptedFetcher::failing(OtaError::HttpStatus(500));
    let sink = RecordingSink::default();
    let mut runner = UpdateRunner::new(request(), fetcher.clone(), CountingSystem::default(), sink.clone());

    assert_eq!(
        runner.attempt(),
        UpdateOutcome::Failed(OtaError::HttpStatus(500))
    );
    assert_eq!(runner.state(), UpdateState::Failed);
    assert_eq!(
        runner.attempt(),
        UpdateOutcome::Failed(OtaError::AlreadyAttempted)
    );
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(sink.count(|e| *e == AppEvent::UpdateStarted), 1);
}

#[test]
fn finish_after_failure_does_not_restart() {
    let system = CountingSystem::default();
    let mut runner = UpdateRunner::new(
        request(),
        ScriptedFetcher::failing(OtaError::Transport),
        system.clone(),
        RecordingSink::default(),
    );
    runner.attempt();
    runner.finish();
    assert_eq!(system.restarts(), 0);
}

#[test]
fn finish_without_attempt_does_not_restart() {
    let system = CountingSystem::default();
    let runner = UpdateRunner::new(
        request(),
        ScriptedFetcher::succeeding(1),
        system.clone(),
        RecordingSink::default(),
    );
    runner.finish();
    assert_eq!(system.restarts(), 0);
}

#[test]
fn job_on_pro_core_reports_outcome() {
    let system = CountingSystem::default();
    let runner = UpdateRunner::new(
        request(),
        ScriptedFetcher::succeeding(77),
        system.clone(),
        RecordingSink::default(),
    );
    let task = TaskConfig {
        core: Core::Pro,
        ..TaskConfig::default()
    };
    let mut job = UpdateJob::spawn(runner, &task).unwrap();
    assert!(job.wait().is_success());
    assert!(job.join().is_success());
    assert_eq!(system.restarts(), 1);
}

// ── Streaming fetcher over simulation adapters ────────────────

#[test]
fn digest_mismatch_aborts_the_slot() {
    let body = vec![0x11u8; 5000];
    let mut fetcher = StreamingFetcher::new(HttpImageSource::serving(body), OtaPartition::new());
    let req = request().with_expected_sha256([0u8; 32]);

    assert_eq!(fetcher.fetch_and_flash(&req), Err(OtaError::DigestMismatch));
    assert_eq!(fetcher.partition().state(), SlotState::Aborted);
}

#[test]
fn matching_digest_marks_slot_bootable() {
    let body: Vec<u8> = (0..5000u32).map(|i| i as u8).collect();
    let digest = hmac_sha256::Hash::hash(&body);
    let mut fetcher =
        StreamingFetcher::new(HttpImageSource::serving(body.clone()), OtaPartition::new());

    let report = fetcher
        .fetch_and_flash(&request().with_expected_sha256(digest))
        .unwrap();
    assert_eq!(report.bytes_written, 5000);
    assert_eq!(fetcher.partition().state(), SlotState::Bootable);
    assert_eq!(fetcher.partition().image(), body.as_slice());
    assert_eq!(
        fetcher.source().requested_url(),
        Some("http://192.168.1.10:8000/firmware.bin")
    );
}

#[test]
fn http_error_never_opens_the_slot() {
    let mut fetcher = StreamingFetcher::new(
        HttpImageSource::serving(vec![1; 10]).with_status(404),
        OtaPartition::new(),
    );
    assert_eq!(
        fetcher.fetch_and_flash(&request()),
        Err(OtaError::HttpStatus(404))
    );
    assert_eq!(fetcher.partition().state(), SlotState::Closed);
}

#[test]
fn success_statuses_other_than_200_are_not_flashed() {
    for status in [201, 204, 206] {
        let mut fetcher = StreamingFetcher::new(
            HttpImageSource::serving(vec![9; 100]).with_status(status),
            OtaPartition::new(),
        );
        assert_eq!(
            fetcher.fetch_and_flash(&request()),
            Err(OtaError::HttpStatus(status)),
            "status {status}"
        );
        assert_eq!(fetcher.partition().state(), SlotState::Closed);
    }
}

#[test]
fn connection_cut_mid_body_aborts_the_slot() {
    // Content-Length says 4096; the connection dies after 3000 bytes.
    let mut fetcher = StreamingFetcher::new(
        HttpImageSource::serving(vec![7; 4096]).failing_after(3000),
        OtaPartition::new(),
    );
    assert_eq!(fetcher.fetch_and_flash(&request()), Err(OtaError::Transport));
    assert_eq!(fetcher.partition().state(), SlotState::Aborted);
}

#[test]
fn oversized_body_without_length_is_capped() {
    let mut fetcher = StreamingFetcher::new(
        HttpImageSource::serving(vec![0; 9000]).without_content_length(),
        OtaPartition::new(),
    );
    let req = request().with_max_image_size(8192);
    assert_eq!(fetcher.fetch_and_flash(&req), Err(OtaError::ImageTooLarge));
    assert_eq!(fetcher.partition().state(), SlotState::Aborted);
}

#[test]
fn finalize_failure_is_reported() {
    let mut fetcher = StreamingFetcher::new(
        HttpImageSource::serving(vec![3; 100]),
        OtaPartition::new().failing_finalize(OtaError::VerifyFailed),
    );
    assert_eq!(fetcher.fetch_and_flash(&request()), Err(OtaError::VerifyFailed));
    assert_ne!(fetcher.partition().state(), SlotState::Bootable);
}
