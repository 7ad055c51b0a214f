use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use outreach::surface::{FakeDriver, FakeScript};
use outreach::{DelayRange, FailureStage, PairingStatus, SendOrchestrator, SendPhase, SessionState, SessionStore, SurfaceConfig};

const RECIPIENT: &str = "+33600000000";
const MESSAGE: &str = "Hi, we have an opportunity matching your profile (Chef in Paris)!";

fn surface() -> SurfaceConfig {
	SurfaceConfig {
		send_delay: DelayRange::fixed(Duration::ZERO),
		..Default::default()
	}
}

fn orchestrator(driver: &FakeDriver, session: &Path) -> SendOrchestrator {
	SendOrchestrator::new(Arc::new(driver.clone()), SessionStore::new(session), surface())
}

fn seed_session(path: &Path, blob: &[u8]) {
	SessionStore::new(path).save(&SessionState::from_bytes(blob.to_vec())).unwrap();
}

#[tokio::test]
async fn saved_session_takes_fast_path() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");
	seed_session(&session, b"previous");

	let driver = FakeDriver::default();
	let orchestrator = orchestrator(&driver, &session);

	assert!(orchestrator.attempt_send(RECIPIENT, MESSAGE).await);

	let log = driver.log();
	assert_eq!(log.seeded_states, vec![Some(b"previous".to_vec())]);
	assert_eq!(log.enters, 1);
	assert_eq!(log.deep_links(), 1);
	assert_eq!(log.open_contexts(), 0);
	assert!(log.visited[1].starts_with("https://web.whatsapp.com/send?phone=33600000000&text=Hi%2C+we+have"));
	assert_eq!(std::fs::read(&session).unwrap(), b"fake-session");
	assert_eq!(orchestrator.current_phase(), SendPhase::Closed { success: true });
}

#[tokio::test]
async fn first_run_pairs_then_sends() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("nested").join("session.json");

	let driver = FakeDriver::default();
	let orchestrator = orchestrator(&driver, &session);

	let outcome = orchestrator.send(RECIPIENT, MESSAGE).await;
	assert!(outcome.is_delivered(), "{outcome:?}");

	let log = driver.log();
	assert_eq!(log.seeded_states, vec![None]);
	assert_eq!(log.contexts_closed, 1);
	assert_eq!(std::fs::read(&session).unwrap(), b"fake-session");
}

#[tokio::test]
async fn pairing_is_observable_while_awaiting_approval() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");

	let driver = FakeDriver::new(FakeScript {
		auto_approve: false,
		..Default::default()
	});
	let orchestrator = Arc::new(orchestrator(&driver, &session));
	let mut phases = orchestrator.phases();

	let pairing = tokio::spawn({
		let orchestrator = Arc::clone(&orchestrator);
		async move { orchestrator.pair().await }
	});

	phases.wait_for(|phase| phase.is_awaiting_approval()).await.unwrap();
	assert!(!session.exists());

	driver.approve_pairing();
	let status = pairing.await.unwrap().unwrap();

	assert_eq!(status, PairingStatus::Paired);
	assert_eq!(std::fs::read(&session).unwrap(), b"fake-session");
	assert_eq!(driver.log().open_contexts(), 0);
	assert_eq!(driver.log().enters, 0);
}

#[tokio::test]
async fn browser_lost_during_pairing_fails_and_frees_the_handle() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");

	let driver = FakeDriver::new(FakeScript {
		auto_approve: false,
		..Default::default()
	});
	let orchestrator = Arc::new(orchestrator(&driver, &session));
	let mut phases = orchestrator.phases();

	let sending = tokio::spawn({
		let orchestrator = Arc::clone(&orchestrator);
		async move { orchestrator.send(RECIPIENT, MESSAGE).await }
	});

	phases.wait_for(|phase| phase.is_awaiting_approval()).await.unwrap();
	driver.lose_browser("websocket closed");
	let outcome = tokio::time::timeout(Duration::from_secs(5), sending).await.unwrap().unwrap();

	assert!(!outcome.committed());
	assert_eq!(outcome.stage(), Some(FailureStage::Pairing));
	assert!(!session.exists());
	assert_eq!(driver.log().open_contexts(), 0);
	assert_eq!(driver.log().enters, 0);

	driver.set_script(FakeScript::default());
	let retry = tokio::time::timeout(Duration::from_secs(5), orchestrator.send(RECIPIENT, MESSAGE)).await.unwrap();
	assert!(retry.is_delivered(), "{retry:?}");
	assert_eq!(std::fs::read(&session).unwrap(), b"fake-session");
}

#[tokio::test]
async fn paired_session_survives_a_restart() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");

	let driver = FakeDriver::default();
	assert_eq!(orchestrator(&driver, &session).pair().await.unwrap(), PairingStatus::Paired);

	let restarted = FakeDriver::new(FakeScript {
		auto_approve: false,
		..Default::default()
	});
	let fresh = orchestrator(&restarted, &session);
	assert_eq!(fresh.pair().await.unwrap(), PairingStatus::AlreadyAuthenticated);
	assert!(fresh.attempt_send(RECIPIENT, MESSAGE).await);
	assert_eq!(restarted.log().seeded_states, vec![Some(b"fake-session".to_vec()), Some(b"fake-session".to_vec())]);
}

async fn assert_failure_leaves_state_untouched(script: FakeScript, stage: FailureStage) {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");
	seed_session(&session, b"previous");

	let driver = FakeDriver::new(script);
	let orchestrator = orchestrator(&driver, &session);

	let outcome = orchestrator.send(RECIPIENT, MESSAGE).await;
	assert!(!outcome.is_delivered());
	assert!(!outcome.committed());
	assert_eq!(outcome.stage(), Some(stage));

	let log = driver.log();
	assert_eq!(log.contexts_opened, 1);
	assert_eq!(log.contexts_closed, 1);
	assert_eq!(std::fs::read(&session).unwrap(), b"previous");
	assert_eq!(orchestrator.current_phase(), SendPhase::Closed { success: false });
}

#[tokio::test]
async fn conversation_timeout_releases_handle() {
	assert_failure_leaves_state_untouched(
		FakeScript {
			conversation_resolves: false,
			..Default::default()
		},
		FailureStage::ConversationReady,
	)
	.await;
}

#[tokio::test]
async fn navigation_error_releases_handle() {
	assert_failure_leaves_state_untouched(
		FakeScript {
			navigation_error: Some("net::ERR_CONNECTION_RESET".into()),
			..Default::default()
		},
		FailureStage::Navigation,
	)
	.await;
}

#[tokio::test]
async fn commit_error_releases_handle() {
	assert_failure_leaves_state_untouched(
		FakeScript {
			commit_error: Some("composer detached".into()),
			..Default::default()
		},
		FailureStage::Commit,
	)
	.await;
}

#[tokio::test]
async fn persist_failure_still_counts_as_committed() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");
	seed_session(&session, b"previous");

	let driver = FakeDriver::new(FakeScript {
		state_error: Some("target closed".into()),
		..Default::default()
	});
	let outcome = orchestrator(&driver, &session).send(RECIPIENT, MESSAGE).await;

	assert_eq!(outcome.stage(), Some(FailureStage::Persist));
	assert!(outcome.committed());
	assert_eq!(driver.log().enters, 1);
	assert_eq!(driver.log().open_contexts(), 0);
}

#[tokio::test]
async fn invalid_input_never_opens_a_browser() {
	let dir = tempfile::tempdir().unwrap();
	let driver = FakeDriver::default();
	let orchestrator = orchestrator(&driver, &dir.path().join("session.json"));

	for (recipient, message) in [("", MESSAGE), ("+33 6 00", MESSAGE), (RECIPIENT, "   ")] {
		let outcome = orchestrator.send(recipient, message).await;
		assert_eq!(outcome.stage(), Some(FailureStage::InvalidInput), "{recipient:?} / {message:?}");
	}
	assert_eq!(driver.log().contexts_opened, 0);
}

#[tokio::test]
async fn unreadable_session_fails_at_session_stage() {
	let dir = tempfile::tempdir().unwrap();
	let session = dir.path().join("session.json");
	std::fs::create_dir(&session).unwrap();

	let driver = FakeDriver::default();
	let outcome = orchestrator(&driver, &session).send(RECIPIENT, MESSAGE).await;

	assert_eq!(outcome.stage(), Some(FailureStage::Session));
	assert_eq!(driver.log().contexts_opened, 0);
}

#[tokio::test]
async fn launch_failure_is_reported() {
	let dir = tempfile::tempdir().unwrap();
	let driver = FakeDriver::new(FakeScript {
		launch_error: Some("chrome not found".into()),
		..Default::default()
	});
	let outcome = orchestrator(&driver, &dir.path().join("session.json")).send(RECIPIENT, MESSAGE).await;

	assert_eq!(outcome.stage(), Some(FailureStage::Launch));
	assert!(outcome.failure.unwrap().detail.contains("chrome not found"));
}
