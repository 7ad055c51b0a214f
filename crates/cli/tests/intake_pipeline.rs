use std::sync::Arc;
use std::time::Duration;

use outreach::surface::{FakeDriver, FakeScript};
use outreach::{DelayRange, SendOrchestrator, SessionState, SessionStore, SurfaceConfig};
use outreach_cli::intake::{IntakeService, RetryPolicy};
use outreach_cli::leads::LeadSource;
use outreach_cli::ledger::SqliteLedger;
use outreach_protocol::{LeadRecord, LeadRequest};

const LEADS: &str = "\
job_title,location,linkedin_url,phone_number
Chef,Paris,https://linkedin.com/in/a,+33600000001
Waiter,Paris,https://linkedin.com/in/b,+33600000002
chef,PARIS,https://linkedin.com/in/c,+33600000003
";

struct Fixture {
	_dir: tempfile::TempDir,
	driver: FakeDriver,
	service: IntakeService,
}

fn fixture(csv: &str, script: FakeScript, retry: RetryPolicy) -> Fixture {
	let dir = tempfile::tempdir().unwrap();
	let leads = dir.path().join("leads.csv");
	std::fs::write(&leads, csv).unwrap();

	let session = dir.path().join("session.json");
	SessionStore::new(&session).save(&SessionState::from_bytes(b"paired".to_vec())).unwrap();

	let driver = FakeDriver::new(script);
	let surface = SurfaceConfig {
		send_delay: DelayRange::fixed(Duration::ZERO),
		..Default::default()
	};
	let orchestrator = SendOrchestrator::new(Arc::new(driver.clone()), SessionStore::new(&session), surface);
	let ledger = SqliteLedger::open(&dir.path().join("leads.db")).unwrap();
	let service = IntakeService::new(Arc::new(orchestrator), LeadSource::new(&leads), ledger).with_retry(retry);

	Fixture { _dir: dir, driver, service }
}

fn no_backoff(max_attempts: u32) -> RetryPolicy {
	RetryPolicy { max_attempts, backoff_ms: 0 }
}

fn phones(leads: &[LeadRecord]) -> Vec<&str> {
	leads.iter().map(|l| l.phone_number.as_str()).collect()
}

fn chef_in_paris() -> LeadRequest {
	LeadRequest::new("Chef", "Paris")
}

#[tokio::test]
async fn matching_leads_are_sent_once_and_recorded() {
	let fx = fixture(LEADS, FakeScript::default(), RetryPolicy::default());

	let sent = fx.service.process(&chef_in_paris()).await.unwrap();
	assert_eq!(phones(&sent), ["+33600000001", "+33600000003"]);
	assert_eq!(sent[0].linkedin_url, "https://linkedin.com/in/a");
	assert_eq!(fx.driver.log().enters, 2);
	assert!(fx.service.ledger().has_been_contacted("+33600000001").unwrap());
	assert!(!fx.service.ledger().has_been_contacted("+33600000002").unwrap());

	let again = fx.service.process(&LeadRequest::new("CHEF", "paris")).await.unwrap();
	assert!(again.is_empty());
	assert_eq!(fx.driver.log().enters, 2);
	assert_eq!(fx.driver.log().contexts_opened, 2);
}

#[tokio::test]
async fn previously_contacted_lead_is_never_sent() {
	let fx = fixture(LEADS, FakeScript::default(), RetryPolicy::default());
	fx.service
		.ledger()
		.record_contacted(&LeadRecord {
			job_title: "Chef".into(),
			location: "Paris".into(),
			linkedin_url: String::new(),
			phone_number: "+33600000001".into(),
		})
		.unwrap();
	fx.service
		.ledger()
		.record_contacted(&LeadRecord {
			job_title: "chef".into(),
			location: "PARIS".into(),
			linkedin_url: String::new(),
			phone_number: "+33600000003".into(),
		})
		.unwrap();

	let sent = fx.service.process(&chef_in_paris()).await.unwrap();
	assert!(sent.is_empty());
	assert_eq!(fx.driver.log().contexts_opened, 0);
}

#[tokio::test]
async fn conversation_timeout_leaves_ledger_unchanged() {
	let fx = fixture(
		LEADS,
		FakeScript {
			conversation_resolves: false,
			..Default::default()
		},
		RetryPolicy::default(),
	);

	let sent = fx.service.process(&chef_in_paris()).await.unwrap();
	assert!(sent.is_empty());
	assert_eq!(fx.service.ledger().contacted_count().unwrap(), 0);
	assert_eq!(fx.driver.log().open_contexts(), 0);
}

#[tokio::test]
async fn duplicate_rows_are_contacted_once() {
	let csv = "\
job_title,location,linkedin_url,phone_number
Chef,Paris,,+33600000001
Chef,Paris,,+33600000001
";
	let fx = fixture(csv, FakeScript::default(), RetryPolicy::default());

	let sent = fx.service.process(&chef_in_paris()).await.unwrap();
	assert_eq!(phones(&sent), ["+33600000001"]);
	assert_eq!(fx.driver.log().enters, 1);
}

#[tokio::test]
async fn plus_prefix_spellings_are_one_recipient() {
	let csv = "\
job_title,location,linkedin_url,phone_number
Chef,Paris,,+33600000001
Chef,Paris,,33600000001
";
	let fx = fixture(csv, FakeScript::default(), RetryPolicy::default());

	let sent = fx.service.process(&chef_in_paris()).await.unwrap();
	assert_eq!(phones(&sent), ["+33600000001"]);
	assert_eq!(fx.driver.log().enters, 1);
	assert_eq!(fx.driver.log().deep_links(), 1);
	assert!(fx.service.ledger().has_been_contacted("+33600000001").unwrap());
	assert!(fx.service.ledger().has_been_contacted("33600000001").unwrap());
	assert_eq!(fx.service.ledger().contacted_count().unwrap(), 1);
}

#[tokio::test]
async fn failures_before_commit_are_retried() {
	let fx = fixture(
		"job_title,location,linkedin_url,phone_number\nChef,Paris,,+33600000001\n",
		FakeScript {
			conversation_resolves: false,
			..Default::default()
		},
		no_backoff(3),
	);

	let sent = fx.service.process(&chef_in_paris()).await.unwrap();
	assert!(sent.is_empty());
	assert_eq!(fx.driver.log().contexts_opened, 3);
	assert_eq!(fx.driver.log().enters, 0);
}

#[tokio::test]
async fn committed_send_is_never_retried() {
	let fx = fixture(
		"job_title,location,linkedin_url,phone_number\nChef,Paris,,+33600000001\n",
		FakeScript {
			state_error: Some("target closed".into()),
			..Default::default()
		},
		no_backoff(3),
	);

	let sent = fx.service.process(&chef_in_paris()).await.unwrap();
	assert_eq!(phones(&sent), ["+33600000001"]);
	assert_eq!(fx.driver.log().enters, 1);
	assert!(fx.service.ledger().has_been_contacted("+33600000001").unwrap());
}
