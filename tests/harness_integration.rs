//! ---
//! ems_section: "15-testing-qa-runbook"
//! ems_subsection: "integration-tests"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "End-to-end harness sessions against the canned API."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
mod support;

use std::time::Duration;

use decoder_common::{
    AutoPrompter, CapturedOutput, Console, HarnessConfig, Palette, Prompter, ScriptedPrompter,
};
use decoder_testharness::{Check, CheckOutcome, Harness, SEED_READINGS};
use support::{StubApi, StubBehaviour};

fn quick_config() -> HarnessConfig {
    HarnessConfig {
        seed_pause: Duration::ZERO,
        run_all_pause: Duration::ZERO,
        ..HarnessConfig::default()
    }
}

fn harness_for<P: Prompter>(api: &StubApi, prompter: P) -> (Harness<P>, CapturedOutput) {
    let (console, output) = Console::capture(Palette::plain());
    (
        Harness::new(api.client(), console, quick_config(), prompter),
        output,
    )
}

#[tokio::test]
async fn unattended_run_passes_every_check() {
    let api = StubApi::spawn().await;
    let (mut harness, output) = harness_for(&api, AutoPrompter::new(""));

    assert!(harness.preflight().await);
    assert!(harness.run_all().await.unwrap());

    assert_eq!(api.ingested().len(), SEED_READINGS.len());
    assert_eq!(harness.results().total(), 7);

    let text = output.contents();
    assert!(text.contains("[PASS] API is running"));
    assert!(text.contains("[PASS] Reading 16/16: Building 3, Sensor sensor-004, Value: 75.0"));
    assert!(text.contains("Admin accessed Building 3: 2 readings retrieved"));
    assert!(text.contains("RBAC Enforced: Owner2 correctly DENIED access to Building 1 (403 Forbidden)"));
    assert!(text.contains("Forecast generated for Building 2: 60 points, avg ~47.7"));
    assert!(text.contains("Forecast generated for Building 1: 60 points, avg ~127.0"));
    assert!(text.contains("Request without token correctly rejected (401)"));
    assert!(text.contains("Total: 7/7 tests passed"));
    assert!(text.contains("All tests passed!"));
    assert!(!text.contains("Press Enter after each test"));
}

#[tokio::test]
async fn run_all_skips_seeding_when_already_recorded() {
    let api = StubApi::spawn().await;
    let (mut harness, output) = harness_for(&api, ScriptedPrompter::new(["1", "8", "0"]));

    harness.run().await.unwrap();

    assert_eq!(api.ingested().len(), SEED_READINGS.len());
    let order: Vec<Check> = harness.results().iter().map(|(check, _)| check).collect();
    assert_eq!(order.first(), Some(&Check::DataGeneration));
    assert_eq!(order.len(), 7);
    assert!(harness.results().all_passed());

    let text = output.contents();
    assert_eq!(
        text.matches("Running: TEST 1: Data Generation - Ingesting Sensor Readings")
            .count(),
        1
    );
    assert!(text.contains("All tests will run one after another. Press Enter after each test."));
    assert!(harness
        .prompter()
        .prompts()
        .iter()
        .any(|prompt| prompt.contains("Press Enter to return to menu...")));
}

#[tokio::test]
async fn open_api_fails_rbac_and_authentication() {
    let api = StubApi::spawn_with(StubBehaviour {
        open_access: true,
        ..StubBehaviour::default()
    })
    .await;
    let (mut harness, output) = harness_for(&api, AutoPrompter::new(""));

    assert!(!harness.run_all().await.unwrap());
    assert_eq!(harness.results().get(Check::RbacEnforcement), Some(false));
    assert_eq!(harness.results().get(Check::Authentication), Some(false));
    assert_eq!(harness.results().get(Check::AdminAccess), Some(true));

    let text = output.contents();
    assert!(text.contains(
        "RBAC Failed: Owner1 should be denied access to Building 3, but got: 200 OK"
    ));
    assert!(text.contains("Authentication failed: Expected 401/403, got 200"));
    assert!(text.contains("Total: 5/7 tests passed"));
    assert!(text.contains("[WARN] Some tests failed"));
}

#[tokio::test]
async fn high_forecast_check_rejects_normal_wording() {
    let api = StubApi::spawn_with(StubBehaviour {
        always_normal: true,
        ..StubBehaviour::default()
    })
    .await;
    let (mut harness, output) = harness_for(&api, AutoPrompter::new(""));

    let outcome = harness.run_check(Check::ForecastHigh).await.unwrap();
    assert_eq!(outcome, CheckOutcome::Completed(false));
    let normal = harness.run_check(Check::ForecastNormal).await.unwrap();
    assert_eq!(normal, CheckOutcome::Completed(true));

    let text = output.contents();
    assert!(text.contains("Unexpected recommendation for high consumption:"));
    assert!(text.contains("does not match high consumption against the 100 alert threshold"));
}

#[tokio::test]
async fn owner_check_previews_recommendation() {
    let api = StubApi::spawn().await;
    let (mut harness, output) = harness_for(&api, AutoPrompter::new(""));

    let owner = harness.run_check(Check::OwnerAccess).await.unwrap();
    assert_eq!(owner, CheckOutcome::Completed(true));

    let text = output.contents();
    assert!(text.contains("Owner1 accessed forecast for Building 1: 60 forecast points"));
    assert!(text.contains("Owner2 accessed Building 3: 2 readings retrieved"));
    assert!(text.contains(
        "[INFO] Recommendation: Forecast exceeds threshold (127.0 > 100.0). Recommendation: Activate energy-savi..."
    ));
}
