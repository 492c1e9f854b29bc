//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Interactive menu loop driving the harness checks."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Menu REPL: `menu -> running-check -> menu`, `menu -> summary -> menu`,
//! `menu -> exit`. Only numeric menu input moves between states.
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use decoder_client::ApiClient;
use decoder_common::{Console, HarnessConfig, PromptError, Prompter};
use decoder_logging::{log_system_event, LogContext, SystemEventOutcome};
use futures::FutureExt;
use strum::IntoEnumIterator;
use tracing::{debug, error};

use crate::checks::{Check, CheckContext};
use crate::session::SessionResults;

const RULE_WIDTH: usize = 70;

/// Parsed menu input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Run(Check),
    RunAll,
    Exit,
    Invalid,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "0" => MenuChoice::Exit,
            "8" => MenuChoice::RunAll,
            other => Check::iter()
                .find(|check| check.number().to_string() == other)
                .map_or(MenuChoice::Invalid, MenuChoice::Run),
        }
    }
}

/// Result of running one check under the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Completed(bool),
    /// The check panicked; nothing was recorded.
    Crashed(String),
}

/// One harness session against a single API.
pub struct Harness<P> {
    client: ApiClient,
    console: Console,
    config: HarnessConfig,
    prompter: P,
    results: SessionResults,
}

impl<P: Prompter> Harness<P> {
    pub fn new(client: ApiClient, console: Console, config: HarnessConfig, prompter: P) -> Self {
        Self {
            client,
            console,
            config,
            prompter,
            results: SessionResults::new(),
        }
    }

    pub fn results(&self) -> &SessionResults {
        &self.results
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Intro banner plus the health probe. False means the API did not answer.
    pub async fn preflight(&self) -> bool {
        let console = &self.console;
        console.header("DECODER API - Interactive Test Suite");
        console.info("Testing: Data Generation, Authentication, RBAC, Forecasting");
        console.info(format!("Target API: {}", self.client.display_base()));
        console.blank();

        console.section("Pre-flight Check");
        let available = self.client.is_available().await;
        if available {
            console.success("API is running");
        } else {
            console.error(format!("API is not running at {}", self.client.display_base()));
            console.warning("Please start the API first: mvn spring-boot:run");
        }
        log_system_event(
            None,
            "harness.preflight",
            &format!("target {}", self.client.display_base()),
            SystemEventOutcome::from_passed(available),
        );
        available
    }

    async fn pause(&mut self, text: &str) -> Result<(), PromptError> {
        let p = *self.console.palette();
        let prompt = format!("\n{}{}{}", p.yellow, text, p.reset);
        self.prompter.acknowledge(&prompt).await
    }

    /// Interactive session: wait for the operator, then loop on the menu
    /// until `0` is chosen or input closes.
    pub async fn run(&mut self) -> Result<(), PromptError> {
        self.pause("Press Enter to start...").await?;
        loop {
            self.show_menu();
            let p = *self.console.palette();
            let prompt = format!("{}Enter your choice (0-8): {}", p.bold, p.reset);
            let input = match self.prompter.read_line(&prompt).await {
                Ok(input) => input,
                Err(PromptError::Closed) => break,
                Err(err) => return Err(err),
            };

            match MenuChoice::parse(&input) {
                MenuChoice::Exit => {
                    self.console.blank();
                    self.console
                        .line(self.console.paint(p.yellow, "Exiting test suite..."));
                    break;
                }
                MenuChoice::Run(check) => {
                    self.run_check(check).await?;
                    if check == Check::DataGeneration {
                        tokio::time::sleep(self.config.seed_pause).await;
                    }
                }
                MenuChoice::RunAll => {
                    self.run_all().await?;
                    self.pause("Press Enter to return to menu...").await?;
                }
                MenuChoice::Invalid => {
                    self.console
                        .error("Invalid choice. Please enter a number between 0 and 8.");
                    self.pause("Press Enter to continue...").await?;
                }
            }
        }
        self.farewell();
        Ok(())
    }

    pub fn farewell(&self) {
        let p = self.console.palette();
        self.console.blank();
        self.console.line(self.console.paint(
            p.cyan,
            "Thank you for using the DECODER API Test Suite!",
        ));
        self.console.blank();
    }

    fn show_menu(&self) {
        let console = &self.console;
        let p = console.palette();
        console.header("DECODER API - Comprehensive Test Suite");
        console.line(console.paint(p.bold, "Select a test to run:"));
        console.blank();
        for check in Check::iter() {
            console.line(format!(
                "  {} - {}",
                console.paint(p.cyan, check.number().to_string()),
                check.menu_label()
            ));
        }
        console.line(format!("  {} - Run All Tests", console.paint(p.cyan, "8")));
        console.line(format!("  {} - Exit", console.paint(p.cyan, "0")));
        console.blank();
    }

    /// Run one check under the guard, record its result and wait for the operator.
    pub async fn run_check(&mut self, check: Check) -> Result<CheckOutcome, PromptError> {
        let console = &self.console;
        let p = *console.palette();
        let rule = "=".repeat(RULE_WIDTH);
        console.blank();
        console.line(format!("{}{}{}{}", p.bold, p.magenta, rule, p.reset));
        console.line(format!("{}{}Running: {}{}", p.bold, p.magenta, check.title(), p.reset));
        console.line(format!("{}{}{}{}", p.bold, p.magenta, rule, p.reset));
        console.blank();

        let ctx = CheckContext {
            client: &self.client,
            console: &self.console,
            config: &self.config,
        };
        let outcome = guarded(check.run(&ctx)).await;
        self.settle(check, &outcome);
        self.pause("Press Enter to continue...").await?;
        Ok(outcome)
    }

    /// Record a finished check and print its verdict. Crashes are reported only.
    fn settle(&mut self, check: Check, outcome: &CheckOutcome) {
        let console = &self.console;
        let p = *console.palette();
        match outcome {
            CheckOutcome::Completed(passed) => {
                self.results.record(check, *passed);
                console.blank();
                if *passed {
                    console.line(format!("{}{}[PASS] Test PASSED{}", p.green, p.bold, p.reset));
                } else {
                    console.line(format!("{}{}[FAIL] Test FAILED{}", p.red, p.bold, p.reset));
                }
                let ctx = LogContext::new().with_check(check.result_name());
                log_system_event(
                    Some(&ctx),
                    "harness.check",
                    check.title(),
                    SystemEventOutcome::from_passed(*passed),
                );
            }
            CheckOutcome::Crashed(message) => {
                error!(check = check.result_name(), "check aborted: {}", message);
                console.error(format!("An error occurred: {}", message));
            }
        }
    }

    /// Run every check in order. Seeding is skipped when the session already
    /// holds a data generation result. A crashed check ends the batch early.
    pub async fn run_all(&mut self) -> Result<bool, PromptError> {
        self.console.header("Running All Tests Sequentially");
        if self.prompter.is_interactive() {
            self.console
                .warning("All tests will run one after another. Press Enter after each test.");
            self.console.blank();
        }

        for check in Check::iter() {
            if check == Check::DataGeneration && self.results.contains(check) {
                debug!("seed readings already ingested this session");
                continue;
            }
            if let CheckOutcome::Crashed(_) = self.run_check(check).await? {
                return Ok(false);
            }
            if check == Check::DataGeneration {
                tokio::time::sleep(self.config.run_all_pause).await;
            }
        }

        self.results.print_summary(&self.console);
        Ok(self.results.all_passed())
    }
}

/// Await a check, turning a panic into [`CheckOutcome::Crashed`].
async fn guarded<F>(check: F) -> CheckOutcome
where
    F: Future<Output = bool>,
{
    match AssertUnwindSafe(check).catch_unwind().await {
        Ok(passed) => CheckOutcome::Completed(passed),
        Err(payload) => CheckOutcome::Crashed(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "check panicked".to_owned()
    }
}
