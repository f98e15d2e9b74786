//! Scenario runner
//!
//! Hands out due actions on each frame and records assertion outcomes.

use super::{ActionType, Assertion, Scenario};
use crate::state::{Phase, SessionAction, SessionState};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// What the app should do for a due action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioCommand {
    /// Apply a session action, exactly as the UI would
    Dispatch(SessionAction),
    /// Nothing to do (log lines are written by the runner)
    Noop,
    /// Close the app with this code
    Exit { code: i32 },
}

/// Result of an assertion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionResult {
    Passed,
    Failed(String),
}

/// Schedules the actions of one scenario
pub struct ScenarioRunner {
    scenario: Scenario,
    start_time: Option<Instant>,
    next_action: usize,
    completed: bool,
    passed: bool,
}

impl ScenarioRunner {
    pub fn new(scenario: Scenario) -> Self {
        info!("[SCENARIO] Loaded: {}", scenario.scenario.name);
        if !scenario.scenario.description.is_empty() {
            info!("[SCENARIO] Description: {}", scenario.scenario.description);
        }
        info!("[SCENARIO] Total actions: {}", scenario.actions.len());

        Self {
            scenario,
            start_time: None,
            next_action: 0,
            completed: false,
            passed: true,
        }
    }

    /// Start the clock (call on the first frame)
    pub fn start(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
            info!("[SCENARIO] Started: {}", self.scenario.scenario.name);
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Whether every assertion so far passed
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Next due action, if its time has come
    pub fn poll(&mut self) -> Option<(ScenarioCommand, Option<Assertion>)> {
        let elapsed = self.elapsed();
        self.poll_at(elapsed)
    }

    /// Same as [`poll`](Self::poll) with an explicit clock
    pub fn poll_at(&mut self, elapsed: Duration) -> Option<(ScenarioCommand, Option<Assertion>)> {
        if self.completed || self.start_time.is_none() {
            return None;
        }

        let Some(action) = self.scenario.actions.get(self.next_action) else {
            self.completed = true;
            return None;
        };
        if elapsed < action.delay() {
            return None;
        }

        debug!(
            "[SCENARIO] Executing action at {}ms: {:?}",
            action.time_ms, action.action
        );
        let command = to_command(&action.action);
        let assertion = action.assert.clone();

        self.next_action += 1;
        if self.next_action >= self.scenario.actions.len() {
            self.completed = true;
        }

        Some((command, assertion))
    }

    /// Check an assertion against a session snapshot
    pub fn check_assertion(
        &mut self,
        assertion: &Assertion,
        state: &SessionState,
    ) -> AssertionResult {
        let result = evaluate(assertion, state);
        match &result {
            AssertionResult::Passed => info!("[SCENARIO] PASS: {:?}", assertion),
            AssertionResult::Failed(reason) => {
                error!("[SCENARIO] FAIL: {:?} - {}", assertion, reason);
                self.passed = false;
            }
        }
        result
    }

    pub fn summary(&self) -> String {
        let status = if self.passed { "PASSED" } else { "FAILED" };
        format!(
            "[SCENARIO] '{}' {}: executed {} actions in {:?}",
            self.scenario.scenario.name,
            status,
            self.next_action,
            self.elapsed()
        )
    }
}

fn to_command(action: &ActionType) -> ScenarioCommand {
    let dispatch = ScenarioCommand::Dispatch;
    match action {
        ActionType::Start => dispatch(SessionAction::Start),
        ActionType::SetQuestion { text } => dispatch(SessionAction::EditQuestion(text.clone())),
        ActionType::StartVoice => dispatch(SessionAction::StartVoiceCapture),
        ActionType::SubmitQuestion => dispatch(SessionAction::SubmitQuestion),
        ActionType::ToggleCard { card_id } => dispatch(SessionAction::ToggleCard(card_id.clone())),
        ActionType::CompleteSelection => dispatch(SessionAction::CompleteSelection),
        ActionType::Retry => dispatch(SessionAction::RetryInterpretation),
        ActionType::Reset => dispatch(SessionAction::Reset),
        ActionType::Log { message } => {
            info!("[SCENARIO] Log: {}", message);
            ScenarioCommand::Noop
        }
        ActionType::Exit { code } => ScenarioCommand::Exit { code: *code },
    }
}

fn evaluate(assertion: &Assertion, state: &SessionState) -> AssertionResult {
    let check = |ok: bool, reason: String| {
        if ok {
            AssertionResult::Passed
        } else {
            AssertionResult::Failed(reason)
        }
    };

    match assertion {
        Assertion::Phase { phase } => match Phase::from_name(phase) {
            Some(expected) => check(
                state.phase == expected,
                format!("Expected phase {}, got {}", expected, state.phase),
            ),
            None => AssertionResult::Failed(format!("Unknown phase '{}'", phase)),
        },
        Assertion::SelectedCount { count } => check(
            state.selection.len() == *count,
            format!(
                "Expected {} selected cards, got {}",
                count,
                state.selection.len()
            ),
        ),
        Assertion::QuestionEquals { text } => check(
            state.question == *text,
            format!("Expected question {:?}, got {:?}", text, state.question),
        ),
        Assertion::InterpretationContains { text } => check(
            state.interpretation.contains(text.as_str()),
            format!(
                "Expected interpretation to contain {:?}, got {:?}",
                text, state.interpretation
            ),
        ),
        Assertion::HasNotice => check(state.notice.is_some(), "Expected a notice".to_string()),
        Assertion::IsListening => check(
            state.listening,
            "Expected a voice capture in progress".to_string(),
        ),
    }
}
