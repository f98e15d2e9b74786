//! Scripted scenarios for automated UI runs
//!
//! A scenario is a TOML file of timed actions. Each action goes through the
//! same path as a click in the UI, and may carry an assertion that is checked
//! against the session right after the action runs.

mod runner;

pub use runner::{AssertionResult, ScenarioCommand, ScenarioRunner};

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// A scenario loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Scenario metadata
    pub scenario: ScenarioMetadata,
    /// Timed actions, in order
    pub actions: Vec<ScenarioAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A single action with timing
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioAction {
    /// Milliseconds after the scenario starts
    pub time_ms: u64,
    pub action: ActionType,
    /// Checked right after the action runs
    #[serde(default)]
    pub assert: Option<Assertion>,
}

impl ScenarioAction {
    /// Delay from scenario start
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }
}

/// What a scenario step does
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionType {
    /// Press the start button
    Start,
    /// Replace the question text
    SetQuestion { text: String },
    /// Press the voice button
    StartVoice,
    /// Press the submit button
    SubmitQuestion,
    /// Click a card
    ToggleCard { card_id: String },
    /// Press the complete button
    CompleteSelection,
    /// Press the retry button
    Retry,
    /// Press the restart button
    Reset,
    /// Write a message to the log
    Log { message: String },
    /// Close the app
    Exit {
        #[serde(default)]
        code: i32,
    },
}

/// Conditions checked against the session
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Snake-case phase name, e.g. `card_selection`
    Phase { phase: String },
    SelectedCount { count: usize },
    QuestionEquals { text: String },
    /// Case-sensitive substring of the interpretation
    InterpretationContains { text: String },
    HasNotice,
    IsListening,
}

impl Scenario {
    /// Load a scenario from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ScenarioError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let scenario = Self::from_toml(&content).map_err(|e| match e {
            ScenarioError::Parse { error, .. } => ScenarioError::Parse {
                path: path.display().to_string(),
                error,
            },
            other => other,
        })?;
        Ok(scenario)
    }

    /// Parse and validate a scenario
    pub fn from_toml(content: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = toml::from_str(content).map_err(|e| ScenarioError::Parse {
            path: "<inline>".to_string(),
            error: e.to_string(),
        })?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        if self.actions.is_empty() {
            return Err(ScenarioError::Invalid(
                "Scenario must have at least one action".to_string(),
            ));
        }

        let mut last_time = 0;
        for action in &self.actions {
            if action.time_ms < last_time {
                return Err(ScenarioError::Invalid(format!(
                    "Actions must be ordered by time. Found action at {}ms after action at {}ms",
                    action.time_ms, last_time
                )));
            }
            last_time = action.time_ms;
        }

        if !self
            .actions
            .iter()
            .any(|a| matches!(a.action, ActionType::Exit { .. }))
        {
            return Err(ScenarioError::Invalid(
                "Scenario must have an exit action".to_string(),
            ));
        }

        for action in &self.actions {
            if let Some(Assertion::Phase { phase }) = &action.assert {
                if crate::state::Phase::from_name(phase).is_none() {
                    return Err(ScenarioError::Invalid(format!("Unknown phase '{}'", phase)));
                }
            }
        }

        Ok(())
    }
}

/// Errors from loading or validating a scenario
#[derive(Debug, Clone, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario '{path}': {error}")]
    Io { path: String, error: String },
    #[error("Failed to parse scenario '{path}': {error}")]
    Parse { path: String, error: String },
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}
