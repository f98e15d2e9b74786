//! Session state for a tarot reading
//!
//! This module holds the view-state machine that drives the whole app:
//! - **Phase**: which screen is active (welcome, question, cards, result)
//! - **Selection**: the ordered set of picked cards, capped at three
//! - **Actions**: user intents, applied on the UI thread
//! - **Effects**: work the caller must start (interpretation request, voice capture)
//!
//! The state never performs I/O itself. Worker results are fed back through
//! `on_*` methods, which discard anything that no longer matches the session.

use crate::deck::CardDescriptor;
use crate::error::TarotError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Number of cards a reading needs
pub const MAX_SELECTION: usize = 3;

/// Which screen is active
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Intro screen
    #[default]
    Welcome,
    /// Typing or speaking the question
    QuestionCapture,
    /// Picking three cards
    CardSelection,
    /// Showing the cards and the interpretation
    ResultDisplay,
}

impl Phase {
    /// Parse the snake_case name used in scenario files
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "welcome" => Some(Phase::Welcome),
            "question_capture" => Some(Phase::QuestionCapture),
            "card_selection" => Some(Phase::CardSelection),
            "result_display" => Some(Phase::ResultDisplay),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Welcome => write!(f, "Welcome"),
            Phase::QuestionCapture => write!(f, "QuestionCapture"),
            Phase::CardSelection => write!(f, "CardSelection"),
            Phase::ResultDisplay => write!(f, "ResultDisplay"),
        }
    }
}

/// What a toggle did to the selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    /// Selection overflow, or toggling outside card selection
    Ignored,
}

/// Ordered set of picked cards, unique by id, at most [`MAX_SELECTION`]
#[derive(Clone, Debug, Default)]
pub struct Selection {
    cards: Vec<CardDescriptor>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deselect if present, otherwise select if there is room
    pub fn toggle(&mut self, card: &CardDescriptor) -> ToggleOutcome {
        if let Some(pos) = self.cards.iter().position(|c| c.id == card.id) {
            self.cards.remove(pos);
            ToggleOutcome::Deselected
        } else if self.cards.len() < MAX_SELECTION {
            self.cards.push(card.clone());
            ToggleOutcome::Selected
        } else {
            ToggleOutcome::Ignored
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cards.iter().any(|c| c.id == id)
    }

    /// Picked cards in the order they were picked
    pub fn cards(&self) -> &[CardDescriptor] {
        &self.cards
    }

    pub fn ids(&self) -> Vec<&str> {
        self.cards.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.cards.iter().map(|c| c.name).collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Exactly [`MAX_SELECTION`] cards picked
    pub fn is_complete(&self) -> bool {
        self.cards.len() == MAX_SELECTION
    }
}

/// Progress of the interpretation request for the current selection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestState {
    /// Nothing in flight
    #[default]
    Idle,
    /// Waiting for the response tagged with `request_id`
    Pending { request_id: Uuid },
    /// The last request failed; the user may retry
    Failed {
        request_id: Uuid,
        message: String,
        recoverable: bool,
    },
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RequestState::Failed { .. })
    }

    /// Id of the request this state is about, if any
    pub fn request_id(&self) -> Option<Uuid> {
        match self {
            RequestState::Idle => None,
            RequestState::Pending { request_id } | RequestState::Failed { request_id, .. } => {
                Some(*request_id)
            }
        }
    }
}

/// Non-fatal message shown to the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Submit was pressed with a blank question
    EmptyQuestion,
    /// Voice capture failed; holds the user-facing message
    Voice(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::EmptyQuestion => "질문을 입력해주세요.",
            Notice::Voice(message) => message,
        }
    }
}

/// Everything the oracle needs to produce one interpretation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpretationRequest {
    pub request_id: Uuid,
    pub cards: Vec<CardDescriptor>,
    pub question: String,
}

/// User intents, applied in order on the UI thread
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Leave the welcome screen
    Start,
    /// Replace the question text
    EditQuestion(String),
    /// Ask the recognizer for a spoken question
    StartVoiceCapture,
    /// Submit the question and move on to the cards
    SubmitQuestion,
    /// Pick or unpick a card by id
    ToggleCard(String),
    /// Finish picking and ask for an interpretation
    CompleteSelection,
    /// Re-issue a failed interpretation request
    RetryInterpretation,
    /// Clear everything and return to the welcome screen
    Reset,
}

/// Work the caller must start after applying an action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    RequestInterpretation(InterpretationRequest),
    StartVoiceCapture,
    CancelVoiceCapture,
}

/// The single mutable aggregate for one reading session
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    /// Active screen
    pub phase: Phase,
    /// Question text, editable until submitted
    pub question: String,
    /// Picked cards
    pub selection: Selection,
    /// A voice capture is in flight
    pub listening: bool,
    /// Interpretation text, empty until the request resolves
    pub interpretation: String,
    /// When the interpretation arrived
    pub received_at: Option<DateTime<Utc>>,
    /// Interpretation request progress
    pub request: RequestState,
    /// Current notice (if any)
    pub notice: Option<Notice>,
}

impl SessionState {
    /// Create a new session on the welcome screen
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a user action, returning the effect the caller must start
    ///
    /// Actions that are not valid for the current phase are no-ops.
    pub fn apply(&mut self, action: SessionAction) -> Option<Effect> {
        debug!("[SESSION] {:?} in {}", action, self.phase);
        match action {
            SessionAction::Start => {
                self.start();
                None
            }
            SessionAction::EditQuestion(text) => {
                self.edit_question(text);
                None
            }
            SessionAction::StartVoiceCapture => self
                .begin_voice_capture()
                .then_some(Effect::StartVoiceCapture),
            SessionAction::SubmitQuestion => {
                let was_listening = self.listening;
                if self.submit_question() && was_listening {
                    // Typed question wins over the capture still running
                    self.listening = false;
                    Some(Effect::CancelVoiceCapture)
                } else {
                    None
                }
            }
            SessionAction::ToggleCard(id) => {
                self.toggle_card(&id);
                None
            }
            SessionAction::CompleteSelection => self
                .complete_selection()
                .map(Effect::RequestInterpretation),
            SessionAction::RetryInterpretation => self
                .retry_interpretation()
                .map(Effect::RequestInterpretation),
            SessionAction::Reset => self.reset().then_some(Effect::CancelVoiceCapture),
        }
    }

    // === Transitions ===

    /// Welcome → QuestionCapture
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Welcome {
            return false;
        }
        self.phase = Phase::QuestionCapture;
        info!("[SESSION] Started, awaiting question");
        true
    }

    /// Replace the question text while it is still editable
    pub fn edit_question(&mut self, text: String) -> bool {
        if self.phase != Phase::QuestionCapture {
            return false;
        }
        self.question = text;
        if self.notice == Some(Notice::EmptyQuestion) {
            self.notice = None;
        }
        true
    }

    /// Mark a voice capture as started; false if one is running or not allowed
    pub fn begin_voice_capture(&mut self) -> bool {
        if self.phase != Phase::QuestionCapture || self.listening {
            return false;
        }
        self.listening = true;
        if matches!(self.notice, Some(Notice::Voice(_))) {
            self.notice = None;
        }
        true
    }

    /// QuestionCapture → CardSelection when the trimmed question is non-empty
    pub fn submit_question(&mut self) -> bool {
        if self.phase != Phase::QuestionCapture {
            return false;
        }
        if self.question.trim().is_empty() {
            debug!("[SESSION] Rejected empty question");
            self.notice = Some(Notice::EmptyQuestion);
            return false;
        }
        self.phase = Phase::CardSelection;
        self.notice = None;
        info!("[SESSION] Question submitted");
        true
    }

    /// Pick or unpick a card while in card selection
    ///
    /// The selection is frozen while a request is pending. Changing it after a
    /// failure drops the failure so the new selection can be completed.
    pub fn toggle_card(&mut self, id: &str) -> ToggleOutcome {
        if self.phase != Phase::CardSelection || self.request.is_pending() {
            return ToggleOutcome::Ignored;
        }
        let Some(card) = crate::deck::deck().get(id) else {
            warn!("[SESSION] Unknown card id: {}", id);
            return ToggleOutcome::Ignored;
        };
        let outcome = self.selection.toggle(card);
        if outcome != ToggleOutcome::Ignored && self.request.is_failed() {
            self.request = RequestState::Idle;
        }
        debug!(
            "[SESSION] Toggle {} -> {:?} ({} selected)",
            id,
            outcome,
            self.selection.len()
        );
        outcome
    }

    /// Issue the interpretation request if exactly three cards are picked
    pub fn complete_selection(&mut self) -> Option<InterpretationRequest> {
        if self.phase != Phase::CardSelection
            || !self.selection.is_complete()
            || self.request.is_pending()
        {
            return None;
        }
        Some(self.issue_request())
    }

    /// Re-issue the request after a failure, with the same cards and question
    pub fn retry_interpretation(&mut self) -> Option<InterpretationRequest> {
        if self.phase != Phase::CardSelection || !self.request.is_failed() {
            return None;
        }
        if !self.selection.is_complete() {
            return None;
        }
        Some(self.issue_request())
    }

    fn issue_request(&mut self) -> InterpretationRequest {
        let request_id = Uuid::new_v4();
        self.request = RequestState::Pending { request_id };
        info!(
            "[SESSION] Requesting interpretation {} for [{}]",
            request_id,
            self.selection.names().join(", ")
        );
        InterpretationRequest {
            request_id,
            cards: self.selection.cards().to_vec(),
            question: self.question.clone(),
        }
    }

    /// Clear everything and return to the welcome screen
    ///
    /// Returns true if a voice capture was running and must be cancelled.
    pub fn reset(&mut self) -> bool {
        let was_listening = self.listening;
        *self = Self::default();
        info!("[SESSION] Reset");
        was_listening
    }

    // === Worker results ===

    /// First recognized utterance from the voice capture
    pub fn on_transcript(&mut self, text: String) -> bool {
        if !self.listening || self.phase != Phase::QuestionCapture {
            debug!("[SESSION] Dropping transcript outside an active capture");
            return false;
        }
        self.listening = false;
        self.question = text;
        self.notice = None;
        true
    }

    /// Voice capture ended without a transcript
    pub fn on_voice_error(&mut self, error: &TarotError) -> bool {
        if !self.listening {
            return false;
        }
        self.listening = false;
        if self.phase == Phase::QuestionCapture {
            self.notice = Some(Notice::Voice(error.user_message()));
        }
        true
    }

    /// Outcome of the interpretation request tagged `request_id`
    ///
    /// Results for any request other than the pending one are discarded.
    pub fn on_interpretation(
        &mut self,
        request_id: Uuid,
        result: std::result::Result<String, TarotError>,
    ) -> bool {
        if self.phase != Phase::CardSelection
            || self.request != (RequestState::Pending { request_id })
        {
            debug!("[SESSION] Dropping stale interpretation {}", request_id);
            return false;
        }
        match result {
            Ok(text) => {
                self.interpretation = text;
                self.received_at = Some(Utc::now());
                self.request = RequestState::Idle;
                self.phase = Phase::ResultDisplay;
                info!("[SESSION] Interpretation {} received", request_id);
            }
            Err(e) => {
                warn!("[SESSION] Interpretation {} failed: {}", request_id, e);
                self.request = RequestState::Failed {
                    request_id,
                    message: e.user_message(),
                    recoverable: e.is_recoverable(),
                };
            }
        }
        true
    }

    /// Copy of the current state for rendering or assertions
    pub fn snapshot(&self) -> SessionState {
        self.clone()
    }
}

/// Thread-safe shared session state
///
/// Only the UI thread writes; readers (scenario runner, tests) take snapshots.
#[derive(Clone, Default)]
pub struct SharedSession {
    inner: Arc<RwLock<SessionState>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a read lock on the state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, SessionState> {
        self.inner.read()
    }

    /// Get a write lock on the state
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, SessionState> {
        self.inner.write()
    }

    /// Get a snapshot of current state (no lock held after return)
    pub fn snapshot(&self) -> SessionState {
        self.inner.read().snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.inner.read().phase
    }

    pub fn selected_count(&self) -> usize {
        self.inner.read().selection.len()
    }

    pub fn is_listening(&self) -> bool {
        self.inner.read().listening
    }

    pub fn question(&self) -> String {
        self.inner.read().question.clone()
    }

    pub fn interpretation(&self) -> String {
        self.inner.read().interpretation.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::deck;

    fn at_selection(question: &str) -> SessionState {
        let mut state = SessionState::new();
        state.apply(SessionAction::Start);
        state.apply(SessionAction::EditQuestion(question.to_string()));
        state.apply(SessionAction::SubmitQuestion);
        state
    }

    fn pick(state: &mut SessionState, ids: &[&str]) {
        for id in ids {
            state.apply(SessionAction::ToggleCard(id.to_string()));
        }
    }

    #[test]
    fn test_phase_progression() {
        let mut state = SessionState::new();
        assert_eq!(state.phase, Phase::Welcome);

        state.apply(SessionAction::Start);
        assert_eq!(state.phase, Phase::QuestionCapture);

        state.apply(SessionAction::EditQuestion("내 연애운은?".to_string()));
        state.apply(SessionAction::SubmitQuestion);
        assert_eq!(state.phase, Phase::CardSelection);
    }

    #[test]
    fn test_empty_question_rejected() {
        let mut state = SessionState::new();
        state.apply(SessionAction::Start);

        state.apply(SessionAction::SubmitQuestion);
        assert_eq!(state.phase, Phase::QuestionCapture);
        assert_eq!(state.notice, Some(Notice::EmptyQuestion));

        state.apply(SessionAction::EditQuestion("   \n\t ".to_string()));
        assert!(state.notice.is_none());
        state.apply(SessionAction::SubmitQuestion);
        assert_eq!(state.phase, Phase::QuestionCapture);
        assert_eq!(state.notice, Some(Notice::EmptyQuestion));
    }

    #[test]
    fn test_actions_outside_phase_are_noops() {
        let mut state = SessionState::new();
        assert!(state.apply(SessionAction::CompleteSelection).is_none());
        state.apply(SessionAction::ToggleCard("card_0".to_string()));
        state.apply(SessionAction::EditQuestion("ignored".to_string()));
        state.apply(SessionAction::SubmitQuestion);
        assert!(state.apply(SessionAction::StartVoiceCapture).is_none());

        assert_eq!(state.phase, Phase::Welcome);
        assert!(state.selection.is_empty());
        assert!(state.question.is_empty());
        assert!(!state.listening);
    }

    #[test]
    fn test_toggle_deselects_selected_card() {
        let mut state = at_selection("q");
        pick(&mut state, &["card_0", "card_1", "card_2"]);
        assert_eq!(state.selection.len(), 3);

        assert_eq!(state.toggle_card("card_1"), ToggleOutcome::Deselected);
        assert_eq!(state.selection.ids(), vec!["card_0", "card_2"]);
    }

    #[test]
    fn test_fourth_pick_is_ignored() {
        let mut state = at_selection("q");
        pick(&mut state, &["card_0", "card_27", "card_10"]);

        assert_eq!(state.toggle_card("card_40"), ToggleOutcome::Ignored);
        assert_eq!(state.selection.ids(), vec!["card_0", "card_27", "card_10"]);
    }

    #[test]
    fn test_selection_size_bounded_under_any_sequence() {
        let mut state = at_selection("q");
        // Deterministic pseudo-random walk over a handful of ids
        let ids = ["card_3", "card_7", "card_3", "card_50", "card_11", "card_7", "card_2"];
        for step in 0..200 {
            let id = ids[(step * 7 + step / 3) % ids.len()];
            let was_selected = state.selection.contains(id);
            let before = state.selection.ids().join(",");
            let outcome = state.toggle_card(id);
            assert!(state.selection.len() <= MAX_SELECTION);
            if was_selected {
                assert_eq!(outcome, ToggleOutcome::Deselected);
            } else if outcome == ToggleOutcome::Ignored {
                assert_eq!(state.selection.ids().join(","), before);
            }
        }
    }

    #[test]
    fn test_unknown_card_id_ignored() {
        let mut state = at_selection("q");
        assert_eq!(state.toggle_card("card_999"), ToggleOutcome::Ignored);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn test_complete_requires_exactly_three() {
        let mut state = at_selection("q");
        assert!(state.apply(SessionAction::CompleteSelection).is_none());

        pick(&mut state, &["card_0", "card_1"]);
        assert!(state.apply(SessionAction::CompleteSelection).is_none());
        assert_eq!(state.request, RequestState::Idle);

        pick(&mut state, &["card_2"]);
        let effect = state.apply(SessionAction::CompleteSelection);
        assert!(matches!(effect, Some(Effect::RequestInterpretation(_))));
        assert!(state.request.is_pending());
    }

    #[test]
    fn test_complete_fires_once_per_selection() {
        let mut state = at_selection("q");
        pick(&mut state, &["card_0", "card_1", "card_2"]);
        assert!(state.complete_selection().is_some());
        assert!(state.complete_selection().is_none());
        // Selection is frozen while pending
        assert_eq!(state.toggle_card("card_0"), ToggleOutcome::Ignored);
    }

    #[test]
    fn test_request_carries_cards_in_pick_order() {
        let mut state = at_selection("내 연애운은?");
        pick(&mut state, &["card_0", "card_27", "card_10"]);
        let request = state.complete_selection().unwrap();

        let names: Vec<&str> = request.cards.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["The Fool", "Six of Wands", "Wheel of Fortune"]);
        assert_eq!(request.question, "내 연애운은?");
    }

    #[test]
    fn test_interpretation_success_moves_to_result() {
        let mut state = at_selection("내 연애운은?");
        pick(&mut state, &["card_0", "card_5", "card_10"]);
        let request = state.complete_selection().unwrap();

        let applied = state.on_interpretation(
            request.request_id,
            Ok("사랑이 곧 찾아올 것입니다.".to_string()),
        );
        assert!(applied);
        assert_eq!(state.phase, Phase::ResultDisplay);
        assert_eq!(state.interpretation, "사랑이 곧 찾아올 것입니다.");
        assert!(state.received_at.is_some());
        assert_eq!(state.selection.ids(), vec!["card_0", "card_5", "card_10"]);
    }

    #[test]
    fn test_interpretation_failure_and_retry() {
        let mut state = at_selection("q");
        pick(&mut state, &["card_0", "card_1", "card_2"]);
        let first = state.complete_selection().unwrap();

        state.on_interpretation(first.request_id, Err(TarotError::HttpError("down".into())));
        assert_eq!(state.phase, Phase::CardSelection);
        match &state.request {
            RequestState::Failed {
                message,
                recoverable,
                ..
            } => {
                assert!(!message.is_empty());
                assert!(*recoverable);
            }
            other => panic!("expected Failed, got {:?}", other),
        }

        let effect = state.apply(SessionAction::RetryInterpretation);
        let Some(Effect::RequestInterpretation(second)) = effect else {
            panic!("expected a new request");
        };
        assert_ne!(first.request_id, second.request_id);
        assert_eq!(first.cards, second.cards);

        // A late answer to the first request is ignored
        assert!(!state.on_interpretation(first.request_id, Ok("late".into())));
        assert!(state.on_interpretation(second.request_id, Ok("fresh".into())));
        assert_eq!(state.interpretation, "fresh");
    }

    #[test]
    fn test_retry_only_after_failure() {
        let mut state = at_selection("q");
        pick(&mut state, &["card_0", "card_1", "card_2"]);
        assert!(state.retry_interpretation().is_none());
        state.complete_selection();
        assert!(state.retry_interpretation().is_none());
    }

    #[test]
    fn test_changing_selection_clears_failure() {
        let mut state = at_selection("q");
        pick(&mut state, &["card_0", "card_1", "card_2"]);
        let request = state.complete_selection().unwrap();
        state.on_interpretation(request.request_id, Err(TarotError::HttpError("x".into())));

        state.toggle_card("card_2");
        assert_eq!(state.request, RequestState::Idle);
        assert!(state.complete_selection().is_none());
    }

    #[test]
    fn test_reset_clears_everything_from_any_phase() {
        for phase_steps in 0..4 {
            let mut state = SessionState::new();
            if phase_steps >= 1 {
                state.apply(SessionAction::Start);
                state.apply(SessionAction::EditQuestion("질문".to_string()));
                state.apply(SessionAction::StartVoiceCapture);
            }
            if phase_steps >= 2 {
                state.on_transcript("음성 질문".to_string());
                state.apply(SessionAction::SubmitQuestion);
                pick(&mut state, &["card_0", "card_1", "card_2"]);
            }
            if phase_steps >= 3 {
                let request = state.complete_selection().unwrap();
                state.on_interpretation(request.request_id, Ok("해석".to_string()));
                assert_eq!(state.phase, Phase::ResultDisplay);
            }

            state.apply(SessionAction::Reset);
            assert_eq!(state.phase, Phase::Welcome);
            assert!(state.question.is_empty());
            assert!(state.selection.is_empty());
            assert!(state.interpretation.is_empty());
            assert!(!state.listening);
            assert!(state.notice.is_none());
            assert_eq!(state.request, RequestState::Idle);
        }
    }

    #[test]
    fn test_reset_while_listening_cancels_capture() {
        let mut state = SessionState::new();
        state.apply(SessionAction::Start);
        assert_eq!(
            state.apply(SessionAction::StartVoiceCapture),
            Some(Effect::StartVoiceCapture)
        );
        assert_eq!(
            state.apply(SessionAction::Reset),
            Some(Effect::CancelVoiceCapture)
        );
        assert_eq!(state.apply(SessionAction::Reset), None);
    }

    #[test]
    fn test_submit_while_listening_cancels_capture() {
        let mut state = SessionState::new();
        state.apply(SessionAction::Start);
        state.apply(SessionAction::EditQuestion("typed".to_string()));
        state.apply(SessionAction::StartVoiceCapture);

        assert_eq!(
            state.apply(SessionAction::SubmitQuestion),
            Some(Effect::CancelVoiceCapture)
        );
        assert_eq!(state.phase, Phase::CardSelection);
        assert!(!state.listening);
        assert!(!state.on_transcript("late".to_string()));
        assert_eq!(state.question, "typed");
    }

    #[test]
    fn test_reset_discards_inflight_request() {
        let mut state = at_selection("q");
        pick(&mut state, &["card_0", "card_1", "card_2"]);
        let request = state.complete_selection().unwrap();
        state.reset();

        assert!(!state.on_interpretation(request.request_id, Ok("late".into())));
        assert_eq!(state.phase, Phase::Welcome);
        assert!(state.interpretation.is_empty());
    }

    #[test]
    fn test_voice_transcript_fills_question() {
        let mut state = SessionState::new();
        state.apply(SessionAction::Start);
        state.apply(SessionAction::StartVoiceCapture);
        assert!(state.listening);
        // A second trigger while listening does nothing
        assert!(state.apply(SessionAction::StartVoiceCapture).is_none());

        assert!(state.on_transcript("내 연애운은?".to_string()));
        assert!(!state.listening);
        assert_eq!(state.question, "내 연애운은?");
        // Only the first result counts
        assert!(!state.on_transcript("두 번째".to_string()));
        assert_eq!(state.question, "내 연애운은?");
    }

    #[test]
    fn test_voice_error_surfaces_notice() {
        let mut state = SessionState::new();
        state.apply(SessionAction::Start);
        state.apply(SessionAction::EditQuestion("typed".to_string()));
        state.apply(SessionAction::StartVoiceCapture);

        let err = TarotError::SpeechError("no speech".to_string());
        assert!(state.on_voice_error(&err));
        assert!(!state.listening);
        assert_eq!(state.question, "typed");
        assert_eq!(state.notice, Some(Notice::Voice(err.user_message())));
    }

    #[test]
    fn test_phase_from_name() {
        assert_eq!(Phase::from_name("welcome"), Some(Phase::Welcome));
        assert_eq!(Phase::from_name("result_display"), Some(Phase::ResultDisplay));
        assert_eq!(Phase::from_name("nope"), None);
    }

    #[test]
    fn test_shared_session_snapshot_is_independent() {
        let shared = SharedSession::new();
        let before = shared.snapshot();

        shared.write().apply(SessionAction::Start);

        assert_eq!(before.phase, Phase::Welcome);
        assert_eq!(shared.phase(), Phase::QuestionCapture);
        assert_eq!(shared.selected_count(), 0);
    }

    #[test]
    fn test_deck_lookup_used_by_toggle() {
        let mut state = at_selection("q");
        state.toggle_card("card_77");
        assert_eq!(state.selection.cards()[0], *deck().get("card_77").unwrap());
    }
}
