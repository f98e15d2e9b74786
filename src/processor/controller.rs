//! Session controller
//!
//! Owns the shared session, the oracle worker and the speech recognizer.
//! The UI calls [`SessionController::dispatch`] for every user action and
//! [`SessionController::pump`] once per frame to fold worker results back in.

use super::oracle::{OracleEvent, OracleHandle, OracleRunner};
use super::voice::{recognizer_for, SpeechRecognizer, VoiceEvent};
use crate::config::TarotConfig;
use crate::state::{Effect, SessionAction, SharedSession};
use crate::{Result, TarotError};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use tracing::{debug, info, warn};

pub struct SessionController {
    session: SharedSession,
    oracle: OracleHandle,
    recognizer: Box<dyn SpeechRecognizer>,
    locale: String,
    voice_rx: Option<Receiver<VoiceEvent>>,
}

impl SessionController {
    /// Start the oracle worker and pick a recognizer for this build
    pub fn from_config(config: &TarotConfig) -> Result<Self> {
        Self::new(config, recognizer_for(&config.voice))
    }

    /// Start the oracle worker with the given recognizer
    pub fn new(config: &TarotConfig, recognizer: Box<dyn SpeechRecognizer>) -> Result<Self> {
        let oracle = OracleRunner::new(config.oracle.clone()).start_worker()?;
        info!(
            "[SESSION] Controller ready (voice: {})",
            recognizer.name()
        );
        Ok(Self {
            session: SharedSession::new(),
            oracle,
            recognizer,
            locale: config.voice.locale.clone(),
            voice_rx: None,
        })
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Apply a user action and start whatever it asks for
    pub fn dispatch(&mut self, action: SessionAction) {
        let effect = self.session.write().apply(action);
        if let Some(effect) = effect {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestInterpretation(request) => {
                let request_id = request.request_id;
                if let Err(e) = self.oracle.interpret(request) {
                    self.session.write().on_interpretation(request_id, Err(e));
                }
            }
            Effect::StartVoiceCapture => {
                let (events_tx, events_rx) = bounded(1);
                match self.recognizer.start(&self.locale, events_tx) {
                    Ok(()) => {
                        debug!("[VOICE] Capture started via {}", self.recognizer.name());
                        self.voice_rx = Some(events_rx);
                    }
                    Err(e) => {
                        warn!("[VOICE] Capture could not start: {}", e);
                        self.session.write().on_voice_error(&e);
                    }
                }
            }
            Effect::CancelVoiceCapture => {
                self.recognizer.cancel();
                self.voice_rx = None;
            }
        }
    }

    /// Fold finished worker results into the session
    ///
    /// Returns true if anything arrived, so the caller can repaint.
    pub fn pump(&mut self) -> bool {
        let mut changed = self.pump_voice();

        while let Some(event) = self.oracle.try_recv_event() {
            changed = true;
            match event {
                OracleEvent::Complete { request_id, text } => {
                    self.session.write().on_interpretation(request_id, Ok(text));
                }
                OracleEvent::Failed { request_id, error } => {
                    self.session.write().on_interpretation(request_id, Err(error));
                }
                OracleEvent::Shutdown => {
                    warn!("[ORACLE] Worker stopped unexpectedly");
                }
            }
        }

        changed
    }

    fn pump_voice(&mut self) -> bool {
        let Some(rx) = &self.voice_rx else {
            return false;
        };

        let event = match rx.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => VoiceEvent::Error(TarotError::SpeechError(
                "capture ended without a result".to_string(),
            )),
        };
        self.voice_rx = None;

        let mut session = self.session.write();
        match event {
            VoiceEvent::Transcript(text) => {
                session.on_transcript(text);
            }
            VoiceEvent::Error(e) => {
                session.on_voice_error(&e);
            }
        }
        true
    }

    /// True while a request or capture is outstanding
    pub fn is_busy(&self) -> bool {
        let session = self.session.read();
        session.request.is_pending() || session.listening
    }

    /// Stop the recognizer and the oracle worker
    pub fn shutdown(mut self) -> Result<()> {
        self.recognizer.cancel();
        self.voice_rx = None;
        self.oracle.shutdown()
    }
}
