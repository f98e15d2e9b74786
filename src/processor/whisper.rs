//! Whisper-backed speech recognizer
//!
//! Each capture runs on its own thread: microphone → 16 kHz resampling → VAD
//! end-pointing → one Whisper pass over the whole utterance.

use super::voice::{Endpoint, Endpointer, SpeechRecognizer, VoiceEvent};
use crate::audio::{Microphone, SpeechDetector, StreamResampler, SPEECH_SAMPLE_RATE};
use crate::config::VoiceConfig;
use crate::{Result, TarotError};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Speech recognizer backed by a local Whisper model
pub struct WhisperRecognizer {
    config: VoiceConfig,
    context: Arc<WhisperContext>,
    cancel: Option<Arc<AtomicBool>>,
}

impl WhisperRecognizer {
    /// Load the model named in the voice configuration
    pub fn new(config: VoiceConfig) -> Result<Self> {
        let model_path = config
            .model_path
            .clone()
            .ok_or_else(|| TarotError::ConfigError("voice.model_path is not set".to_string()))?;

        if !model_path.exists() {
            return Err(TarotError::ConfigError(format!(
                "Speech model not found: {:?}",
                model_path
            )));
        }

        info!("[VOICE] Loading Whisper model from {:?}", model_path);
        let path = model_path
            .to_str()
            .ok_or_else(|| TarotError::ConfigError("Invalid model path".to_string()))?;
        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| TarotError::SpeechError(format!("Failed to load Whisper model: {:?}", e)))?;

        Ok(Self {
            config,
            context: Arc::new(context),
            cancel: None,
        })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn start(&mut self, locale: &str, events: Sender<VoiceEvent>) -> Result<()> {
        self.cancel();

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Some(Arc::clone(&cancel));

        let config = self.config.clone().with_locale(locale);
        let context = Arc::clone(&self.context);

        std::thread::Builder::new()
            .name("voice-capture".to_string())
            .spawn(move || {
                let event = match capture_and_transcribe(&config, &context, &cancel) {
                    Ok(Some(text)) => VoiceEvent::Transcript(text),
                    // Cancelled; nobody is listening for the result
                    Ok(None) => return,
                    Err(e) => {
                        warn!("[VOICE] Capture failed: {}", e);
                        VoiceEvent::Error(e)
                    }
                };
                if events.send(event).is_err() {
                    debug!("[VOICE] Capture result dropped, receiver gone");
                }
            })?;

        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(flag) = self.cancel.take() {
            flag.store(true, Ordering::SeqCst);
            debug!("[VOICE] Capture cancelled");
        }
    }

    fn name(&self) -> &str {
        "whisper"
    }
}

/// Record one utterance and transcribe it; `Ok(None)` when cancelled
fn capture_and_transcribe(
    config: &VoiceConfig,
    context: &WhisperContext,
    cancel: &AtomicBool,
) -> Result<Option<String>> {
    let Some(samples) = record_utterance(config, cancel)? else {
        return Ok(None);
    };
    if cancel.load(Ordering::SeqCst) {
        return Ok(None);
    }
    transcribe(context, config.language(), &samples).map(Some)
}

fn record_utterance(config: &VoiceConfig, cancel: &AtomicBool) -> Result<Option<Vec<f32>>> {
    let (audio_tx, audio_rx) = bounded::<Vec<f32>>(64);
    let mut mic = Microphone::open()?;
    let mut resampler = StreamResampler::new(mic.sample_rate(), SPEECH_SAMPLE_RATE)?;
    let mut vad = SpeechDetector::new(config.vad_threshold)?;
    let mut endpointer = Endpointer::from_config(SpeechDetector::window_secs(), config);

    mic.start(audio_tx)?;
    info!("[VOICE] Listening ({})", config.locale);

    let mut utterance = Vec::new();
    loop {
        if cancel.load(Ordering::SeqCst) {
            mic.stop();
            return Ok(None);
        }

        let chunk = match audio_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => chunk,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(TarotError::AudioDeviceError(
                    "Microphone stream ended".to_string(),
                ));
            }
        };

        let resampled = resampler.push(&chunk)?;
        utterance.extend_from_slice(&resampled);

        let mut finished = None;
        for is_speech in vad.push(&resampled) {
            match endpointer.push(is_speech) {
                Endpoint::Continue => {}
                decision => {
                    finished = Some(decision);
                    break;
                }
            }
        }

        match finished {
            None => continue,
            Some(Endpoint::NoSpeech) => {
                mic.stop();
                return Err(TarotError::SpeechError("no speech detected".to_string()));
            }
            Some(_) => {
                mic.stop();
                utterance.extend(resampler.flush()?);
                debug!(
                    "[VOICE] Utterance captured: {:.1}s",
                    utterance.len() as f32 / SPEECH_SAMPLE_RATE as f32
                );
                return Ok(Some(utterance));
            }
        }
    }
}

fn transcribe(context: &WhisperContext, language: &str, samples: &[f32]) -> Result<String> {
    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some(language));
    params.set_translate(false);
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    let mut state = context
        .create_state()
        .map_err(|e| TarotError::SpeechError(format!("Failed to create state: {:?}", e)))?;

    state
        .full(params, samples)
        .map_err(|e| TarotError::SpeechError(format!("Transcription failed: {:?}", e)))?;

    let num_segments = state
        .full_n_segments()
        .map_err(|e| TarotError::SpeechError(format!("Failed to get segments: {:?}", e)))?;

    let mut text = String::new();
    for i in 0..num_segments {
        match state.full_get_segment_text(i) {
            Ok(segment) => text.push_str(&segment),
            Err(e) => error!("[VOICE] Failed to read segment {}: {:?}", i, e),
        }
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(TarotError::SpeechError("empty transcript".to_string()));
    }
    info!("[VOICE] Transcribed {} chars", text.chars().count());
    Ok(text)
}
