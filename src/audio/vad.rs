use crate::{Result, TarotError};
use tracing::info;
use voice_activity_detector::VoiceActivityDetector;

/// Silero VAD window at 16 kHz (32 ms)
pub const VAD_CHUNK: usize = 512;

/// Speech detector for 16 kHz mono audio
///
/// Samples are buffered into fixed windows; each full window yields one
/// speech/non-speech decision.
pub struct SpeechDetector {
    detector: VoiceActivityDetector,
    threshold: f32,
    pending: Vec<f32>,
}

impl SpeechDetector {
    pub fn new(threshold: f32) -> Result<Self> {
        let detector = VoiceActivityDetector::builder()
            .sample_rate(super::SPEECH_SAMPLE_RATE as i32)
            .chunk_size(VAD_CHUNK)
            .build()
            .map_err(|e| TarotError::SpeechError(format!("Failed to create VAD: {:?}", e)))?;

        info!("[VOICE] VAD ready, threshold {}", threshold);

        Ok(Self {
            detector,
            threshold: threshold.clamp(0.0, 1.0),
            pending: Vec::with_capacity(VAD_CHUNK * 2),
        })
    }

    /// Feed samples; returns one decision per completed window
    pub fn push(&mut self, samples: &[f32]) -> Vec<bool> {
        self.pending.extend_from_slice(samples);
        let mut decisions = Vec::new();
        while self.pending.len() >= VAD_CHUNK {
            let window: Vec<f32> = self.pending.drain(..VAD_CHUNK).collect();
            let probability = self.detector.predict(window);
            decisions.push(probability >= self.threshold);
        }
        decisions
    }

    /// Seconds of audio covered by one decision
    pub fn window_secs() -> f32 {
        VAD_CHUNK as f32 / super::SPEECH_SAMPLE_RATE as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_not_speech() {
        if let Ok(mut vad) = SpeechDetector::new(0.5) {
            let decisions = vad.push(&vec![0.0f32; VAD_CHUNK * 3]);
            assert_eq!(decisions.len(), 3);
            assert!(decisions.iter().all(|d| !d));
        }
    }

    #[test]
    fn test_partial_window_is_buffered() {
        if let Ok(mut vad) = SpeechDetector::new(0.5) {
            assert!(vad.push(&vec![0.0f32; VAD_CHUNK - 1]).is_empty());
            assert_eq!(vad.push(&[0.0f32]).len(), 1);
        }
    }

    #[test]
    fn test_window_secs() {
        assert!((SpeechDetector::window_secs() - 0.032).abs() < 1e-6);
    }
}
