use crate::{Result, TarotError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default input device, producing mono `f32` chunks
///
/// The cpal stream is not `Send`; create and drop the microphone on the
/// thread that consumes its samples.
pub struct Microphone {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    is_recording: Arc<AtomicBool>,
}

impl Microphone {
    /// Open the default input device
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| TarotError::AudioDeviceError("No input device available".into()))?;

        info!(
            "[VOICE] Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config: StreamConfig = device
            .default_input_config()
            .map_err(|e| TarotError::AudioDeviceError(format!("Failed to get input config: {}", e)))?
            .into();

        debug!(
            "[VOICE] Input config: {}Hz, {} channel(s)",
            config.sample_rate.0, config.channels
        );

        Ok(Self {
            device,
            config,
            stream: None,
            is_recording: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start streaming mono chunks into `audio_tx`
    pub fn start(&mut self, audio_tx: Sender<Vec<f32>>) -> Result<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            warn!("[VOICE] Already recording");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let is_recording = Arc::clone(&self.is_recording);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !is_recording.load(Ordering::SeqCst) {
                        return;
                    }

                    let samples = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };

                    if let Err(e) = audio_tx.try_send(samples) {
                        debug!("[VOICE] Dropped audio chunk: {}", e);
                    }
                },
                |err| error!("[VOICE] Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| TarotError::AudioDeviceError(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| TarotError::AudioDeviceError(format!("Failed to start input stream: {}", e)))?;

        self.is_recording.store(true, Ordering::SeqCst);
        self.stream = Some(stream);
        info!("[VOICE] Microphone open");
        Ok(())
    }

    pub fn stop(&mut self) {
        self.is_recording.store(false, Ordering::SeqCst);
        if self.stream.take().is_some() {
            info!("[VOICE] Microphone closed");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }
}

impl Drop for Microphone {
    fn drop(&mut self) {
        self.stop();
    }
}
