use crate::{Result, TarotError};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Frames handed to the sinc resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Mono resampler for a live stream of arbitrarily sized chunks
///
/// Input is buffered until a full chunk is available, so only the final
/// [`flush`](Self::flush) pads with silence. Matching rates pass through.
pub struct StreamResampler {
    resampler: Option<SincFixedIn<f32>>,
    pending: Vec<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl StreamResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(TarotError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }

        let resampler = if input_rate == output_rate {
            None
        } else {
            let params = SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };
            let ratio = output_rate as f64 / input_rate as f64;
            let resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_FRAMES, 1)
                .map_err(|e| {
                    TarotError::AudioDeviceError(format!("Failed to create resampler: {}", e))
                })?;
            Some(resampler)
        };

        debug!("[VOICE] Resampler {} Hz -> {} Hz", input_rate, output_rate);

        Ok(Self {
            resampler,
            pending: Vec::with_capacity(CHUNK_FRAMES * 2),
            input_rate,
            output_rate,
        })
    }

    /// Feed samples, returning whatever full chunks produced
    pub fn push(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(input.to_vec());
        };

        self.pending.extend_from_slice(input);
        let mut output = Vec::new();
        while self.pending.len() >= CHUNK_FRAMES {
            let chunk: Vec<f32> = self.pending.drain(..CHUNK_FRAMES).collect();
            let planar = resampler
                .process(&[chunk], None)
                .map_err(|e| TarotError::AudioDeviceError(format!("Resampling failed: {}", e)))?;
            if let Some(channel) = planar.into_iter().next() {
                output.extend(channel);
            }
        }
        Ok(output)
    }

    /// Resample whatever is still buffered, padded with silence
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        if self.resampler.is_none() || self.pending.is_empty() {
            self.pending.clear();
            return Ok(Vec::new());
        }

        let real_frames = self.pending.len();
        self.pending.resize(CHUNK_FRAMES, 0.0);
        let mut output = self.push(&[])?;

        // Keep only the part that corresponds to real input
        let keep = (real_frames as f64 * self.ratio()).ceil() as usize;
        output.truncate(keep);
        Ok(output)
    }

    pub fn ratio(&self) -> f64 {
        self.output_rate as f64 / self.input_rate as f64
    }
}
