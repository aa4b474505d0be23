use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use super::{AudioWaiterConfig, Waiter};
use crate::error::{ControlError, Result};
use crate::shutdown::ShutdownSignal;

/// Blocks until the default input device picks up a signal above the threshold
pub struct AudioLevelWaiter {
    config: AudioWaiterConfig,
    shutdown: ShutdownSignal,
}

impl AudioLevelWaiter {
    pub fn new(config: AudioWaiterConfig, shutdown: ShutdownSignal) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.threshold) {
            return Err(ControlError::InvalidParameter(format!(
                "audio threshold {} is outside 0.0..=1.0",
                config.threshold
            )));
        }
        Ok(Self { config, shutdown })
    }

    fn build_stream(&self, peaks: Sender<f32>) -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| ControlError::AudioError("no input device".to_string()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| ControlError::AudioError(e.to_string()))?;
        let config: cpal::StreamConfig = supported.config();
        let threshold = self.config.threshold;

        let err_fn = |err: cpal::StreamError| tracing::warn!("Audio input stream error: {}", err);

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    report_peak(&peaks, data.iter().map(|s| s.abs()), threshold)
                },
                err_fn,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    report_peak(
                        &peaks,
                        data.iter().map(|s| f32::from(*s).abs() / f32::from(i16::MAX)),
                        threshold,
                    )
                },
                err_fn,
                None,
            ),
            cpal::SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    report_peak(
                        &peaks,
                        data.iter()
                            .map(|s| (f32::from(*s) - 32768.0).abs() / 32768.0),
                        threshold,
                    )
                },
                err_fn,
                None,
            ),
            other => {
                return Err(ControlError::AudioError(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| ControlError::AudioError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| ControlError::AudioError(e.to_string()))?;
        Ok(stream)
    }
}

fn report_peak(peaks: &Sender<f32>, samples: impl Iterator<Item = f32>, threshold: f32) {
    let peak = samples.fold(0.0f32, f32::max);
    if peak >= threshold {
        // full means a peak is already waiting to be read
        let _ = peaks.try_send(peak);
    }
}

impl Waiter for AudioLevelWaiter {
    fn name(&self) -> &str {
        "audio"
    }

    fn wait(&mut self) -> Result<()> {
        let (tx, rx) = bounded(1);
        let stream = self.build_stream(tx)?;
        tracing::info!(
            "Waiting for audio input above {:.2}",
            self.config.threshold
        );

        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let result = loop {
            match rx.recv_timeout(poll) {
                Ok(peak) => {
                    tracing::info!("Audio level {:.2} reached, starting", peak);
                    break Ok(());
                }
                Err(RecvTimeoutError::Timeout) if self.shutdown.is_triggered() => {
                    break Err(ControlError::Interrupted)
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    break Err(ControlError::AudioError(
                        "audio input stream closed".to_string(),
                    ))
                }
            }
        };

        drop(stream);
        result
    }
}
