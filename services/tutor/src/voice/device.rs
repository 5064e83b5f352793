//! Microphone and speaker access through the default audio host.
//!
//! Playback blocks the calling thread; run it on a blocking task.

use anyhow::{Context, Result, bail};
use cpal::{
    SampleFormat, SampleRate, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use ringbuf::{
    HeapCons, HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::audio::{downmix_to_mono, resample};
use super::pipeline::Recording;
use super::playback::{PlaybackWatch, playback_limit};
use super::speech::SpeechAudio;

/// Longest recording kept; audio past this is dropped.
const MAX_RECORDING_SECS: usize = 120;

/// Names of the default input and output devices, if any.
#[derive(Debug, Clone, Default)]
pub struct DeviceReport {
    pub input: Option<String>,
    pub output: Option<String>,
}

pub fn default_devices() -> DeviceReport {
    let host = cpal::default_host();
    DeviceReport {
        input: host.default_input_device().and_then(|d| d.name().ok()),
        output: host.default_output_device().and_then(|d| d.name().ok()),
    }
}

/// A microphone stream that keeps recording until [`ActiveRecording::finish`].
pub struct ActiveRecording {
    stream: cpal::Stream,
    consumer: HeapCons<f32>,
    channels: u16,
    sample_rate: u32,
}

impl ActiveRecording {
    /// Stops the stream and returns what was captured, down-mixed to mono.
    pub fn finish(mut self) -> Recording {
        if let Err(e) = self.stream.pause() {
            debug!(error = %e, "Could not pause input stream");
        }
        let interleaved: Vec<f32> = self.consumer.pop_iter().collect();
        let recording = Recording {
            samples: downmix_to_mono(&interleaved, self.channels),
            sample_rate: self.sample_rate,
        };
        info!(seconds = recording.duration_secs(), "Recording finished");
        recording
    }
}

/// Starts recording from the default input device.
///
/// `fallback_sample_rate` is used when the device does not report a default
/// configuration.
pub fn start_recording(fallback_sample_rate: u32) -> Result<ActiveRecording> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("No microphone found")?;

    let (stream_config, sample_format) = match device.default_input_config() {
        Ok(supported) => (supported.config(), supported.sample_format()),
        Err(e) => {
            warn!(error = %e, fallback_sample_rate, "Input device has no default config");
            (
                StreamConfig {
                    channels: 1,
                    sample_rate: SampleRate(fallback_sample_rate),
                    buffer_size: cpal::BufferSize::Default,
                },
                SampleFormat::F32,
            )
        }
    };
    let sample_rate = stream_config.sample_rate.0;
    let channels = stream_config.channels;
    debug!(sample_rate, channels, ?sample_format, "Opening input stream");

    let ring = HeapRb::<f32>::new(sample_rate as usize * channels as usize * MAX_RECORDING_SECS);
    let (mut producer, consumer) = ring.split();
    let err_fn = |e: cpal::StreamError| error!(error = %e, "Input stream error");

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                producer.push_slice(data);
            },
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    let _ = producer.try_push(sample as f32 / 32768.0);
                }
            },
            err_fn,
            None,
        )?,
        other => bail!("Unsupported microphone sample format: {:?}", other),
    };
    stream.play()?;

    Ok(ActiveRecording {
        stream,
        consumer,
        channels,
        sample_rate,
    })
}

/// Plays mono speech on the default output device and waits until it ends.
pub fn play(audio: &SpeechAudio) -> Result<()> {
    if audio.samples.is_empty() {
        return Ok(());
    }
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("No speaker found")?;
    let supported = device.default_output_config()?;
    let sample_format = supported.sample_format();
    let stream_config = supported.config();
    let channels = stream_config.channels as usize;

    let mono = resample(&audio.samples, audio.sample_rate, stream_config.sample_rate.0)?;
    let mut ring = HeapRb::<f32>::new(mono.len() * channels + 1);
    for sample in &mono {
        for _ in 0..channels {
            let _ = ring.try_push(*sample);
        }
    }
    let (_, mut consumer) = ring.split();
    let watch = PlaybackWatch::new();
    let watch_in_callback = watch.clone();
    let watch_on_error = watch.clone();
    let err_fn = move |e: cpal::StreamError| {
        error!(error = %e, "Output stream error");
        watch_on_error.mark_failed();
    };

    let stream = match sample_format {
        SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for out in data.iter_mut() {
                    *out = consumer.try_pop().unwrap_or(0.0);
                }
                if consumer.is_empty() {
                    watch_in_callback.mark_finished();
                }
            },
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_output_stream(
            &stream_config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                for out in data.iter_mut() {
                    let sample = consumer.try_pop().unwrap_or(0.0);
                    *out = (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                }
                if consumer.is_empty() {
                    watch_in_callback.mark_finished();
                }
            },
            err_fn,
            None,
        )?,
        other => bail!("Unsupported speaker sample format: {:?}", other),
    };
    stream.play()?;

    watch.wait(playback_limit(audio.samples.len(), audio.sample_rate))?;
    // Let the device drain its own buffer.
    std::thread::sleep(Duration::from_millis(250));
    Ok(())
}
