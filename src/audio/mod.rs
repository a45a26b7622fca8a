/// Block clock using cpal
///
/// The output stream only ever plays silence. Its data callback is what
/// paces the sequencer: every callback is one processing block.
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Work done once per audio block, on the audio thread. Implementations
/// must not allocate or block.
pub trait BlockProcessor: Send + 'static {
    fn process_block(&mut self, frames: usize);
}

pub struct BlockClock {
    _stream: cpal::Stream,
}

impl BlockClock {
    /// Opens the default output device and starts calling `processor`.
    pub fn start<P: BlockProcessor>(processor: P) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no default audio output device"))?;
        let config = device
            .default_output_config()
            .context("failed to query default output config")?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels().max(1) as usize;
        let sample_format = config.sample_format();
        let stream_config: cpal::StreamConfig = config.into();

        let mut processor = processor;
        let stream = match sample_format {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data.fill(0.0);
                    processor.process_block(data.len() / channels);
                },
                |err| log::error!("audio stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I16 => device.build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    data.fill(0);
                    processor.process_block(data.len() / channels);
                },
                |err| log::error!("audio stream error: {}", err),
                None,
            ),
            format => return Err(anyhow!("unsupported sample format {:?}", format)),
        }
        .context("failed to build output stream")?;

        stream.play().context("failed to start output stream")?;
        log::info!(
            "block clock running at {} Hz, {} channel(s)",
            sample_rate,
            channels
        );

        Ok(Self { _stream: stream })
    }
}
