//! cpal output-stream construction.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::render::RenderCore;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream};

/// Extract a device's display name (cpal 0.17 `description`).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Find an output device by case-insensitive substring, or the default.
pub fn find_output_device(name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();
    match name {
        Some(search) => {
            let needle = search.to_lowercase();
            let devices = host
                .output_devices()
                .map_err(|e| EngineError::Stream(e.to_string()))?;
            for device in devices {
                if let Ok(dev_name) = device_name(&device)
                    && dev_name.to_lowercase().contains(&needle)
                {
                    return Ok(device);
                }
            }
            Err(EngineError::DeviceNotFound(search.to_string()))
        }
        None => host.default_output_device().ok_or(EngineError::NoDevice),
    }
}

/// Build and start the output stream, handing the render core to the
/// callback. The stream plays until dropped.
pub fn build_output_stream(config: &EngineConfig, mut core: RenderCore) -> Result<Stream> {
    let device = find_output_device(config.device_name.as_deref())?;

    let channels: u16 = 2;
    let stream_config = cpal::StreamConfig {
        channels,
        sample_rate: config.sample_rate,
        buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
    };

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                core.process_interleaved(data, channels as usize);
            },
            move |err| {
                tracing::error!(error = %err, "output stream error");
            },
            None,
        )
        .map_err(|e| EngineError::Stream(e.to_string()))?;

    stream.play().map_err(|e| EngineError::Stream(e.to_string()))?;
    tracing::info!(
        sample_rate = config.sample_rate,
        buffer_size = config.buffer_size,
        "output stream started"
    );
    Ok(stream)
}
