use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::fmt;
use tracing::{debug, info};

use crate::config::CameraConfig;

/// A frame source opened once at startup.
pub trait Camera: Send + Sync {
    fn capture_frame(&mut self) -> Result<RgbImage>;
    fn release(&mut self);
}

impl fmt::Debug for dyn Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Camera")
    }
}

/// Produces synthetic frames in place of a real sensor.
pub struct SimulatedCamera {
    config: CameraConfig,
    open: bool,
}

impl fmt::Debug for SimulatedCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedCamera")
            .field("width", &self.config.width)
            .field("height", &self.config.height)
            .field("open", &self.open)
            .finish()
    }
}

impl SimulatedCamera {
    pub fn open(config: &CameraConfig) -> Result<Self> {
        if !config.enabled {
            bail!("Camera device is disabled");
        }
        if config.width == 0 || config.height == 0 {
            bail!(
                "Invalid camera resolution {}x{}",
                config.width,
                config.height
            );
        }
        Ok(Self {
            config: config.clone(),
            open: true,
        })
    }
}

impl Camera for SimulatedCamera {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        if !self.open {
            bail!("Camera has been released");
        }
        let (width, height) = (self.config.width, self.config.height);
        // Reddish terrain gradient with sensor noise.
        let frame = RgbImage::from_fn(width, height, |x, y| {
            let noise: u8 = rand::random_range(0..32);
            let shade = ((y * 160) / height) as u8;
            Rgb([
                (95 + shade / 2).saturating_add(noise),
                (40 + ((x * 40) / width) as u8).saturating_add(noise / 2),
                (20 + shade / 4).saturating_add(noise / 4),
            ])
        });
        debug!("Captured {}x{} frame", width, height);
        Ok(frame)
    }

    fn release(&mut self) {
        if self.open {
            self.open = false;
            info!("Camera released");
        }
    }
}

pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(frame)
        .context("Failed to encode frame as JPEG")?;
    Ok(buffer)
}

/// JPEG-encodes a frame and wraps it in base64 for the radio link.
pub fn encode_for_transmission(frame: &RgbImage, quality: u8) -> Result<String> {
    let jpeg = encode_jpeg(frame, quality)?;
    Ok(STANDARD.encode(jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_camera() -> CameraConfig {
        CameraConfig {
            width: 32,
            height: 24,
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_camera_fails_to_open() {
        let config = CameraConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(SimulatedCamera::open(&config).is_err());
    }

    #[test]
    fn test_capture_matches_resolution() -> Result<()> {
        let mut camera = SimulatedCamera::open(&small_camera())?;
        let frame = camera.capture_frame()?;
        assert_eq!(frame.dimensions(), (32, 24));
        Ok(())
    }

    #[test]
    fn test_released_camera_cannot_capture() -> Result<()> {
        let mut camera = SimulatedCamera::open(&small_camera())?;
        camera.release();
        assert!(camera.capture_frame().is_err());
        Ok(())
    }

    #[test]
    fn test_jpeg_and_base64_encoding() -> Result<()> {
        let mut camera = SimulatedCamera::open(&small_camera())?;
        let frame = camera.capture_frame()?;

        let jpeg = encode_jpeg(&frame, 50)?;
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let payload = encode_for_transmission(&frame, 50)?;
        assert_eq!(STANDARD.decode(&payload)?, jpeg);
        Ok(())
    }
}
