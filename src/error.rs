//! Error types for the adapter boundary.
//!
//! Nothing here ever reaches the frame loop: callers degrade to a default
//! (fixed colour, default settings) and log a warning.

use std::fmt;

/// Errors that can occur when building an image sampler from a host buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    /// Width or height is zero.
    EmptyImage,
    /// Byte buffer length does not match `width * height * 4`.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::EmptyImage => write!(f, "Image has no pixels"),
            SampleError::SizeMismatch { expected, actual } => write!(
                f,
                "RGBA buffer has {} bytes, expected {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for SampleError {}

/// Errors that can occur when loading settings.
#[derive(Debug)]
pub enum SettingsError {
    /// Stored JSON could not be parsed.
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Parse(e) => write!(f, "Failed to parse settings: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Parse(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Errors that can occur while bringing up the GPU host.
#[derive(Debug)]
pub enum RenderError {
    /// The adapter refused a device.
    Device(wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    NoSurfaceFormat,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Device(e) => write!(f, "Failed to create device: {}", e),
            RenderError::NoSurfaceFormat => write!(f, "Surface has no supported format"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Device(e) => Some(e),
            RenderError::NoSurfaceFormat => None,
        }
    }
}

impl From<wgpu::RequestDeviceError> for RenderError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        RenderError::Device(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_message() {
        let e = SampleError::SizeMismatch {
            expected: 16,
            actual: 12,
        };
        assert_eq!(e.to_string(), "RGBA buffer has 12 bytes, expected 16");
    }

    #[test]
    fn test_settings_error_has_source() {
        let e: SettingsError = serde_json::from_str::<u32>("nope")
            .map_err(SettingsError::from)
            .expect_err("invalid json");
        assert!(std::error::Error::source(&e).is_some());
        assert!(e.to_string().starts_with("Failed to parse settings"));
    }
}
