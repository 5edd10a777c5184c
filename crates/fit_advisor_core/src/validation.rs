//! crates/fit_advisor_core/src/validation.rs
//!
//! Input bounds checked before any call to the generation service.

use crate::domain::{ImageInput, Measurements};
use crate::ports::{PortError, PortResult};

/// Largest accepted photo upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Longest accepted chat message, in characters.
pub const MAX_CHAT_MESSAGE_CHARS: usize = 2000;

fn check_bound(name: &str, value: Option<f64>, min: f64, max: f64) -> PortResult<()> {
    match value {
        Some(v) if !v.is_finite() || v < min || v > max => Err(PortError::Validation(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, v
        ))),
        _ => Ok(()),
    }
}

/// Checks each provided measurement against its accepted range.
pub fn validate_measurements(m: &Measurements) -> PortResult<()> {
    check_bound("height", m.height, 100.0, 250.0)?;
    check_bound("weight", m.weight, 30.0, 200.0)?;
    check_bound("chest", m.chest, 60.0, 150.0)?;
    check_bound("waist", m.waist, 50.0, 130.0)?;
    check_bound("hips", m.hips, 60.0, 150.0)?;
    check_bound("shoulder", m.shoulder, 30.0, 60.0)?;
    Ok(())
}

/// Checks a photo's declared type and size.
pub fn validate_image(image: &ImageInput) -> PortResult<()> {
    if !ALLOWED_IMAGE_TYPES.contains(&image.mime_type.as_str()) {
        return Err(PortError::Validation(format!(
            "Invalid file type. Allowed: {}",
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }
    if image.is_empty() {
        return Err(PortError::Validation("Image is empty".to_string()));
    }
    if image.data.len() > MAX_IMAGE_BYTES {
        return Err(PortError::Validation("File too large. Max 5MB".to_string()));
    }
    Ok(())
}

pub fn validate_chat_message(message: &str) -> PortResult<()> {
    let chars = message.chars().count();
    if message.trim().is_empty() || chars > MAX_CHAT_MESSAGE_CHARS {
        return Err(PortError::Validation(format!(
            "Message must be between 1 and {} characters",
            MAX_CHAT_MESSAGE_CHARS
        )));
    }
    Ok(())
}
