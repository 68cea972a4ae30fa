//! Image payload decoding and skin tone classification.

pub mod classifier;
pub mod decoder;

pub use classifier::{is_skin_like, SampleStats, SkinToneClassifier};
pub use decoder::{decode_payload, ImagePayload};

use sunlog_types::SunlogError;

pub fn vision_error(message: impl Into<String>) -> SunlogError {
    SunlogError::Vision(message.into())
}
