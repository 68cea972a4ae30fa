//! Skin tone heuristic over encoded image bytes.
//!
//! The scan reads the compressed stream as if it were interleaved RGB. This is
//! an approximation, not a pixel decode.

use sunlog_types::{
    config::ClassifierConfig,
    skin::{ColorSample, SkinClass, SkinClassification},
    Result,
};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::{decoder::decode_payload, vision_error};

/// Green may undershoot blue by this much and still count as skin-like.
const BLUE_TOLERANCE: i16 = 15;

/// Outcome of one window scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleStats {
    pub accepted: usize,
    pub mean: Option<ColorSample>,
}

pub fn is_skin_like(r: u8, g: u8, b: u8) -> bool {
    r >= g && g as i16 >= b as i16 - BLUE_TOLERANCE
}

#[derive(Debug, Clone, Default)]
pub struct SkinToneClassifier {
    config: ClassifierConfig,
}

impl SkinToneClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies an encoded image buffer. Always yields an answer.
    pub fn classify(&self, bytes: Option<&[u8]>, image_ref: &str) -> SkinClassification {
        let Some(bytes) = bytes else {
            debug!("No image bytes for {image_ref}; using fallback classification");
            return SkinClassification::fallback();
        };
        if bytes.len() < self.config.min_buffer_bytes {
            debug!(
                "Image {image_ref} too small ({} < {} bytes); using fallback classification",
                bytes.len(),
                self.config.min_buffer_bytes
            );
            return SkinClassification::fallback();
        }

        let stats = match self.sample_stats(bytes) {
            Ok(stats) => stats,
            Err(err) => {
                warn!("Sampling failed for {image_ref}: {err}; using fallback classification");
                return SkinClassification::fallback();
            }
        };

        match stats.mean {
            Some(mean) if stats.accepted >= self.config.min_samples => {
                let class = SkinClass::from_brightness(mean.brightness());
                debug!(
                    "Classified {image_ref} as class {class} from {} samples (mean {})",
                    stats.accepted,
                    mean.to_hex()
                );
                SkinClassification::measured(class)
            }
            _ => {
                debug!(
                    "Only {} skin-like samples in {image_ref} (need {}); using fallback classification",
                    stats.accepted, self.config.min_samples
                );
                SkinClassification::fallback()
            }
        }
    }

    /// Decodes a transport payload and classifies it; decode failures fall back.
    pub fn classify_payload(&self, payload: &str, image_ref: &str) -> SkinClassification {
        match decode_payload(payload) {
            Ok(decoded) => self.classify(Some(&decoded.bytes), image_ref),
            Err(err) => {
                warn!("Could not decode image {image_ref}: {err}; using fallback classification");
                SkinClassification::fallback()
            }
        }
    }

    /// Same as [`classify_payload`](Self::classify_payload), held back by the
    /// configured processing delay for interactive callers.
    pub async fn classify_paced(&self, payload: &str, image_ref: &str) -> SkinClassification {
        if self.config.processing_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.processing_delay_ms)).await;
        }
        self.classify_payload(payload, image_ref)
    }

    /// Scans the configured window and averages the accepted triplets.
    pub fn sample_stats(&self, bytes: &[u8]) -> Result<SampleStats> {
        let stride = self.config.stride;
        if stride < 3 {
            return Err(vision_error(format!("stride {stride} cannot hold an RGB triplet")));
        }
        let len = bytes.len();
        let start = len * self.config.window_start_pct as usize / 100;
        let end = len * self.config.window_end_pct as usize / 100;
        if start > end || end > len {
            return Err(vision_error(format!(
                "scan window {start}..{end} outside {len} bytes"
            )));
        }

        let mut accepted = 0usize;
        let (mut sum_r, mut sum_g, mut sum_b) = (0u64, 0u64, 0u64);
        // A stride starting inside the window may read past its end.
        for offset in (start..end).step_by(stride) {
            if accepted >= self.config.max_samples {
                break;
            }
            let Some(&[r, g, b]) = bytes.get(offset..offset + 3) else {
                break;
            };
            if is_skin_like(r, g, b) {
                accepted += 1;
                sum_r += r as u64;
                sum_g += g as u64;
                sum_b += b as u64;
            }
        }

        let mean = (accepted > 0).then(|| {
            let n = accepted as f64;
            ColorSample::new(
                (sum_r as f64 / n).round() as u8,
                (sum_g as f64 / n).round() as u8,
                (sum_b as f64 / n).round() as u8,
            )
        });
        Ok(SampleStats { accepted, mean })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use sunlog_types::skin::Confidence;

    const BUFFER_LEN: usize = 100_000;

    /// Buffer whose every stride is the given triplet followed by a filler byte.
    fn uniform_buffer(r: u8, g: u8, b: u8) -> Vec<u8> {
        [r, g, b, 0].repeat(BUFFER_LEN / 4)
    }

    fn classify(bytes: &[u8]) -> SkinClassification {
        SkinToneClassifier::default().classify(Some(bytes), "test://frame")
    }

    #[test]
    fn missing_or_small_buffers_fall_back() {
        let classifier = SkinToneClassifier::default();
        assert_eq!(
            classifier.classify(None, "test://none"),
            SkinClassification::fallback()
        );
        for len in [0, 1, 500, 999] {
            let result = classify(&vec![200u8; len]);
            assert_eq!(result.skin_class.value(), 3);
            assert_eq!(result.confidence, Confidence::Low);
        }
    }

    #[test]
    fn acceptance_rule_tolerates_cool_undertones() {
        assert!(is_skin_like(200, 150, 100));
        assert!(is_skin_like(150, 150, 165));
        assert!(!is_skin_like(150, 150, 166));
        assert!(!is_skin_like(100, 101, 0));
        assert!(is_skin_like(0, 0, 15));
    }

    #[test]
    fn too_few_samples_fall_back() {
        // Blue-dominant strides are all rejected.
        let result = classify(&uniform_buffer(10, 10, 200));
        assert_eq!(result, SkinClassification::fallback());

        // 2999 accepted strides inside the window, the rest rejected.
        let mut bytes = uniform_buffer(10, 10, 200);
        let start = BUFFER_LEN * 20 / 100;
        for i in 0..2999 {
            let offset = start + i * 4;
            bytes[offset..offset + 3].copy_from_slice(&[200, 180, 160]);
        }
        let stats = SkinToneClassifier::default().sample_stats(&bytes).unwrap();
        assert_eq!(stats.accepted, 2999);
        assert_eq!(classify(&bytes), SkinClassification::fallback());

        bytes[start + 2999 * 4..start + 2999 * 4 + 3].copy_from_slice(&[200, 180, 160]);
        assert_eq!(classify(&bytes).confidence, Confidence::High);
    }

    #[test]
    fn sampling_stops_at_cap() {
        let bytes = [120u8, 110, 100, 0].repeat(50_000);
        let stats = SkinToneClassifier::default().sample_stats(&bytes).unwrap();
        assert_eq!(stats.accepted, 20_000);
        assert_eq!(stats.mean, Some(ColorSample::new(120, 110, 100)));
    }

    #[test]
    fn last_stride_may_straddle_window_end() {
        // Window 3002..12008 is 9006 bytes, so the final stride starts at
        // 12006 and reads one byte past the window.
        let mut bytes = vec![0u8; 15_010];
        for offset in (3002..12008).step_by(4) {
            bytes[offset..offset + 3].copy_from_slice(&[150, 140, 130]);
        }
        let classifier = SkinToneClassifier::new(ClassifierConfig {
            min_samples: 2252,
            ..ClassifierConfig::default()
        });
        let stats = classifier.sample_stats(&bytes).unwrap();
        assert_eq!(stats.accepted, 2252);
        assert_eq!(stats.mean, Some(ColorSample::new(150, 140, 130)));
        assert_eq!(
            classifier.classify(Some(&bytes), "test://straddle").confidence,
            Confidence::High
        );
    }

    #[test]
    fn only_middle_window_is_scanned() {
        let mut bytes = uniform_buffer(10, 10, 200);
        let start = BUFFER_LEN * 20 / 100;
        let end = BUFFER_LEN * 80 / 100;
        for chunk in bytes[..start].chunks_mut(4) {
            chunk[..3].copy_from_slice(&[250, 250, 250]);
        }
        for chunk in bytes[end..].chunks_mut(4) {
            chunk[..3].copy_from_slice(&[250, 250, 250]);
        }
        assert_eq!(classify(&bytes), SkinClassification::fallback());
    }

    #[test]
    fn brightness_table_at_boundaries() {
        let cases = [
            ((196, 192, 188), 1), // 576 / 765 > 0.75
            ((193, 191, 189), 2), // 573 / 765 just under 0.75
            ((170, 166, 162), 2), // 498 / 765 > 0.65
            ((168, 165, 164), 3), // 497 / 765 just under 0.65
            ((130, 128, 125), 3), // 383 / 765 > 0.50
            ((130, 127, 125), 4), // 382 / 765 just under 0.50
            ((92, 90, 86), 4),    // 268 / 765 > 0.35
            ((90, 89, 88), 5),    // 267 / 765 just under 0.35
            ((52, 51, 51), 5),    // 154 / 765 > 0.20
            ((51, 51, 51), 6),    // exactly 0.20
            ((20, 10, 5), 6),
        ];
        for ((r, g, b), expected) in cases {
            let result = classify(&uniform_buffer(r, g, b));
            assert_eq!(
                result.skin_class.value(),
                expected,
                "rgb({r}, {g}, {b})"
            );
            assert_eq!(result.confidence, Confidence::High);
            assert_eq!(
                result.representative_color,
                result.skin_class.reference_color()
            );
        }
    }

    #[test]
    fn decoded_payload_round_trips_into_expected_class() {
        let bytes = uniform_buffer(180, 140, 110); // mean brightness 0.562
        let payload = format!("data:image/jpeg;base64,{}", STANDARD.encode(&bytes));
        let classifier = SkinToneClassifier::default();

        let first = classifier.classify_payload(&payload, "test://payload");
        let second = classifier.classify_payload(&payload, "test://payload");
        assert_eq!(first.skin_class.value(), 3);
        assert_eq!(first.confidence, Confidence::High);
        assert_eq!(first, second);
    }

    #[test]
    fn undecodable_payload_falls_back() {
        let classifier = SkinToneClassifier::default();
        assert_eq!(
            classifier.classify_payload("data:image/jpeg;base64,@@@", "test://bad"),
            SkinClassification::fallback()
        );
    }

    #[test]
    fn invalid_stride_falls_back_instead_of_failing() {
        let classifier = SkinToneClassifier::new(ClassifierConfig {
            stride: 1,
            ..ClassifierConfig::default()
        });
        assert!(classifier.sample_stats(&uniform_buffer(200, 150, 100)).is_err());
        assert_eq!(
            classifier.classify(Some(&uniform_buffer(200, 150, 100)), "test://stride"),
            SkinClassification::fallback()
        );
    }

    #[tokio::test]
    async fn paced_classification_matches_immediate() {
        let classifier = SkinToneClassifier::new(ClassifierConfig {
            processing_delay_ms: 5,
            ..ClassifierConfig::default()
        });
        let payload = STANDARD.encode(uniform_buffer(90, 60, 40));
        let paced = classifier.classify_paced(&payload, "test://paced").await;
        assert_eq!(paced, classifier.classify_payload(&payload, "test://paced"));
        assert_eq!(paced.skin_class.value(), 5);
    }
}
