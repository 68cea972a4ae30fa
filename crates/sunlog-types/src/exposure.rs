use serde::{Deserialize, Serialize};

use crate::skin::SkinClass;

/// Ambient inputs the score depends on besides the sessions themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureContext {
    pub skin_class: SkinClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_uv_index: Option<f64>,
}

impl ExposureContext {
    pub fn new(skin_class: SkinClass) -> Self {
        Self {
            skin_class,
            ambient_uv_index: None,
        }
    }

    pub fn with_uv_index(mut self, uv_index: f64) -> Self {
        self.ambient_uv_index = Some(uv_index);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExposureStatus {
    NoExposure,
    Low,
    Optimal,
    High,
    Excessive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Optimal,
    Caution,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub message: String,
    pub short_message: String,
    pub icon: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureScore {
    pub score: u32,
    pub status: ExposureStatus,
    pub status_color: String,
    pub recommendation: Recommendation,
}

impl ExposureScore {
    pub fn none() -> Self {
        ExposureStatus::NoExposure.into_score(0)
    }
}

impl ExposureStatus {
    pub const LOW_UPPER: u32 = 40;
    pub const OPTIMAL_UPPER: u32 = 80;
    pub const HIGH_UPPER: u32 = 120;

    /// Band lookup for a score produced from at least one exposed session.
    /// Bands are half-open: `[0,40) [40,80) [80,120) [120,∞)`.
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s < Self::LOW_UPPER => ExposureStatus::Low,
            s if s < Self::OPTIMAL_UPPER => ExposureStatus::Optimal,
            s if s < Self::HIGH_UPPER => ExposureStatus::High,
            _ => ExposureStatus::Excessive,
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            ExposureStatus::NoExposure | ExposureStatus::Low => Priority::Low,
            ExposureStatus::Optimal => Priority::Optimal,
            ExposureStatus::High => Priority::Caution,
            ExposureStatus::Excessive => Priority::Warning,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ExposureStatus::NoExposure => "#9E9E9E",
            ExposureStatus::Low => "#2196F3",
            ExposureStatus::Optimal => "#4CAF50",
            ExposureStatus::High => "#FF9800",
            ExposureStatus::Excessive => "#F44336",
        }
    }

    pub fn recommendation(self) -> Recommendation {
        let (message, short_message, icon) = match self {
            ExposureStatus::NoExposure => (
                "No sun exposure logged today. A short session in gentle light is a good start.",
                "No exposure yet",
                "sunny-outline",
            ),
            ExposureStatus::Low => (
                "Below your daily range. A little more time outdoors would help.",
                "Get more sun",
                "partly-sunny",
            ),
            ExposureStatus::Optimal => (
                "You are within your healthy range for today. Well balanced.",
                "Optimal range",
                "checkmark-circle",
            ),
            ExposureStatus::High => (
                "Approaching your limit. Seek shade and protect exposed skin.",
                "Seek shade",
                "warning",
            ),
            ExposureStatus::Excessive => (
                "Past your safe limit for today. Stay out of direct sun and reapply protection.",
                "Avoid more sun",
                "alert-circle",
            ),
        };
        Recommendation {
            message: message.into(),
            short_message: short_message.into(),
            icon: icon.into(),
            priority: self.priority(),
        }
    }

    pub fn into_score(self, score: u32) -> ExposureScore {
        ExposureScore {
            score,
            status: self,
            status_color: self.color().into(),
            recommendation: self.recommendation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_are_half_open() {
        assert_eq!(ExposureStatus::from_score(0), ExposureStatus::Low);
        assert_eq!(ExposureStatus::from_score(39), ExposureStatus::Low);
        assert_eq!(ExposureStatus::from_score(40), ExposureStatus::Optimal);
        assert_eq!(ExposureStatus::from_score(79), ExposureStatus::Optimal);
        assert_eq!(ExposureStatus::from_score(80), ExposureStatus::High);
        assert_eq!(ExposureStatus::from_score(119), ExposureStatus::High);
        assert_eq!(ExposureStatus::from_score(120), ExposureStatus::Excessive);
        assert_eq!(ExposureStatus::from_score(u32::MAX), ExposureStatus::Excessive);
    }

    #[test]
    fn recommendation_priority_tracks_status() {
        let statuses = [
            (ExposureStatus::NoExposure, Priority::Low),
            (ExposureStatus::Low, Priority::Low),
            (ExposureStatus::Optimal, Priority::Optimal),
            (ExposureStatus::High, Priority::Caution),
            (ExposureStatus::Excessive, Priority::Warning),
        ];
        for (status, priority) in statuses {
            assert_eq!(status.recommendation().priority, priority);
            assert_eq!(status.recommendation(), status.recommendation());
        }
    }

    #[test]
    fn empty_score_shape() {
        let score = ExposureScore::none();
        assert_eq!(score.score, 0);
        assert_eq!(score.status, ExposureStatus::NoExposure);
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["status"], "NoExposure");
        assert_eq!(json["recommendation"]["priority"], "low");
        assert!(json.get("statusColor").is_some());
    }
}
