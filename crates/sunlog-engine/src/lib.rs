//! Daily exposure scoring.

use chrono::NaiveDate;
use sunlog_types::{
    config::ScoringConfig,
    exposure::{ExposureContext, ExposureScore, ExposureStatus},
    session::SessionRecord,
    Result, SunlogError,
};
use tracing::debug;

/// Numeric part of the score. Implementations must be deterministic and
/// non-decreasing in session minutes for a fixed context.
pub trait ScorePolicy: Send + Sync {
    fn score(&self, sessions: &[SessionRecord], ctx: &ExposureContext) -> u32;
}

/// Scores the day's UV-weighted minutes against a per-skin-class budget.
#[derive(Debug, Clone)]
pub struct DoseRatioPolicy {
    config: ScoringConfig,
}

impl DoseRatioPolicy {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        if !config.default_uv_index.is_finite() || config.default_uv_index < 0.0 {
            return Err(engine_error(format!(
                "default UV index {} is not usable",
                config.default_uv_index
            )));
        }
        if let Some(limit) = config
            .dose_limits
            .iter()
            .find(|limit| !limit.is_finite() || **limit <= 0.0)
        {
            return Err(engine_error(format!("dose limit {limit} must be positive")));
        }
        Ok(Self { config })
    }

    fn ambient_uv(&self, ctx: &ExposureContext) -> f64 {
        ctx.ambient_uv_index
            .filter(|uv| uv.is_finite() && *uv >= 0.0)
            .unwrap_or(self.config.default_uv_index)
    }

    /// UV-minutes accumulated by the sessions.
    pub fn dose(&self, sessions: &[SessionRecord], ctx: &ExposureContext) -> f64 {
        let ambient = self.ambient_uv(ctx);
        sessions
            .iter()
            .map(|session| session.minutes() * session.uv().unwrap_or(ambient))
            .sum()
    }
}

impl Default for DoseRatioPolicy {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }
}

impl ScorePolicy for DoseRatioPolicy {
    fn score(&self, sessions: &[SessionRecord], ctx: &ExposureContext) -> u32 {
        let limit = self.config.dose_limit(ctx.skin_class);
        let ratio = self.dose(sessions, ctx) / limit * 100.0;
        ratio.round() as u32
    }
}

pub struct ExposureScoreEngine<P = DoseRatioPolicy> {
    policy: P,
}

impl ExposureScoreEngine {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        Ok(Self::with_policy(DoseRatioPolicy::new(config)?))
    }
}

impl Default for ExposureScoreEngine {
    fn default() -> Self {
        Self::with_policy(DoseRatioPolicy::default())
    }
}

impl<P: ScorePolicy> ExposureScoreEngine<P> {
    pub fn with_policy(policy: P) -> Self {
        Self { policy }
    }

    /// Scores sessions already narrowed to a single calendar day.
    pub fn evaluate(&self, sessions: &[SessionRecord], ctx: &ExposureContext) -> ExposureScore {
        if !sessions.iter().any(|session| session.minutes() > 0.0) {
            return ExposureScore::none();
        }
        let score = self.policy.score(sessions, ctx);
        let status = ExposureStatus::from_score(score);
        debug!(
            "Scored {} sessions for skin class {}: {} ({:?})",
            sessions.len(),
            ctx.skin_class,
            score,
            status
        );
        status.into_score(score)
    }

    /// Filters a full history down to `day` and scores it.
    pub fn evaluate_day(
        &self,
        sessions: &[SessionRecord],
        day: NaiveDate,
        ctx: &ExposureContext,
    ) -> ExposureScore {
        let todays: Vec<SessionRecord> = sessions
            .iter()
            .filter(|session| session.day() == Some(day))
            .cloned()
            .collect();
        self.evaluate(&todays, ctx)
    }
}

pub fn engine_error(message: impl Into<String>) -> SunlogError {
    SunlogError::Engine(message.into())
}
