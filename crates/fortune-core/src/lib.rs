pub mod catalog;
pub mod config;
pub mod request;
pub mod score;
pub mod signature;
pub mod synth;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use catalog::{filter_recommendations, Catalog, Product, DETAILED_READING_HANDLE};
pub use config::{ConfigError, FortuneConfig, LlmSettings};
pub use request::{FortuneRequest, ValidationError};
pub use score::{clamp_score, Level, Scored};
pub use signature::ProxyVerifier;
pub use synth::{deep_dive, report_id, synthesize, DeepDive, Framing, WeekPlan};

// --- Bounds (shared by the synthesizer, the schema and the repairer) ---

pub const ACTIONS_MIN: usize = 3;
pub const ACTIONS_MAX: usize = 5;
pub const COMMON_MIN: usize = 2;
pub const COMMON_MAX: usize = 5;
pub const RECOMMENDATIONS_MAX: usize = 6;
/// Cap used when the reading is built locally rather than generated.
pub const LOCAL_RECOMMENDATIONS_MAX: usize = 3;

pub const DEFAULT_DISCLAIMER: &str = "This reading is for entertainment and self-reflection only. \
Scores describe tendencies, not predictions, and are not based on astronomical calculation.";

// --- Types ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Overall {
    #[schemars(range(min = 0, max = 100))]
    pub score: u8,
    pub level: Level,
    pub one_liner: String,
}

/// One scored life area (love, career or money) within a perspective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Aspect {
    #[schemars(range(min = 0, max = 100))]
    pub score: u8,
    pub level: Level,
    pub insight: String,
}

impl Aspect {
    pub fn new(score: u8, insight: impl Into<String>) -> Self {
        let Scored { score, level } = Scored::new(score);
        Self {
            score,
            level,
            insight: insight.into(),
        }
    }
}

/// One of the two interpretive frames, east or west.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Perspective {
    pub summary: String,
    pub love: Aspect,
    pub career: Aspect,
    pub money: Aspect,
    #[schemars(length(min = ACTIONS_MIN, max = ACTIONS_MAX))]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Common {
    #[schemars(length(min = COMMON_MIN, max = COMMON_MAX))]
    pub themes: Vec<String>,
    #[schemars(length(min = COMMON_MIN, max = COMMON_MAX))]
    pub what_to_focus: Vec<String>,
    #[schemars(length(min = COMMON_MIN, max = COMMON_MAX))]
    pub what_to_avoid: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Recommendation {
    pub handle: String,
    pub reason: String,
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Upsell {
    pub should_offer: bool,
    pub detailed_product_handle: String,
    pub pitch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Reading {
    pub report_id: String,
    pub overall: Overall,
    pub east: Perspective,
    pub west: Perspective,
    pub common: Common,
    #[schemars(length(min = 1, max = RECOMMENDATIONS_MAX))]
    pub recommendations: Vec<Recommendation>,
    pub upsell: Upsell,
    pub disclaimer: String,
}

impl Reading {
    /// Every score of the reading paired with its level, overall first.
    pub fn scored_fields(&self) -> Vec<(u8, Level)> {
        let mut out = vec![(self.overall.score, self.overall.level)];
        for p in [&self.east, &self.west] {
            for a in [&p.love, &p.career, &p.money] {
                out.push((a.score, a.level));
            }
        }
        out
    }

    /// Check the reading's structural invariants against `catalog`.
    pub fn is_compliant(&self, catalog: &Catalog) -> bool {
        let scores_ok = self
            .scored_fields()
            .iter()
            .all(|(s, l)| *s <= 100 && Level::of(*s) == *l);
        let actions_ok = [&self.east, &self.west]
            .iter()
            .all(|p| (ACTIONS_MIN..=ACTIONS_MAX).contains(&p.actions.len()));
        let common_ok = [
            &self.common.themes,
            &self.common.what_to_focus,
            &self.common.what_to_avoid,
        ]
        .iter()
        .all(|v| (COMMON_MIN..=COMMON_MAX).contains(&v.len()));
        let recs_ok = (1..=RECOMMENDATIONS_MAX).contains(&self.recommendations.len())
            && self
                .recommendations
                .iter()
                .all(|r| catalog.contains(&r.handle));

        scores_ok
            && actions_ok
            && common_ok
            && recs_ok
            && self.upsell.detailed_product_handle == DETAILED_READING_HANDLE
    }
}
