//! Turn raw model output into a reading that satisfies every invariant.
//!
//! Scores are always re-clamped and levels re-derived when missing or
//! inconsistent. Arrays are held to their bounds, handles are checked
//! against the catalog and the upsell product is pinned. Output that already
//! satisfies the schema comes back unchanged. Repairs are routine and only
//! logged at debug.

use serde_json::{Map, Value};
use tracing::debug;

use fortune_core::{
    clamp_score, filter_recommendations, report_id, Aspect, Catalog, Common, Level, Overall, Perspective,
    Reading, Recommendation, Upsell, ACTIONS_MAX, ACTIONS_MIN, COMMON_MAX, COMMON_MIN,
    DEFAULT_DISCLAIMER, DETAILED_READING_HANDLE, RECOMMENDATIONS_MAX,
};

pub const DEFAULT_PITCH: &str =
    "Want the full picture? The detailed reading turns these tendencies into a month-by-month plan.";

const FILLER_ACTIONS: [&str; ACTIONS_MIN] = [
    "Keep a short daily journal of what went well.",
    "Protect one unhurried evening each week.",
    "Tidy one small space to reset your focus.",
];

const FILLER_COMMON: [&str; COMMON_MIN] = ["Steady routines", "Patience with yourself"];

/// Outcome of the structural parse of model output.
#[derive(Debug)]
pub enum Draft {
    Parsed(Map<String, Value>),
    Unparsable,
}

impl Draft {
    /// Parse the outermost JSON object in `raw`. Code fences or prose around
    /// it are tolerated; the object must hold the four scored sections.
    pub fn from_raw(raw: &str) -> Self {
        let Some(json_str) = extract_json_object(raw) else {
            return Draft::Unparsable;
        };
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(json_str) else {
            return Draft::Unparsable;
        };
        let has_sections = ["overall", "east", "west", "common"]
            .iter()
            .all(|k| map.get(*k).is_some_and(Value::is_object));
        if has_sections {
            Draft::Parsed(map)
        } else {
            Draft::Unparsable
        }
    }
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Repair raw model output into a compliant reading, or `None` when it is
/// structurally unusable and the caller should fall back.
pub fn repair(raw: &str, catalog: &Catalog) -> Option<Reading> {
    match Draft::from_raw(raw) {
        Draft::Parsed(map) => Some(repair_map(&map, raw, catalog)),
        Draft::Unparsable => {
            debug!(len = raw.len(), "model output is not a usable reading");
            None
        }
    }
}

fn repair_map(map: &Map<String, Value>, raw: &str, catalog: &Catalog) -> Reading {
    let empty = Map::new();
    let section = |key: &str| map.get(key).and_then(Value::as_object).unwrap_or(&empty);

    let overall = section("overall");
    let (score, level) = scored(overall);
    let common = section("common");

    Reading {
        report_id: text(map.get("report_id")).unwrap_or_else(|| report_id("generated", &[raw])),
        overall: Overall {
            score,
            level,
            one_liner: text(overall.get("one_liner")).unwrap_or_default(),
        },
        east: perspective(section("east")),
        west: perspective(section("west")),
        common: Common {
            themes: bounded(common.get("themes"), COMMON_MAX, &FILLER_COMMON),
            what_to_focus: bounded(common.get("what_to_focus"), COMMON_MAX, &FILLER_COMMON),
            what_to_avoid: bounded(common.get("what_to_avoid"), COMMON_MAX, &FILLER_COMMON),
        },
        recommendations: recommendations(map.get("recommendations"), catalog),
        upsell: upsell(map.get("upsell").and_then(Value::as_object)),
        disclaimer: text(map.get("disclaimer")).unwrap_or_else(|| DEFAULT_DISCLAIMER.to_string()),
    }
}

fn text(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str).map(str::to_string)
}

/// Clamp the score; keep the model's level only if it agrees with it.
fn scored(obj: &Map<String, Value>) -> (u8, Level) {
    let score = clamp_score(obj.get("score").unwrap_or(&Value::Null));
    let derived = Level::of(score);
    let level = match obj.get("level").and_then(Value::as_str).and_then(Level::parse) {
        Some(given) if given == derived => given,
        given => {
            debug!(score, ?given, derived = derived.as_str(), "re-derived level");
            derived
        }
    };
    (score, level)
}

fn aspect(v: Option<&Value>) -> Aspect {
    let empty = Map::new();
    let obj = v.and_then(Value::as_object).unwrap_or(&empty);
    let (score, level) = scored(obj);
    Aspect {
        score,
        level,
        insight: text(obj.get("insight")).unwrap_or_default(),
    }
}

fn perspective(obj: &Map<String, Value>) -> Perspective {
    Perspective {
        summary: text(obj.get("summary")).unwrap_or_default(),
        love: aspect(obj.get("love")),
        career: aspect(obj.get("career")),
        money: aspect(obj.get("money")),
        actions: bounded(obj.get("actions"), ACTIONS_MAX, &FILLER_ACTIONS),
    }
}

/// Keep the string entries of an array, truncated to `max`. Short arrays are
/// padded from `filler` up to `filler.len()` entries.
fn bounded(v: Option<&Value>, max: usize, filler: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = v
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .take(max)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    for fill in filler {
        if out.len() >= filler.len() {
            break;
        }
        if !out.iter().any(|s| s == fill) {
            out.push(fill.to_string());
        }
    }
    out
}

fn recommendations(v: Option<&Value>, catalog: &Catalog) -> Vec<Recommendation> {
    let parsed: Vec<Recommendation> = v
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|obj| {
                    Some(Recommendation {
                        handle: text(obj.get("handle"))?,
                        reason: text(obj.get("reason")).unwrap_or_default(),
                        tag: text(obj.get("tag")).unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let mut kept = filter_recommendations(parsed, catalog, RECOMMENDATIONS_MAX);
    if kept.is_empty() {
        kept.push(catalog.default_recommendation());
    }
    kept
}

fn upsell(obj: Option<&Map<String, Value>>) -> Upsell {
    let should_offer = obj
        .and_then(|o| o.get("should_offer"))
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let pitch = obj
        .and_then(|o| text(o.get("pitch")))
        .unwrap_or_else(|| DEFAULT_PITCH.to_string());
    Upsell {
        should_offer,
        detailed_product_handle: DETAILED_READING_HANDLE.to_string(),
        pitch,
    }
}
