use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Score used when the raw value carries no usable number.
pub const NEUTRAL_SCORE: u8 = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Mid,
    High,
}

impl Level {
    /// Fixed thresholds: `<= 40` low, `<= 70` mid, else high.
    pub fn of(score: u8) -> Self {
        match score {
            0..=40 => Level::Low,
            41..=70 => Level::Mid,
            _ => Level::High,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Level::Low),
            "mid" => Some(Level::Mid),
            "high" => Some(Level::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Mid => "mid",
            Level::High => "high",
        }
    }
}

/// A score with the level derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    pub score: u8,
    pub level: Level,
}

impl Scored {
    pub fn new(score: u8) -> Self {
        let score = score.min(100);
        Self {
            score,
            level: Level::of(score),
        }
    }
}

/// Coerce any JSON value into an integer score in `[0, 100]`.
///
/// Numbers and numeric strings are rounded to nearest and clamped. Anything
/// else (null, NaN, words, booleans, containers) maps to [`NEUTRAL_SCORE`].
pub fn clamp_score(raw: &Value) -> u8 {
    let n = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    clamp_f64(n.unwrap_or(f64::NAN))
}

pub fn clamp_f64(n: f64) -> u8 {
    if n.is_nan() {
        return NEUTRAL_SCORE;
    }
    n.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn thresholds_are_inclusive_upper_bounds() {
        assert_eq!(Level::of(0), Level::Low);
        assert_eq!(Level::of(40), Level::Low);
        assert_eq!(Level::of(41), Level::Mid);
        assert_eq!(Level::of(70), Level::Mid);
        assert_eq!(Level::of(71), Level::High);
        assert_eq!(Level::of(100), Level::High);
    }

    #[test]
    fn clamps_and_rounds_numbers() {
        assert_eq!(clamp_score(&json!(-5)), 0);
        assert_eq!(clamp_score(&json!(250)), 100);
        assert_eq!(clamp_score(&json!(69.5)), 70);
        assert_eq!(clamp_score(&json!(69.4)), 69);
        assert_eq!(clamp_score(&json!(1e300)), 100);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        assert_eq!(clamp_score(&json!("82")), 82);
        assert_eq!(clamp_score(&json!(" 12.6 ")), 13);
        assert_eq!(clamp_score(&json!("-3")), 0);
    }

    #[test]
    fn non_numeric_input_defaults_to_neutral() {
        for raw in [
            json!(null),
            json!("NaN"),
            json!("lots"),
            json!(true),
            json!([1, 2]),
            json!({"score": 90}),
        ] {
            assert_eq!(clamp_score(&raw), NEUTRAL_SCORE, "{raw}");
        }
    }

    #[test]
    fn level_parse_is_case_insensitive() {
        assert_eq!(Level::parse("HIGH"), Some(Level::High));
        assert_eq!(Level::parse(" mid "), Some(Level::Mid));
        assert_eq!(Level::parse("medium"), None);
    }

    proptest! {
        #[test]
        fn prop_clamp_always_in_range(x in proptest::num::f64::ANY) {
            let s = clamp_f64(x);
            prop_assert!(s <= 100);
            let level = Level::of(s);
            let expected = if s <= 40 { Level::Low } else if s <= 70 { Level::Mid } else { Level::High };
            prop_assert_eq!(level, expected);
        }

        #[test]
        fn prop_clamp_integers_and_strings_agree(x in -1000i64..1000) {
            let from_num = clamp_score(&json!(x));
            let from_str = clamp_score(&json!(x.to_string()));
            prop_assert_eq!(from_num, from_str);
            prop_assert_eq!(i64::from(from_num), x.clamp(0, 100));
        }
    }
}
