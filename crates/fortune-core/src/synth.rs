//! Local reading synthesis. Deterministic, infallible, and free of external
//! calls: this is both the free-tier content and the fallback whenever
//! generation fails.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::{filter_recommendations, Catalog, DETAILED_READING_HANDLE};
use crate::score::{clamp_f64, Level, Scored};
use crate::{
    Aspect, Common, Overall, Perspective, Reading, Upsell, DEFAULT_DISCLAIMER,
    LOCAL_RECOMMENDATIONS_MAX,
};

/// `base + (seed + offset) % range` for one scored dimension.
struct Dial {
    base: usize,
    offset: usize,
    range: usize,
}

impl Dial {
    const fn new(base: usize, offset: usize, range: usize) -> Self {
        Self { base, offset, range }
    }

    fn turn(&self, seed: usize) -> u8 {
        clamp_f64((self.base + (seed + self.offset) % self.range) as f64)
    }
}

const EAST_LOVE: Dial = Dial::new(50, 3, 20);
const EAST_CAREER: Dial = Dial::new(45, 11, 30);
const EAST_MONEY: Dial = Dial::new(40, 17, 35);
const WEST_LOVE: Dial = Dial::new(48, 5, 25);
const WEST_CAREER: Dial = Dial::new(52, 13, 25);
const WEST_MONEY: Dial = Dial::new(42, 7, 30);

#[derive(Clone, Copy)]
enum Area {
    Love,
    Career,
    Money,
}

/// Build a complete reading from the raw birth fields. Missing fields are
/// passed as empty strings.
pub fn synthesize(birth_date: &str, birth_time: &str, birth_city: &str) -> Reading {
    let seed = format!("{birth_date}{birth_time}{birth_city}").chars().count();

    let east = perspective(
        "East",
        [
            EAST_LOVE.turn(seed),
            EAST_CAREER.turn(seed),
            EAST_MONEY.turn(seed),
        ],
        &[
            "Tidy one corner of your home each week to keep energy moving.",
            "Reach out to one mentor or elder this month.",
            "Keep a steady sleep rhythm before making big decisions.",
        ],
    );
    let west = perspective(
        "West",
        [
            WEST_LOVE.turn(seed),
            WEST_CAREER.turn(seed),
            WEST_MONEY.turn(seed),
        ],
        &[
            "Write down three intentions at the start of each week.",
            "Say yes to one social invitation you would usually skip.",
            "Review your spending on the first day of every month.",
        ],
    );

    let scores: Vec<u8> = [&east, &west]
        .iter()
        .flat_map(|p| [p.love.score, p.career.score, p.money.score])
        .collect();
    let mean = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64;
    let Scored { score, level } = Scored::new(clamp_f64(mean));

    let recommendations = recommend(&east, &west);
    let upsell = local_upsell(level);

    Reading {
        report_id: local_report_id(birth_date, birth_time, birth_city),
        overall: Overall {
            score,
            level,
            one_liner: overall_line(level).to_string(),
        },
        common: common_ground(&east, &west),
        east,
        west,
        recommendations,
        upsell,
        disclaimer: DEFAULT_DISCLAIMER.to_string(),
    }
}

fn perspective(name: &str, [love, career, money]: [u8; 3], actions: &[&str]) -> Perspective {
    let love = Aspect::new(love, insight(Area::Love, Level::of(love)));
    let career = Aspect::new(career, insight(Area::Career, Level::of(career)));
    let money = Aspect::new(money, insight(Area::Money, Level::of(money)));
    let strongest = [
        ("love", love.score),
        ("career", career.score),
        ("money", money.score),
    ]
    .into_iter()
    .max_by_key(|(_, s)| *s)
    .map(|(area, _)| area)
    .unwrap_or("love");

    Perspective {
        summary: format!(
            "{name}ern view: the period leans towards {strongest}, with the other areas asking for patience."
        ),
        love,
        career,
        money,
        actions: actions.iter().map(|a| a.to_string()).collect(),
    }
}

fn insight(area: Area, level: Level) -> &'static str {
    match (area, level) {
        (Area::Love, Level::Low) => "Connections feel fragile; gentle, honest talks help more than grand gestures.",
        (Area::Love, Level::Mid) => "Relationships are steady; small shared rituals deepen trust.",
        (Area::Love, Level::High) => "Warm, open energy around you; a good time to express feelings.",
        (Area::Career, Level::Low) => "Work may feel stuck; focus on one skill rather than many projects.",
        (Area::Career, Level::Mid) => "Progress comes from consistency; keep showing up.",
        (Area::Career, Level::High) => "Momentum is on your side; volunteer for visible work.",
        (Area::Money, Level::Low) => "Hold back on impulse purchases and rebuild a small buffer.",
        (Area::Money, Level::Mid) => "Finances are balanced; a simple budget keeps it that way.",
        (Area::Money, Level::High) => "A favourable phase for planned, careful investments.",
    }
}

fn overall_line(level: Level) -> &'static str {
    match level {
        Level::Low => "A quiet season for rebuilding: slow down and tend to the basics.",
        Level::Mid => "A balanced season: steady effort brings steady rewards.",
        Level::High => "A bright season: lean into the opportunities in front of you.",
    }
}

fn common_ground(east: &Perspective, west: &Perspective) -> Common {
    let mut themes = vec!["Steady routines".to_string()];
    let mut focus = vec!["Rest and recovery".to_string()];
    let mut avoid = vec!["Rushed decisions".to_string()];

    let avg = |a: &Aspect, b: &Aspect| Level::of(((u16::from(a.score) + u16::from(b.score)) / 2) as u8);
    let love = avg(&east.love, &west.love);
    let career = avg(&east.career, &west.career);
    let money = avg(&east.money, &west.money);

    if love == Level::Low {
        themes.push("Rebuilding closeness".to_string());
        focus.push("Honest conversations".to_string());
        avoid.push("Keeping score in relationships".to_string());
    } else {
        themes.push("Warm connections".to_string());
        focus.push("Shared time with people you trust".to_string());
    }
    if career == Level::High {
        themes.push("Visible progress at work".to_string());
    } else {
        focus.push("One clear work goal".to_string());
    }
    if money == Level::Low {
        avoid.push("Impulse spending".to_string());
    } else {
        avoid.push("Overcommitting your budget".to_string());
    }

    Common {
        themes,
        what_to_focus: focus,
        what_to_avoid: avoid,
    }
}

fn recommend(east: &Perspective, west: &Perspective) -> Vec<crate::Recommendation> {
    let catalog = Catalog::default();
    let low = |a: &Aspect, b: &Aspect| a.level == Level::Low || b.level == Level::Low;

    let mut picks = Vec::new();
    if low(&east.love, &west.love) {
        picks.push(("fox-charm", "Guards your heart while love energy is low."));
        picks.push(("rose-quartz-bracelet", "Softens communication with the people close to you."));
    }
    if low(&east.money, &west.money) {
        picks.push(("wealth-amulet", "A reminder to act with financial confidence."));
    }
    if low(&east.career, &west.career) {
        picks.push(("career-talisman", "Keeps your attention on one career goal at a time."));
    }
    picks.push(("calm-aroma", "Supports calm evenings and steadier sleep."));

    let recs = picks
        .into_iter()
        .filter_map(|(handle, reason)| catalog.recommend(handle, reason))
        .collect();
    let mut out = filter_recommendations(recs, &catalog, LOCAL_RECOMMENDATIONS_MAX);
    if out.is_empty() {
        out.push(catalog.default_recommendation());
    }
    out
}

fn local_upsell(overall: Level) -> Upsell {
    let pitch = match overall {
        Level::Low => "This season asks for care. The detailed reading maps out a week-by-week plan to turn things around.",
        _ => "Things look promising. The detailed reading adds a yearly plan to make the most of it.",
    };
    Upsell {
        should_offer: true,
        detailed_product_handle: DETAILED_READING_HANDLE.to_string(),
        pitch: pitch.to_string(),
    }
}

fn local_report_id(birth_date: &str, birth_time: &str, birth_city: &str) -> String {
    report_id("local", &[birth_date, birth_time, birth_city])
}

/// `{prefix}-` followed by 12 hex chars of a SHA-256 over `parts`.
pub fn report_id(prefix: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hex::encode(hasher.finalize());
    format!("{prefix}-{}", &digest[..12])
}

// --- Paid deep dive ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    Repair,
    Advance,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekPlan {
    pub week: u8,
    pub theme: String,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeepDive {
    pub framing: Framing,
    pub headline: String,
    pub weeks: Vec<WeekPlan>,
}

/// Expand a reading into a four-week plan. Low east love gets the repair
/// framing; everything else gets the advance framing.
pub fn deep_dive(reading: &Reading) -> DeepDive {
    let framing = match reading.east.love.level {
        Level::Low => Framing::Repair,
        _ => Framing::Advance,
    };

    let (headline, plan): (&str, [(&str, [&str; 2]); 4]) = match framing {
        Framing::Repair => (
            "Repair: rebuild trust and calm before pushing forward.",
            [
                ("Pause", ["List what drains you", "Protect two evenings for rest"]),
                ("Listen", ["Have one honest conversation", "Write down what you heard"]),
                ("Mend", ["Make one small amends", "Replace one habit that causes friction"]),
                ("Reset", ["Set one shared goal", "Review the month together"]),
            ],
        ),
        Framing::Advance => (
            "Advance: build on the momentum you already have.",
            [
                ("Aim", ["Pick one goal for the month", "Tell someone about it"]),
                ("Build", ["Block focused time three times", "Ask for feedback early"]),
                ("Connect", ["Meet one new person in your field", "Plan a date or shared outing"]),
                ("Harvest", ["Celebrate one win", "Decide what to carry into next month"]),
            ],
        ),
    };

    let focus = weakest_area(reading);
    DeepDive {
        framing,
        headline: headline.to_string(),
        weeks: plan
            .iter()
            .zip(1u8..)
            .map(|((theme, tasks), week)| {
                let mut tasks: Vec<String> = tasks.iter().map(|t| t.to_string()).collect();
                if week == 1 {
                    tasks.push(format!("Note one small step for {focus} each day"));
                }
                WeekPlan {
                    week,
                    theme: theme.to_string(),
                    tasks,
                }
            })
            .collect(),
    }
}

fn weakest_area(reading: &Reading) -> &'static str {
    let e = &reading.east;
    let w = &reading.west;
    [
        ("love", u16::from(e.love.score) + u16::from(w.love.score)),
        ("career", u16::from(e.career.score) + u16::from(w.career.score)),
        ("money", u16::from(e.money.score) + u16::from(w.money.score)),
    ]
    .into_iter()
    .min_by_key(|(_, s)| *s)
    .map(|(area, _)| area)
    .unwrap_or("love")
}
