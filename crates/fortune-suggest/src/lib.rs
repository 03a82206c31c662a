pub mod engine;
mod parse;
pub mod prompt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fortune_core::{synthesize, Catalog, FortuneRequest, Reading};

pub use engine::{GenerationError, Generator, LlmGenerator};
pub use parse::{repair, Draft, DEFAULT_PITCH};

/// Where the delivered reading came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    Generated,
    Local,
}

#[derive(Debug, Clone)]
pub struct ReadingOutcome {
    pub reading: Reading,
    pub source: ReadingSource,
}

impl ReadingOutcome {
    /// The local synthesizer's reading for `request`. Cannot fail.
    pub fn fallback(request: &FortuneRequest) -> Self {
        Self {
            reading: synthesize(
                &request.birth_date,
                request.birth_time_or_empty(),
                request.birth_city_or_empty(),
            ),
            source: ReadingSource::Local,
        }
    }
}

/// Ask the generator for a reading and repair it. Any generation failure
/// or unusable output yields the local reading instead; this never errors.
pub async fn get_reading(
    generator: &dyn Generator,
    request: &FortuneRequest,
    catalog: &Catalog,
) -> ReadingOutcome {
    let built = prompt::build(request, catalog);

    match generator.generate(&built.prompt, &built.schema).await {
        Ok(raw) => {
            debug!(len = raw.len(), "generation returned text");
            match repair(&raw, catalog) {
                Some(reading) if reading.is_compliant(catalog) => {
                    info!(report_id = %reading.report_id, "using generated reading");
                    ReadingOutcome {
                        reading,
                        source: ReadingSource::Generated,
                    }
                }
                _ => {
                    warn!("generated reading unusable, falling back to local synthesis");
                    ReadingOutcome::fallback(request)
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "generation failed, falling back to local synthesis");
            ReadingOutcome::fallback(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Canned(Result<String, ()>);

    #[async_trait]
    impl Generator for Canned {
        async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<String, GenerationError> {
            self.0
                .clone()
                .map_err(|_| GenerationError::Unreachable("connection refused".to_string()))
        }
    }

    fn request() -> FortuneRequest {
        FortuneRequest::new("1990-01-01")
    }

    #[tokio::test]
    async fn unreachable_generator_falls_back() {
        let out = get_reading(&Canned(Err(())), &request(), &Catalog::default()).await;
        assert_eq!(out.source, ReadingSource::Local);
        assert_eq!(out.reading, synthesize("1990-01-01", "", ""));
    }

    #[tokio::test]
    async fn garbage_output_falls_back() {
        let out = get_reading(
            &Canned(Ok("I'm sorry, I can't do that".to_string())),
            &request(),
            &Catalog::default(),
        )
        .await;
        assert_eq!(out.source, ReadingSource::Local);
    }

    #[tokio::test]
    async fn usable_output_is_repaired_and_kept() {
        let mut reading = synthesize("2000-02-02", "", "Lisbon");
        reading.report_id = "gen-1".to_string();
        reading.overall.score = 99;
        let mut raw: Value = serde_json::to_value(&reading).unwrap();
        raw["recommendations"][0]["handle"] = Value::String("unicorn-dust".to_string());

        let out = get_reading(&Canned(Ok(raw.to_string())), &request(), &Catalog::default()).await;
        assert_eq!(out.source, ReadingSource::Generated);
        assert_eq!(out.reading.report_id, "gen-1");
        assert_eq!(out.reading.overall.level, fortune_core::Level::High);
        assert!(out
            .reading
            .recommendations
            .iter()
            .all(|r| r.handle != "unicorn-dust"));
        assert!(!out.reading.recommendations.is_empty());
    }
}
