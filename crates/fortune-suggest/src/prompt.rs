use fortune_core::{Catalog, FortuneRequest, Reading};
use schemars::generate::SchemaSettings;
use schemars::transform::RecursiveTransform;
use schemars::Schema;
use serde_json::Value;

pub const SCHEMA_NAME: &str = "fortune_reading_v1";

/// Prompt text plus the strict schema the model must answer in.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub schema: Value,
}

pub fn build(request: &FortuneRequest, catalog: &Catalog) -> GenerationRequest {
    GenerationRequest {
        prompt: prompt_text(request, catalog),
        schema: reading_schema(),
    }
}

pub fn system_prompt() -> &'static str {
    "You are a fortune reading content generator. Output ONLY JSON that conforms to the given JSON schema."
}

fn prompt_text(request: &FortuneRequest, catalog: &Catalog) -> String {
    let or = |v: &Option<String>, missing: &'static str| v.clone().unwrap_or_else(|| missing.to_string());

    format!(
        "## Input\n\
- name: {name}\n\
- gender: {gender}\n\
- birthDate: {birth_date}\n\
- birthTime: {birth_time}\n\
- birthCity: {birth_city}\n\n\
## Output requirements (important)\n\
1. Produce all three modules: the eastern reading (east), the western reading (west), \
and the common ground between them (common).\n\
2. Speak in tendencies, themes and suggestions. Do NOT claim you computed a precise chart. \
Do NOT invent exact star or palace placements, exact planetary aspects, or degrees.\n\
3. Scores are integers from 0 to 100; level is low, mid or high. Keep the love/career/money \
scores of the two modules distinct but plausible.\n\
4. recommendations must use product handles from the list below ONLY. Never invent a handle.\n\
Candidate products (handle: tag (meaning)):\n\
{catalog}\n\n\
## Recommendation strategy\n\
- If love is low: recommend 1-2 love_boost / love_guard products (e.g. the fox charm).\n\
- If the overall level is low: set upsell.should_offer = true with a natural, persuasive pitch.\n\
- If things look good overall: upsell may still be true, but keep the pitch light \
(an advanced reading or a yearly plan).\n\n\
Output ONLY the JSON object, nothing else.",
        name = or(&request.name, "not provided"),
        gender = or(&request.gender, "not provided"),
        birth_date = request.birth_date,
        birth_time = or(&request.birth_time, "unknown"),
        birth_city = or(&request.birth_city, "unknown"),
        catalog = catalog.prompt_hint(),
    )
}

/// Strict JSON schema of a reading, derived from the model types: no extra
/// properties anywhere, every property required, bounded arrays. Subschemas
/// are inlined and integer `format` hints dropped.
pub fn reading_schema() -> Value {
    let generator = SchemaSettings::draft2020_12()
        .with(|s| s.inline_subschemas = true)
        .with_transform(RecursiveTransform(|schema: &mut Schema| {
            schema.remove("format");
        }))
        .into_generator();
    let mut schema = generator.into_root_schema_for::<Reading>().to_value();
    if let Some(root) = schema.as_object_mut() {
        root.remove("$schema");
    }
    schema
}
