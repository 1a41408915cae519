use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

const SYSTEM_PROMPT: &str = include_str!("prompts/system.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

#[derive(Serialize)]
struct SystemContext {
    today: String,
}

/// The system message of a turn starting at `now`
pub fn system_prompt(now: DateTime<Utc>) -> Result<String, TeraError> {
    let context = SystemContext {
        today: now.format("%A, %B %-d, %Y (%Y-%m-%d) %H:%M UTC").to_string(),
    };
    load_prompt(SYSTEM_PROMPT, &context)
}
