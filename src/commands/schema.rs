use schemars::schema_for;

use crate::config::Config;

/// JSON Schema describing `streakbot.toml`.
pub fn schema_json() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&schema_for!(Config))?)
}

pub fn run_schema() -> anyhow::Result<()> {
    println!("{}", schema_json()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_covers_every_section() {
        let schema: serde_json::Value = serde_json::from_str(&schema_json().unwrap()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for section in ["state", "chat", "poll", "tagging", "motivation", "pacing"] {
            assert!(properties.contains_key(section), "missing {section}");
        }
    }
}
