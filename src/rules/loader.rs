//! Load rule sets from TOML files
//!
//! ```toml
//! [[rule]]
//! id = "outside-border"
//! severity = "high"
//! short_message = "Outside border!"
//! message = "The area must be fully inside the property border."
//! check = { kind = "containment", layer = "property-border", should_be_inside = true }
//! ```

use crate::core::error::Result;
use crate::rules::registry::RuleRegistry;
use crate::rules::rule::RuleSpec;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleSpec>,
}

/// Parse rule specs from TOML content
pub fn parse_rule_specs(content: &str) -> Result<Vec<RuleSpec>> {
    let file: RuleFile = toml::from_str(content)?;
    Ok(file.rules)
}

/// Load rule specs from a TOML file on disk
pub fn load_rule_specs(path: &Path) -> Result<Vec<RuleSpec>> {
    let content = std::fs::read_to_string(path)?;
    parse_rule_specs(&content)
}

/// Standard rules with the file's rules layered on top (same id replaces)
pub fn load_registry(path: &Path) -> Result<RuleRegistry> {
    let specs = load_rule_specs(path)?;
    let standard: Vec<RuleSpec> = RuleRegistry::standard().specs().cloned().collect();
    Ok(RuleRegistry::builder().rules(standard).rules(specs).build())
}
