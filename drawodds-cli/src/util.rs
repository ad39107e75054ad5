use anyhow::{Context, Result, bail};
use drawodds_core::query::check_percent;
use regex::Regex;

const IDENTIFIER_PATTERN: &str = r"^[a-z0-9-]+$";

/// Non-empty, trimmed items of a comma-separated flag value.
fn list_items(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn identifier_pattern() -> Result<Regex> {
    Regex::new(IDENTIFIER_PATTERN).context("compiling identifier pattern")
}

/// Lowercase and check one dataset identifier before it reaches the engine.
fn checked_identifier(pattern: &Regex, flag: &str, value: &str) -> Result<String> {
    let lowered = value.trim().to_ascii_lowercase();
    if !pattern.is_match(&lowered) {
        bail!(
            "--{flag} value `{value}` is not a valid identifier \
             (letters, digits, hyphens)"
        );
    }
    Ok(lowered)
}

pub fn identifier(flag: &str, value: &str) -> Result<String> {
    checked_identifier(&identifier_pattern()?, flag, value)
}

/// Identifiers from a comma-separated flag, in first-seen order without repeats.
pub fn identifier_list(flag: &str, text: &str) -> Result<Vec<String>> {
    let pattern = identifier_pattern()?;
    let mut ids: Vec<String> = Vec::new();
    for item in list_items(text) {
        let id = checked_identifier(&pattern, flag, item)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Clap value parser for a percentage flag.
pub fn parse_percent(text: &str) -> Result<u8> {
    let value: u32 = text
        .trim()
        .trim_end_matches('%')
        .parse()
        .with_context(|| format!("`{text}` is not a whole percentage"))?;
    Ok(check_percent("percent", value)?)
}

pub fn parse_percent_list(text: &str) -> Result<Vec<u8>> {
    list_items(text)
        .map(|part| parse_percent(part).with_context(|| format!("invalid odds value `{part}`")))
        .collect()
}
