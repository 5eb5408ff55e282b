//! Path template interpolation
//!
//! Handles `{placeholder}` interpolation in API path templates such as
//! `/adaccounts/{ad_account_id}/campaigns`. Placeholders are resolved from a
//! stream [`Context`]; an unresolved placeholder is a configuration error.

use crate::error::{Error, Result};
use crate::partition::Context;
use crate::types::value_to_string;
use regex::Regex;
use std::sync::LazyLock;

/// Regex for matching path placeholders: {placeholder}
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}").unwrap());

/// Render a path template with the given context
pub fn render(template: &str, ctx: &Context) -> Result<String> {
    let mut errors = Vec::new();

    let rendered = PLACEHOLDER_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let name = &cap[1];
        match ctx.get(name) {
            Some(value) if !value.is_null() => value_to_string(value),
            _ => {
                errors.push(name.to_string());
                cap[0].to_string()
            }
        }
    });

    if errors.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Check if a string contains placeholders
pub fn has_placeholders(s: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(s)
}

/// Extract all placeholder names from a template, in order of appearance
pub fn extract_placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}
