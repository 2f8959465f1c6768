//! Template rendering against an execution context
//!
//! Placeholders are `{{ key }}` (a leading dot, `{{ .key }}`, is also
//! accepted). Dotted keys walk nested objects. A key missing from the
//! context is an error, never an empty substitution.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::common::{Error, Result};

/// Key/value data available to templates during one plan execution
pub type Context = HashMap<String, Value>;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Renders strings and files given a context
pub trait TemplateEngine {
    fn render_str(&self, template: &str, context: &Context) -> Result<String>;

    /// Render the file at `source` into `destination`
    fn render_file(&self, source: &Path, destination: &Path, context: &Context) -> Result<()> {
        let content = std::fs::read_to_string(source).map_err(|e| Error::file_read(source, &e))?;
        let rendered = self
            .render_str(&content, context)
            .map_err(|e| Error::Template(format!("{}: {}", source.display(), e)))?;
        std::fs::write(destination, rendered)?;
        Ok(())
    }
}

/// Default `{{ key }}` substitution engine
#[derive(Debug, Default, Clone, Copy)]
pub struct Placeholders;

impl TemplateEngine for Placeholders {
    fn render_str(&self, template: &str, context: &Context) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + OPEN.len()..];
            let end = after_open
                .find(CLOSE)
                .ok_or_else(|| Error::Template(format!("unclosed '{{{{' in '{}'", template)))?;

            let key = parse_key(&after_open[..end])?;
            out.push_str(&stringify(lookup(context, key)?));
            rest = &after_open[end + CLOSE.len()..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*(\.[A-Za-z_][A-Za-z0-9_-]*)*$")
            .expect("static regex is valid")
    })
}

fn parse_key(raw: &str) -> Result<&str> {
    let key = raw.trim();
    let key = key.strip_prefix('.').unwrap_or(key);
    if !key_pattern().is_match(key) {
        return Err(Error::Template(format!("malformed placeholder '{{{{{}}}}}'", raw)));
    }
    Ok(key)
}

fn lookup<'a>(context: &'a Context, key: &str) -> Result<&'a Value> {
    let missing = || Error::Template(format!("no value for '{}' in context", key));

    let mut segments = key.split('.');
    let first = segments.next().ok_or_else(missing)?;
    let mut value = context.get(first).ok_or_else(missing)?;
    for segment in segments {
        value = value.get(segment).ok_or_else(missing)?;
    }
    Ok(value)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
