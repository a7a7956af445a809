use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::table::Record;

/// Matches `{name}` where the name holds no braces or line breaks.
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([^{}\r\n]+)\}").expect("placeholder regex is valid"))
}

/// A prompt with `{column}` placeholders, shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Substitutes every `{col}` whose name is a column of `record`.
    ///
    /// Unknown placeholders are left verbatim, so JSON examples embedded in a
    /// prompt (`{"title": ""}`) survive rendering.
    pub fn render(&self, record: &Record) -> String {
        render(&self.text, record)
    }

    /// Names of all placeholders, in order of first appearance.
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in placeholder_regex().captures_iter(&self.text) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Placeholders that none of `columns` can satisfy.
    pub fn unmatched_placeholders(&self, columns: &[String]) -> Vec<String> {
        self.placeholders()
            .into_iter()
            .filter(|name| !columns.iter().any(|c| c == name))
            .collect()
    }

    /// Appends the JSON answer skeleton for `columns` to the prompt.
    pub fn with_output_scaffold(&self, columns: &[String]) -> Self {
        if columns.is_empty() {
            return self.clone();
        }
        Self {
            text: format!("{}\n\n{}", self.text, scaffold_output_columns(columns)),
        }
    }
}

pub fn render(template: &str, record: &Record) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| match record.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Splits a comma-separated column list, dropping blanks.
pub fn parse_column_list(columns: &str) -> Vec<String> {
    columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds the JSON object the model is asked to fill in, one empty string per
/// column.
pub fn scaffold_output_columns(columns: &[String]) -> String {
    let fields: Vec<String> = columns
        .iter()
        .map(|c| format!("  {}: \"\"", serde_json::Value::String(c.clone())))
        .collect();
    format!("{{\n{}\n}}", fields.join(",\n"))
}
