//! The parsed model output and its field accessors.
//!
//! An [`AnalysisResult`] keeps the JSON value exactly as the model returned
//! it. Nothing is validated at parse time: a response that is valid JSON but
//! misses keys, nests them oddly, or uses numbers where strings were asked
//! for is still a result. The accessors below absorb all of that by falling
//! back to [`NOT_AVAILABLE`] for scalars and an empty list for lists.
//!
//! Keys are matched exactly first, then by a loose comparison that ignores
//! case and punctuation, so `"key_takeaways"` finds `"Key Takeaways"` and
//! `"quarter_period"` finds `"Quarter/Period"`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder rendered for every absent or null scalar field.
pub const NOT_AVAILABLE: &str = "N/A";

/// Top-level sections the prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Meta,
    Sentiment,
    KeyTakeaways,
    Guidance,
    Operational,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Meta,
        Section::Sentiment,
        Section::KeyTakeaways,
        Section::Guidance,
        Section::Operational,
    ];

    /// JSON key of the section.
    pub fn key(self) -> &'static str {
        match self {
            Section::Meta => "Meta",
            Section::Sentiment => "Sentiment",
            Section::KeyTakeaways => "Key Takeaways",
            Section::Guidance => "Guidance",
            Section::Operational => "Operational",
        }
    }
}

/// Scalar fields shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    CompanyName,
    Period,
    Tone,
    ConfidenceScore,
    Rationale,
    Revenue,
    Margin,
    Capex,
    CapacityUtilization,
    GrowthInitiatives,
}

impl TextField {
    pub const ALL: [TextField; 10] = [
        TextField::CompanyName,
        TextField::Period,
        TextField::Tone,
        TextField::ConfidenceScore,
        TextField::Rationale,
        TextField::Revenue,
        TextField::Margin,
        TextField::Capex,
        TextField::CapacityUtilization,
        TextField::GrowthInitiatives,
    ];

    pub fn section(self) -> Section {
        match self {
            TextField::CompanyName | TextField::Period => Section::Meta,
            TextField::Tone | TextField::ConfidenceScore | TextField::Rationale => {
                Section::Sentiment
            }
            TextField::Revenue | TextField::Margin | TextField::Capex => Section::Guidance,
            TextField::CapacityUtilization | TextField::GrowthInitiatives => Section::Operational,
        }
    }

    /// JSON key of the field inside its section.
    pub fn key(self) -> &'static str {
        match self {
            TextField::CompanyName => "Company Name",
            TextField::Period => "Quarter/Period",
            TextField::Tone => "Tone",
            TextField::ConfidenceScore => "Confidence Score",
            TextField::Rationale => "Rationale",
            TextField::Revenue => "Revenue",
            TextField::Margin => "Margin",
            TextField::Capex => "Capex",
            TextField::CapacityUtilization => "Capacity Utilization",
            TextField::GrowthInitiatives => "New Growth Initiatives",
        }
    }
}

/// List-valued fields shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    Positives,
    Concerns,
}

impl ListField {
    pub const ALL: [ListField; 2] = [ListField::Positives, ListField::Concerns];

    pub fn section(self) -> Section {
        Section::KeyTakeaways
    }

    pub fn key(self) -> &'static str {
        match self {
            ListField::Positives => "Positives",
            ListField::Concerns => "Concerns",
        }
    }
}

/// The JSON object extracted by the model for one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    value: Value,
}

impl AnalysisResult {
    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    /// The raw JSON as returned by the model.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// The object stored under `section`, if present and an object.
    pub fn section(&self, section: Section) -> Option<&Map<String, Value>> {
        lookup(self.value.as_object()?, section.key())?.as_object()
    }

    /// The display text of `field`, or [`NOT_AVAILABLE`].
    pub fn text(&self, field: TextField) -> String {
        self.section(field.section())
            .and_then(|s| lookup(s, field.key()))
            .and_then(scalar_text)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// The items of `field`, or an empty list.
    pub fn list(&self, field: ListField) -> Vec<String> {
        let Some(value) = self
            .section(field.section())
            .and_then(|s| lookup(s, field.key()))
        else {
            return Vec::new();
        };
        match value {
            Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
            Value::Null => Vec::new(),
            Value::String(s) if s.trim().is_empty() => Vec::new(),
            other => scalar_text(other).into_iter().collect(),
        }
    }

    /// A fixed demo result for previewing the dashboard without an API call.
    ///
    /// The `Operational` section is left out on purpose so the preview also
    /// shows the placeholder rendering.
    pub fn sample() -> Self {
        Self::from_value(serde_json::json!({
            "Meta": {
                "Company Name": "Sample Corp (demo data)",
                "Quarter/Period": "Q1 2026"
            },
            "Sentiment": {
                "Tone": "Neutral",
                "Confidence Score": "Medium",
                "Rationale": "Sample data loaded; no document was analysed."
            },
            "Key Takeaways": {
                "Positives": ["Dashboard layout preview", "No API key required"],
                "Concerns": ["Values are illustrative only"]
            },
            "Guidance": {
                "Revenue": "N/A",
                "Margin": "N/A",
                "Capex": "N/A"
            }
        }))
    }
}

/// Find `key` in `map`: exact match first, then a case- and
/// punctuation-insensitive match.
fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(v) = map.get(key) {
        return Some(v);
    }
    let wanted = normalise_key(key);
    map.iter()
        .find(|(k, _)| normalise_key(k) == wanted)
        .map(|(_, v)| v)
}

fn normalise_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Render a JSON value as one line of display text. `None` for null.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}
