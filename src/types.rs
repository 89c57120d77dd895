// =============================================================================
// Shared record types served by the Signal Wheel API
// =============================================================================
//
// Both record kinds are kept as raw JSON objects so that every attribute the
// data files carry is passed through untouched (key order included). The
// service only ever looks at a handful of well-known fields.
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read a string-valued field from a JSON object. Missing or non-string
/// values yield `None`.
fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// A discrete observable data point identified by its `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signal(pub Map<String, Value>);

impl Signal {
    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id")
    }
}

/// A hypothetical outcome classified by polarity and likelihood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scenario(pub Map<String, Value>);

impl Scenario {
    /// Directional character, e.g. `positive` / `negative`.
    pub fn polarity(&self) -> Option<&str> {
        str_field(&self.0, "polarity")
    }

    /// Coarse probability bucket, e.g. `probable` / `plausible` / `possible`.
    pub fn likelihood(&self) -> Option<&str> {
        str_field(&self.0, "likelihood")
    }
}

/// Number of scenarios sharing one `(polarity, likelihood)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinationCount {
    pub polarity: Option<String>,
    pub likelihood: Option<String>,
    pub count: usize,
}

impl std::fmt::Display for CombinationCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}): {}",
            self.polarity.as_deref().unwrap_or("-"),
            self.likelihood.as_deref().unwrap_or("-"),
            self.count
        )
    }
}
