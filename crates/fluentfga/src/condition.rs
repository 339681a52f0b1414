//! Condition instances and parameter serialization.
//!
//! Generated condition builders call the serializers in this module, so the
//! rules for each parameter kind live in one place:
//!
//! | Kind      | Wire form                                   |
//! |-----------|---------------------------------------------|
//! | Timestamp | `"2026-01-01T00:00:00.000Z"` (milliseconds) |
//! | Duration  | `"864000s"` (total seconds)                 |
//! | Int       | JSON number                                 |
//! | Bool      | `"true"` / `"false"`                        |
//! | String    | JSON string                                 |

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameter values for a condition, keyed by the declared parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionContext(Map<String, Value>);

impl ConditionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter value, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Merges `other` into this context. Values in `other` win.
    pub fn merge(&mut self, other: ConditionContext) -> &mut Self {
        self.0.extend(other.0);
        self
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ConditionContext {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<K: Into<String>> Extend<(K, Value)> for ConditionContext {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}

/// A named condition attached to a tuple, with its grant-time parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionInstance {
    pub name: String,
    #[serde(default, skip_serializing_if = "ConditionContext::is_empty")]
    pub context: ConditionContext,
}

impl ConditionInstance {
    pub fn new(name: impl Into<String>, context: ConditionContext) -> Self {
        Self {
            name: name.into(),
            context,
        }
    }
}

/// ISO-8601 with millisecond precision and a literal `Z`.
pub fn timestamp(value: DateTime<Utc>) -> Value {
    Value::String(value.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Total seconds suffixed with `s`. Sub-second durations keep their fraction.
pub fn duration(value: Duration) -> Value {
    let text = if value.subsec_nanos() == 0 {
        format!("{}s", value.as_secs())
    } else {
        format!("{}s", value.as_secs_f64())
    };
    Value::String(text)
}

pub fn int(value: i64) -> Value {
    Value::from(value)
}

/// Lowercase string form (`"true"` / `"false"`).
pub fn boolean(value: bool) -> Value {
    Value::String(value.to_string())
}

pub fn string(value: impl ToString) -> Value {
    Value::String(value.to_string())
}
