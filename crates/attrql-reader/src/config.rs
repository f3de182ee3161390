//! Reader configuration.
//!
//! ```json
//! { "use_subqueries": "true", "lenient_conversion": false }
//! ```

use crate::error::ReaderResult;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Fetch eager collections with one nested query instead of `1 + 2N`.
    ///
    /// Accepts a bool or the strings `"true"` / `"false"` in any case.
    #[serde(deserialize_with = "flag")]
    pub use_subqueries: bool,

    /// Log row conversion failures and return an empty result instead.
    pub lenient_conversion: bool,
}

impl ReaderConfig {
    pub fn from_json(json: &str) -> ReaderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_subqueries(mut self, enabled: bool) -> Self {
        self.use_subqueries = enabled;
        self
    }

    pub fn lenient(mut self, enabled: bool) -> Self {
        self.lenient_conversion = enabled;
        self
    }
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(de::Error::custom(format!(
                "expected a bool or \"true\"/\"false\", got {text:?}"
            ))),
        },
    }
}
