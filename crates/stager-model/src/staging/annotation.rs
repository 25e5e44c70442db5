use serde::{Deserialize, Serialize, de::Error as _};
use serde_json::Value;

use crate::Lifecycle;

/// Metadata attached to a staging task at creation and returned unchanged on completion.
///
/// Every field is optional on the wire: the lifecycle picks the response backend,
/// and each backend decides which identities it requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingTaskAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl StagingTaskAnnotation {
    pub fn new(lifecycle: Lifecycle, app_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            lifecycle: Some(lifecycle.tag().to_string()),
            app_id: Some(app_id.into()),
            task_id: Some(task_id.into()),
        }
    }

    /// Parse an annotation; must be a JSON object.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str(raw)? {
            obj @ Value::Object(_) => serde_json::from_value(obj),
            other => Err(serde_json::Error::custom(format!(
                "annotation must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn to_json(&self) -> String {
        // A struct of optional strings always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
