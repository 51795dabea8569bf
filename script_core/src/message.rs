//! Messages emitted by the host.
//!
//! A message is a tagged record. The core routes on the tag and never looks
//! at the other fields. On the wire a message is a JSON object whose `"T"`
//! key holds the tag:
//!
//! ```json
//! {"T": "BlockBreak", "pos": [1, 2, 3], "block": 1}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A tagged message routed by [`Message::kind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The routing tag.
    #[serde(rename = "T")]
    pub kind: String,

    /// Everything else, untouched.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Message {
    /// Create a message with no fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Add a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The routing tag.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Decode a JSON array of messages.
    pub fn parse_batch(json: &str) -> Result<Vec<Message>> {
        Ok(serde_json::from_str(json)?)
    }
}
