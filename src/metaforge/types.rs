use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The unit of caching and aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
  Items,
  Quests,
  Traders,
  Arcs,
}

impl ResourceKind {
  pub const ALL: [ResourceKind; 4] = [
    ResourceKind::Items,
    ResourceKind::Quests,
    ResourceKind::Traders,
    ResourceKind::Arcs,
  ];

  /// Key in the shared response cache
  pub fn cache_key(self) -> &'static str {
    match self {
      ResourceKind::Items => "arcfinder:items",
      ResourceKind::Quests => "arcfinder:quests",
      ResourceKind::Traders => "arcfinder:traders",
      ResourceKind::Arcs => "arcfinder:arcs",
    }
  }

  /// Path segment under the upstream base URL
  pub fn path(self) -> &'static str {
    match self {
      ResourceKind::Items => "items",
      ResourceKind::Quests => "quests",
      ResourceKind::Traders => "traders",
      ResourceKind::Arcs => "arcs",
    }
  }

  /// Human-readable name used in error messages
  pub fn label(self) -> &'static str {
    match self {
      ResourceKind::Items => "items",
      ResourceKind::Quests => "quests",
      ResourceKind::Traders => "traders",
      ResourceKind::Arcs => "ARCs",
    }
  }

  /// Whether the upstream endpoint is walked page by page
  pub fn is_paginated(self) -> bool {
    matches!(self, ResourceKind::Items)
  }
}

/// An upstream entity (item, quest, trader or ARC).
///
/// Only `id` and `name` are interpreted; everything else rides along in
/// `fields` and is serialized back out untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  #[serde(deserialize_with = "string_or_number")]
  pub id: String,
  /// Empty when the upstream sends no name, `null`, or a non-string
  #[serde(default, deserialize_with = "string_or_empty")]
  pub name: String,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

pub type Item = Record;
pub type Quest = Record;
pub type Trader = Record;
pub type ArcUnit = Record;

impl Record {
  /// A string-valued pass-through field.
  pub fn str_field(&self, key: &str) -> Option<&str> {
    self.fields.get(key).and_then(Value::as_str)
  }

  /// An array-valued pass-through field, empty when absent.
  pub fn list_field(&self, key: &str) -> &[Value] {
    self
      .fields
      .get(key)
      .and_then(Value::as_array)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn description(&self) -> Option<&str> {
    self.str_field("description")
  }

  pub fn rarity(&self) -> Option<&str> {
    self.str_field("rarity")
  }

  pub fn item_type(&self) -> Option<&str> {
    self.str_field("item_type")
  }

  pub fn category(&self) -> Option<&str> {
    self.str_field("category")
  }

  /// Icon or image URL, whichever the record carries.
  pub fn image_url(&self) -> Option<&str> {
    self.str_field("icon").or_else(|| self.str_field("image"))
  }
}

/// Upstream ids are usually strings but some endpoints emit numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::String(s) => Ok(s),
    Value::Number(n) => Ok(n.to_string()),
    other => Err(serde::de::Error::custom(format!(
      "expected string or number id, got {}",
      other
    ))),
  }
}

/// Names are display-only, so anything but a string reads as empty.
fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::String(s) => Ok(s),
    _ => Ok(String::new()),
  }
}

/// Decode raw upstream values into records, skipping ones without an id.
pub fn decode_records(values: &[Value]) -> Vec<Record> {
  values
    .iter()
    .filter_map(|v| match serde_json::from_value::<Record>(v.clone()) {
      Ok(record) => Some(record),
      Err(e) => {
        tracing::warn!(error = %e, "Skipping undecodable record");
        None
      }
    })
    .collect()
}
