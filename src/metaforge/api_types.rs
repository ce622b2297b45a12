//! Decoding of MetaForge response envelopes.
//!
//! Endpoints do not agree on a shape: some return a bare array, some wrap it
//! in `data` or `value`, and traders come back as an object keyed by trader
//! name. Every body goes through [`ListShape::decode`], which tries each
//! known shape in order and keeps the first that fits.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use super::types::ResourceKind;

/// The recognized response envelopes, in decode priority order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListShape {
  /// `[ ... ]`
  Bare(Vec<Value>),
  /// `{ "data": [ ... ] }`
  Data { data: Vec<Value> },
  /// `{ "value": [ ... ] }`
  Wrapped { value: Vec<Value> },
  /// `{ "success": true, "data": { "<trader>": [ ... ] } }`
  Keyed {
    success: bool,
    data: Map<String, Value>,
  },
}

impl ListShape {
  /// Attempt every known shape; `None` when the body fits none of them.
  pub fn decode(body: Value) -> Option<Self> {
    serde_json::from_value(body).ok()
  }

  fn name(&self) -> &'static str {
    match self {
      ListShape::Bare(_) => "array",
      ListShape::Data { .. } => "data envelope",
      ListShape::Wrapped { .. } => "value envelope",
      ListShape::Keyed { .. } => "keyed object",
    }
  }
}

/// Pagination block of the paginated item endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  #[serde(default)]
  pub has_next_page: bool,
}

#[derive(Debug, Default, Deserialize)]
struct PageMeta {
  #[serde(default)]
  pagination: Option<Pagination>,
}

/// Whether a page body says another page follows.
///
/// A page without pagination metadata is treated as the last one.
pub fn has_next_page(body: &Value) -> bool {
  PageMeta::deserialize(body)
    .ok()
    .and_then(|meta| meta.pagination)
    .map(|p| p.has_next_page)
    .unwrap_or(false)
}

/// Extract the record list for `kind` from a response body.
///
/// Shapes the resource type does not accept, and bodies matching no shape,
/// yield an empty list and a warning.
pub fn normalize(kind: ResourceKind, body: Value) -> Vec<Value> {
  let shape = match ListShape::decode(body) {
    Some(shape) => shape,
    None => {
      warn!(resource = kind.label(), "Unexpected API response structure");
      return Vec::new();
    }
  };

  match (kind, shape) {
    (ResourceKind::Traders, ListShape::Keyed { success: true, data }) => trader_records(data),
    (_, ListShape::Bare(list)) => list,
    (_, ListShape::Data { data }) => data,
    (ResourceKind::Arcs, ListShape::Wrapped { value }) => value,
    (_, shape) => {
      warn!(
        resource = kind.label(),
        shape = shape.name(),
        "Unexpected API response structure"
      );
      Vec::new()
    }
  }
}

/// Turn `{ "Apollo": [...] }` into `[{ id, name, items, description }]`.
///
/// Traders keep the order the upstream object lists them in.
pub fn trader_records(data: Map<String, Value>) -> Vec<Value> {
  data
    .into_iter()
    .map(|(name, items)| {
      json!({
        "id": name.to_lowercase(),
        "name": name,
        "items": items,
        "description": format!("Trader {}", name),
      })
    })
    .collect()
}
