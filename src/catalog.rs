//! Item lookup, search and filtering over loaded catalogs.

use std::collections::BTreeSet;

use crate::metaforge::{Item, Trader};

/// Lowercase a name and join its words with single hyphens.
///
/// `"Plasma  Rifle"` becomes `"plasma-rifle"`. Leading and trailing
/// whitespace is dropped rather than turned into hyphens.
pub fn slugify(name: &str) -> String {
  name
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join("-")
}

/// Find an item by identifier or slug.
///
/// Precedence, first match wins: exact id, case-insensitive id, slug of
/// the name equal to the lowercased `id`.
pub fn find_by_id<'a>(items: &'a [Item], id: &str) -> Option<&'a Item> {
  if id.is_empty() {
    return None;
  }

  if let Some(item) = items.iter().find(|i| i.id == id) {
    return Some(item);
  }

  let wanted = id.to_lowercase();
  if let Some(item) = items.iter().find(|i| i.id.to_lowercase() == wanted) {
    return Some(item);
  }

  items.iter().find(|i| slugify(&i.name) == wanted)
}

/// Find a trader by id, or by name compared case-insensitively.
pub fn find_trader<'a>(traders: &'a [Trader], id: &str) -> Option<&'a Trader> {
  let wanted = id.to_lowercase();
  traders
    .iter()
    .find(|t| t.id == id || t.name.to_lowercase() == wanted)
}

/// Items whose name, description, type or category contains `query`.
pub fn search<'a>(items: &'a [Item], query: &str) -> Vec<&'a Item> {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return items.iter().collect();
  }

  let contains = |field: Option<&str>| {
    field
      .map(|f| f.to_lowercase().contains(&needle))
      .unwrap_or(false)
  };

  items
    .iter()
    .filter(|item| {
      contains(Some(&item.name))
        || contains(item.description())
        || contains(item.item_type())
        || contains(item.category())
    })
    .collect()
}

fn is_wildcard(filter: &str) -> bool {
  filter.is_empty() || filter.eq_ignore_ascii_case("all")
}

fn field_matches(field: Option<&str>, filter: &str) -> bool {
  field
    .map(|f| f.to_lowercase() == filter.to_lowercase())
    .unwrap_or(false)
}

pub fn filter_by_rarity<'a>(items: Vec<&'a Item>, rarity: &str) -> Vec<&'a Item> {
  if is_wildcard(rarity) {
    return items;
  }
  items
    .into_iter()
    .filter(|i| field_matches(i.rarity(), rarity))
    .collect()
}

pub fn filter_by_type<'a>(items: Vec<&'a Item>, item_type: &str) -> Vec<&'a Item> {
  if is_wildcard(item_type) {
    return items;
  }
  items
    .into_iter()
    .filter(|i| field_matches(i.item_type(), item_type))
    .collect()
}

/// Distinct rarities, sorted.
pub fn unique_rarities(items: &[Item]) -> Vec<String> {
  items
    .iter()
    .filter_map(|i| i.rarity())
    .map(String::from)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}

/// Distinct item types, sorted.
pub fn unique_types(items: &[Item]) -> Vec<String> {
  items
    .iter()
    .filter_map(|i| i.item_type())
    .map(String::from)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}
