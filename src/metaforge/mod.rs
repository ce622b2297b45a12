//! MetaForge ARC Raiders API: client, response decoding and the resource loader.

pub mod api_types;
pub mod client;
pub mod loader;
pub mod types;

pub use client::MetaForgeClient;
pub use loader::ResourceLoader;
pub use types::{ArcUnit, Item, Quest, Record, ResourceKind, Trader};
