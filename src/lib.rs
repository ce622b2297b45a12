//! arcfinder: caching proxy and terminal browser for the MetaForge ARC Raiders API.
//!
//! Two caches make up the core:
//! - [`cache`] + [`metaforge`]: a shared expiring response cache in front of
//!   a loader that aggregates paginated upstream endpoints, with at most one
//!   aggregation per resource type in flight per process
//! - [`images`]: a persistent, URL-keyed image blob cache on the client side

pub mod api_client;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod images;
pub mod logging;
pub mod maps;
pub mod metaforge;
pub mod web;
