//! Domain types, the [`EngagementStore`](store::EngagementStore) trait and
//! the [`EngagementService`] that coordinates likes, saves, shares, views,
//! downloads, comments and comment notifications over any store backend.
//!
//! No HTTP or database code lives here.

pub mod comment;
pub mod content;
pub mod engagement;
pub mod error;
pub mod notification;
pub mod service;
pub mod store;

pub use error::{Error, Result};
pub use service::EngagementService;
