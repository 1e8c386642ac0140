//! Library circulation and social wall core
//!
//! Two stateless decision components sit at the center:
//!
//! - [`circulation`]: the borrow lifecycle (request, approve, reject, return)
//!   and overdue fines, as pure functions over snapshots that return the
//!   effect to persist;
//! - [`moderation`]: the rule-based content moderator for wall posts and
//!   comments.
//!
//! Around them, [`repository`] persists state (Postgres or in memory) and
//! [`services`] load snapshots, call the core and commit effects atomically.

pub mod circulation;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod moderation;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
