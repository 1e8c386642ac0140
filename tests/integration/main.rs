//! Integration tests
//!
//! The in-memory suites run by default. The Postgres suite needs a live
//! database: `DATABASE_URL=... cargo test -- --ignored`

mod common;
mod feed;
mod lifecycle;
mod postgres;
mod properties;
