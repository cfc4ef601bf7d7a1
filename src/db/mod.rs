//! Database layer: repositories over sqlx, one handler per entity.
//!
//! ```text
//!  API handlers ──► db::handlers (Profiles, Credits, Signups, SystemConfig)
//!                        │
//!                        ▼
//!                  db::models (DB request/response types)
//!                        │
//!                        ▼
//!                    PostgreSQL
//! ```
//!
//! Handlers borrow a `&mut PgConnection` so callers decide the transaction
//! scope; multi-statement writes open their own transaction internally.

pub mod errors;
pub mod handlers;
pub mod models;
