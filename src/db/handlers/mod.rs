//! Repository handlers, one per entity.
//!
//! Each handler wraps a `&mut PgConnection` and exposes the queries the API
//! layer needs. Nothing here knows about HTTP.

pub mod credits;
pub mod profiles;
pub mod signups;
pub mod system_config;

pub use credits::Credits;
pub use profiles::Profiles;
pub use signups::Signups;
pub use system_config::SystemConfig;
