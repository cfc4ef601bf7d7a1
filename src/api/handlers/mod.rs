pub mod api_keys;
pub mod charges;
pub mod content;
pub mod credits;
pub mod email;
pub mod signup_guard;
pub mod static_assets;
pub mod webhooks;
