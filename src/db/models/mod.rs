pub mod credits;
pub mod profiles;
pub mod signups;
