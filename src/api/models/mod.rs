pub mod charges;
pub mod content;
pub mod credits;
pub mod email;
pub mod generation;
pub mod signup;
