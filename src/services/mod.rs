pub mod attendance;
pub mod auth;
pub mod email;
pub mod media;
pub mod menu;
pub mod report;
pub mod roster;
