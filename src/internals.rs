pub mod config;
pub mod invite_data;
pub mod platform;
pub mod utils;
