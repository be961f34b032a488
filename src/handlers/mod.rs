pub mod custom_sources;
pub mod data;
pub mod error;
pub mod health;
