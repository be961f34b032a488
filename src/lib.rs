// src/lib.rs
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
