pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod models;
pub mod observability;
pub mod presentation;
pub mod repositories;
pub mod services;
pub mod telegram;
