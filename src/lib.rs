// Library interface for testing
pub mod admin;
pub mod availability;
pub mod booked;
pub mod booking;
pub mod catalog;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod jobs;
pub mod models;
pub mod render;
pub mod store;
pub mod time;
pub mod traits;
pub mod utils;
