pub mod app;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
