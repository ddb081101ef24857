pub mod handlers;
pub mod manager;
pub mod models;
pub mod transcript;
