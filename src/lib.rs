pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod photo;
pub mod scoring;
pub mod session;
pub mod workers;
