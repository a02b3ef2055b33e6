pub mod api;
pub mod config;
pub mod data;
pub mod db;
pub mod diagnostic;
pub mod error;
pub mod feedback;
pub mod mastery;
pub mod models;
pub mod plan;
pub mod service;
pub mod srs;
