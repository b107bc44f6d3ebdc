// src/lib.rs

pub mod config;
pub mod db;
pub mod repositories;
pub mod scoring;
pub mod auth;
pub mod services;
pub mod web;
pub mod app;
pub mod test_utils;

pub use adhdscreen_common::error::Error;
pub use adhdscreen_common::models;
pub use config::{AppConfig, StoreKind};
pub use db::Database;
