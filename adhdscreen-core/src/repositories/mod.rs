// src/repositories/mod.rs

pub mod postgres;
pub mod memory;

pub use adhdscreen_common::traits::{ActivityLogRepository, ResultRepository, UserRepository};
pub use memory::MemoryStore;
