pub mod helpers;
pub mod fixtures;
