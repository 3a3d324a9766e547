//! Seed and migration tools for the LUNARi users table in DynamoDB.
//!
//! `seed-database` loads pre-shaped user items from a JSON file,
//! `migrate-data` copies the PostgreSQL `users` table into the denormalized
//! DynamoDB layout.

pub mod error;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod utils;


pub use error::{EtlError, Result};
pub use pipeline::RunStats;
