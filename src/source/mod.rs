pub mod postgres;
pub mod seed_file;

pub use postgres::{RoleRow, SourceFlag, SourceTime, UserRow, UserSource};
pub use seed_file::{load_seed_file, SeedRecord, DEFAULT_SEED_FILE};
