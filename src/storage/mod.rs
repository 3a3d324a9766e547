pub mod dynamodb;
pub mod migration;
pub mod models;
pub mod roles;
pub mod writer;

pub use dynamodb::{DynamoDBStore, Item};
pub use migration::to_user_item;
pub use models::{Role, RoleType, UserItem};
pub use roles::RoleCache;
pub use writer::{writer_for, DryRunWriter, ItemWriter};
