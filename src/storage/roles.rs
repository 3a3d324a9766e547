use std::collections::HashMap;

use crate::error::Result;
use crate::source::RoleRow;
use crate::storage::models::{Role, RoleType};

/// Role lookup built once per migration run
#[derive(Debug, Clone, PartialEq)]
pub struct RoleCache {
    roles: HashMap<i64, Role>,
    default_role: Role,
}

impl RoleCache {
    /// The four canonical roles
    pub fn canonical() -> Self {
        Self::with_roles(
            RoleType::ALL
                .into_iter()
                .map(|role| (role.id(), role.to_role()))
                .collect(),
        )
    }

    fn with_roles(roles: HashMap<i64, Role>) -> Self {
        Self {
            roles,
            default_role: RoleType::Client.to_role(),
        }
    }

    /// Build the cache from `user_role` rows. Known ids keep the canonical
    /// name and description whatever the table says.
    pub fn from_rows(rows: impl IntoIterator<Item = RoleRow>) -> Self {
        let roles = rows
            .into_iter()
            .map(|row| {
                let role = match RoleType::from_id(row.id) {
                    Some(known) => known.to_role(),
                    None => Role {
                        role_id: row.id,
                        role_name: row.name.to_uppercase(),
                        role_description: row.description.unwrap_or_default(),
                    },
                };
                (row.id, role)
            })
            .collect();

        Self::with_roles(roles)
    }

    /// Use the loaded rows, or the canonical table if they could not be read
    pub fn from_source(rows: Result<Vec<RoleRow>>) -> Self {
        match rows {
            Ok(rows) => {
                let cache = Self::from_rows(rows);
                tracing::info!(roles = cache.len(), "Loaded role cache");
                cache
            }
            Err(err) => {
                tracing::warn!(error = %err, "Could not load roles from database");
                tracing::info!("Using default role mapping");
                Self::canonical()
            }
        }
    }

    /// Role for a source role id; unknown or missing ids get CLIENT
    pub fn resolve(&self, role_id: Option<i64>) -> &Role {
        role_id
            .and_then(|id| self.roles.get(&id))
            .unwrap_or(&self.default_role)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
