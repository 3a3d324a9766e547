use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{EtlError, Result};

pub const DEFAULT_SEED_FILE: &str = "infrastructure/seed-data.json";

/// Pre-shaped user item taken from the seed file
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRecord {
    pub username: String,
    pub email: String,
    pub item: Map<String, Value>,
}

impl SeedRecord {
    /// Validate one element of the seed array. `position` is only used to
    /// name the record in errors when it has no username.
    pub fn from_value(position: usize, value: Value) -> Result<Self> {
        let Value::Object(item) = value else {
            return Err(EtlError::data_shape(
                format!("#{position}"),
                "seed entry is not a JSON object",
            ));
        };

        let username = string_field(&item, "username")
            .ok_or_else(|| EtlError::data_shape(format!("#{position}"), "missing username"))?;
        let email = string_field(&item, "email")
            .ok_or_else(|| EtlError::data_shape(username.clone(), "missing email"))?;

        Ok(Self {
            username,
            email,
            item,
        })
    }
}

fn string_field(item: &Map<String, Value>, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Read the seed file. Missing or unparsable files are fatal; the entries
/// themselves are validated one by one later.
pub fn load_seed_file(path: &Path) -> Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path).map_err(|source| EtlError::SeedFile {
        path: PathBuf::from(path),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| EtlError::SeedParse {
        path: PathBuf::from(path),
        source,
    })
}
