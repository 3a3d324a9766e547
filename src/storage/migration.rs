//! Mapping of PostgreSQL user rows to DynamoDB user items.

use std::collections::BTreeMap;

use crate::error::{EtlError, Result};
use crate::source::{SourceTime, UserRow};
use crate::storage::models::{
    Favorites, Preferences, PurchaseStats, ReviewStats, UserItem,
};
use crate::storage::roles::RoleCache;

/// Transform one source row into a user item.
///
/// Rows without `email`, `created_at` or `updated_at` are rejected with a
/// `DataShape` error.
pub fn to_user_item(row: &UserRow, roles: &RoleCache) -> Result<UserItem> {
    let user_id = row.id.clone();
    let role = roles.resolve(row.role_id).clone();

    let email = row
        .email
        .clone()
        .filter(|email| !email.is_empty())
        .ok_or_else(|| EtlError::data_shape(&user_id, "email is NULL"))?;
    let created_at = required_time(&row.created_at, "created_at", &user_id)?;
    let updated_at = required_time(&row.updated_at, "updated_at", &user_id)?;

    Ok(UserItem {
        first_name: or_empty(&row.first_name),
        last_name: or_empty(&row.last_name),
        email,
        phone: or_empty(&row.phone),
        profile_img: or_empty(&row.profile_image),
        password: or_empty(&row.password),

        role_name: role.role_name.clone(),
        role,

        is_active: row.is_active.as_bool(),
        is_verified: row.is_verified.as_bool(),
        is_active_user_id: UserItem::active_sort_key(row.is_active, &user_id),

        member_since: created_at.clone(),
        created_at,
        updated_at,

        last_login: optional_time(&row.last_login),
        token_verification: row
            .token_verification
            .clone()
            .filter(|token| !token.is_empty()),
        token_expiration: optional_time(&row.token_expiration),

        level: 1,
        points: 0,
        purchases: PurchaseStats::default(),
        reviews: ReviewStats::default(),
        favorites: Favorites::default(),
        preferences: Preferences::default(),
        metadata: BTreeMap::new(),

        user_id,
    })
}

fn or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn optional_time(value: &Option<SourceTime>) -> Option<String> {
    value
        .as_ref()
        .filter(|time| !time.is_empty())
        .map(SourceTime::to_iso8601)
}

fn required_time(value: &Option<SourceTime>, column: &str, user_id: &str) -> Result<String> {
    optional_time(value).ok_or_else(|| EtlError::data_shape(user_id, format!("{column} is NULL")))
}
