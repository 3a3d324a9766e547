use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical roles of the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleType {
    Admin,
    ProductOwner,
    Client,
    Devops,
}

impl RoleType {
    pub const ALL: [RoleType; 4] = [
        RoleType::Admin,
        RoleType::ProductOwner,
        RoleType::Client,
        RoleType::Devops,
    ];

    pub fn id(&self) -> i64 {
        match self {
            RoleType::Admin => 1,
            RoleType::ProductOwner => 2,
            RoleType::Client => 3,
            RoleType::Devops => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Admin => "ADMIN",
            RoleType::ProductOwner => "PRODUCT_OWNER",
            RoleType::Client => "CLIENT",
            RoleType::Devops => "DEVOPS",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RoleType::Admin => "Administrator with full system access",
            RoleType::ProductOwner => "Product owner with management capabilities",
            RoleType::Client => "Regular client user",
            RoleType::Devops => "DevOps engineer with infrastructure access",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }

    pub fn to_role(self) -> Role {
        Role {
            role_id: self.id(),
            role_name: self.as_str().to_string(),
            role_description: self.description().to_string(),
        }
    }
}

/// Role embedded in every user item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: i64,
    pub role_name: String,
    pub role_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseStats {
    pub total_count: u64,
    pub total_spent: String, // decimal string, e.g. "0.00"
}

impl Default for PurchaseStats {
    fn default() -> Self {
        Self {
            total_count: 0,
            total_spent: "0.00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorites {
    pub service_ids: Vec<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email: bool,
    pub sms: bool,
    pub push: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            sms: false,
            push: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub language: String,
    pub currency: String,
    pub notifications: NotificationPreferences,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "es".to_string(),
            currency: "CLP".to_string(),
            notifications: NotificationPreferences::default(),
        }
    }
}

/// DynamoDB user item, keyed by `userId`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserItem {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub profile_img: String,
    pub password: String,

    pub role: Role,
    pub role_name: String, // RoleActiveIndex partition key

    pub is_active: bool,
    pub is_verified: bool,
    pub is_active_user_id: String, // RoleActiveIndex sort key

    pub created_at: String, // ISO 8601
    pub updated_at: String, // ISO 8601
    pub member_since: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_verification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expiration: Option<String>,

    pub level: u32,
    pub points: u64,
    pub purchases: PurchaseStats,
    pub reviews: ReviewStats,
    pub favorites: Favorites,
    pub preferences: Preferences,
    pub metadata: BTreeMap<String, String>,
}

impl UserItem {
    pub fn partition_key(&self) -> &str {
        &self.user_id
    }

    /// Composite sort key for the role/active secondary index
    pub fn active_sort_key(is_active: impl std::fmt::Display, user_id: &str) -> String {
        format!("{}#{}", is_active, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_table() {
        assert_eq!(RoleType::from_id(1), Some(RoleType::Admin));
        assert_eq!(RoleType::from_id(4), Some(RoleType::Devops));
        assert_eq!(RoleType::from_id(9), None);

        let client = RoleType::Client.to_role();
        assert_eq!(client.role_id, 3);
        assert_eq!(client.role_name, "CLIENT");
        assert_eq!(client.role_description, "Regular client user");
    }

    #[test]
    fn test_role_serializes_camel_case() {
        let value = serde_json::to_value(RoleType::Admin.to_role()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "roleId": 1,
                "roleName": "ADMIN",
                "roleDescription": "Administrator with full system access"
            })
        );
    }

    #[test]
    fn test_enrichment_defaults() {
        let preferences = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(
            preferences,
            serde_json::json!({
                "language": "es",
                "currency": "CLP",
                "notifications": {"email": true, "sms": false, "push": true}
            })
        );
        assert_eq!(
            serde_json::to_value(PurchaseStats::default()).unwrap(),
            serde_json::json!({"totalCount": 0, "totalSpent": "0.00"})
        );
        assert_eq!(
            serde_json::to_value(Favorites::default()).unwrap(),
            serde_json::json!({"serviceIds": [], "count": 0})
        );
    }

    #[test]
    fn test_active_sort_key() {
        assert_eq!(UserItem::active_sort_key("True", "42"), "True#42");
        assert_eq!(UserItem::active_sort_key(0, "7"), "0#7");
    }
}
