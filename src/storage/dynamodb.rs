use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::{Map, Value};

use crate::error::{EtlError, Result};
use crate::storage::models::UserItem;
use crate::storage::writer::ItemWriter;
use crate::utils::Config;

/// DynamoDB item as sent to `PutItem`
pub type Item = HashMap<String, AttributeValue>;

/// DynamoDB Storage Layer
pub struct DynamoDBStore {
    client: Client,
    table_name: String,
}

impl DynamoDBStore {
    /// Create a client for `table_name`, honoring the local endpoint override
    pub async fn new(config: &Config, table_name: String) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));

        if let Some(endpoint) = &config.dynamodb_endpoint {
            tracing::info!(endpoint = %endpoint, "Using local DynamoDB endpoint");
            loader = loader
                .endpoint_url(endpoint)
                .credentials_provider(Credentials::new(
                    "fakeAccessKey",
                    "fakeSecretKey",
                    None,
                    None,
                    "local-endpoint",
                ));
        } else {
            tracing::info!(region = %config.aws_region, "Using AWS DynamoDB");
        }

        let sdk_config = loader.load().await;
        let client = Client::new(&sdk_config);

        Self { client, table_name }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Fail unless the target table exists
    pub async fn ensure_table(&self) -> Result<()> {
        match self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                let resource_missing = err
                    .as_service_error()
                    .is_some_and(|service| service.is_resource_not_found_exception());

                if resource_missing {
                    Err(EtlError::TableNotFound(self.table_name.clone()))
                } else {
                    Err(EtlError::DestinationCheck {
                        table: self.table_name.clone(),
                        reason: DisplayErrorContext(&err).to_string(),
                    })
                }
            }
        }
    }
}

#[async_trait]
impl ItemWriter for DynamoDBStore {
    async fn put_item(&self, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| EtlError::Store(DisplayErrorContext(&err).to_string()))?;

        Ok(())
    }
}

/// Convert a JSON value to its DynamoDB attribute
pub fn json_to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(flag) => AttributeValue::Bool(flag),
        Value::Number(number) => AttributeValue::N(number.to_string()),
        Value::String(text) => AttributeValue::S(text),
        Value::Array(values) => {
            AttributeValue::L(values.into_iter().map(json_to_attribute).collect())
        }
        Value::Object(fields) => AttributeValue::M(item_from_json(fields)),
    }
}

/// Convert a JSON object to a DynamoDB item
pub fn item_from_json(fields: Map<String, Value>) -> Item {
    fields
        .into_iter()
        .map(|(key, value)| (key, json_to_attribute(value)))
        .collect()
}

impl UserItem {
    pub fn to_item(&self) -> Result<Item> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(item_from_json(fields)),
            _ => Err(EtlError::data_shape(
                self.user_id.clone(),
                "user item did not serialize to an object",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(json_to_attribute(json!(null)), AttributeValue::Null(true));
        assert_eq!(json_to_attribute(json!(true)), AttributeValue::Bool(true));
        assert_eq!(json_to_attribute(json!(1)), AttributeValue::N("1".to_string()));
        assert_eq!(json_to_attribute(json!(2.5)), AttributeValue::N("2.5".to_string()));
        assert_eq!(
            json_to_attribute(json!("0.00")),
            AttributeValue::S("0.00".to_string())
        );
    }

    #[test]
    fn test_empty_collections_stay_typed() {
        assert_eq!(json_to_attribute(json!([])), AttributeValue::L(vec![]));
        assert_eq!(json_to_attribute(json!({})), AttributeValue::M(HashMap::new()));
    }

    #[test]
    fn test_nested_document() {
        let item = item_from_json(
            json!({
                "userId": "42",
                "favorites": {"serviceIds": ["svc-1"], "count": 1}
            })
            .as_object()
            .cloned()
            .unwrap(),
        );

        assert_eq!(item["userId"], AttributeValue::S("42".to_string()));
        let favorites = item["favorites"].as_m().unwrap();
        assert_eq!(favorites["count"], AttributeValue::N("1".to_string()));
        assert_eq!(
            favorites["serviceIds"],
            AttributeValue::L(vec![AttributeValue::S("svc-1".to_string())])
        );
    }
}
