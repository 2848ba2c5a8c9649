//! DynamoDB-backed [`ParishStore`].

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;
use tracing::debug;

use crate::store::{Item, ParishStore, CATEGORY_ATTRIBUTE, KEY_ATTRIBUTE, VERSION_ATTRIBUTE};
use crate::{Config, Error, Result};

/// Store backed by the parish DynamoDB table.
pub struct DynamoStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Build a store from the ambient AWS configuration.
    pub async fn from_config(config: &Config) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()))
            .load()
            .await;
        Self::new(DynamoClient::new(&sdk_config), config.table_name.clone())
    }
}

#[async_trait]
impl ParishStore for DynamoStore {
    async fn get(&self, namespace: &str) -> Result<Option<Item>> {
        debug!(table = %self.table_name, namespace, "get_item");

        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(namespace.to_string()))
            .send()
            .await
            .map_err(|e| Error::Store(format!("get_item for {} failed: {}", namespace, e)))?;

        output.item.map(item_to_json).transpose()
    }

    async fn scan(&self, category: &str) -> Result<Vec<Item>> {
        debug!(table = %self.table_name, category, "scan");

        let pages: std::result::Result<Vec<_>, _> = self
            .client
            .scan()
            .table_name(&self.table_name)
            .filter_expression("#category = :category")
            .expression_attribute_names("#category", CATEGORY_ATTRIBUTE)
            .expression_attribute_values(":category", AttributeValue::S(category.to_string()))
            .into_paginator()
            .items()
            .send()
            .collect()
            .await;

        let items = pages.map_err(|e| Error::Store(format!("scan for {} failed: {}", category, e)))?;
        items.into_iter().map(item_to_json).collect()
    }

    async fn update(&self, namespace: &str, fields: Item) -> Result<()> {
        debug!(table = %self.table_name, namespace, fields = fields.len(), "update_item");

        let mut names = HashMap::new();
        let mut values = HashMap::new();
        let mut assignments = Vec::with_capacity(fields.len());

        for (i, (name, value)) in fields.iter().enumerate() {
            names.insert(format!("#f{}", i), name.clone());
            values.insert(format!(":v{}", i), json_to_attribute(value)?);
            assignments.push(format!("#f{i} = :v{i}"));
        }
        names.insert("#version".to_string(), VERSION_ATTRIBUTE.to_string());
        values.insert(":one".to_string(), AttributeValue::N("1".to_string()));

        let mut expression = String::new();
        if !assignments.is_empty() {
            expression.push_str("SET ");
            expression.push_str(&assignments.join(", "));
            expression.push(' ');
        }
        expression.push_str("ADD #version :one");

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(namespace.to_string()))
            .update_expression(expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(|e| Error::Store(format!("update_item for {} failed: {}", namespace, e)))?;

        Ok(())
    }
}

fn item_to_json(item: HashMap<String, AttributeValue>) -> Result<Item> {
    serde_dynamo::from_item(item).map_err(|e| Error::Store(format!("unreadable item: {}", e)))
}

fn json_to_attribute(value: &serde_json::Value) -> Result<AttributeValue> {
    serde_dynamo::to_attribute_value(value).map_err(|e| Error::Store(format!("unwritable value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleRecord;
    use aws_sdk_dynamodb::primitives::Blob;
    use serde_json::{json, Value};

    fn item(attributes: Vec<(&str, AttributeValue)>) -> HashMap<String, AttributeValue> {
        attributes
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    #[test]
    fn test_schedule_item_decodes() {
        let item = item(vec![
            ("namespace", AttributeValue::S("event:mass:daily:6".to_string())),
            (
                "eventTimes",
                AttributeValue::L(vec![
                    AttributeValue::S("7,30".to_string()),
                    AttributeValue::S("12,0,spanish".to_string()),
                ]),
            ),
            ("eventYear", AttributeValue::N("2026".to_string())),
        ]);

        let json = item_to_json(item).unwrap();
        let record: ScheduleRecord = serde_json::from_value(Value::Object(json)).unwrap();
        assert_eq!(record.event_times, vec!["7,30", "12,0,spanish"]);
        assert_eq!(record.event_year, Some(2026));
    }

    #[test]
    fn test_string_sets_become_arrays() {
        let json = item_to_json(item(vec![("eventTimes", AttributeValue::Ss(vec!["9,0".to_string()]))])).unwrap();
        assert_eq!(json["eventTimes"], json!(["9,0"]));
    }

    #[test]
    fn test_numbers() {
        let json = item_to_json(item(vec![
            ("offsetInMilliseconds", AttributeValue::N("42".to_string())),
            ("ratio", AttributeValue::N("1.5".to_string())),
        ]))
        .unwrap();
        assert_eq!(json["offsetInMilliseconds"], json!(42));
        assert_eq!(json["ratio"], json!(1.5));
        assert!(matches!(json_to_attribute(&json!(12)).unwrap(), AttributeValue::N(ref n) if n == "12"));
    }

    #[test]
    fn test_binary_attribute_is_an_error() {
        let result = item_to_json(item(vec![("blob", AttributeValue::B(Blob::new(vec![1, 2, 3])))]));
        assert!(matches!(result, Err(Error::Store(_))));
    }

    #[test]
    fn test_update_values_encode() {
        assert!(matches!(json_to_attribute(&json!("tok")).unwrap(), AttributeValue::S(ref s) if s == "tok"));
        assert!(matches!(json_to_attribute(&Value::Null).unwrap(), AttributeValue::Null(true)));
        match json_to_attribute(&json!(["a", 1])).unwrap() {
            AttributeValue::L(list) => assert_eq!(list.len(), 2),
            other => panic!("unexpected attribute {:?}", other),
        }
    }
}
