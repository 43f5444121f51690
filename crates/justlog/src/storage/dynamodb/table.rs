//! Table provisioning.

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
};
use justlog_core::storage::{keys, RepositoryError, Result};

use super::error::{map_build_error, map_create_table_error};
use super::DynamoDbRepository;

const MAX_ATTEMPTS: usize = 60;
const POLL_DELAY: Duration = Duration::from_secs(2);

impl DynamoDbRepository {
    /// Create the table with a string `uid` hash key and string `sk` range
    /// key, then wait for it to become active.
    pub async fn create_table(&self) -> Result<()> {
        let key_schema = vec![
            KeySchemaElement::builder()
                .attribute_name(keys::PARTITION_KEY)
                .key_type(KeyType::Hash)
                .build()
                .map_err(|e| map_build_error("CreateTable", e))?,
            KeySchemaElement::builder()
                .attribute_name(keys::SORT_KEY)
                .key_type(KeyType::Range)
                .build()
                .map_err(|e| map_build_error("CreateTable", e))?,
        ];

        let attribute_definitions = vec![
            AttributeDefinition::builder()
                .attribute_name(keys::PARTITION_KEY)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|e| map_build_error("CreateTable", e))?,
            AttributeDefinition::builder()
                .attribute_name(keys::SORT_KEY)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|e| map_build_error("CreateTable", e))?,
        ];

        self.client()
            .create_table()
            .table_name(self.table_name())
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| map_create_table_error(e, self.table_name()))?;

        tracing::info!(table = self.table_name(), "Created table");
        self.wait_for_table_active().await
    }

    async fn wait_for_table_active(&self) -> Result<()> {
        for _ in 0..MAX_ATTEMPTS {
            let status = self
                .client()
                .describe_table()
                .table_name(self.table_name())
                .send()
                .await
                .ok()
                .and_then(|output| output.table)
                .and_then(|table| table.table_status);

            if status == Some(TableStatus::Active) {
                return Ok(());
            }
            tracing::debug!(table = self.table_name(), ?status, "Waiting for table");
            tokio::time::sleep(POLL_DELAY).await;
        }

        Err(RepositoryError::unavailable(
            "CreateTable",
            "timed out waiting for table to become active",
        ))
    }
}
