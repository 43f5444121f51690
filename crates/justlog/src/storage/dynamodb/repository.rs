//! DynamoDB repository implementation.
//!
//! Implements the repository traits from `justlog_core::storage` using DynamoDB.

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::get_item::builders::GetItemFluentBuilder;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;

use justlog_core::credential::{
    digest_key, generate_raw_key, plan_issue, plan_revoke, CredentialWrite, KeyDigest,
    Precondition, RawApiKey, StoredApiKey,
};
use justlog_core::entry::{Entry, EntryType};
use justlog_core::storage::{
    keys, CredentialRepository, EntryRepository, RepositoryError, Result, TimeWindow,
};

use super::conversions::{
    api_key_key, api_key_to_item, entry_to_item, item_to_entry, item_to_owner,
    item_to_stored_api_key, key, lookup_key, lookup_to_item, Item,
};
use super::error::{
    map_build_error, map_delete_item_error, map_get_item_error, map_put_item_error,
    map_query_error, map_transact_write_error,
};
use crate::config::Config;

const EXPECTED_HASH: &str = ":expected";

/// DynamoDB-based repository implementation.
///
/// Every record kind lives in one table keyed by `uid` and `sk`.
pub struct DynamoDbRepository {
    client: Client,
    table_name: String,
}

impl DynamoDbRepository {
    /// Creates a new repository with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a new repository from configuration.
    ///
    /// Uses the AWS SDK default credential chain with the configured region
    /// and optional endpoint override.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), config.table_name.clone())
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Get the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_item_request(&self, key: Item, consistent: bool) -> GetItemFluentBuilder {
        self.client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .consistent_read(consistent)
    }

    async fn get_item(&self, key: Item, consistent: bool) -> Result<Option<Item>> {
        let output = self
            .get_item_request(key, consistent)
            .send()
            .await
            .map_err(map_get_item_error)?;

        Ok(output.item)
    }

    /// Lookup records are read strongly consistent so a key stops resolving
    /// as soon as its revocation or rotation commits.
    fn lookup_request(&self, digest: &KeyDigest) -> GetItemFluentBuilder {
        self.get_item_request(lookup_key(digest), true)
    }

    async fn stored_api_key(&self, user_id: &str) -> Result<StoredApiKey> {
        let item = self.get_item(api_key_key(user_id), true).await?;
        Ok(item_to_stored_api_key(item.as_ref()))
    }

    /// Apply a credential plan as one transaction.
    async fn commit_credential_writes(
        &self,
        user_id: &str,
        writes: Vec<CredentialWrite>,
    ) -> Result<()> {
        let items = writes
            .into_iter()
            .map(|write| credential_write_to_transact_item(&self.table_name, write))
            .collect::<Result<Vec<_>>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(|e| map_transact_write_error(e, "ApiKey", user_id))?;

        Ok(())
    }
}

// ============================================================================
// Transaction items
// ============================================================================

/// Condition expression for a precondition on the API key record.
fn precondition_expression(precondition: &Precondition) -> (String, Option<AttributeValue>) {
    match precondition {
        Precondition::Absent => (
            format!("attribute_not_exists({})", keys::PARTITION_KEY),
            None,
        ),
        Precondition::Present => (format!("attribute_exists({})", keys::PARTITION_KEY), None),
        Precondition::KeyHashEquals(digest) => (
            format!("{} = {EXPECTED_HASH}", keys::KEY_HASH_ATTR),
            Some(AttributeValue::S(digest.as_str().to_string())),
        ),
    }
}

/// Translate one planned write into a transaction item.
pub(crate) fn credential_write_to_transact_item(
    table_name: &str,
    write: CredentialWrite,
) -> Result<TransactWriteItem> {
    let item = match write {
        CredentialWrite::PutApiKey {
            user_id,
            digest,
            precondition,
        } => {
            let (condition, expected) = precondition_expression(&precondition);
            let put = Put::builder()
                .table_name(table_name)
                .set_item(Some(api_key_to_item(&user_id, &digest)))
                .condition_expression(condition);
            let put = match expected {
                Some(value) => put.expression_attribute_values(EXPECTED_HASH, value),
                None => put,
            };
            TransactWriteItem::builder()
                .put(put.build().map_err(|e| map_build_error("TransactWriteItems", e))?)
                .build()
        }
        CredentialWrite::DeleteApiKey {
            user_id,
            precondition,
        } => {
            let (condition, expected) = precondition_expression(&precondition);
            let delete = Delete::builder()
                .table_name(table_name)
                .set_key(Some(api_key_key(&user_id)))
                .condition_expression(condition);
            let delete = match expected {
                Some(value) => delete.expression_attribute_values(EXPECTED_HASH, value),
                None => delete,
            };
            TransactWriteItem::builder()
                .delete(
                    delete
                        .build()
                        .map_err(|e| map_build_error("TransactWriteItems", e))?,
                )
                .build()
        }
        CredentialWrite::PutLookup { digest, user_id } => {
            let put = Put::builder()
                .table_name(table_name)
                .set_item(Some(lookup_to_item(&digest, &user_id)))
                .condition_expression(format!("attribute_not_exists({})", keys::PARTITION_KEY))
                .build()
                .map_err(|e| map_build_error("TransactWriteItems", e))?;
            TransactWriteItem::builder().put(put).build()
        }
        CredentialWrite::DeleteLookup { digest } => {
            let delete = Delete::builder()
                .table_name(table_name)
                .set_key(Some(lookup_key(&digest)))
                .build()
                .map_err(|e| map_build_error("TransactWriteItems", e))?;
            TransactWriteItem::builder().delete(delete).build()
        }
    };

    Ok(item)
}

// ============================================================================
// CredentialRepository implementation
// ============================================================================

#[async_trait]
impl CredentialRepository for DynamoDbRepository {
    async fn issue_api_key(&self, user_id: &str) -> Result<RawApiKey> {
        keys::validate_user_id(user_id)?;

        let current = self.stored_api_key(user_id).await?;
        let raw_key = generate_raw_key();
        let writes = plan_issue(user_id, &current, digest_key(raw_key.as_str()));

        self.commit_credential_writes(user_id, writes).await?;

        tracing::info!(
            user_id,
            replaced = matches!(current, StoredApiKey::Active(_)),
            "Issued API key"
        );
        Ok(raw_key)
    }

    async fn resolve_api_key(&self, raw_key: &str) -> Result<String> {
        let digest = digest_key(raw_key);

        let output = self
            .lookup_request(&digest)
            .send()
            .await
            .map_err(map_get_item_error)?;

        match output.item {
            Some(item) => item_to_owner(&item),
            None => Err(RepositoryError::NotFound {
                entity: "ApiKeyLookup",
            }),
        }
    }

    async fn revoke_api_key(&self, user_id: &str) -> Result<()> {
        keys::validate_user_id(user_id)?;

        let current = self.stored_api_key(user_id).await?;
        if current == StoredApiKey::Malformed {
            tracing::warn!(user_id, "Skipping revoke of malformed API key record");
        }

        let writes = plan_revoke(user_id, &current);
        if writes.is_empty() {
            return Ok(());
        }

        self.commit_credential_writes(user_id, writes).await?;

        tracing::info!(user_id, "Revoked API key");
        Ok(())
    }
}

// ============================================================================
// EntryRepository implementation
// ============================================================================

#[async_trait]
impl EntryRepository for DynamoDbRepository {
    async fn append_entry(&self, entry: &Entry) -> Result<()> {
        entry.validate()?;

        let sort_id = entry.sort_id();
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(entry_to_item(entry)))
            .condition_expression(format!("attribute_not_exists({})", keys::PARTITION_KEY))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, "Entry", format!("{}/{sort_id}", entry.user_id)))?;

        tracing::debug!(user_id = %entry.user_id, sort_id = %sort_id, "Appended entry");
        Ok(())
    }

    async fn get_entry(&self, user_id: &str, sort_id: &str) -> Result<Option<Entry>> {
        keys::validate_user_id(user_id)?;
        keys::validate_entry_sk(sort_id)?;

        match self
            .get_item(key(keys::entry_pk(user_id), sort_id), false)
            .await?
        {
            Some(item) => Ok(Some(item_to_entry(&item)?)),
            None => Ok(None),
        }
    }

    async fn query_entries(
        &self,
        user_id: &str,
        entry_type: EntryType,
        window: TimeWindow,
    ) -> Result<Vec<Entry>> {
        keys::validate_user_id(user_id)?;

        let (lower, upper) = window.sort_bounds(entry_type);
        let mut entries = Vec::new();
        let mut start_key: Option<Item> = None;
        let mut pages = 0usize;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression(format!(
                    "{} = :uid AND {} BETWEEN :lo AND :hi",
                    keys::PARTITION_KEY,
                    keys::SORT_KEY
                ))
                .expression_attribute_values(":uid", AttributeValue::S(keys::entry_pk(user_id)))
                .expression_attribute_values(":lo", AttributeValue::S(lower.clone()))
                .expression_attribute_values(":hi", AttributeValue::S(upper.clone()))
                .scan_index_forward(false)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(map_query_error)?;

            pages += 1;
            for item in output.items() {
                entries.push(item_to_entry(item)?);
            }

            match output.last_evaluated_key {
                Some(last) if !last.is_empty() => start_key = Some(last),
                _ => break,
            }
        }

        tracing::debug!(
            user_id,
            entry_type = %entry_type,
            count = entries.len(),
            pages,
            "Queried entries"
        );
        Ok(entries)
    }

    async fn delete_entry(&self, user_id: &str, sort_id: &str) -> Result<()> {
        keys::validate_user_id(user_id)?;
        keys::validate_entry_sk(sort_id)?;

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key(keys::entry_pk(user_id), sort_id)))
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, "Entry", format!("{user_id}/{sort_id}")))?;

        tracing::debug!(user_id, sort_id, "Deleted entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(seed: &str) -> KeyDigest {
        digest_key(seed)
    }

    fn s(value: Option<&AttributeValue>) -> &str {
        value.unwrap().as_s().unwrap()
    }

    fn offline_repository() -> DynamoDbRepository {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .build();
        DynamoDbRepository::new(Client::from_conf(config), "justlog-test")
    }

    #[tokio::test]
    async fn test_from_config_applies_overrides() {
        let config = Config {
            table_name: "justlog".to_string(),
            endpoint_url: None,
            region: "eu-west-1".to_string(),
        }
        .with_table_name("justlog-dev")
        .with_endpoint_url("http://localhost:8000");

        let repo = DynamoDbRepository::from_config(&config).await;

        assert_eq!(repo.table_name(), "justlog-dev");
        let region = repo.client().config().region().map(|r| r.to_string());
        assert_eq!(region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_lookup_read_is_strongly_consistent() {
        let repo = offline_repository();
        let digest = digest("k");

        let request = repo.lookup_request(&digest);
        let input = request.as_input();

        assert_eq!(input.get_consistent_read(), &Some(true));
        assert_eq!(input.get_table_name().as_deref(), Some("justlog-test"));
        assert_eq!(input.get_key(), &Some(lookup_key(&digest)));
    }

    #[test]
    fn test_put_api_key_guarded_by_previous_digest() {
        let old = digest("old");
        let write = CredentialWrite::PutApiKey {
            user_id: "u1".to_string(),
            digest: digest("new"),
            precondition: Precondition::KeyHashEquals(old.clone()),
        };

        let item = credential_write_to_transact_item("justlog", write).unwrap();
        let put = item.put().unwrap();

        assert_eq!(put.table_name(), "justlog");
        assert_eq!(put.condition_expression(), Some("KeyHash = :expected"));
        let values = put.expression_attribute_values().unwrap();
        assert_eq!(s(values.get(":expected")), old.as_str());
        assert_eq!(s(put.item().get("KeyHash")), digest("new").as_str());
        assert_eq!(s(put.item().get("sk")), "apikey");
    }

    #[test]
    fn test_put_api_key_on_absent_record() {
        let write = CredentialWrite::PutApiKey {
            user_id: "u1".to_string(),
            digest: digest("new"),
            precondition: Precondition::Absent,
        };

        let item = credential_write_to_transact_item("justlog", write).unwrap();
        let put = item.put().unwrap();

        assert_eq!(put.condition_expression(), Some("attribute_not_exists(uid)"));
        assert!(put.expression_attribute_values().is_none());
    }

    #[test]
    fn test_put_api_key_over_malformed_record() {
        let write = CredentialWrite::PutApiKey {
            user_id: "u1".to_string(),
            digest: digest("new"),
            precondition: Precondition::Present,
        };

        let item = credential_write_to_transact_item("justlog", write).unwrap();

        assert_eq!(
            item.put().unwrap().condition_expression(),
            Some("attribute_exists(uid)")
        );
    }

    #[test]
    fn test_lookup_put_never_overwrites() {
        let d = digest("new");
        let write = CredentialWrite::PutLookup {
            digest: d.clone(),
            user_id: "u1".to_string(),
        };

        let item = credential_write_to_transact_item("justlog", write).unwrap();
        let put = item.put().unwrap();

        assert_eq!(put.condition_expression(), Some("attribute_not_exists(uid)"));
        assert_eq!(s(put.item().get("uid")), format!("apikey#{}", d.as_str()));
        assert_eq!(s(put.item().get("UID")), "u1");
    }

    #[test]
    fn test_revoke_plan_translates_to_guarded_deletes() {
        let d = digest("current");
        let items: Vec<_> = plan_revoke("u1", &StoredApiKey::Active(d.clone()))
            .into_iter()
            .map(|w| credential_write_to_transact_item("justlog", w).unwrap())
            .collect();

        assert_eq!(items.len(), 2);
        let key_delete = items[0].delete().unwrap();
        assert_eq!(s(key_delete.key().get("uid")), "u1");
        assert_eq!(s(key_delete.key().get("sk")), "apikey");
        assert_eq!(
            key_delete.condition_expression(),
            Some("KeyHash = :expected")
        );

        let lookup_delete = items[1].delete().unwrap();
        assert_eq!(
            s(lookup_delete.key().get("sk")),
            format!("apikey#{}", d.as_str())
        );
        assert!(lookup_delete.condition_expression().is_none());
    }

    #[test]
    fn test_issue_plan_is_one_transaction() {
        let items: Vec<_> = plan_issue("u1", &StoredApiKey::Active(digest("old")), digest("new"))
            .into_iter()
            .map(|w| credential_write_to_transact_item("justlog", w).unwrap())
            .collect();

        assert_eq!(items.len(), 3);
        assert!(items[0].delete().is_some());
        assert!(items[1].put().is_some());
        assert!(items[2].put().is_some());
    }
}
