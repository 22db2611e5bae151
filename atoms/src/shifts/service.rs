use super::model::{CreateShiftPayload, Shift};
use crate::catalog::{task_from_id, Client};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fmt;
use tokio::time::{sleep, Duration};

/// Records deleted per bulk-delete batch
pub const DELETE_BATCH_SIZE: usize = 500;

/// DynamoDB caps BatchWriteItem at 25 requests
const DYNAMO_WRITE_CHUNK: usize = 25;
const UNPROCESSED_ATTEMPTS: u32 = 5;
const RETRY_BACKOFF_MS: u64 = 100;

const SHIFT_PK: &str = "SHIFT";
const SHIFT_SK_PREFIX: &str = "SHIFT#";

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    NotFound(String),
    InvalidShift(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Shift {} not found", id),
            StoreError::InvalidShift(msg) => write!(f, "Invalid shift: {}", msg),
            StoreError::Backend(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistence for shift records. Implementations only move data;
/// validation and batching live in the free functions below.
#[async_trait]
pub trait ShiftStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Shift>, StoreError>;

    async fn create(&self, shift: Shift) -> Result<(), StoreError>;

    /// Overwrite `notes` only. Unknown ids are `StoreError::NotFound`.
    async fn update_notes(&self, shift_id: &str, notes: &str) -> Result<(), StoreError>;

    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;

    async fn delete_batch(&self, shift_ids: &[String]) -> Result<(), StoreError>;
}

/// All shifts, or an empty list when the store can't be read
pub async fn list_shifts(store: &dyn ShiftStore) -> Vec<Shift> {
    match store.list().await {
        Ok(shifts) => shifts,
        Err(e) => {
            tracing::error!("Error fetching shifts: {}", e);
            Vec::new()
        }
    }
}

/// Validate and persist a finished shift under a fresh id
pub async fn create_shift(
    store: &dyn ShiftStore,
    payload: CreateShiftPayload,
) -> Result<Shift, StoreError> {
    payload.validate().map_err(StoreError::InvalidShift)?;

    let shift = payload.into_shift(uuid::Uuid::new_v4().to_string());
    store.create(shift.clone()).await.map_err(|e| {
        tracing::error!("Error adding shift: {}", e);
        e
    })?;

    tracing::info!(shift_id = %shift.id, client = %shift.client.name, "shift recorded");
    Ok(shift)
}

pub async fn update_shift_notes(
    store: &dyn ShiftStore,
    shift_id: &str,
    notes: &str,
) -> Result<(), StoreError> {
    store.update_notes(shift_id, notes).await.map_err(|e| {
        tracing::error!("Error updating notes for {}: {}", shift_id, e);
        e
    })
}

/// Delete every shift, DELETE_BATCH_SIZE at a time. Stops at the first failed batch.
pub async fn delete_all_shifts(store: &dyn ShiftStore) -> Result<usize, StoreError> {
    let ids = store.list_ids().await?;
    let mut deleted = 0;

    for batch in ids.chunks(DELETE_BATCH_SIZE) {
        store.delete_batch(batch).await.map_err(|e| {
            tracing::error!(deleted, "Bulk delete failed after partial progress: {}", e);
            e
        })?;
        deleted += batch.len();
    }

    tracing::info!(deleted, "all shifts cleared");
    Ok(deleted)
}

type Item = HashMap<String, AttributeValue>;

/// One BatchWriteItem round trip. Returns whatever DynamoDB left unprocessed.
#[async_trait]
trait BatchWriter: Send + Sync {
    async fn write(&self, reqs: Vec<WriteRequest>) -> Result<Vec<WriteRequest>, StoreError>;
}

/// One Query page: the items plus the key to resume from, if any
#[async_trait]
trait PageSource: Send + Sync {
    async fn page(&self, start_key: Option<Item>) -> Result<(Vec<Item>, Option<Item>), StoreError>;
}

/// Follow pages until the source stops handing out a resume key
async fn collect_pages(source: &dyn PageSource) -> Result<Vec<Item>, StoreError> {
    let mut items = Vec::new();
    let mut start_key = None;

    loop {
        let (page, next) = source.page(start_key.take()).await?;
        items.extend(page);

        match next {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => break,
        }
    }

    Ok(items)
}

/// Send `reqs` DYNAMO_WRITE_CHUNK at a time, re-sending unprocessed
/// leftovers with a growing pause until each chunk drains.
async fn write_in_chunks(
    writer: &dyn BatchWriter,
    reqs: Vec<WriteRequest>,
    backoff: Duration,
) -> Result<(), StoreError> {
    for chunk in reqs.chunks(DYNAMO_WRITE_CHUNK) {
        let mut pending = chunk.to_vec();
        let mut attempts = 0;

        loop {
            attempts += 1;
            pending = writer.write(pending).await?;
            if pending.is_empty() {
                break;
            }
            if attempts >= UNPROCESSED_ATTEMPTS {
                return Err(StoreError::Backend(format!(
                    "DynamoDB left {} deletes unprocessed",
                    pending.len()
                )));
            }
            tracing::warn!(attempts, unprocessed = pending.len(), "Retrying unprocessed deletes");
            sleep(backoff * attempts).await;
        }
    }

    Ok(())
}

fn shift_key(shift_id: &str) -> Item {
    let mut key = HashMap::new();
    key.insert("PK".to_string(), AttributeValue::S(SHIFT_PK.to_string()));
    key.insert(
        "SK".to_string(),
        AttributeValue::S(format!("{}{}", SHIFT_SK_PREFIX, shift_id)),
    );
    key
}

fn delete_requests(shift_ids: &[String]) -> Result<Vec<WriteRequest>, StoreError> {
    shift_ids
        .iter()
        .map(|id| {
            DeleteRequest::builder()
                .set_key(Some(shift_key(id)))
                .build()
                .map(|del| WriteRequest::builder().delete_request(del).build())
                .map_err(|e| StoreError::Backend(format!("Invalid delete request: {}", e)))
        })
        .collect()
}

/// Shifts stored in the app table:
/// PK = "SHIFT"
/// SK = "SHIFT#{shift_id}"
pub struct DynamoShiftStore {
    client: DynamoClient,
    table_name: String,
    retry_backoff: Duration,
}

impl DynamoShiftStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            retry_backoff: Duration::from_millis(RETRY_BACKOFF_MS),
        }
    }

    /// Query the whole shift partition, following LastEvaluatedKey
    async fn query_all(&self) -> Result<Vec<Item>, StoreError> {
        collect_pages(self).await
    }
}

#[async_trait]
impl PageSource for DynamoShiftStore {
    async fn page(&self, start_key: Option<Item>) -> Result<(Vec<Item>, Option<Item>), StoreError> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(SHIFT_PK.to_string()))
            .expression_attribute_values(
                ":sk_prefix",
                AttributeValue::S(SHIFT_SK_PREFIX.to_string()),
            )
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB query error: {}", e)))?;

        Ok((result.items().to_vec(), result.last_evaluated_key().cloned()))
    }
}

#[async_trait]
impl BatchWriter for DynamoShiftStore {
    async fn write(&self, reqs: Vec<WriteRequest>) -> Result<Vec<WriteRequest>, StoreError> {
        let result = self
            .client
            .batch_write_item()
            .request_items(&self.table_name, reqs)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB batch_write_item error: {}", e)))?;

        Ok(result
            .unprocessed_items()
            .and_then(|m| m.get(&self.table_name))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ShiftStore for DynamoShiftStore {
    async fn list(&self) -> Result<Vec<Shift>, StoreError> {
        let items = self.query_all().await?;
        Ok(items.iter().filter_map(shift_from_item).collect())
    }

    async fn create(&self, shift: Shift) -> Result<(), StoreError> {
        let mut builder = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", AttributeValue::S(SHIFT_PK.to_string()))
            .item("SK", AttributeValue::S(format!("{}{}", SHIFT_SK_PREFIX, shift.id)))
            .item("client_id", AttributeValue::S(shift.client.id.clone()))
            .item("client_name", AttributeValue::S(shift.client.name.clone()))
            .item("start_time", AttributeValue::S(timestamp(&shift.start_time)))
            .item("end_time", AttributeValue::S(timestamp(&shift.end_time)))
            .item(
                "completed_task_ids",
                task_ids_value(shift.completed_tasks.iter().map(|t| t.id)),
            )
            .item(
                "incomplete_task_ids",
                task_ids_value(shift.incomplete_tasks.iter().map(|t| t.id)),
            )
            .item("notes", AttributeValue::S(shift.notes.clone()))
            .condition_expression("attribute_not_exists(SK)");

        if let Some(name) = &shift.caregiver_name {
            builder = builder.item("caregiver_name", AttributeValue::S(name.clone()));
        }

        builder
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB put_item error: {}", e)))?;

        Ok(())
    }

    async fn update_notes(&self, shift_id: &str, notes: &str) -> Result<(), StoreError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(shift_key(shift_id)))
            .update_expression("SET #notes = :notes")
            .condition_expression("attribute_exists(SK)")
            .expression_attribute_names("#notes", "notes")
            .expression_attribute_values(":notes", AttributeValue::S(notes.to_string()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false);
                if missing {
                    Err(StoreError::NotFound(shift_id.to_string()))
                } else {
                    Err(StoreError::Backend(format!("DynamoDB update_item error: {}", e)))
                }
            }
        }
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let items = self.query_all().await?;
        Ok(items
            .iter()
            .filter_map(|item| item.get("SK").and_then(|v| v.as_s().ok()))
            .filter_map(|sk| sk.strip_prefix(SHIFT_SK_PREFIX))
            .map(|id| id.to_string())
            .collect())
    }

    async fn delete_batch(&self, shift_ids: &[String]) -> Result<(), StoreError> {
        write_in_chunks(self, delete_requests(shift_ids)?, self.retry_backoff).await
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn task_ids_value(ids: impl Iterator<Item = u32>) -> AttributeValue {
    AttributeValue::L(ids.map(|id| AttributeValue::N(id.to_string())).collect())
}

fn string_attr(item: &Item, key: &str) -> Option<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

fn time_attr(item: &Item, key: &str) -> Option<DateTime<Utc>> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn task_ids_attr(item: &Item, key: &str) -> Vec<u32> {
    item.get(key)
        .and_then(|v| v.as_l().ok())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_n().ok())
                .filter_map(|n| n.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Map a stored item back to a Shift. Items without a parsable time window are skipped.
fn shift_from_item(item: &Item) -> Option<Shift> {
    let id = string_attr(item, "SK")?
        .strip_prefix(SHIFT_SK_PREFIX)?
        .to_string();

    let (start_time, end_time) = match (time_attr(item, "start_time"), time_attr(item, "end_time")) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            tracing::warn!("Skipping shift {} with unreadable timestamps", id);
            return None;
        }
    };

    Some(Shift {
        id,
        client: Client {
            id: string_attr(item, "client_id").unwrap_or_default(),
            name: string_attr(item, "client_name").unwrap_or_default(),
        },
        caregiver_name: string_attr(item, "caregiver_name"),
        start_time,
        end_time,
        completed_tasks: task_ids_attr(item, "completed_task_ids")
            .into_iter()
            .map(|id| task_from_id(id, true))
            .collect(),
        incomplete_tasks: task_ids_attr(item, "incomplete_task_ids")
            .into_iter()
            .map(|id| task_from_id(id, false))
            .collect(),
        notes: string_attr(item, "notes").unwrap_or_default(),
    })
}
