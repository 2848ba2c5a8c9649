//! Key-value store access.
//!
//! The parish table is a single DynamoDB table whose primary key is the
//! string attribute `namespace`. Items are handled here as JSON objects so
//! that the typed records in [`crate::models`] decode them with serde,
//! regardless of which [`ParishStore`] produced them.

use async_trait::async_trait;
use chrono::Weekday;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::{
    CalendarRecord, ConfessionRecord, PhoneRecord, ScheduleRecord, TalkRecord, UserRecord,
    UserRecordUpdate,
};
use crate::{Error, Result};

/// One stored item.
pub type Item = Map<String, Value>;

/// Name of the primary key attribute.
pub const KEY_ATTRIBUTE: &str = "namespace";
/// Attribute used to group scannable items.
pub const CATEGORY_ATTRIBUTE: &str = "eventCategory";
/// Attribute bumped on every user-record write.
pub const VERSION_ATTRIBUTE: &str = "recordVersion";

/// Store key conventions.
pub mod keys {
    use chrono::Weekday;

    pub const OFFICE_PHONE: &str = "info:office:phone";

    pub fn daily_mass(weekday: Weekday) -> String {
        format!("event:mass:daily:{}", weekday.num_days_from_monday())
    }

    pub fn holy_day_mass(id: u32) -> String {
        format!("event:mass:holyday:{}", id)
    }
}

/// Raw access to the parish table.
#[async_trait]
pub trait ParishStore: Send + Sync {
    /// Fetch a single item by namespace.
    async fn get(&self, namespace: &str) -> Result<Option<Item>>;

    /// Fetch every item whose `eventCategory` equals `category`.
    async fn scan(&self, category: &str) -> Result<Vec<Item>>;

    /// Set the named attributes on an item (creating it if absent) and bump
    /// its `recordVersion`. Attributes not named are left as they are.
    async fn update(&self, namespace: &str, fields: Item) -> Result<()>;
}

/// In-process store, used for tests and local runs.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, Item>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item wholesale.
    pub async fn put(&self, namespace: &str, item: Value) {
        let mut item = match item {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        item.insert(KEY_ATTRIBUTE.to_string(), Value::String(namespace.to_string()));
        self.items.write().await.insert(namespace.to_string(), item);
    }

    /// Make every subsequent call fail, as if the table were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Store("memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ParishStore for MemoryStore {
    async fn get(&self, namespace: &str) -> Result<Option<Item>> {
        self.check_available()?;
        Ok(self.items.read().await.get(namespace).cloned())
    }

    async fn scan(&self, category: &str) -> Result<Vec<Item>> {
        self.check_available()?;
        let items = self.items.read().await;
        let mut found: Vec<Item> = items
            .values()
            .filter(|item| item.get(CATEGORY_ATTRIBUTE).and_then(Value::as_str) == Some(category))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            let key = |item: &Item| item.get(KEY_ATTRIBUTE).and_then(Value::as_str).map(String::from);
            key(a).cmp(&key(b))
        });
        Ok(found)
    }

    async fn update(&self, namespace: &str, fields: Item) -> Result<()> {
        self.check_available()?;
        let mut items = self.items.write().await;
        let item = items.entry(namespace.to_string()).or_insert_with(|| {
            let mut item = Map::new();
            item.insert(KEY_ATTRIBUTE.to_string(), Value::String(namespace.to_string()));
            item
        });
        let version = item.get(VERSION_ATTRIBUTE).and_then(Value::as_u64).unwrap_or(0);
        item.extend(fields);
        item.insert(VERSION_ATTRIBUTE.to_string(), Value::from(version + 1));
        Ok(())
    }
}

/// Typed access to parish data.
///
/// Read failures are logged and reported as "nothing found" so that a store
/// outage degrades the answer instead of failing the request.
#[derive(Clone)]
pub struct ParishData {
    store: Arc<dyn ParishStore>,
}

impl ParishData {
    pub fn new(store: Arc<dyn ParishStore>) -> Self {
        Self { store }
    }

    async fn record<T: DeserializeOwned>(&self, namespace: &str) -> Option<T> {
        let item = match self.store.get(namespace).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                info!(namespace, "No item found");
                return None;
            }
            Err(e) => {
                warn!(namespace, error = %e, "Store read failed, treating as missing");
                return None;
            }
        };

        match serde_json::from_value(Value::Object(item)) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(namespace, error = %e, "Malformed item, treating as missing");
                None
            }
        }
    }

    async fn records<T: DeserializeOwned>(&self, category: &str) -> Vec<T> {
        let items = match self.store.scan(category).await {
            Ok(items) => items,
            Err(e) => {
                warn!(category, error = %e, "Store scan failed, treating as empty");
                return Vec::new();
            }
        };

        items
            .into_iter()
            .filter_map(|item| {
                let namespace = item
                    .get(KEY_ATTRIBUTE)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                match serde_json::from_value(Value::Object(item)) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(category, namespace = %namespace, error = %e, "Skipping malformed item");
                        None
                    }
                }
            })
            .collect()
    }

    pub async fn daily_schedule(&self, weekday: Weekday) -> Option<ScheduleRecord> {
        self.record(&keys::daily_mass(weekday)).await
    }

    pub async fn holy_day_schedule(&self, id: u32) -> Option<ScheduleRecord> {
        self.record(&keys::holy_day_mass(id)).await
    }

    pub async fn office_phone(&self) -> Option<String> {
        self.record::<PhoneRecord>(keys::OFFICE_PHONE)
            .await
            .map(|record| record.phone_number)
    }

    pub async fn confessions(&self) -> Vec<ConfessionRecord> {
        self.records("confession").await
    }

    pub async fn calendar_events(&self) -> Vec<CalendarRecord> {
        self.records("calendar").await
    }

    pub async fn talks(&self) -> Vec<TalkRecord> {
        self.records("talk").await
    }

    /// The listener's record; a new listener gets an empty one.
    pub async fn user(&self, user_id: &str) -> UserRecord {
        self.record(user_id).await.unwrap_or_default()
    }

    /// Write the named fields of a listener's record.
    pub async fn save_user(&self, user_id: &str, update: &UserRecordUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let fields = update.fields();
        let names: Vec<String> = fields.keys().cloned().collect();
        info!(fields = ?names, "Writing user record");
        self.store.update(user_id, fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data_with(store: &Arc<MemoryStore>) -> ParishData {
        ParishData::new(store.clone())
    }

    #[tokio::test]
    async fn test_missing_user_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let user = data_with(&store).user("amzn1.ask.account.NEW").await;
        assert_eq!(user, UserRecord::default());
    }

    #[tokio::test]
    async fn test_user_update_preserves_other_fields() {
        let store = Arc::new(MemoryStore::new());
        let data = data_with(&store);
        data.save_user("u1", &UserRecordUpdate::track("tok", "https://x/y.mp3"))
            .await
            .unwrap();
        data.save_user("u1", &UserRecordUpdate::offset(9000)).await.unwrap();

        let user = data.user("u1").await;
        assert_eq!(user.last_token, "tok");
        assert_eq!(user.last_track, "https://x/y.mp3");
        assert_eq!(user.offset_in_milliseconds, 9000);
        assert_eq!(user.record_version, 2);
    }

    #[tokio::test]
    async fn test_outage_degrades_to_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.put(keys::OFFICE_PHONE, json!({"phoneNumber": "9495551234"})).await;
        store.set_unavailable(true);

        let data = data_with(&store);
        assert_eq!(data.office_phone().await, None);
        assert!(data.confessions().await.is_empty());
        assert!(data.save_user("u1", &UserRecordUpdate::offset(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_scan_skips_malformed_items() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                "event:confession:5",
                json!({"eventCategory": "confession", "dayEnum": 5, "dayName": "Saturday", "eventTimes": ["15,30"]}),
            )
            .await;
        store
            .put("event:confession:bad", json!({"eventCategory": "confession"}))
            .await;

        let confessions = data_with(&store).confessions().await;
        assert_eq!(confessions.len(), 1);
        assert_eq!(confessions[0].day_name, "Saturday");
    }

    #[test]
    fn test_key_conventions() {
        assert_eq!(keys::daily_mass(Weekday::Wed), "event:mass:daily:2");
        assert_eq!(keys::holy_day_mass(110), "event:mass:holyday:110");
    }
}
