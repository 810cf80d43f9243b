//! Post store interface for dynamic blocks
//!
//! Dynamic block variants (e.g. Section Process fed by "Process Step" posts)
//! pull an ordered list of records from the host's content store. The store
//! is an external collaborator; this module defines the query contract and an
//! in-memory implementation used by tests and embedders.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::attribute::AttributeValue;

/// Post type slug of process steps
pub const PROCESS_STEP_POST_TYPE: &str = "process_step";
/// Numeric ordering meta of process steps
pub const PROCESS_STEP_ORDER_META: &str = "_process_step_order";
/// Free-text duration meta of process steps ("2 weeks")
pub const PROCESS_STEP_DURATION_META: &str = "_process_step_duration";
/// Icon class meta of process steps
pub const PROCESS_STEP_ICON_META: &str = "_process_step_icon";

/// A content record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Store-assigned id; increases with insertion
    pub id: u64,
    pub post_type: String,
    pub title: String,
    /// Excerpt, possibly containing markup
    pub excerpt: String,
    pub menu_order: i64,
    pub date: DateTime<Utc>,
    /// Featured image media id
    pub featured_media: Option<u64>,
    /// Alt text of the featured image
    pub featured_media_alt: Option<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, AttributeValue>,
}

impl PostRecord {
    /// Numeric meta value, `None` when absent or not numeric
    pub fn meta_number(&self, key: &str) -> Option<f64> {
        match self.meta.get(key)? {
            AttributeValue::String(s) => s.trim().parse().ok(),
            other => other.as_number(),
        }
    }

    /// String meta value, empty when absent
    pub fn meta_str(&self, key: &str) -> &str {
        self.meta.get(key).and_then(AttributeValue::as_str).unwrap_or("")
    }
}

/// Process-step specific view of a post record
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessStepMeta {
    /// Display order, lower first
    pub order: Option<u32>,
    /// Estimated duration
    pub duration: Option<String>,
    /// Icon CSS class
    pub icon: Option<String>,
}

impl ProcessStepMeta {
    /// Read the process-step meta of a record
    pub fn from_record(record: &PostRecord) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            order: record
                .meta_number(PROCESS_STEP_ORDER_META)
                .filter(|n| *n >= 0.0)
                .map(|n| n as u32),
            duration: non_empty(record.meta_str(PROCESS_STEP_DURATION_META)),
            icon: non_empty(record.meta_str(PROCESS_STEP_ICON_META)),
        }
    }
}

/// Sort key of a post query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    /// Manual ordering (`menu_order`)
    MenuOrder,
    /// Publication date
    Date,
    /// Title, case-insensitive
    Title,
    /// Numeric meta field
    MetaNumber(String),
}

impl OrderBy {
    /// Parse the block attribute form (`"menu_order"`, `"date"`, `"title"`)
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "menu_order" => Some(OrderBy::MenuOrder),
            "date" => Some(OrderBy::Date),
            "title" => Some(OrderBy::Title),
            _ => value
                .strip_prefix("meta_value_num:")
                .map(|key| OrderBy::MetaNumber(key.to_string())),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    /// Parse `"ASC"` / `"DESC"` (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "ASC" => Some(Order::Asc),
            "DESC" => Some(Order::Desc),
            _ => None,
        }
    }
}

/// Query against the post store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostQuery {
    pub post_type: String,
    /// Maximum number of records
    pub per_page: usize,
    pub order_by: OrderBy,
    pub order: Order,
}

impl PostQuery {
    /// Query process steps in their configured order
    pub fn process_steps(per_page: usize) -> Self {
        Self {
            post_type: PROCESS_STEP_POST_TYPE.into(),
            per_page,
            order_by: OrderBy::MetaNumber(PROCESS_STEP_ORDER_META.into()),
            order: Order::Asc,
        }
    }

    /// Compare two records under this query's ordering
    ///
    /// Ties are broken by ascending record id regardless of direction.
    pub fn compare(&self, a: &PostRecord, b: &PostRecord) -> Ordering {
        let primary = match &self.order_by {
            OrderBy::MenuOrder => a.menu_order.cmp(&b.menu_order),
            OrderBy::Date => a.date.cmp(&b.date),
            OrderBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            OrderBy::MetaNumber(key) => {
                // Records without the meta sort after every numbered record.
                let a = a.meta_number(key).unwrap_or(f64::INFINITY);
                let b = b.meta_number(key).unwrap_or(f64::INFINITY);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
        };
        let primary = match self.order {
            Order::Asc => primary,
            Order::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Post store errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The query was rejected
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Document/post store interface
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Ordered records matching the query
    async fn query(&self, query: &PostQuery) -> Result<Vec<PostRecord>, StoreError>;

    /// Single record by id
    async fn get_record(&self, id: u64) -> Result<Option<PostRecord>, StoreError>;
}

/// In-memory post store
#[derive(Clone, Default)]
pub struct InMemoryPostStore {
    records: Arc<RwLock<Vec<PostRecord>>>,
}

impl InMemoryPostStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, assigning the next id
    pub fn insert(&self, mut record: PostRecord) -> u64 {
        let mut records = self.records.write();
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        record.id = id;
        records.push(record);
        id
    }

    /// Delete a record
    pub fn delete(&self, id: u64) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);
        records.len() != before
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn query(&self, query: &PostQuery) -> Result<Vec<PostRecord>, StoreError> {
        if query.per_page == 0 {
            return Err(StoreError::InvalidQuery("per_page must be at least 1".into()));
        }
        let mut matching: Vec<PostRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| r.post_type == query.post_type)
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.compare(a, b));
        matching.truncate(query.per_page);
        Ok(matching)
    }

    async fn get_record(&self, id: u64) -> Result<Option<PostRecord>, StoreError> {
        Ok(self.records.read().iter().find(|r| r.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn step(title: &str, order: Option<i64>, day: u32) -> PostRecord {
        let mut meta = BTreeMap::new();
        if let Some(order) = order {
            meta.insert(PROCESS_STEP_ORDER_META.to_string(), AttributeValue::Integer(order));
        }
        PostRecord {
            id: 0,
            post_type: PROCESS_STEP_POST_TYPE.into(),
            title: title.into(),
            excerpt: String::new(),
            menu_order: 0,
            date: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            featured_media: None,
            featured_media_alt: None,
            meta,
        }
    }

    fn titles(records: &[PostRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_meta_order_with_id_tiebreak() {
        let store = InMemoryPostStore::new();
        store.insert(step("Third", Some(3), 1));
        store.insert(step("First", Some(1), 2));
        store.insert(step("Also first", Some(1), 3));
        store.insert(step("Unordered", None, 4));

        let result = store.query(&PostQuery::process_steps(10)).await.unwrap();
        assert_eq!(titles(&result), vec!["First", "Also first", "Third", "Unordered"]);
    }

    #[tokio::test]
    async fn test_date_desc_and_limit() {
        let store = InMemoryPostStore::new();
        store.insert(step("Old", None, 1));
        store.insert(step("New", None, 9));
        store.insert(step("Mid", None, 5));

        let query = PostQuery {
            post_type: PROCESS_STEP_POST_TYPE.into(),
            per_page: 2,
            order_by: OrderBy::Date,
            order: Order::Desc,
        };
        let result = store.query(&query).await.unwrap();
        assert_eq!(titles(&result), vec!["New", "Mid"]);
    }

    #[tokio::test]
    async fn test_other_post_types_filtered() {
        let store = InMemoryPostStore::new();
        let mut page = step("Page", None, 1);
        page.post_type = "page".into();
        store.insert(page);
        let id = store.insert(step("Step", None, 1));

        let result = store.query(&PostQuery::process_steps(5)).await.unwrap();
        assert_eq!(titles(&result), vec!["Step"]);
        assert!(store.get_record(id).await.unwrap().is_some());
        assert!(store.query(&PostQuery::process_steps(0)).await.is_err());
    }

    #[test]
    fn test_process_step_meta() {
        let mut record = step("A", Some(2), 1);
        record
            .meta
            .insert(PROCESS_STEP_DURATION_META.into(), "2 weeks".into());
        let meta = ProcessStepMeta::from_record(&record);
        assert_eq!(meta.order, Some(2));
        assert_eq!(meta.duration.as_deref(), Some("2 weeks"));
        assert_eq!(meta.icon, None);
    }

    #[test]
    fn test_parse_order() {
        assert_eq!(OrderBy::parse("menu_order"), Some(OrderBy::MenuOrder));
        assert_eq!(
            OrderBy::parse("meta_value_num:_process_step_order"),
            Some(OrderBy::MetaNumber(PROCESS_STEP_ORDER_META.into()))
        );
        assert_eq!(OrderBy::parse("random"), None);
        assert_eq!(Order::parse("desc"), Some(Order::Desc));
    }
}
