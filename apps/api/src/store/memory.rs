//! In-memory record store for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{Filter, Order, RecordStore, StoreError, Table};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    dropped: Mutex<HashSet<Table>>,
    progress: Mutex<Vec<i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts into `table` report success but keep nothing, like a REST
    /// write whose failure status nobody checked.
    pub fn silently_drop(&self, table: Table) {
        self.dropped.lock().unwrap().insert(table);
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Every `progress_percentage` ever written to a job, in write order.
    pub fn progress_history(&self) -> Vec<i64> {
        self.progress.lock().unwrap().clone()
    }
}

fn row_matches(filter: &Filter, row: &Value) -> bool {
    filter
        .conditions()
        .iter()
        .all(|(column, expected)| match row.get(column) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == *expected,
        })
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_many(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        if self.dropped.lock().unwrap().contains(&table) {
            return Ok(Vec::new());
        }
        if table == Table::GenerationJobs {
            let mut progress = self.progress.lock().unwrap();
            progress.extend(rows.iter().filter_map(|r| r["progress_percentage"].as_i64()));
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn patch(&self, table: Table, filter: &Filter, fields: Value) -> Result<(), StoreError> {
        if table == Table::GenerationJobs {
            if let Some(p) = fields.get("progress_percentage").and_then(Value::as_i64) {
                self.progress.lock().unwrap().push(p);
            }
        }
        let mut tables = self.tables.lock().unwrap();
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(());
        };
        let Value::Object(fields) = fields else {
            return Ok(());
        };
        for row in rows.iter_mut().filter(|r| row_matches(filter, r)) {
            if let Value::Object(existing) = row {
                for (k, v) in &fields {
                    existing.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }

    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|r| row_matches(filter, r))
            .collect();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let (a, b) = (&a[order.column], &b[order.column]);
                let ord = match (a.as_i64(), b.as_i64()) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    _ => a.to_string().cmp(&b.to_string()),
                };
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        Ok(rows)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_patch_merges_fields_into_matching_rows() {
        let store = MemoryStore::new();
        store
            .insert_many(
                Table::GenerationJobs,
                vec![
                    json!({"course_id": "a", "progress_percentage": 5, "status": "processing"}),
                    json!({"course_id": "b", "progress_percentage": 5, "status": "processing"}),
                ],
            )
            .await
            .unwrap();

        store
            .patch(
                Table::GenerationJobs,
                &Filter::eq("course_id", "a"),
                json!({"progress_percentage": 50}),
            )
            .await
            .unwrap();

        let a = store
            .select(Table::GenerationJobs, &Filter::eq("course_id", "a"), None)
            .await
            .unwrap();
        assert_eq!(a[0]["progress_percentage"], 50);
        assert_eq!(a[0]["status"], "processing");
        assert_eq!(store.progress_history(), vec![5, 5, 50]);
    }

    #[tokio::test]
    async fn test_dropped_table_keeps_nothing() {
        let store = MemoryStore::new();
        store.silently_drop(Table::Audio);

        store
            .insert_many(Table::Audio, vec![json!({"course_id": "a"})])
            .await
            .unwrap();

        assert!(!store
            .exists(Table::Audio, &Filter::eq("course_id", "a"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_filters_compare_numbers_as_text() {
        let store = MemoryStore::new();
        store
            .insert_many(
                Table::Chapters,
                vec![json!({"course_id": "a", "order_number": 2}), json!({"course_id": "a", "order_number": 1})],
            )
            .await
            .unwrap();

        let ordered = store
            .select(Table::Chapters, &Filter::eq("course_id", "a"), Some(Order::asc("order_number")))
            .await
            .unwrap();
        assert_eq!(ordered[0]["order_number"], 1);

        let second = store
            .select(Table::Chapters, &Filter::eq("order_number", 2), None)
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
    }
}
