use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use super::{validate_column, Filter, Order, RecordStore, StoreError, Table};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Record store backed by Supabase's PostgREST interface.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, service_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .timeout(REQUEST_TIMEOUT)
    }
}

/// PostgREST `column=eq.value` query pairs.
fn filter_params(filter: &Filter) -> Result<Vec<(String, String)>, StoreError> {
    filter
        .conditions()
        .iter()
        .map(|(column, value)| Ok((validate_column(column)?.to_string(), format!("eq.{value}"))))
        .collect()
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn insert_many(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        if rows.is_empty() {
            return Ok(rows);
        }
        debug!(table = table.name(), rows = rows.len(), "Supabase insert");

        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;

        let stored: Value = check(response).await?.json().await?;
        Ok(match stored {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            single => vec![single],
        })
    }

    async fn patch(&self, table: Table, filter: &Filter, fields: Value) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.patch(self.table_url(table)))
            .query(&filter_params(filter)?)
            .json(&fields)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut params = filter_params(filter)?;
        params.push(("select".to_string(), "*".to_string()));
        if let Some(order) = order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push((
                "order".to_string(),
                format!("{}.{direction}", validate_column(order.column)?),
            ));
        }

        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&params)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn exists(&self, table: Table, filter: &Filter) -> Result<bool, StoreError> {
        let mut params = filter_params(filter)?;
        params.push(("select".to_string(), "id".to_string()));
        params.push(("limit".to_string(), "1".to_string()));

        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&params)
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        Ok(!rows.is_empty())
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}
