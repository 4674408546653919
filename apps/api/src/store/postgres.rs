use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use super::{validate_column, Filter, Order, RecordStore, StoreError, Table};

/// Record store talking to Postgres directly. Rows go in and come out as
/// JSONB so the same JSON row shapes work for every table.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `WHERE` clause over alias `t`, placeholders numbered from `first`.
fn where_clause(filter: &Filter, first: usize) -> Result<String, StoreError> {
    let parts = filter
        .conditions()
        .iter()
        .enumerate()
        .map(|(i, (column, _))| Ok(format!("t.{}::text = ${}", validate_column(column)?, first + i)))
        .collect::<Result<Vec<_>, StoreError>>()?;
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn insert_many(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        if rows.is_empty() {
            return Ok(rows);
        }
        debug!(table = table.name(), rows = rows.len(), "Postgres insert");

        let sql = format!(
            "INSERT INTO {t} SELECT * FROM jsonb_populate_recordset(NULL::{t}, $1) RETURNING to_jsonb({t}.*)",
            t = table.name()
        );
        let stored = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Array(rows))
            .fetch_all(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn patch(&self, table: Table, filter: &Filter, fields: Value) -> Result<(), StoreError> {
        let Some(object) = fields.as_object() else {
            return Ok(());
        };
        if object.is_empty() {
            return Ok(());
        }

        let assignments = object
            .keys()
            .map(|column| {
                let column = validate_column(column)?;
                Ok(format!("{column} = r.{column}"))
            })
            .collect::<Result<Vec<_>, StoreError>>()?
            .join(", ");

        let sql = format!(
            "UPDATE {t} AS t SET {assignments} FROM jsonb_populate_record(NULL::{t}, $1) AS r{filter}",
            t = table.name(),
            filter = where_clause(filter, 2)?
        );

        let mut query = sqlx::query(&sql).bind(&fields);
        for (_, value) in filter.conditions() {
            query = query.bind(value);
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut sql = format!(
            "SELECT to_jsonb(t) FROM {} AS t{}",
            table.name(),
            where_clause(filter, 1)?
        );
        if let Some(order) = order {
            let direction = if order.ascending { "ASC" } else { "DESC" };
            sql.push_str(&format!(
                " ORDER BY t.{} {direction}",
                validate_column(order.column)?
            ));
        }

        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        for (_, value) in filter.conditions() {
            query = query.bind(value);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn exists(&self, table: Table, filter: &Filter) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} AS t{})",
            table.name(),
            where_clause(filter, 1)?
        );
        let mut query = sqlx::query_scalar::<_, bool>(&sql);
        for (_, value) in filter.conditions() {
            query = query.bind(value);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
