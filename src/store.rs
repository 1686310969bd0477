//! Document store over PostgreSQL.
//!
//! One table per resource, each row a schemaless JSONB document plus the
//! system columns (`id`, `created_at`, `updated_at`). The store is built
//! once at startup, cloned into the router state, and closed on shutdown.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::registry::{Ordering, ResourceSpec, RESOURCES};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One stored document: schemaless fields plus the system columns.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub data: Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Wire shape: the document fields with id and timestamps merged in.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".to_string(), Value::String(self.id.to_string()));
        for (key, value) in self.data.iter() {
            obj.insert(key.clone(), value.clone());
        }
        obj.insert(
            "createdAt".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        obj.insert(
            "updatedAt".to_string(),
            Value::String(self.updated_at.to_rfc3339()),
        );
        Value::Object(obj)
    }
}

const DOCUMENT_COLUMNS: &str = "id, data, created_at, updated_at";

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Connect eagerly using `DATABASE_URL`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = database_url()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&url)
            .await?;
        info!("connected to store");
        Ok(Self { pool })
    }

    /// Pool that only connects on first use. Lets the router be exercised
    /// without a reachable database.
    pub fn connect_lazy(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().connect_lazy(url)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the table for every registered resource.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for spec in RESOURCES {
            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 id UUID PRIMARY KEY, \
                 data JSONB NOT NULL DEFAULT '{{}}'::jsonb, \
                 created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
                 updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
                quote_identifier(spec.name)
            );
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        info!("store migrated: {} resource tables", RESOURCES.len());
        Ok(())
    }

    /// All documents for a resource, ordered per its sort rule. Filters are
    /// equality matches on document fields; the field names come from the
    /// resource spec, never from the caller.
    pub async fn list(
        &self,
        spec: &ResourceSpec,
        filters: &[(&str, &str)],
    ) -> Result<Vec<Document>, StoreError> {
        let mut sql = format!(
            "SELECT {} FROM {}",
            DOCUMENT_COLUMNS,
            quote_identifier(spec.name)
        );
        if !filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&field_clauses(filters));
        }
        sql.push_str(&order_sql(spec));

        let mut query = sqlx::query_as::<_, Document>(&sql);
        for (_, value) in filters {
            query = query.bind(value.to_string());
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Oldest document, used by the singleton resource.
    pub async fn find_first(&self, spec: &ResourceSpec) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at ASC LIMIT 1",
            DOCUMENT_COLUMNS,
            quote_identifier(spec.name)
        );
        Ok(sqlx::query_as(&sql).fetch_optional(&self.pool).await?)
    }

    /// First document matching every field pair; the uniqueness probe.
    pub async fn find_by_fields(
        &self,
        spec: &ResourceSpec,
        pairs: &[(&str, &str)],
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} LIMIT 1",
            DOCUMENT_COLUMNS,
            quote_identifier(spec.name),
            field_clauses(pairs)
        );
        let mut query = sqlx::query_as::<_, Document>(&sql);
        for (_, value) in pairs {
            query = query.bind(value.to_string());
        }
        Ok(query.fetch_optional(&self.pool).await?)
    }

    pub async fn insert(
        &self,
        spec: &ResourceSpec,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let sql = format!(
            "INSERT INTO {} (id, data) VALUES ($1, $2) RETURNING {}",
            quote_identifier(spec.name),
            DOCUMENT_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(Json(data))
            .fetch_one(&self.pool)
            .await?)
    }

    /// Merge the named fields into the document and refresh `updated_at`.
    /// Returns None when no document has the id.
    pub async fn update(
        &self,
        spec: &ResourceSpec,
        id: Uuid,
        changes: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "UPDATE {} SET data = data || $2, updated_at = now() WHERE id = $1 RETURNING {}",
            quote_identifier(spec.name),
            DOCUMENT_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(id)
            .bind(Json(changes))
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Permanently remove a document. Returns false when nothing matched.
    pub async fn delete(&self, spec: &ResourceSpec, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", quote_identifier(spec.name));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("store pool closed");
    }
}

fn database_url() -> Result<String, StoreError> {
    std::env::var("DATABASE_URL").map_err(|_| StoreError::ConfigMissing("DATABASE_URL"))
}

/// `data->>'field' = $n AND ...` for positional binds starting at $1.
/// Field names are registry constants, so interpolation is safe here.
fn field_clauses(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (field, _))| format!("data->>'{}' = ${}", field, i + 1))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn order_sql(spec: &ResourceSpec) -> String {
    match spec.ordering {
        Ordering::CreatedAtDesc => " ORDER BY created_at DESC".to_string(),
        Ordering::FieldsDesc(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .map(|f| {
                    if f.numeric {
                        format!("(data->>'{}')::numeric DESC", f.name)
                    } else {
                        format!("data->>'{}' DESC", f.name)
                    }
                })
                .collect();
            format!(" ORDER BY {}", parts.join(", "))
        }
    }
}

/// Quote SQL identifier to prevent injection
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use serde_json::json;

    #[test]
    fn journey_orders_by_year_then_order_descending() {
        let spec = registry::find("journey").unwrap();
        assert_eq!(
            order_sql(spec),
            " ORDER BY data->>'year' DESC, (data->>'order')::numeric DESC"
        );
    }

    #[test]
    fn default_ordering_is_created_at_desc() {
        let spec = registry::find("projects").unwrap();
        assert_eq!(order_sql(spec), " ORDER BY created_at DESC");
    }

    #[test]
    fn field_clauses_number_the_binds() {
        let clause = field_clauses(&[("name", "Rust"), ("category", "Backend")]);
        assert_eq!(clause, "data->>'name' = $1 AND data->>'category' = $2");
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_identifier("skills"), "\"skills\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn wire_value_merges_fields_and_system_keys() {
        let mut data = Map::new();
        data.insert("name".to_string(), json!("Rust"));
        let doc = Document {
            id: Uuid::new_v4(),
            data: Json(data),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = doc.to_value();
        assert_eq!(value["name"], json!("Rust"));
        assert_eq!(value["id"], json!(doc.id.to_string()));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}
