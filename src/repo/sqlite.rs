use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{
    Collection, Document, DocumentNotFound, DocumentStore, LiveQuery, Query,
    live::{ChangeFeed, spawn_live_query},
    sqlite_queries,
};
use crate::consts;

/// Document store persisted in sqlite, one JSON row per document.
#[derive(Clone)]
pub struct SqlxDocumentStore {
    pub db_pool: SqlitePool,
    pub feed: ChangeFeed,
}

impl SqlxDocumentStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self {
            db_pool,
            feed: ChangeFeed::new(),
        }
    }
}

fn decode_document(raw: &str) -> anyhow::Result<Document> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(doc) => Ok(doc),
        other => Err(anyhow::anyhow!("stored document is not an object: {other}")),
    }
}

#[async_trait]
impl DocumentStore for SqlxDocumentStore {
    async fn create(&self, collection: Collection, mut data: Document) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        data.insert(consts::FIELD_ID.into(), Value::String(id.clone()));

        sqlx::query(sqlite_queries::QUERY_INSERT_DOCUMENT)
            .bind(collection.as_str())
            .bind(&id)
            .bind(Value::Object(data).to_string())
            .bind(Utc::now())
            .execute(&self.db_pool)
            .await
            .with_context(|| format!("failed to insert into {collection}"))?;

        self.feed.notify(collection);
        Ok(id)
    }

    async fn set(&self, collection: Collection, id: &str, mut data: Document) -> anyhow::Result<()> {
        data.insert(consts::FIELD_ID.into(), Value::String(id.to_string()));

        sqlx::query(sqlite_queries::QUERY_UPSERT_DOCUMENT)
            .bind(collection.as_str())
            .bind(id)
            .bind(Value::Object(data).to_string())
            .bind(Utc::now())
            .execute(&self.db_pool)
            .await
            .with_context(|| format!("failed to write {collection}/{id}"))?;

        self.feed.notify(collection);
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Document,
    ) -> anyhow::Result<()> {
        let mut tx = self.db_pool.begin().await?;

        let raw: Option<String> = sqlx::query_scalar(sqlite_queries::QUERY_GET_DOCUMENT)
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let mut doc = match raw {
            Some(raw) => decode_document(&raw)?,
            None => {
                return Err(DocumentNotFound {
                    collection,
                    id: id.to_string(),
                }
                .into());
            }
        };

        for (field, value) in patch {
            if field != consts::FIELD_ID {
                doc.insert(field, value);
            }
        }

        sqlx::query(sqlite_queries::QUERY_UPDATE_DOCUMENT_DATA)
            .bind(collection.as_str())
            .bind(id)
            .bind(Value::Object(doc).to_string())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.feed.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> anyhow::Result<()> {
        let deleted = sqlx::query(sqlite_queries::QUERY_DELETE_DOCUMENT)
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        if deleted > 0 {
            self.feed.notify(collection);
        }
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> anyhow::Result<Option<Document>> {
        sqlx::query(sqlite_queries::QUERY_GET_DOCUMENT)
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .map(|row| decode_document(row.try_get::<&str, _>("data")?))
            .transpose()
    }

    async fn query(&self, collection: Collection, query: &Query) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query(sqlite_queries::QUERY_GET_COLLECTION_DOCUMENTS)
            .bind(collection.as_str())
            .fetch_all(&self.db_pool)
            .await?;

        let docs = rows
            .iter()
            .map(|row| decode_document(row.try_get::<&str, _>("data")?))
            .collect::<anyhow::Result<Vec<Document>>>()?;

        Ok(query.apply(docs))
    }

    fn subscribe(&self, collection: Collection, query: Query) -> LiveQuery {
        spawn_live_query(self.clone(), &self.feed, collection, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::Direction;
    use crate::utils;
    use serde_json::json;

    async fn store() -> SqlxDocumentStore {
        let pool = utils::setup_in_memory_db_pool().await.unwrap();
        utils::run_migrations(&pool).await.unwrap();
        SqlxDocumentStore::new(pool)
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_documents_survive_a_round_trip() {
        let store = store().await;

        let id = store
            .create(
                Collection::Pets,
                doc(json!({"name": "Michi", "ownerId": "u1", "species": "gato"})),
            )
            .await
            .unwrap();
        store
            .update(Collection::Pets, &id, doc(json!({"breed": "Siamés"})))
            .await
            .unwrap();

        let stored = store.get(Collection::Pets, &id).await.unwrap().unwrap();
        assert_eq!(stored.get("id"), Some(&json!(id)));
        assert_eq!(stored.get("breed"), Some(&json!("Siamés")));
        assert_eq!(stored.get("species"), Some(&json!("gato")));

        store.delete(Collection::Pets, &id).await.unwrap();
        assert!(store.get(Collection::Pets, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = store().await;
        for (name, owner) in [("Zeus", "u1"), ("Bola", "u2"), ("Arya", "u1")] {
            store
                .create(Collection::Pets, doc(json!({"name": name, "ownerId": owner})))
                .await
                .unwrap();
        }

        let docs = store
            .query(
                Collection::Pets,
                &Query::new()
                    .where_eq("ownerId", "u1")
                    .order_by("name", Direction::Asc),
            )
            .await
            .unwrap();

        let names = docs
            .iter()
            .map(|d| d.get("name").and_then(Value::as_str).unwrap())
            .collect::<Vec<&str>>();
        assert_eq!(names, vec!["Arya", "Zeus"]);
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = store().await;

        let err = store
            .update(Collection::Pets, "nope", doc(json!({"name": "x"})))
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<DocumentNotFound>().is_some());
    }

    #[tokio::test]
    async fn test_subscription_sees_writes() {
        let store = store().await;
        let mut live = store.subscribe(
            Collection::Appointments,
            Query::new().where_eq("ownerId", "u1"),
        );
        assert!(live.next().await.unwrap().unwrap().is_empty());

        store
            .create(
                Collection::Appointments,
                doc(json!({"ownerId": "u1", "date": "2024-01-10"})),
            )
            .await
            .unwrap();

        let delivered = live.next().await.unwrap().unwrap();
        assert_eq!(delivered.len(), 1);
    }
}
