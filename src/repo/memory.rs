use async_trait::async_trait;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Collection, Document, DocumentNotFound, DocumentStore, LiveQuery, Query,
    live::{ChangeFeed, spawn_live_query},
};
use crate::consts;

/// Process-local store, documents kept in insertion order per collection.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
    feed: ChangeFeed,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, collection: Collection, mut data: Document) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        data.insert(consts::FIELD_ID.into(), Value::String(id.clone()));

        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(data);
        self.feed.notify(collection);

        Ok(id)
    }

    async fn set(&self, collection: Collection, id: &str, mut data: Document) -> anyhow::Result<()> {
        data.insert(consts::FIELD_ID.into(), Value::String(id.to_string()));

        {
            let mut collections = self.collections.write().await;
            let docs = collections.entry(collection).or_default();
            match docs.iter_mut().find(|doc| doc_id(doc) == Some(id)) {
                Some(existing) => *existing = data,
                None => docs.push(data),
            }
        }
        self.feed.notify(collection);

        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Document,
    ) -> anyhow::Result<()> {
        {
            let mut collections = self.collections.write().await;
            let existing = collections
                .get_mut(&collection)
                .and_then(|docs| docs.iter_mut().find(|doc| doc_id(doc) == Some(id)))
                .ok_or_else(|| DocumentNotFound {
                    collection,
                    id: id.to_string(),
                })?;

            for (field, value) in patch {
                if field != consts::FIELD_ID {
                    existing.insert(field, value);
                }
            }
        }
        self.feed.notify(collection);

        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> anyhow::Result<()> {
        let removed = {
            let mut collections = self.collections.write().await;
            match collections.get_mut(&collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|doc| doc_id(doc) != Some(id));
                    before != docs.len()
                }
                None => false,
            }
        };

        if removed {
            self.feed.notify(collection);
        }

        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> anyhow::Result<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| doc_id(doc) == Some(id)).cloned()))
    }

    async fn query(&self, collection: Collection, query: &Query) -> anyhow::Result<Vec<Document>> {
        let docs = self
            .collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default();

        Ok(query.apply(docs))
    }

    fn subscribe(&self, collection: Collection, query: Query) -> LiveQuery {
        spawn_live_query(self.clone(), &self.feed, collection, query)
    }
}

fn doc_id(doc: &Document) -> Option<&str> {
    doc.get(consts::FIELD_ID).and_then(Value::as_str)
}
