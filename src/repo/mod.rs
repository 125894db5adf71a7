pub mod live;
pub mod memory;
pub mod query;
pub mod sqlite;
pub mod sqlite_queries;

use crate::consts;
use async_trait::async_trait;
use derive_more::Display;
use std::sync::Arc;

pub use live::{ChangeFeed, LiveQuery, Subscription};
pub use query::{Direction, Filter, OrderBy, Query};

/// Schemaless record as written to a collection
pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    #[display("pets")]
    Pets,
    #[display("reminders")]
    Appointments,
    #[display("medicalHistory")]
    MedicalHistory,
    #[display("posts")]
    Posts,
    #[display("contacts")]
    Contacts,
    #[display("weightLog")]
    WeightLog,
    #[display("grooming")]
    Grooming,
    #[display("users")]
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Pets => consts::COLLECTION_PETS,
            Collection::Appointments => consts::COLLECTION_APPOINTMENTS,
            Collection::MedicalHistory => consts::COLLECTION_MEDICAL_HISTORY,
            Collection::Posts => consts::COLLECTION_POSTS,
            Collection::Contacts => consts::COLLECTION_CONTACTS,
            Collection::WeightLog => consts::COLLECTION_WEIGHT_LOG,
            Collection::Grooming => consts::COLLECTION_GROOMING,
            Collection::Users => consts::COLLECTION_USERS,
        }
    }

    /// Field holding the owning identity; `None` for globally owned data
    pub fn owner_field(&self) -> Option<&'static str> {
        match self {
            Collection::Contacts => None,
            Collection::Posts => Some(consts::FIELD_USER_ID),
            Collection::Users => Some("uid"),
            _ => Some(consts::FIELD_OWNER_ID),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a new document under a random id and returns the id
    async fn create(&self, collection: Collection, data: Document) -> anyhow::Result<String>;

    /// Writes a document under a caller chosen id, replacing any previous one
    async fn set(&self, collection: Collection, id: &str, data: Document) -> anyhow::Result<()>;

    /// Merges top-level fields into an existing document
    async fn update(&self, collection: Collection, id: &str, patch: Document)
    -> anyhow::Result<()>;

    async fn delete(&self, collection: Collection, id: &str) -> anyhow::Result<()>;

    async fn get(&self, collection: Collection, id: &str) -> anyhow::Result<Option<Document>>;

    async fn query(&self, collection: Collection, query: &Query)
    -> anyhow::Result<Vec<Document>>;

    /// Opens a standing query. Must be called inside a tokio runtime.
    fn subscribe(&self, collection: Collection, query: Query) -> LiveQuery;
}

pub type ImplDocumentStore = Arc<dyn DocumentStore>;

#[derive(Debug, Display, derive_more::Error)]
#[display("document {collection}/{id} not found")]
pub struct DocumentNotFound {
    pub collection: Collection,
    #[error(not(source))]
    pub id: String,
}
