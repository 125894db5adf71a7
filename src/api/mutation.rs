//! # Mutation gateway
//!
//! Single write path into the document store. Every write stamps
//! `updatedAt`, creates also stamp `createdAt`, and the owner field is always
//! taken from the caller's session, never from the payload. Changes reach
//! the UI through the live collections, not through return values.

use serde::Serialize;
use serde_json::Value;

use super::errors::UserError;
use crate::{
    consts, metric,
    models::user_app::Session,
    repo::{Collection, Document, ImplDocumentStore},
    utils,
};

#[derive(Clone)]
pub struct MutationGateway {
    store: ImplDocumentStore,
}

pub fn to_document<P: Serialize + ?Sized>(payload: &P) -> anyhow::Result<Document> {
    match serde_json::to_value(payload)? {
        Value::Object(doc) => Ok(doc),
        other => anyhow::bail!("payload must serialize to an object, got {other}"),
    }
}

/// Drops `null` values and empty strings, the store keeps only set fields
fn strip_empty(doc: &mut Document) {
    doc.retain(|_, value| match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    });
}

/// Drops the fields only the write path may set
fn strip_reserved(doc: &mut Document, collection: Collection) {
    doc.remove(consts::FIELD_ID);
    doc.remove(consts::FIELD_CREATED_AT);
    doc.remove(consts::FIELD_UPDATED_AT);
    if let Some(owner_field) = collection.owner_field() {
        doc.remove(owner_field);
    }
}

impl MutationGateway {
    pub fn new(store: ImplDocumentStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ImplDocumentStore {
        &self.store
    }

    fn prepare_new(session: &Session, collection: Collection, mut doc: Document) -> Document {
        strip_empty(&mut doc);
        strip_reserved(&mut doc, collection);

        if let Some(owner_field) = collection.owner_field() {
            doc.insert(owner_field.into(), Value::String(session.uid.clone()));
        }

        let now = Value::String(utils::now_timestamp());
        doc.insert(consts::FIELD_CREATED_AT.into(), now.clone());
        doc.insert(consts::FIELD_UPDATED_AT.into(), now);

        doc
    }

    /// Creates a document owned by `session` and returns its id
    pub async fn create<P: Serialize + ?Sized>(
        &self,
        session: &Session,
        collection: Collection,
        payload: &P,
    ) -> anyhow::Result<String> {
        let doc = Self::prepare_new(session, collection, to_document(payload)?);
        let id = self.store.create(collection, doc).await?;

        metric::incr_mutation_statds(collection.as_str(), "create");
        tracing::info!("created {collection}/{id}");

        Ok(id)
    }

    /// Writes a document under a known id, e.g. `users/{uid}`
    pub async fn put<P: Serialize + ?Sized>(
        &self,
        session: &Session,
        collection: Collection,
        id: &str,
        payload: &P,
    ) -> anyhow::Result<()> {
        let doc = Self::prepare_new(session, collection, to_document(payload)?);
        self.store.set(collection, id, doc).await?;

        metric::incr_mutation_statds(collection.as_str(), "put");

        Ok(())
    }

    async fn ensure_owner(
        &self,
        session: &Session,
        collection: Collection,
        id: &str,
    ) -> anyhow::Result<()> {
        let Some(owner_field) = collection.owner_field() else {
            return Ok(());
        };

        let doc = self
            .store
            .get(collection, id)
            .await?
            .ok_or(UserError::NotFound)?;

        match doc.get(owner_field).and_then(Value::as_str) {
            Some(owner) if owner == session.uid => Ok(()),
            _ => {
                tracing::warn!("{} tried to modify {collection}/{id}", session.uid);
                Err(UserError::NotOwner.into())
            }
        }
    }

    /// Merges `patch` into a document the caller owns
    pub async fn update<P: Serialize + ?Sized>(
        &self,
        session: &Session,
        collection: Collection,
        id: &str,
        patch: &P,
    ) -> anyhow::Result<()> {
        self.ensure_owner(session, collection, id).await?;

        let mut doc = to_document(patch)?;
        doc.retain(|_, value| !value.is_null());
        strip_reserved(&mut doc, collection);
        doc.insert(
            consts::FIELD_UPDATED_AT.into(),
            Value::String(utils::now_timestamp()),
        );

        self.store.update(collection, id, doc).await?;
        metric::incr_mutation_statds(collection.as_str(), "update");

        Ok(())
    }

    pub async fn delete(
        &self,
        session: &Session,
        collection: Collection,
        id: &str,
    ) -> anyhow::Result<()> {
        self.ensure_owner(session, collection, id).await?;

        self.store.delete(collection, id).await?;
        metric::incr_mutation_statds(collection.as_str(), "delete");
        tracing::info!("deleted {collection}/{id}");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{MockDocumentStore, memory::InMemoryDocumentStore};
    use serde_json::json;
    use std::sync::Arc;

    fn session(uid: &str) -> Session {
        Session {
            uid: uid.into(),
            email: format!("{uid}@correo.com"),
            display_name: None,
        }
    }

    fn gateway() -> MutationGateway {
        MutationGateway::new(Arc::new(InMemoryDocumentStore::new()))
    }

    #[tokio::test]
    async fn test_create_injects_owner_and_timestamps() {
        let gateway = gateway();
        let payload = json!({
            "name": "Firulais",
            "microchip": "",
            "image": null,
            "ownerId": "someone-else",
            "createdAt": "1999-01-01T00:00:00Z",
            "age": 0
        });

        let id = gateway
            .create(&session("u1"), Collection::Pets, &payload)
            .await
            .unwrap();

        let doc = gateway.store().get(Collection::Pets, &id).await.unwrap().unwrap();
        assert_eq!(doc.get("ownerId"), Some(&json!("u1")));
        assert_eq!(doc.get("age"), Some(&json!(0)));
        assert!(doc.get("microchip").is_none());
        assert!(doc.get("image").is_none());
        assert_ne!(doc.get("createdAt"), Some(&json!("1999-01-01T00:00:00Z")));
        assert_eq!(doc.get("createdAt"), doc.get("updatedAt"));
    }

    #[tokio::test]
    async fn test_posts_use_user_id_and_contacts_have_no_owner() {
        let gateway = gateway();

        let post = gateway
            .create(&session("u1"), Collection::Posts, &json!({"name": "Rocky"}))
            .await
            .unwrap();
        let contact = gateway
            .create(&session("admin"), Collection::Contacts, &json!({"name": "Vet"}))
            .await
            .unwrap();

        let post = gateway.store().get(Collection::Posts, &post).await.unwrap().unwrap();
        assert_eq!(post.get("userId"), Some(&json!("u1")));

        let contact = gateway
            .store()
            .get(Collection::Contacts, &contact)
            .await
            .unwrap()
            .unwrap();
        assert!(contact.get("ownerId").is_none());
        assert!(contact.get("userId").is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_check_the_owner() {
        let gateway = gateway();
        let id = gateway
            .create(&session("u1"), Collection::Pets, &json!({"name": "Luna"}))
            .await
            .unwrap();

        let err = gateway
            .update(&session("u2"), Collection::Pets, &id, &json!({"name": "Robada"}))
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<UserError>(), Some(&UserError::NotOwner));

        let err = gateway
            .delete(&session("u2"), Collection::Pets, &id)
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<UserError>(), Some(&UserError::NotOwner));

        let err = gateway
            .delete(&session("u1"), Collection::Pets, "missing")
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<UserError>(), Some(&UserError::NotFound));

        gateway
            .update(
                &session("u1"),
                Collection::Pets,
                &id,
                &json!({"name": "Luna II", "ownerId": "u2", "breed": null}),
            )
            .await
            .unwrap();
        let doc = gateway.store().get(Collection::Pets, &id).await.unwrap().unwrap();
        assert_eq!(doc.get("name"), Some(&json!("Luna II")));
        assert_eq!(doc.get("ownerId"), Some(&json!("u1")));

        gateway.delete(&session("u1"), Collection::Pets, &id).await.unwrap();
        assert!(gateway.store().get(Collection::Pets, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_errors_reach_the_caller() {
        let mut store = MockDocumentStore::new();
        store
            .expect_create()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("permission-denied")));

        let gateway = MutationGateway::new(Arc::new(store));
        let err = gateway
            .create(&session("u1"), Collection::Appointments, &json!({"title": "x"}))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "permission-denied");
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        assert!(to_document(&json!(["a"])).is_err());
    }
}
