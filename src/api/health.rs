//! Health history of a pet: medical records, weight log and grooming log.
//!
//! Every record belongs to the owner who wrote it and is listed per pet,
//! most recent date first.

use serde::de::DeserializeOwned;

use super::{errors::UserError, live::decode_documents, mutation::MutationGateway};
use crate::{
    consts,
    models::{
        health::{
            GroomingRecord, MedicalRecord, NewGroomingRecord, NewMedicalRecord, NewWeightRecord,
            WeightRecord,
        },
        user_app::Session,
    },
    repo::{Collection, Direction, ImplDocumentStore, Query},
};

fn ensure_pet_id(pet_id: &str) -> Result<(), UserError> {
    if pet_id.trim().is_empty() {
        return Err(UserError::FormInputValueError(
            "Selecciona una mascota".into(),
        ));
    }
    Ok(())
}

async fn pet_history<T: DeserializeOwned>(
    session: &Session,
    pet_id: &str,
    collection: Collection,
    store: &ImplDocumentStore,
) -> anyhow::Result<Vec<T>> {
    let query = Query::new()
        .where_eq(consts::FIELD_OWNER_ID, session.uid.as_str())
        .where_eq("petId", pet_id)
        .order_by("date", Direction::Desc);

    let docs = store.query(collection, &query).await?;

    Ok(decode_documents(collection, docs))
}

pub async fn add_medical_record(
    session: &Session,
    record: NewMedicalRecord,
    gateway: &MutationGateway,
) -> anyhow::Result<String> {
    ensure_pet_id(&record.pet_id)?;
    gateway
        .create(session, Collection::MedicalHistory, &record)
        .await
}

pub async fn get_pet_medical_records(
    session: &Session,
    pet_id: &str,
    store: &ImplDocumentStore,
) -> anyhow::Result<Vec<MedicalRecord>> {
    pet_history(session, pet_id, Collection::MedicalHistory, store).await
}

pub async fn add_weight_record(
    session: &Session,
    record: NewWeightRecord,
    gateway: &MutationGateway,
) -> anyhow::Result<String> {
    ensure_pet_id(&record.pet_id)?;
    if record.weight.trim().is_empty() {
        return Err(UserError::FormInputValueError("Ingresa el peso".into()).into());
    }

    gateway.create(session, Collection::WeightLog, &record).await
}

pub async fn get_pet_weight_history(
    session: &Session,
    pet_id: &str,
    store: &ImplDocumentStore,
) -> anyhow::Result<Vec<WeightRecord>> {
    pet_history(session, pet_id, Collection::WeightLog, store).await
}

pub async fn add_grooming_record(
    session: &Session,
    record: NewGroomingRecord,
    gateway: &MutationGateway,
) -> anyhow::Result<String> {
    ensure_pet_id(&record.pet_id)?;
    gateway.create(session, Collection::Grooming, &record).await
}

pub async fn get_pet_grooming_history(
    session: &Session,
    pet_id: &str,
    store: &ImplDocumentStore,
) -> anyhow::Result<Vec<GroomingRecord>> {
    pet_history(session, pet_id, Collection::Grooming, store).await
}
