//! # Pet API Module
//!
//! Pet management for the signed-in owner: creation with an optional profile
//! picture, edits, removal and the owner scoped reads (one-shot and live).
//!
//! Creating a pet and attaching its picture are two independent writes. When
//! the picture fails the pet is kept without it and the call still succeeds.
//! An uploaded picture that could not be linked to its pet is removed again.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tokio::sync::watch;

use super::{
    errors::UserError,
    live::{LiveCollection, decode_documents},
    mutation::MutationGateway,
    session::SessionState,
};
use crate::{
    consts, metric,
    models::{
        pet::{NewPet, Pet, PetChanges},
        user_app::Session,
    },
    repo::{Collection, Direction, ImplDocumentStore, Query},
    services::ImplBlobStorage,
};

/// Picture picked by the user
#[derive(Debug, Clone)]
pub struct PetImage {
    pub filename: String,
    pub body: Vec<u8>,
}

impl PetImage {
    /// Lower-cased extension, rejected when unsupported or too large
    pub fn checked_extension(&self) -> anyhow::Result<String> {
        let extension = Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !consts::ACCEPTED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            anyhow::bail!("unsupported image extension: {:?}", extension);
        }

        if self.body.len() > consts::PIC_PET_MAX_SIZE_BYTES {
            anyhow::bail!("image of {} bytes is too large", self.body.len());
        }

        Ok(extension)
    }
}

/// Storage path of a pet profile picture
pub fn pet_image_path(owner_id: &str, pet_id: &str, extension: &str) -> String {
    format!(
        "pets/{owner_id}/{pet_id}/profile_image_{}.{extension}",
        Utc::now().timestamp_millis()
    )
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SavedPet {
    pub id: String,
    /// Retrieval URL of the uploaded picture, `None` when none was stored
    pub image: Option<String>,
}

struct UploadedImage {
    path: String,
    url: String,
}

async fn upload_pet_image(
    owner_id: &str,
    pet_id: &str,
    image: PetImage,
    storage: &ImplBlobStorage,
) -> anyhow::Result<UploadedImage> {
    let extension = image.checked_extension()?;
    let path = pet_image_path(owner_id, pet_id, &extension);
    let url = storage.upload(&path, image.body).await?;

    Ok(UploadedImage { path, url })
}

/// Best effort removal of a picture no pet points to
async fn discard_pet_image(path: &str, storage: &ImplBlobStorage) {
    if let Err(err) = storage.delete(path).await {
        tracing::warn!("failed to remove orphaned picture {path}: {err:#}");
    }
}

fn report_image_failure(pet_id: &str, err: &anyhow::Error) {
    tracing::warn!("pet {pet_id} saved without its picture: {err:#}");
    metric::incr_partial_failure_statds("pet_image");
}

fn validate_name(name: &str) -> Result<(), UserError> {
    if name.trim().is_empty() {
        return Err(UserError::FormInputValueError(
            "El nombre de la mascota es obligatorio".into(),
        ));
    }
    Ok(())
}

/// Adds a new pet owned by the session's identity.
///
/// # Process
/// 1. Create the pet record (owner and timestamps set by the gateway)
/// 2. Upload the picture, if any, to `pets/{owner}/{pet}/profile_image_{ms}.{ext}`
/// 3. Store the picture URL on the pet
///
/// Failures in steps 2 or 3 are logged and reported as `image: None`. When
/// step 3 fails the uploaded picture is deleted.
pub async fn add_new_pet(
    session: &Session,
    new_pet: NewPet,
    image: Option<PetImage>,
    gateway: &MutationGateway,
    storage: &ImplBlobStorage,
) -> anyhow::Result<SavedPet> {
    let _span = logfire::span!("add_new_pet").entered();

    validate_name(&new_pet.name)?;
    let id = gateway.create(session, Collection::Pets, &new_pet).await?;

    let Some(image) = image else {
        return Ok(SavedPet { id, image: None });
    };

    let attached = match upload_pet_image(&session.uid, &id, image, storage).await {
        Ok(UploadedImage { path, url }) => match gateway
            .update(session, Collection::Pets, &id, &json!({ "image": url }))
            .await
        {
            Ok(()) => Ok(url),
            Err(err) => {
                discard_pet_image(&path, storage).await;
                Err(err)
            }
        },
        Err(err) => Err(err),
    };

    match attached {
        Ok(url) => Ok(SavedPet {
            id,
            image: Some(url),
        }),
        Err(err) => {
            report_image_failure(&id, &err);
            Ok(SavedPet { id, image: None })
        }
    }
}

/// Edits a pet. A new picture is uploaded first; when that fails the other
/// changes are saved anyway.
pub async fn update_pet(
    session: &Session,
    pet_id: &str,
    mut changes: PetChanges,
    image: Option<PetImage>,
    gateway: &MutationGateway,
    storage: &ImplBlobStorage,
) -> anyhow::Result<SavedPet> {
    let _span = logfire::span!("update_pet").entered();

    if let Some(name) = &changes.name {
        validate_name(name)?;
    }

    let mut uploaded_path = None;
    if let Some(image) = image {
        match upload_pet_image(&session.uid, pet_id, image, storage).await {
            Ok(UploadedImage { path, url }) => {
                uploaded_path = Some(path);
                changes.image = Some(url);
            }
            Err(err) => report_image_failure(pet_id, &err),
        }
    }

    if let Err(err) = gateway
        .update(session, Collection::Pets, pet_id, &changes)
        .await
    {
        if let Some(path) = uploaded_path {
            discard_pet_image(&path, storage).await;
        }
        return Err(err);
    }

    Ok(SavedPet {
        id: pet_id.to_string(),
        image: changes.image,
    })
}

pub async fn delete_pet(
    session: &Session,
    pet_id: &str,
    gateway: &MutationGateway,
) -> anyhow::Result<()> {
    gateway.delete(session, Collection::Pets, pet_id).await
}

fn owner_pets_query(owner_id: &str) -> Query {
    Query::new()
        .where_eq(consts::FIELD_OWNER_ID, owner_id)
        .order_by(consts::FIELD_CREATED_AT, Direction::Desc)
}

/// Pets of the session's identity, newest first
pub async fn get_user_pets(
    session: &Session,
    store: &ImplDocumentStore,
) -> anyhow::Result<Vec<Pet>> {
    let docs = store
        .query(Collection::Pets, &owner_pets_query(&session.uid))
        .await?;

    Ok(decode_documents(Collection::Pets, docs))
}

/// A single pet, `None` when missing or owned by someone else
pub async fn get_pet(
    session: &Session,
    pet_id: &str,
    store: &ImplDocumentStore,
) -> anyhow::Result<Option<Pet>> {
    let Some(doc) = store.get(Collection::Pets, pet_id).await? else {
        return Ok(None);
    };

    let pet: Pet = serde_json::from_value(serde_json::Value::Object(doc))?;
    Ok(Some(pet).filter(|pet| pet.owner_id == session.uid))
}

pub fn live_pets(
    store: ImplDocumentStore,
    sessions: watch::Receiver<SessionState>,
) -> LiveCollection<Pet> {
    LiveCollection::scoped(
        store,
        sessions,
        Collection::Pets,
        Some((consts::FIELD_CREATED_AT, Direction::Desc)),
    )
}
