//! Nearby pets discovery, backed by the `posts` collection.
//!
//! Distances are the values stored with each post; there is no geospatial
//! lookup.

use super::{live::decode_documents, mutation::MutationGateway};
use crate::{
    consts,
    models::{
        nearby_pet::{NearbyPet, NewNearbyPet},
        user_app::Session,
    },
    repo::{Collection, Direction, ImplDocumentStore, Query},
};

pub async fn post_nearby_pet(
    session: &Session,
    post: NewNearbyPet,
    gateway: &MutationGateway,
) -> anyhow::Result<String> {
    gateway.create(session, Collection::Posts, &post).await
}

/// Posts within `max_distance_km` (10 km when `None`), newest first,
/// optionally restricted to one species
pub async fn get_nearby_pets(
    store: &ImplDocumentStore,
    max_distance_km: Option<f64>,
    species: Option<&str>,
) -> anyhow::Result<Vec<NearbyPet>> {
    let max_distance = max_distance_km.unwrap_or(consts::DEFAULT_NEARBY_RADIUS_KM);
    let query = Query::new().order_by(consts::FIELD_CREATED_AT, Direction::Desc);

    let docs = store.query(Collection::Posts, &query).await?;
    let species = species
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    Ok(decode_documents::<NearbyPet>(Collection::Posts, docs)
        .into_iter()
        .filter(|pet| pet.distance <= max_distance)
        .filter(|pet| {
            species
                .as_deref()
                .is_none_or(|species| pet.species.to_lowercase() == species)
        })
        .collect())
}
