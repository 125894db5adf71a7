use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Discovery post from the `posts` collection.
///
/// `distance` is whatever the poster stored; no geodesic computation happens
/// on read.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPet {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub last_seen: String,
    #[serde(default)]
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNearbyPet {
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age: u32,
    pub owner: String,
    pub distance: f64,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub description: String,
    pub rating: f64,
    pub coordinates: Coordinates,
    pub last_seen: String,
    pub is_online: bool,
}
