use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Species {
    #[display("dog")]
    #[serde(rename = "perro")]
    Dog,
    #[display("cat")]
    #[serde(rename = "gato")]
    Cat,
    #[display("bird")]
    #[serde(rename = "ave")]
    Bird,
    #[display("fish")]
    #[serde(rename = "pez")]
    Fish,
    #[default]
    #[display("other")]
    #[serde(rename = "otro")]
    Other,
}

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Gender {
    #[display("male")]
    #[serde(rename = "macho")]
    Male,
    #[default]
    #[display("female")]
    #[serde(rename = "hembra")]
    Female,
}

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum HealthStatus {
    #[display("excellent")]
    #[serde(rename = "excelente")]
    Excellent,
    #[default]
    #[display("good")]
    #[serde(rename = "bueno")]
    Good,
    #[display("regular")]
    #[serde(rename = "regular")]
    Regular,
    #[display("concerning")]
    #[serde(rename = "preocupante")]
    Concerning,
}

/// Pet record as stored in the `pets` collection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub species: Species,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub weight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microchip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub health_status: HealthStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller supplied fields of a new pet
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPet {
    pub name: String,
    pub species: Species,
    pub breed: String,
    pub age: u32,
    pub gender: Gender,
    pub weight: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microchip: Option<String>,
    pub health_status: HealthStatus,
}

/// Partial pet edit, only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<Species>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microchip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_status: Option<HealthStatus>,
}
