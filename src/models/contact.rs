use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::Coordinates;

#[derive(Debug, Display, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum ContactType {
    #[display("vet")]
    #[serde(rename = "veterinario")]
    Vet,
    #[display("groomer")]
    #[serde(rename = "peluqueria")]
    Groomer,
    #[display("shop")]
    #[serde(rename = "tienda")]
    Shop,
    #[display("daycare")]
    #[serde(rename = "guarderia")]
    Daycare,
}

/// Pet-service provider, globally readable
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ContactType,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub coordinates: Coordinates,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Case-insensitive match on name, service tags or address
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.to_lowercase();

        self.name.to_lowercase().contains(&term)
            || self
                .services
                .iter()
                .any(|service| service.to_lowercase().contains(&term))
            || self.address.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ContactType,
    pub address: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub coordinates: Coordinates,
}
