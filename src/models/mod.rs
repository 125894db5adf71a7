pub mod appointment;
pub mod contact;
pub mod health;
pub mod nearby_pet;
pub mod pet;
pub mod user_app;

use serde::{Deserialize, Serialize};

/// Geographic point as stored on contacts and posts
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}
