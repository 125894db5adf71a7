use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum AppointmentType {
    #[display("vaccine")]
    #[serde(rename = "vacuna")]
    Vaccine,
    #[default]
    #[display("vet")]
    #[serde(rename = "veterinario")]
    Vet,
    #[display("grooming")]
    #[serde(rename = "peluqueria")]
    Grooming,
    #[display("weight")]
    #[serde(rename = "peso")]
    Weight,
    #[display("medication")]
    #[serde(rename = "medicacion")]
    Medication,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 5] = [
        AppointmentType::Vaccine,
        AppointmentType::Vet,
        AppointmentType::Grooming,
        AppointmentType::Weight,
        AppointmentType::Medication,
    ];
}

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    #[default]
    #[display("scheduled")]
    #[serde(rename = "programada")]
    Scheduled,
    #[display("completed")]
    #[serde(rename = "completada")]
    Completed,
    #[display("cancelled")]
    #[serde(rename = "cancelada")]
    Cancelled,
    #[display("reminder")]
    #[serde(rename = "recordatorio")]
    Reminder,
}

impl AppointmentStatus {
    /// Scheduled and reminder entries still need attention
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled | AppointmentStatus::Reminder
        )
    }
}

/// Care event stored in the `reminders` collection.
///
/// `pet_name` is copied from the pet when the appointment is created and is
/// not rewritten when the pet is renamed later.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub owner_id: String,
    pub pet_id: String,
    #[serde(default)]
    pub pet_name: String,
    #[serde(rename = "type", default)]
    pub kind: AppointmentType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub veterinarian: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Date and time combined; an unreadable time counts as midnight
    pub fn scheduled_at(&self) -> NaiveDateTime {
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&self.time, "%H:%M:%S"))
            .unwrap_or_default();

        self.date.and_time(time)
    }
}

/// Appointment fields entered by the user
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppointmentForm {
    pub kind: AppointmentType,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub veterinarian: String,
    pub status: AppointmentStatus,
}

/// Document payload written on creation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub pet_id: String,
    pub pet_name: String,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub veterinarian: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentChanges {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AppointmentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veterinarian: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
}
