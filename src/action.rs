//! Command line front end. Every command drives the library the same way a
//! screen of the app would and prints its result as JSON.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};

use crate::{
    api::{
        appointment, contact, health, nearby, pet,
        schedule::{self, AppointmentBuckets, CareSummary, CompletedPreview},
        user,
    },
    app::AppState,
    models::{
        appointment::{AppointmentForm, AppointmentStatus, AppointmentType},
        contact::{ContactType, NewContact},
        health::{GroomingRecord, MedicalRecord, WeightRecord},
        pet::{Gender, HealthStatus, NewPet, Pet, Species},
        user_app::Session,
    },
};

/// Parses the stored tag of an enum, e.g. `perro` or `programada`
fn parse_tag<T: DeserializeOwned>(value: &str) -> Result<T, serde_json::Error> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Args, Debug, Clone)]
pub struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    location: String,
}

#[derive(Args, Debug, Clone)]
pub struct AddPetArgs {
    #[command(flatten)]
    credentials: Credentials,
    #[arg(long)]
    name: String,
    #[arg(long, value_parser = parse_tag::<Species>, default_value = "otro")]
    species: Species,
    #[arg(long, default_value = "")]
    breed: String,
    #[arg(long, default_value_t = 0)]
    age: u32,
    #[arg(long, value_parser = parse_tag::<Gender>, default_value = "hembra")]
    gender: Gender,
    #[arg(long, default_value = "")]
    weight: String,
    #[arg(long)]
    microchip: Option<String>,
    #[arg(long, value_parser = parse_tag::<HealthStatus>, default_value = "bueno")]
    health_status: HealthStatus,
    /// Profile picture to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AddAppointmentArgs {
    #[command(flatten)]
    credentials: Credentials,
    #[arg(long)]
    pet_id: String,
    #[arg(long, value_parser = parse_tag::<AppointmentType>)]
    kind: AppointmentType,
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    /// YYYY-MM-DD
    #[arg(long)]
    date: NaiveDate,
    /// HH:MM
    #[arg(long)]
    time: String,
    #[arg(long, default_value = "")]
    veterinarian: String,
    #[arg(long, value_parser = parse_tag::<AppointmentStatus>, default_value = "programada")]
    status: AppointmentStatus,
}

#[derive(Args, Debug, Clone)]
pub struct SetStatusArgs {
    #[command(flatten)]
    credentials: Credentials,
    #[arg(long)]
    appointment_id: String,
    #[arg(long, value_parser = parse_tag::<AppointmentStatus>)]
    status: AppointmentStatus,
}

#[derive(Args, Debug, Clone)]
pub struct DashboardArgs {
    #[command(flatten)]
    credentials: Credentials,
    /// Show every completed appointment instead of the preview
    #[arg(long)]
    expanded: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    #[command(flatten)]
    credentials: Credentials,
    #[arg(long)]
    pet_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct ContactsArgs {
    #[arg(long, value_parser = parse_tag::<ContactType>)]
    kind: Option<ContactType>,
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct NearbyArgs {
    #[arg(long)]
    max_distance_km: Option<f64>,
    #[arg(long)]
    species: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SeedContactsArgs {
    #[command(flatten)]
    credentials: Credentials,
    /// JSON array of contacts
    #[arg(short, long)]
    file: PathBuf,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Action {
    Register(RegisterArgs),
    AddPet(AddPetArgs),
    AddAppointment(AddAppointmentArgs),
    SetStatus(SetStatusArgs),
    Dashboard(DashboardArgs),
    History(HistoryArgs),
    Contacts(ContactsArgs),
    Nearby(NearbyArgs),
    SeedContacts(SeedContactsArgs),
}

/// Pet care client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct AppArgs {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Serialize)]
struct Dashboard {
    today: NaiveDate,
    pets: Vec<Pet>,
    buckets: AppointmentBuckets,
    completed: CompletedPreview,
    care: CareSummary,
}

#[derive(Serialize)]
struct History {
    medical: Vec<MedicalRecord>,
    weight: Vec<WeightRecord>,
    grooming: Vec<GroomingRecord>,
}

/// Signs in and waits until the session provider reports the identity
async fn sign_in(app: &AppState, credentials: &Credentials) -> anyhow::Result<Session> {
    let session =
        user::login_user(&credentials.email, &credentials.password, &app.identity).await?;

    let mut changes = app.sessions.changes();
    changes
        .wait_for(|state| state.uid() == Some(session.uid.as_str()))
        .await
        .context("session provider stopped")?;

    Ok(session)
}

async fn read_image(path: &Path) -> anyhow::Result<pet::PetImage> {
    let body = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(pet::PetImage { filename, body })
}

impl AppArgs {
    pub async fn run(&self, app: &AppState) -> anyhow::Result<()> {
        match &self.action {
            Action::Register(args) => {
                let request = user::RegisterRequest {
                    email: args.email.clone(),
                    password: args.password.clone(),
                    name: args.name.clone(),
                    location: args.location.clone(),
                };
                let session = user::register_user(request, &app.identity, &app.gateway).await?;

                print_json(&session)
            }
            Action::AddPet(args) => {
                let session = sign_in(app, &args.credentials).await?;
                let image = match &args.image {
                    Some(path) => Some(read_image(path).await?),
                    None => None,
                };
                let new_pet = NewPet {
                    name: args.name.clone(),
                    species: args.species,
                    breed: args.breed.clone(),
                    age: args.age,
                    gender: args.gender,
                    weight: args.weight.clone(),
                    microchip: args.microchip.clone(),
                    health_status: args.health_status,
                };
                let saved =
                    pet::add_new_pet(&session, new_pet, image, &app.gateway, &app.storage).await?;

                print_json(&saved)
            }
            Action::AddAppointment(args) => {
                let session = sign_in(app, &args.credentials).await?;
                let pet = pet::get_pet(&session, &args.pet_id, &app.store)
                    .await?
                    .with_context(|| format!("pet {} not found", args.pet_id))?;
                let form = AppointmentForm {
                    kind: args.kind,
                    title: args.title.clone(),
                    description: args.description.clone(),
                    date: args.date,
                    time: args.time.clone(),
                    veterinarian: args.veterinarian.clone(),
                    status: args.status,
                };
                let id = appointment::create_appointment(&session, &pet, form, &app.gateway).await?;

                print_json(&serde_json::json!({ "id": id }))
            }
            Action::SetStatus(args) => {
                let session = sign_in(app, &args.credentials).await?;
                appointment::set_appointment_status(
                    &session,
                    &args.appointment_id,
                    args.status,
                    &app.gateway,
                )
                .await?;

                print_json(&serde_json::json!({
                    "id": args.appointment_id,
                    "status": args.status,
                }))
            }
            Action::Dashboard(args) => {
                sign_in(app, &args.credentials).await?;

                let pets = app.live_pets();
                let appointments = app.live_appointments();
                let pets = pets.loaded().await?;
                let appointments = appointments.loaded().await?;
                if let Some(err) = pets.error.or(appointments.error) {
                    anyhow::bail!("live collection failed: {err}");
                }

                let today = app.today();
                print_json(&Dashboard {
                    today,
                    pets: pets.items,
                    buckets: app.buckets(&appointments.items),
                    completed: schedule::completed_preview(&appointments.items, args.expanded),
                    care: schedule::care_summary(&appointments.items, today),
                })
            }
            Action::History(args) => {
                let session = sign_in(app, &args.credentials).await?;

                print_json(&History {
                    medical: health::get_pet_medical_records(&session, &args.pet_id, &app.store)
                        .await?,
                    weight: health::get_pet_weight_history(&session, &args.pet_id, &app.store)
                        .await?,
                    grooming: health::get_pet_grooming_history(
                        &session,
                        &args.pet_id,
                        &app.store,
                    )
                    .await?,
                })
            }
            Action::Contacts(ContactsArgs { kind, search }) => {
                let contacts = match search {
                    Some(term) => contact::search_contacts(&app.store, term, *kind).await?,
                    None => contact::get_contacts(&app.store, *kind).await?,
                };

                print_json(&contacts)
            }
            Action::Nearby(NearbyArgs {
                max_distance_km,
                species,
            }) => {
                let pets =
                    nearby::get_nearby_pets(&app.store, *max_distance_km, species.as_deref())
                        .await?;

                print_json(&pets)
            }
            Action::SeedContacts(args) => {
                let session = sign_in(app, &args.credentials).await?;
                let raw = tokio::fs::read_to_string(&args.file)
                    .await
                    .with_context(|| format!("failed to read {}", args.file.display()))?;
                let contacts: Vec<NewContact> = serde_json::from_str(&raw)?;

                let mut ids = Vec::with_capacity(contacts.len());
                for new_contact in contacts {
                    ids.push(contact::add_contact(&session, new_contact, &app.gateway).await?);
                }
                tracing::info!("seeded {} contacts", ids.len());

                print_json(&ids)
            }
        }
    }
}
