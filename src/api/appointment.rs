//! Appointments and reminders of the signed-in owner.

use chrono::NaiveTime;
use serde_json::json;
use tokio::sync::watch;

use super::{
    errors::UserError,
    live::{LiveCollection, decode_documents},
    mutation::MutationGateway,
    session::SessionState,
};
use crate::{
    consts,
    models::{
        appointment::{
            Appointment, AppointmentChanges, AppointmentForm, AppointmentStatus, NewAppointment,
        },
        pet::Pet,
        user_app::Session,
    },
    repo::{Collection, Direction, ImplDocumentStore, Query},
};

fn validate_form(form: &AppointmentForm) -> Result<(), UserError> {
    if form.title.trim().is_empty() {
        return Err(UserError::FormInputValueError(
            "El título es obligatorio".into(),
        ));
    }

    if NaiveTime::parse_from_str(&form.time, consts::TIME_FORMAT).is_err() {
        return Err(UserError::FormInputValueError(format!(
            "Hora inválida: {}",
            form.time
        )));
    }

    Ok(())
}

/// Schedules an appointment for `pet`. The pet's current name is copied onto
/// the appointment and is not updated if the pet is renamed later.
pub async fn create_appointment(
    session: &Session,
    pet: &Pet,
    form: AppointmentForm,
    gateway: &MutationGateway,
) -> anyhow::Result<String> {
    validate_form(&form)?;

    if pet.owner_id != session.uid {
        return Err(UserError::NotOwner.into());
    }

    let new_appointment = NewAppointment {
        pet_id: pet.id.clone(),
        pet_name: pet.name.clone(),
        kind: form.kind,
        title: form.title.trim().to_string(),
        description: form.description,
        date: form.date,
        time: form.time,
        veterinarian: form.veterinarian,
        status: form.status,
    };

    gateway
        .create(session, Collection::Appointments, &new_appointment)
        .await
}

pub async fn update_appointment(
    session: &Session,
    appointment_id: &str,
    changes: AppointmentChanges,
    gateway: &MutationGateway,
) -> anyhow::Result<()> {
    gateway
        .update(session, Collection::Appointments, appointment_id, &changes)
        .await
}

/// Marks an appointment completed, cancelled, ...
pub async fn set_appointment_status(
    session: &Session,
    appointment_id: &str,
    status: AppointmentStatus,
    gateway: &MutationGateway,
) -> anyhow::Result<()> {
    gateway
        .update(
            session,
            Collection::Appointments,
            appointment_id,
            &json!({ "status": status }),
        )
        .await
}

pub async fn delete_appointment(
    session: &Session,
    appointment_id: &str,
    gateway: &MutationGateway,
) -> anyhow::Result<()> {
    gateway
        .delete(session, Collection::Appointments, appointment_id)
        .await
}

/// Appointments of the session's identity, by date ascending
pub async fn get_user_appointments(
    session: &Session,
    store: &ImplDocumentStore,
) -> anyhow::Result<Vec<Appointment>> {
    let query = Query::new()
        .where_eq(consts::FIELD_OWNER_ID, session.uid.as_str())
        .order_by("date", Direction::Asc);

    let docs = store.query(Collection::Appointments, &query).await?;

    Ok(decode_documents(Collection::Appointments, docs))
}

pub fn live_appointments(
    store: ImplDocumentStore,
    sessions: watch::Receiver<SessionState>,
) -> LiveCollection<Appointment> {
    LiveCollection::scoped(
        store,
        sessions,
        Collection::Appointments,
        Some(("date", Direction::Asc)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::session::ProfileState,
        models::{
            appointment::AppointmentType,
            pet::{Gender, HealthStatus, Species},
        },
        repo::memory::InMemoryDocumentStore,
    };
    use chrono::{NaiveDate, Utc};
    use std::sync::Arc;

    fn session(uid: &str) -> Session {
        Session {
            uid: uid.into(),
            email: format!("{uid}@correo.com"),
            display_name: None,
        }
    }

    fn pet(owner: &str, name: &str) -> Pet {
        Pet {
            id: format!("pet-{name}"),
            owner_id: owner.into(),
            name: name.into(),
            species: Species::Cat,
            breed: String::new(),
            age: 2,
            gender: Gender::Female,
            weight: "4 kg".into(),
            microchip: None,
            image: None,
            health_status: HealthStatus::Good,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn form(title: &str, day: &str, time: &str) -> AppointmentForm {
        AppointmentForm {
            kind: AppointmentType::Vaccine,
            title: title.into(),
            description: "Refuerzo anual".into(),
            date: NaiveDate::parse_from_str(day, consts::DATE_FORMAT).unwrap(),
            time: time.into(),
            veterinarian: "Dra. López".into(),
            status: AppointmentStatus::Scheduled,
        }
    }

    fn setup() -> (ImplDocumentStore, MutationGateway) {
        let store: ImplDocumentStore = Arc::new(InMemoryDocumentStore::new());
        (store.clone(), MutationGateway::new(store))
    }

    #[tokio::test]
    async fn test_create_copies_pet_name_and_orders_by_date() {
        let (store, gateway) = setup();
        let michi = pet("u1", "Michi");

        create_appointment(&session("u1"), &michi, form("Rabia", "2024-03-01", "10:00"), &gateway)
            .await
            .unwrap();
        create_appointment(&session("u1"), &michi, form("Triple", "2024-02-01", "09:00"), &gateway)
            .await
            .unwrap();

        let appointments = get_user_appointments(&session("u1"), &store).await.unwrap();
        let titles = appointments
            .iter()
            .map(|apt| apt.title.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(titles, vec!["Triple", "Rabia"]);
        assert!(appointments.iter().all(|apt| apt.pet_name == "Michi"));
        assert!(appointments.iter().all(|apt| apt.pet_id == michi.id));
    }

    #[tokio::test]
    async fn test_pet_name_is_not_rewritten_on_rename() {
        let (store, gateway) = setup();
        let mut michi = pet("u1", "Michi");

        create_appointment(&session("u1"), &michi, form("Rabia", "2024-03-01", "10:00"), &gateway)
            .await
            .unwrap();
        michi.name = "Don Michi".into();

        let appointments = get_user_appointments(&session("u1"), &store).await.unwrap();
        assert_eq!(appointments[0].pet_name, "Michi");
        assert_ne!(appointments[0].pet_name, michi.name);
    }

    #[tokio::test]
    async fn test_invalid_forms_and_foreign_pets_are_rejected() {
        let (_, gateway) = setup();

        let err = create_appointment(
            &session("u1"),
            &pet("u1", "Michi"),
            form("", "2024-03-01", "10:00"),
            &gateway,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UserError>(),
            Some(UserError::FormInputValueError(_))
        ));

        let err = create_appointment(
            &session("u1"),
            &pet("u1", "Michi"),
            form("Rabia", "2024-03-01", "25:99"),
            &gateway,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UserError>(),
            Some(UserError::FormInputValueError(_))
        ));

        let err = create_appointment(
            &session("u1"),
            &pet("u2", "Ajeno"),
            form("Rabia", "2024-03-01", "10:00"),
            &gateway,
        )
        .await
        .unwrap_err();
        assert_eq!(err.downcast_ref::<UserError>(), Some(&UserError::NotOwner));
    }

    #[tokio::test]
    async fn test_status_changes_are_delivered_live() {
        let (store, gateway) = setup();
        let (sessions, receiver) = watch::channel(SessionState::Authenticated {
            session: session("u1"),
            profile: ProfileState::Loaded(None),
        });
        let appointments = live_appointments(store, receiver);

        let id = create_appointment(
            &session("u1"),
            &pet("u1", "Michi"),
            form("Rabia", "2024-03-01", "10:00"),
            &gateway,
        )
        .await
        .unwrap();
        appointments
            .wait_until(|state| state.items.len() == 1)
            .await
            .unwrap();

        set_appointment_status(&session("u1"), &id, AppointmentStatus::Completed, &gateway)
            .await
            .unwrap();

        let state = appointments
            .wait_until(|state| {
                state
                    .items
                    .first()
                    .is_some_and(|apt| apt.status == AppointmentStatus::Completed)
            })
            .await
            .unwrap();
        assert_eq!(state.items[0].id, id);

        update_appointment(
            &session("u1"),
            &id,
            AppointmentChanges {
                title: Some("Rabia (refuerzo)".into()),
                ..Default::default()
            },
            &gateway,
        )
        .await
        .unwrap();
        appointments
            .wait_until(|state| {
                state
                    .items
                    .first()
                    .is_some_and(|apt| apt.title == "Rabia (refuerzo)")
            })
            .await
            .unwrap();

        delete_appointment(&session("u1"), &id, &gateway).await.unwrap();
        appointments
            .wait_until(|state| state.items.is_empty())
            .await
            .unwrap();
        drop(sessions);
    }
}
