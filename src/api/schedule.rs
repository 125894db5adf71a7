//! # Schedule views
//!
//! Day-relative views over the appointment list delivered by the live
//! appointments collection. Nothing here touches the store; every function
//! takes the full list and the calendar day considered "today".
//!
//! The four status buckets partition the non-cancelled appointments:
//!
//! | bucket   | status                 | date          | order               |
//! |----------|------------------------|---------------|---------------------|
//! | today    | scheduled / reminder   | `== today`    | time ascending      |
//! | upcoming | scheduled / reminder   | `> today`     | date+time ascending |
//! | past due | scheduled / reminder   | `< today`     | date+time descending|
//! | completed| completed              | any           | date+time descending|
//!
//! Cancelled appointments never show up in any bucket. All sorts are stable,
//! appointments sharing date and time keep the order they were delivered in.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::{
    consts,
    models::appointment::{Appointment, AppointmentStatus, AppointmentType},
};

fn sorted_asc(mut list: Vec<Appointment>) -> Vec<Appointment> {
    list.sort_by_key(Appointment::scheduled_at);
    list
}

fn sorted_desc(mut list: Vec<Appointment>) -> Vec<Appointment> {
    list.sort_by(|a, b| b.scheduled_at().cmp(&a.scheduled_at()));
    list
}

fn select(list: &[Appointment], keep: impl Fn(&Appointment) -> bool) -> Vec<Appointment> {
    list.iter().filter(|apt| keep(apt)).cloned().collect()
}

/// Every appointment ordered by date and time
pub fn all_sorted(list: &[Appointment]) -> Vec<Appointment> {
    sorted_asc(list.to_vec())
}

/// Active appointments falling on `today`
pub fn today_appointments(list: &[Appointment], today: NaiveDate) -> Vec<Appointment> {
    sorted_asc(select(list, |apt| {
        apt.status.is_active() && apt.date == today
    }))
}

/// Active appointments after `today` and up to `today + days` inclusive
pub fn next_days(list: &[Appointment], today: NaiveDate, days: i64) -> Vec<Appointment> {
    let until = today + Duration::days(days);

    sorted_asc(select(list, |apt| {
        apt.status.is_active() && apt.date > today && apt.date <= until
    }))
}

/// Active appointments from tomorrow on, soonest first. Today's ones are only
/// listed by [`today_appointments`].
pub fn upcoming(list: &[Appointment], today: NaiveDate) -> Vec<Appointment> {
    sorted_asc(select(list, |apt| {
        apt.status.is_active() && apt.date > today
    }))
}

/// Active appointments whose day already passed, most recently missed first
pub fn past_due(list: &[Appointment], today: NaiveDate) -> Vec<Appointment> {
    sorted_desc(select(list, |apt| {
        apt.status.is_active() && apt.date < today
    }))
}

pub fn completed(list: &[Appointment]) -> Vec<Appointment> {
    sorted_desc(select(list, |apt| {
        apt.status == AppointmentStatus::Completed
    }))
}

/// Calendar day listing, any status
pub fn appointments_on(list: &[Appointment], date: NaiveDate) -> Vec<Appointment> {
    sorted_asc(select(list, |apt| apt.date == date))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletedPreview {
    pub items: Vec<Appointment>,
    /// Entries behind the "show more" action
    pub hidden: usize,
}

pub fn completed_preview(list: &[Appointment], expanded: bool) -> CompletedPreview {
    let mut items = completed(list);
    let total = items.len();

    if !expanded {
        items.truncate(consts::COMPLETED_PREVIEW_LEN);
    }

    CompletedPreview {
        hidden: total - items.len(),
        items,
    }
}

/// Search box plus type and status selectors of the reminders page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub search: Option<String>,
    pub kind: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentFilter {
    pub fn matches(&self, apt: &Appointment) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                apt.pet_name.to_lowercase().contains(&term)
                    || apt.title.to_lowercase().contains(&term)
                    || apt.description.to_lowercase().contains(&term)
            }
        };

        matches_search
            && self.kind.is_none_or(|kind| apt.kind == kind)
            && self.status.is_none_or(|status| apt.status == status)
    }
}

pub fn filter_appointments(list: &[Appointment], filter: &AppointmentFilter) -> Vec<Appointment> {
    select(list, |apt| filter.matches(apt))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CareCategory {
    pub kind: AppointmentType,
    pub preview: Vec<Appointment>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CareSummary {
    /// Only types with at least one appointment
    pub categories: Vec<CareCategory>,
    pub completed: usize,
    pub upcoming: usize,
    pub overdue: usize,
}

/// Per-type overview of the care page. Counters of upcoming and overdue
/// entries only look at scheduled appointments.
pub fn care_summary(list: &[Appointment], today: NaiveDate) -> CareSummary {
    let categories = AppointmentType::ALL
        .iter()
        .filter_map(|kind| {
            let of_kind = select(list, |apt| apt.kind == *kind);
            if of_kind.is_empty() {
                return None;
            }

            Some(CareCategory {
                kind: *kind,
                total: of_kind.len(),
                preview: of_kind
                    .into_iter()
                    .take(consts::CARE_CATEGORY_PREVIEW_LEN)
                    .collect(),
            })
        })
        .collect();

    let scheduled = |apt: &&Appointment| apt.status == AppointmentStatus::Scheduled;

    CareSummary {
        categories,
        completed: list
            .iter()
            .filter(|apt| apt.status == AppointmentStatus::Completed)
            .count(),
        upcoming: list
            .iter()
            .filter(scheduled)
            .filter(|apt| apt.date >= today)
            .count(),
        overdue: list
            .iter()
            .filter(scheduled)
            .filter(|apt| apt.date < today)
            .count(),
    }
}

/// Every dashboard bucket computed from one delivered list
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppointmentBuckets {
    pub today: Vec<Appointment>,
    pub next_days: Vec<Appointment>,
    pub upcoming: Vec<Appointment>,
    pub past_due: Vec<Appointment>,
    pub completed: Vec<Appointment>,
}

impl AppointmentBuckets {
    pub fn build(list: &[Appointment], today: NaiveDate, window_days: i64) -> Self {
        Self {
            today: today_appointments(list, today),
            next_days: next_days(list, today, window_days),
            upcoming: upcoming(list, today),
            past_due: past_due(list, today),
            completed: completed(list),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, consts::DATE_FORMAT).unwrap()
    }

    fn appointment(
        id: &str,
        day: &str,
        time: &str,
        status: AppointmentStatus,
        kind: AppointmentType,
    ) -> Appointment {
        let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Appointment {
            id: id.into(),
            owner_id: "u1".into(),
            pet_id: "p1".into(),
            pet_name: "Firulais".into(),
            kind,
            title: format!("Cita {id}"),
            description: String::new(),
            date: date(day),
            time: time.into(),
            veterinarian: String::new(),
            status,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    fn scheduled(id: &str, day: &str, time: &str) -> Appointment {
        appointment(id, day, time, AppointmentStatus::Scheduled, AppointmentType::Vet)
    }

    fn ids(list: &[Appointment]) -> Vec<&str> {
        list.iter().map(|apt| apt.id.as_str()).collect()
    }

    fn mixed_list() -> Vec<Appointment> {
        vec![
            scheduled("future", "2024-01-10", "09:00"),
            scheduled("missed", "2024-01-05", "10:00"),
            scheduled("today", "2024-01-08", "12:00"),
            appointment(
                "reminder-today",
                "2024-01-08",
                "08:00",
                AppointmentStatus::Reminder,
                AppointmentType::Medication,
            ),
            appointment(
                "done",
                "2024-01-02",
                "10:00",
                AppointmentStatus::Completed,
                AppointmentType::Vaccine,
            ),
            appointment(
                "cancelled-future",
                "2024-01-09",
                "10:00",
                AppointmentStatus::Cancelled,
                AppointmentType::Grooming,
            ),
            appointment(
                "cancelled-past",
                "2024-01-01",
                "10:00",
                AppointmentStatus::Cancelled,
                AppointmentType::Grooming,
            ),
        ]
    }

    #[test]
    fn test_upcoming_and_past_due_split_around_today() {
        let list = vec![
            scheduled("a", "2024-01-10", "09:00"),
            scheduled("b", "2024-01-05", "10:00"),
            scheduled("c", "2024-01-08", "23:00"),
        ];
        let today = date("2024-01-08");

        assert_eq!(ids(&past_due(&list, today)), vec!["b"]);
        assert_eq!(ids(&upcoming(&list, today)), vec!["a"]);
        assert_eq!(ids(&today_appointments(&list, today)), vec!["c"]);
    }

    #[test]
    fn test_buckets_never_overlap_and_skip_cancelled() {
        let list = mixed_list();
        let buckets = AppointmentBuckets::build(&list, date("2024-01-08"), 7);

        let mut seen = Vec::new();
        for bucket in [
            &buckets.today,
            &buckets.upcoming,
            &buckets.past_due,
            &buckets.completed,
        ] {
            seen.extend(ids(bucket));
        }
        let mut deduped = seen.clone();
        deduped.sort();
        deduped.dedup();

        assert_eq!(seen.len(), deduped.len());
        assert_eq!(seen.len(), 5);
        assert!(!seen.iter().any(|id| id.starts_with("cancelled")));
        assert!(!ids(&buckets.next_days).iter().any(|id| id.starts_with("cancelled")));
        assert_eq!(ids(&buckets.today), vec!["reminder-today", "today"]);
        assert_eq!(ids(&buckets.completed), vec!["done"]);
    }

    #[test]
    fn test_next_days_window() {
        let list = vec![
            scheduled("today", "2024-01-08", "09:00"),
            scheduled("in-7", "2024-01-15", "23:00"),
            scheduled("in-8", "2024-01-16", "00:00"),
            scheduled("in-1", "2024-01-09", "10:00"),
        ];

        let within = next_days(&list, date("2024-01-08"), 7);

        assert_eq!(ids(&within), vec!["in-1", "in-7"]);
    }

    #[test]
    fn test_sorting_is_by_date_and_time_and_stable() {
        let list = vec![
            scheduled("late", "2024-01-10", "18:00"),
            scheduled("early", "2024-01-10", "07:30"),
            scheduled("tie-1", "2024-01-12", "10:00"),
            scheduled("tie-2", "2024-01-12", "10:00"),
        ];

        assert_eq!(
            ids(&upcoming(&list, date("2024-01-08"))),
            vec!["early", "late", "tie-1", "tie-2"]
        );
        assert_eq!(
            ids(&past_due(&list, date("2024-02-01"))),
            vec!["tie-1", "tie-2", "late", "early"]
        );
    }

    #[test]
    fn test_completed_preview_caps_at_five() {
        let list = (1..=7)
            .map(|day| {
                appointment(
                    &format!("c{day}"),
                    &format!("2024-01-0{day}"),
                    "10:00",
                    AppointmentStatus::Completed,
                    AppointmentType::Vet,
                )
            })
            .collect::<Vec<Appointment>>();

        let preview = completed_preview(&list, false);
        assert_eq!(ids(&preview.items), vec!["c7", "c6", "c5", "c4", "c3"]);
        assert_eq!(preview.hidden, 2);

        let expanded = completed_preview(&list, true);
        assert_eq!(expanded.items.len(), 7);
        assert_eq!(expanded.hidden, 0);
    }

    #[test]
    fn test_filter_appointments() {
        let list = mixed_list();

        let by_search = filter_appointments(
            &list,
            &AppointmentFilter {
                search: Some("CITA MISSED".into()),
                ..Default::default()
            },
        );
        assert_eq!(ids(&by_search), vec!["missed"]);

        let by_kind_and_status = filter_appointments(
            &list,
            &AppointmentFilter {
                search: Some("  ".into()),
                kind: Some(AppointmentType::Grooming),
                status: Some(AppointmentStatus::Cancelled),
            },
        );
        assert_eq!(
            ids(&by_kind_and_status),
            vec!["cancelled-future", "cancelled-past"]
        );
    }

    #[test]
    fn test_appointments_on_includes_every_status() {
        let list = mixed_list();

        assert_eq!(
            ids(&appointments_on(&list, date("2024-01-09"))),
            vec!["cancelled-future"]
        );
        assert_eq!(
            ids(&appointments_on(&list, date("2024-01-08"))),
            vec!["reminder-today", "today"]
        );
    }

    #[test]
    fn test_care_summary() {
        let mut list = mixed_list();
        list.extend((0..4).map(|n| {
            appointment(
                &format!("vet-{n}"),
                "2024-02-01",
                "10:00",
                AppointmentStatus::Scheduled,
                AppointmentType::Vet,
            )
        }));

        let summary = care_summary(&list, date("2024-01-08"));

        let vet = summary
            .categories
            .iter()
            .find(|c| c.kind == AppointmentType::Vet)
            .unwrap();
        assert_eq!(vet.total, 7);
        assert_eq!(ids(&vet.preview), vec!["future", "missed", "today"]);
        assert!(
            !summary
                .categories
                .iter()
                .any(|c| c.kind == AppointmentType::Weight)
        );
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.upcoming, 6);
        assert_eq!(summary.overdue, 1);
    }
}
