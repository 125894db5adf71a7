//! Pet-service providers (vets, groomers, shops, daycares).
//!
//! Contacts are global: every user reads the same collection and the client
//! only narrows it down by type or by a search term.

use std::sync::Arc;

use super::{
    live::{LiveCollection, Refine, decode_documents},
    mutation::MutationGateway,
};
use crate::{
    consts,
    models::{
        contact::{Contact, ContactType, NewContact},
        user_app::Session,
    },
    repo::{Collection, Direction, ImplDocumentStore, Query},
};

/// Live contact list ordered by name, optionally narrowed to one type
pub fn live_contacts(store: ImplDocumentStore, kind: Option<ContactType>) -> LiveCollection<Contact> {
    let refine: Refine<Contact> = Arc::new(move |contacts: Vec<Contact>| match kind {
        Some(kind) => contacts
            .into_iter()
            .filter(|contact| contact.kind == kind)
            .collect(),
        None => contacts,
    });

    LiveCollection::global_refined(
        store,
        Collection::Contacts,
        Query::new().order_by("name", Direction::Asc),
        refine,
    )
}

pub async fn get_contacts(
    store: &ImplDocumentStore,
    kind: Option<ContactType>,
) -> anyhow::Result<Vec<Contact>> {
    let mut query = Query::new();
    if let Some(kind) = kind {
        query = query.where_eq("type", serde_json::to_value(kind)?);
    }
    query = query.order_by("name", Direction::Asc);

    let docs = store.query(Collection::Contacts, &query).await?;

    Ok(decode_documents(Collection::Contacts, docs))
}

/// Case-insensitive search on name, services and address. Terms shorter
/// than two characters return the plain listing.
pub async fn search_contacts(
    store: &ImplDocumentStore,
    term: &str,
    kind: Option<ContactType>,
) -> anyhow::Result<Vec<Contact>> {
    let contacts = get_contacts(store, kind).await?;
    let term = term.trim();

    if term.chars().count() < consts::MIN_SEARCH_TERM_LEN {
        return Ok(contacts);
    }

    Ok(contacts
        .into_iter()
        .filter(|contact| contact.matches_term(term))
        .collect())
}

/// Administrative insert; contacts carry no owner
pub async fn add_contact(
    session: &Session,
    contact: NewContact,
    gateway: &MutationGateway,
) -> anyhow::Result<String> {
    gateway.create(session, Collection::Contacts, &contact).await
}
