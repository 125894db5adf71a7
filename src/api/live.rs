//! # Live collections
//!
//! A [`LiveCollection`] keeps the latest decoded result set of a standing
//! query and republishes it as a [`CollectionState`] every time the store
//! delivers a new set.
//!
//! Scoped collections follow the session: the owner filter is bound to the
//! signed-in identity, the previous subscription is cancelled before a new
//! identity is bound, and signing out resets the state to empty so records of
//! a previous identity are never served.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};

use super::session::SessionState;
use crate::repo::{
    Collection, Direction, Document, ImplDocumentStore, LiveQuery, Query, live::Snapshot,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> CollectionState<T> {
    fn loading() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
            error: None,
        }
    }

    fn empty() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

/// Post-processing applied to each delivered set, e.g. client side filters
pub type Refine<T> = Arc<dyn Fn(Vec<T>) -> Vec<T> + Send + Sync>;

/// Decodes delivered documents, skipping (and logging) malformed ones
pub fn decode_documents<T: DeserializeOwned>(collection: Collection, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(
            |doc| match serde_json::from_value::<T>(serde_json::Value::Object(doc)) {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::warn!("skipping malformed document in {collection}: {err}");
                    None
                }
            },
        )
        .collect()
}

pub struct LiveCollection<T> {
    state: watch::Receiver<CollectionState<T>>,
    task: JoinHandle<()>,
}

impl<T> LiveCollection<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Collection readable by everyone, e.g. contacts
    pub fn global(store: ImplDocumentStore, collection: Collection, query: Query) -> Self {
        Self::global_refined(store, collection, query, Arc::new(|items| items))
    }

    pub fn global_refined(
        store: ImplDocumentStore,
        collection: Collection,
        query: Query,
        refine: Refine<T>,
    ) -> Self {
        let (tx, state) = watch::channel(CollectionState::loading());
        let live = store.subscribe(collection, query);
        let task = tokio::spawn(follow_global(live, collection, refine, tx));

        Self { state, task }
    }

    /// Collection filtered by the owner field of `collection`, bound to the
    /// identity published on `sessions`
    pub fn scoped(
        store: ImplDocumentStore,
        sessions: watch::Receiver<SessionState>,
        collection: Collection,
        order_by: Option<(&str, Direction)>,
    ) -> Self {
        let mut query = Query::new();
        if let Some((field, direction)) = order_by {
            query = query.order_by(field, direction);
        }

        let (tx, state) = watch::channel(CollectionState::loading());
        let task = tokio::spawn(follow_session(store, sessions, collection, query, tx));

        Self { state, task }
    }

    pub fn state(&self) -> CollectionState<T> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    pub fn changes(&self) -> watch::Receiver<CollectionState<T>> {
        self.state.clone()
    }

    /// Waits until a published state satisfies `ready`
    pub async fn wait_until(
        &self,
        ready: impl FnMut(&CollectionState<T>) -> bool,
    ) -> anyhow::Result<CollectionState<T>> {
        let mut changes = self.state.clone();
        let state = changes.wait_for(ready).await?;

        Ok(state.clone())
    }

    /// Waits for the first delivered set (or error)
    pub async fn loaded(&self) -> anyhow::Result<CollectionState<T>> {
        self.wait_until(|state| !state.loading).await
    }

    /// Stops following the store; the subscription is cancelled
    pub fn close(&self) {
        self.task.abort();
    }
}

impl<T> Drop for LiveCollection<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn publish<T: DeserializeOwned>(
    tx: &watch::Sender<CollectionState<T>>,
    collection: Collection,
    refine: &Refine<T>,
    snapshot: Snapshot,
) {
    match snapshot {
        Ok(docs) => {
            let items = refine(decode_documents(collection, docs));
            tx.send_replace(CollectionState {
                items,
                loading: false,
                error: None,
            });
        }
        Err(err) => {
            // keep what was already delivered, the subscription stays open
            tx.send_modify(|state| {
                state.loading = false;
                state.error = Some(err.to_string());
            });
        }
    }
}

async fn follow_global<T: DeserializeOwned>(
    mut live: LiveQuery,
    collection: Collection,
    refine: Refine<T>,
    tx: watch::Sender<CollectionState<T>>,
) {
    while let Some(snapshot) = live.next().await {
        publish(&tx, collection, &refine, snapshot);
    }
}

struct Binding {
    uid: String,
    live: Option<LiveQuery>,
}

async fn next_snapshot(binding: &mut Option<Binding>) -> Option<Snapshot> {
    match binding.as_mut().and_then(|binding| binding.live.as_mut()) {
        Some(live) => live.next().await,
        None => std::future::pending().await,
    }
}

async fn follow_session<T: DeserializeOwned>(
    store: ImplDocumentStore,
    mut sessions: watch::Receiver<SessionState>,
    collection: Collection,
    query: Query,
    tx: watch::Sender<CollectionState<T>>,
) {
    let refine: Refine<T> = Arc::new(|items| items);
    let owner_field = collection.owner_field();
    let mut binding: Option<Binding> = None;

    loop {
        let (uid, session_loading) = {
            let state = sessions.borrow_and_update();
            (
                state.uid().map(str::to_string),
                *state == SessionState::Loading,
            )
        };

        match uid {
            None => {
                if let Some(previous) = binding.take() {
                    tracing::debug!("unbinding {collection} from {}", previous.uid);
                }
                match session_loading {
                    true => tx.send_replace(CollectionState::loading()),
                    false => tx.send_replace(CollectionState::empty()),
                };
            }
            Some(uid) if binding.as_ref().map(|b| b.uid.as_str()) != Some(uid.as_str()) => {
                // cancel the previous identity's subscription before binding
                drop(binding.take());
                tx.send_replace(CollectionState::loading());

                let scoped = match owner_field {
                    Some(field) => query.clone().where_eq(field, uid.clone()),
                    None => query.clone(),
                };
                binding = Some(Binding {
                    live: Some(store.subscribe(collection, scoped)),
                    uid,
                });
            }
            Some(_) => {}
        }

        tokio::select! {
            changed = sessions.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            snapshot = next_snapshot(&mut binding) => match snapshot {
                Some(snapshot) => publish(&tx, collection, &refine, snapshot),
                None => {
                    if let Some(binding) = binding.as_mut() {
                        binding.live = None;
                    }
                    tx.send_modify(|state| {
                        state.loading = false;
                        state.error = Some(format!("live query on {collection} closed"));
                    });
                }
            },
        }
    }
}
