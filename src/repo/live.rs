//! Standing queries over a document store.
//!
//! Every write notifies a [`ChangeFeed`] with the collection it touched. A
//! live query task listens to the feed, re-runs its query and pushes the
//! whole result set whenever it differs from the last one delivered. The task
//! stops as soon as its [`Subscription`] is cancelled or dropped.

use tokio::sync::{broadcast, mpsc, watch};

use super::{Collection, Document, DocumentStore, Query};
use crate::metric;

const CHANGE_FEED_CAPACITY: usize = 256;

/// Snapshot or failure pushed by a live query
pub type Snapshot = anyhow::Result<Vec<Document>>;

#[derive(Clone, Debug)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Collection>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { sender }
    }

    pub fn notify(&self, collection: Collection) {
        // no listeners is fine
        let _ = self.sender.send(collection);
    }

    pub fn listen(&self) -> broadcast::Receiver<Collection> {
        self.sender.subscribe()
    }
}

/// Cancellation handle of a live query.
///
/// `unsubscribe` can be called any number of times; dropping the handle
/// unsubscribes as well.
#[derive(Debug)]
pub struct Subscription {
    cancel: watch::Sender<bool>,
}

impl Subscription {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (cancel, cancelled) = watch::channel(false);
        metric::incr_subscription_statds("open");
        (Self { cancel }, cancelled)
    }

    pub fn unsubscribe(&self) {
        let changed = self.cancel.send_if_modified(|cancelled| {
            if *cancelled {
                return false;
            }
            *cancelled = true;
            true
        });

        if changed {
            metric::incr_subscription_statds("close");
        }
    }

    pub fn is_active(&self) -> bool {
        !*self.cancel.borrow()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Receiving end of a standing query plus its cancellation handle
#[derive(Debug)]
pub struct LiveQuery {
    pub snapshots: mpsc::UnboundedReceiver<Snapshot>,
    pub subscription: Subscription,
}

impl LiveQuery {
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.snapshots.recv().await
    }
}

/// Spawns the task backing a live query on `store`.
pub fn spawn_live_query<S>(
    store: S,
    feed: &ChangeFeed,
    collection: Collection,
    query: Query,
) -> LiveQuery
where
    S: DocumentStore + 'static,
{
    let (subscription, mut cancelled) = Subscription::new();
    let (tx, snapshots) = mpsc::unbounded_channel::<Snapshot>();
    // listen before the first read so no write falls in between
    let mut changes = feed.listen();

    tokio::spawn(async move {
        let mut last: Option<Vec<Document>> = None;
        let mut first = true;

        loop {
            if !first {
                tokio::select! {
                    biased;
                    _ = cancelled.changed() => break,
                    event = changes.recv() => match event {
                        Ok(changed) if changed != collection => continue,
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!("live query on {collection} lagged by {skipped}");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            first = false;

            let result = store.query(collection, &query).await;
            if *cancelled.borrow() {
                break;
            }

            let sent = match result {
                Ok(docs) => {
                    if last.as_ref() == Some(&docs) {
                        continue;
                    }
                    last = Some(docs.clone());
                    tx.send(Ok(docs))
                }
                Err(err) => {
                    tracing::warn!("live query on {collection} failed: {err:#}");
                    metric::incr_subscription_statds("error");
                    // the next good set must be delivered even if unchanged
                    last = None;
                    tx.send(Err(err))
                }
            };

            if sent.is_err() {
                break;
            }
        }
    });

    LiveQuery {
        snapshots,
        subscription,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{MockDocumentStore, memory::InMemoryDocumentStore};
    use serde_json::json;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use tokio::time::timeout;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent_and_stops_delivery() {
        let store = InMemoryDocumentStore::new();
        let mut live = store.subscribe(Collection::Pets, Query::new());

        let initial = live.next().await.unwrap().unwrap();
        assert!(initial.is_empty());

        live.subscription.unsubscribe();
        live.subscription.unsubscribe();
        assert!(!live.subscription.is_active());

        store
            .create(Collection::Pets, doc(json!({"name": "Firulais"})))
            .await
            .unwrap();

        assert!(live.next().await.is_none());
    }

    #[tokio::test]
    async fn test_unrelated_writes_do_not_redeliver() {
        let store = InMemoryDocumentStore::new();
        let mut live = store.subscribe(
            Collection::Pets,
            Query::new().where_eq("ownerId", "u1"),
        );
        assert!(live.next().await.unwrap().unwrap().is_empty());

        store
            .create(Collection::Contacts, doc(json!({"name": "Vet"})))
            .await
            .unwrap();
        store
            .create(Collection::Pets, doc(json!({"name": "Otro", "ownerId": "u2"})))
            .await
            .unwrap();
        store
            .create(Collection::Pets, doc(json!({"name": "Mio", "ownerId": "u1"})))
            .await
            .unwrap();

        let delivered = live.next().await.unwrap().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].get("name"), Some(&json!("Mio")));
    }

    #[tokio::test]
    async fn test_dropping_the_handle_closes_the_stream() {
        let store = InMemoryDocumentStore::new();
        let LiveQuery {
            mut snapshots,
            subscription,
        } = store.subscribe(Collection::Pets, Query::new());
        assert!(snapshots.recv().await.is_some());

        drop(subscription);
        store
            .create(Collection::Pets, doc(json!({"name": "Luna"})))
            .await
            .unwrap();

        assert!(snapshots.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_same_set_is_redelivered_after_a_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut mock_store = MockDocumentStore::new();
        mock_store.expect_query().returning(move |_, _| {
            match counter.fetch_add(1, Ordering::SeqCst) {
                1 => Err(anyhow::anyhow!("unavailable")),
                _ => Ok(vec![doc(json!({"id": "p1", "name": "Firulais"}))]),
            }
        });

        let feed = ChangeFeed::new();
        let mut live = spawn_live_query(mock_store, &feed, Collection::Pets, Query::new());
        assert_eq!(live.next().await.unwrap().unwrap().len(), 1);

        feed.notify(Collection::Pets);
        assert!(live.next().await.unwrap().is_err());

        feed.notify(Collection::Pets);
        let recovered = timeout(Duration::from_secs(2), live.next())
            .await
            .expect("recovered set was not delivered")
            .unwrap()
            .unwrap();
        assert_eq!(recovered[0].get("name"), Some(&json!("Firulais")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
