//! Application state: the collaborators wired together once at start-up and
//! passed explicitly to whoever needs them.

use chrono::NaiveDate;
use chrono_tz::Tz;
use std::{path::PathBuf, sync::Arc};

use crate::{
    api::{
        live::LiveCollection, mutation::MutationGateway, schedule::AppointmentBuckets,
        session::SessionProvider,
    },
    config::AppConfig,
    models::{appointment::Appointment, pet::Pet},
    repo::{ImplDocumentStore, sqlite::SqlxDocumentStore},
    services::{
        ImplBlobStorage, ImplIdentityProvider,
        identity::LocalIdentityProvider,
        storage::{LocalStorageHandler, StorageHandler},
    },
    utils,
};

pub struct AppState {
    pub config: AppConfig,
    pub store: ImplDocumentStore,
    pub identity: ImplIdentityProvider,
    pub storage: ImplBlobStorage,
    pub gateway: MutationGateway,
    pub sessions: SessionProvider,
    pub timezone: Tz,
}

impl AppState {
    /// Opens the sqlite database and builds the default collaborators
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = utils::setup_sqlite_db_pool(&config).await?;
        utils::run_migrations(&db_pool).await?;

        let store: ImplDocumentStore = Arc::new(SqlxDocumentStore::new(db_pool.clone()));
        let identity: ImplIdentityProvider =
            Arc::new(LocalIdentityProvider::new(db_pool, store.clone()));
        let storage = setup_storage(&config).await;

        Self::from_parts(config, store, identity, storage)
    }

    /// Must be called inside a tokio runtime
    pub fn from_parts(
        config: AppConfig,
        store: ImplDocumentStore,
        identity: ImplIdentityProvider,
        storage: ImplBlobStorage,
    ) -> anyhow::Result<Self> {
        let timezone = config.timezone()?;

        Ok(Self {
            gateway: MutationGateway::new(store.clone()),
            sessions: SessionProvider::start(identity.clone()),
            config,
            store,
            identity,
            storage,
            timezone,
        })
    }

    pub fn today(&self) -> NaiveDate {
        utils::today_in(self.timezone)
    }

    pub fn live_pets(&self) -> LiveCollection<Pet> {
        crate::api::pet::live_pets(self.store.clone(), self.sessions.changes())
    }

    pub fn live_appointments(&self) -> LiveCollection<Appointment> {
        crate::api::appointment::live_appointments(self.store.clone(), self.sessions.changes())
    }

    pub fn buckets(&self, appointments: &[Appointment]) -> AppointmentBuckets {
        AppointmentBuckets::build(
            appointments,
            self.today(),
            self.config.dashboard_window_days,
        )
    }

    pub fn shutdown(&self) {
        self.sessions.shutdown();
        tracing::info!("app state shut down");
    }
}

async fn setup_storage(config: &AppConfig) -> ImplBlobStorage {
    match &config.storage_bucket {
        Some(bucket) => {
            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.aws_region_name.clone()))
                .load()
                .await;

            Arc::new(StorageHandler {
                client: aws_sdk_s3::Client::new(&aws_config),
                bucket: bucket.clone(),
                region: config.aws_region_name.clone(),
            })
        }
        None => Arc::new(LocalStorageHandler {
            root: PathBuf::from(&config.storage_local_dir),
            public_base_url: config.storage_public_base_url.clone(),
        }),
    }
}
