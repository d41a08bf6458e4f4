use metrics_exporter_prometheus::PrometheusHandle;
use signup_forms::config::{FormConfig, StorageBackend, StorageConfig};
use signup_forms::forms::{
    apply_update, FormId, FormSession, FormSessionRepository, SchemaOptions, SessionError,
};
use signup_forms::storage::{
    FilesystemBucketStore, HttpBucketStore, ObjectStore, StorageError, StoredObject,
    UploadRequest,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryFormSessionRepository {
    sessions: Arc<Mutex<HashMap<FormId, FormSession>>>,
}

impl InMemoryFormSessionRepository {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<FormId, FormSession>>, SessionError> {
        self.sessions
            .lock()
            .map_err(|_| SessionError::Unavailable("session mutex poisoned".to_string()))
    }
}

impl FormSessionRepository for InMemoryFormSessionRepository {
    fn insert(&self, session: FormSession) -> Result<FormSession, SessionError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&session.id) {
            return Err(SessionError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: FormSession) -> Result<(), SessionError> {
        match self.guard()?.get_mut(&session.id) {
            Some(stored) => apply_update(stored, session),
            None => Err(SessionError::NotFound),
        }
    }

    fn fetch(&self, id: &FormId) -> Result<Option<FormSession>, SessionError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn remove(&self, id: &FormId) -> Result<(), SessionError> {
        self.guard()?
            .remove(id)
            .map(|_| ())
            .ok_or(SessionError::NotFound)
    }
}

/// Object store chosen at startup from `STORAGE_BACKEND`.
#[derive(Debug, Clone)]
pub(crate) enum ConfiguredStore {
    Filesystem(FilesystemBucketStore),
    Http(HttpBucketStore),
}

impl ObjectStore for ConfiguredStore {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StorageError> {
        match self {
            ConfiguredStore::Filesystem(store) => store.upload(request).await,
            ConfiguredStore::Http(store) => store.upload(request).await,
        }
    }
}

pub(crate) fn build_store(config: &StorageConfig) -> Result<ConfiguredStore, StorageError> {
    match &config.backend {
        StorageBackend::Filesystem { root } => Ok(ConfiguredStore::Filesystem(
            FilesystemBucketStore::new(root.clone()),
        )),
        StorageBackend::Http { base_url, api_key } => Ok(ConfiguredStore::Http(
            HttpBucketStore::new(base_url, api_key.clone())?,
        )),
    }
}

pub(crate) fn schema_options(config: &FormConfig) -> SchemaOptions {
    SchemaOptions::new(config.email_domain.clone())
}
