use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use serde_json::{json, Value};

use crate::forms::domain::{FormVariant, RawSubmission, RawTech, SelectedFile};
use crate::forms::schema::{SchemaOptions, SubmissionSchema};
use crate::forms::service::RegistrationService;
use crate::forms::sessions::{
    apply_update, FormId, FormSession, FormSessionRepository, SessionError,
};
use crate::storage::{ObjectStore, StorageError, StoredObject, UploadRequest};

pub(super) const BUCKET: &str = "forms-react";

pub(super) fn schema(variant: FormVariant) -> SubmissionSchema {
    SubmissionSchema::for_variant(variant, &SchemaOptions::default())
}

pub(super) fn tech(title: &str, knowledge: Value) -> RawTech {
    RawTech {
        title: Some(title.to_string()),
        knowledge: Some(knowledge),
    }
}

pub(super) fn avatar() -> SelectedFile {
    SelectedFile::new("ana.png", vec![0x89, b'P', b'N', b'G'])
}

pub(super) fn credentials_input() -> RawSubmission {
    RawSubmission {
        email: Some("Ana@Example.com".to_string()),
        password: Some("segredo".to_string()),
        ..RawSubmission::default()
    }
}

pub(super) fn profile_input() -> RawSubmission {
    RawSubmission {
        name: Some("  ana   silva ".to_string()),
        email: Some("Ana@Rocketseat.com.br".to_string()),
        password: Some("segredo".to_string()),
        ..RawSubmission::default()
    }
}

pub(super) fn portfolio_input() -> RawSubmission {
    RawSubmission {
        name: Some("ana silva".to_string()),
        email: Some("ana@example.com".to_string()),
        password: Some("segredo".to_string()),
        techs: vec![tech("Rust", json!(90)), tech("React", json!("50"))],
        avatar: vec![avatar()],
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySessions {
    sessions: Arc<Mutex<HashMap<FormId, FormSession>>>,
}

impl MemorySessions {
    pub(super) fn len(&self) -> usize {
        self.sessions.lock().expect("session mutex poisoned").len()
    }
}

impl FormSessionRepository for MemorySessions {
    fn insert(&self, session: FormSession) -> Result<FormSession, SessionError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(SessionError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: FormSession) -> Result<(), SessionError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        match guard.get_mut(&session.id) {
            Some(stored) => apply_update(stored, session),
            None => Err(SessionError::NotFound),
        }
    }

    fn fetch(&self, id: &FormId) -> Result<Option<FormSession>, SessionError> {
        Ok(self
            .sessions
            .lock()
            .expect("session mutex poisoned")
            .get(id)
            .cloned())
    }

    fn remove(&self, id: &FormId) -> Result<(), SessionError> {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(SessionError::NotFound)
    }
}

/// Records every upload it receives.
#[derive(Default)]
pub(super) struct RecordingStore {
    uploads: Mutex<Vec<UploadRequest>>,
}

impl RecordingStore {
    pub(super) fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().expect("upload mutex poisoned").clone()
    }
}

impl ObjectStore for RecordingStore {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StorageError> {
        let stored = StoredObject::for_request(&request);
        self.uploads
            .lock()
            .expect("upload mutex poisoned")
            .push(request);
        Ok(stored)
    }
}

/// Always refuses uploads, counting attempts.
#[derive(Default)]
pub(super) struct FailingStore {
    attempts: Mutex<u32>,
}

impl FailingStore {
    pub(super) fn attempts(&self) -> u32 {
        *self.attempts.lock().expect("attempt mutex poisoned")
    }
}

impl ObjectStore for FailingStore {
    async fn upload(&self, _request: UploadRequest) -> Result<StoredObject, StorageError> {
        *self.attempts.lock().expect("attempt mutex poisoned") += 1;
        Err(StorageError::Rejected {
            status: 503,
            body: "bucket offline".to_string(),
        })
    }
}

/// Holds every upload for `delay` before answering, so callers can
/// overlap with it.
pub(super) struct SlowStore {
    delay: Duration,
    fail: bool,
    calls: Mutex<u32>,
}

impl SlowStore {
    pub(super) fn succeeding(delay: Duration) -> Self {
        Self {
            delay,
            fail: false,
            calls: Mutex::new(0),
        }
    }

    pub(super) fn failing(delay: Duration) -> Self {
        Self {
            delay,
            fail: true,
            calls: Mutex::new(0),
        }
    }

    pub(super) fn calls(&self) -> u32 {
        *self.calls.lock().expect("call mutex poisoned")
    }
}

impl ObjectStore for SlowStore {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StorageError> {
        *self.calls.lock().expect("call mutex poisoned") += 1;
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(StorageError::Rejected {
                status: 503,
                body: "bucket offline".to_string(),
            });
        }
        Ok(StoredObject::for_request(&request))
    }
}

pub(super) struct UnavailableSessions;

impl FormSessionRepository for UnavailableSessions {
    fn insert(&self, _session: FormSession) -> Result<FormSession, SessionError> {
        Err(SessionError::Unavailable("session store offline".to_string()))
    }

    fn update(&self, _session: FormSession) -> Result<(), SessionError> {
        Err(SessionError::Unavailable("session store offline".to_string()))
    }

    fn fetch(&self, _id: &FormId) -> Result<Option<FormSession>, SessionError> {
        Err(SessionError::Unavailable("session store offline".to_string()))
    }

    fn remove(&self, _id: &FormId) -> Result<(), SessionError> {
        Err(SessionError::Unavailable("session store offline".to_string()))
    }
}

pub(super) fn build_service() -> (
    RegistrationService<MemorySessions, RecordingStore>,
    MemorySessions,
    Arc<RecordingStore>,
) {
    let sessions = MemorySessions::default();
    let store = Arc::new(RecordingStore::default());
    let service = RegistrationService::new(
        Arc::new(sessions.clone()),
        store.clone(),
        BUCKET,
        SchemaOptions::default(),
    );
    (service, sessions, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
