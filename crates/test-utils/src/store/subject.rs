//! In-memory subject store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use veridoc_protocol::service::SubjectRecord;

/// In-memory stand-in for the service's relational subject storage.
#[derive(Default, Clone, Debug)]
pub struct SubjectStore {
    subjects: Arc<Mutex<HashMap<String, SubjectRecord>>>,
}

impl SubjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a subject with no verified document yet, returning its id.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    pub fn create(&self, integration_id: &str, email: &str) -> String {
        let mut subjects = self.subjects.lock().expect("should lock");
        let id = format!("subject-{}", subjects.len() + 1);
        subjects.insert(
            id.clone(),
            SubjectRecord {
                id: id.clone(),
                integration_id: integration_id.to_string(),
                email: email.to_string(),
                document_id: None,
            },
        );
        id
    }

    /// Seed an existing subject.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    pub fn add(&self, record: SubjectRecord) {
        self.subjects.lock().expect("should lock").insert(record.id.clone(), record);
    }

    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    #[must_use]
    pub fn find(&self, subject_id: &str) -> Option<SubjectRecord> {
        self.subjects.lock().expect("should lock").get(subject_id).cloned()
    }

    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    #[must_use]
    pub fn find_by_email(&self, integration_id: &str, email: &str) -> Option<SubjectRecord> {
        self.subjects
            .lock()
            .expect("should lock")
            .values()
            .find(|s| s.integration_id == integration_id && s.email == email)
            .cloned()
    }

    /// Record the verified document id on the subject. Returns `false`
    /// when the subject does not exist.
    ///
    /// # Panics
    ///
    /// Panics if the store lock is poisoned.
    pub fn set_document(&self, subject_id: &str, document_id: &str) -> bool {
        let mut subjects = self.subjects.lock().expect("should lock");
        let Some(subject) = subjects.get_mut(subject_id) else {
            return false;
        };
        subject.document_id = Some(document_id.to_string());
        true
    }
}
