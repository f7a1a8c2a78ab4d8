//! New member submission
//!
//! validate → flatten → append once → announce. Validation failures never
//! reach the store; store failures leave the form untouched and announce
//! nothing.

use crate::store::{DirectoryStore, StoreError};
use chrono::Utc;
use sdir_common::events::{DirectoryEvent, EventBus};
use sdir_common::{FormState, MemberForm, NewMemberData, ValidationErrors};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Form has invalid fields; the full error map is attached
    #[error("Please fix all validation errors before submitting")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct SubmissionPipeline {
    store: Arc<dyn DirectoryStore>,
    event_bus: EventBus,
}

impl SubmissionPipeline {
    pub fn new(store: Arc<dyn DirectoryStore>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Submit the form; on success the form is reset
    pub async fn submit(&self, state: &mut FormState) -> Result<(), SubmitError> {
        if !state.validate_all() {
            warn!(
                invalid_fields = state.errors().len(),
                "Submission rejected by validation"
            );
            return Err(SubmitError::Validation(state.errors().clone()));
        }

        let payload = NewMemberData::from(state.form());

        if let Err(e) = self.store.append_record(&payload).await {
            error!(store = self.store.store_id(), error = %e, "Error adding member");
            return Err(e.into());
        }

        info!(name = %payload.name, village = %payload.village, "Member added to directory");
        match self.event_bus.emit(DirectoryEvent::MemberAdded {
            name: payload.name,
            village: payload.village,
            timestamp: Utc::now(),
        }) {
            Ok(listeners) => debug!(listeners, "MemberAdded event sent"),
            Err(_) => debug!("MemberAdded event dropped: no listeners"),
        }

        state.reset();
        Ok(())
    }

    /// Submit a complete form in one call (HTTP path)
    ///
    /// On failure the form is handed back alongside the error.
    pub async fn submit_form(&self, form: MemberForm) -> Result<(), (SubmitError, MemberForm)> {
        let mut state = FormState::from_form(form);
        match self.submit(&mut state).await {
            Ok(()) => Ok(()),
            Err(e) => Err((e, state.form().clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use sdir_common::{FamilyField, FamilyMember, FieldPath};

    fn valid_form() -> MemberForm {
        MemberForm {
            name: "Rajesh Patel".to_string(),
            mobile: "9876543210".to_string(),
            village: "Gandhinagar".to_string(),
            current_address: "Ahmedabad, Gujarat".to_string(),
            ..Default::default()
        }
    }

    fn pipeline(store: Arc<MemoryStore>) -> (SubmissionPipeline, EventBus) {
        let bus = EventBus::new(8);
        (SubmissionPipeline::new(store, bus.clone()), bus)
    }

    #[tokio::test]
    async fn test_blank_family_slots_produce_empty_fields() {
        let store = Arc::new(MemoryStore::default());
        let (pipeline, bus) = pipeline(store.clone());
        let mut rx = bus.subscribe();
        let mut state = FormState::from_form(valid_form());

        pipeline.submit(&mut state).await.unwrap();

        let appended = store.appended().await;
        assert_eq!(appended.len(), 1);
        let json = serde_json::to_value(&appended[0]).unwrap();
        let family: Vec<_> = json
            .as_object()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.starts_with("member"))
            .collect();
        assert_eq!(family.len(), 15);
        assert!(family.iter().all(|(_, v)| v.as_str() == Some("")));
        assert_eq!(json["remark"], "");

        assert_eq!(state, FormState::new());
        assert!(matches!(rx.try_recv(), Ok(DirectoryEvent::MemberAdded { ref name, .. }) if name == "Rajesh Patel"));
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_store_call() {
        let store = Arc::new(MemoryStore::default());
        let (pipeline, _bus) = pipeline(store.clone());
        let form = MemberForm {
            name: "A1!".to_string(),
            mobile: "1234567890".to_string(),
            village: "V".to_string(),
            current_address: "1234".to_string(),
            ..Default::default()
        };
        let mut state = FormState::from_form(form.clone());

        let err = pipeline.submit(&mut state).await.unwrap_err();

        match err {
            SubmitError::Validation(errors) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(store.append_calls(), 0);
        assert_eq!(state.form(), &form);
        assert_eq!(state.errors().len(), 4);
    }

    #[tokio::test]
    async fn test_non_blank_family_slot_is_fully_validated() {
        let store = Arc::new(MemoryStore::default());
        let (pipeline, _bus) = pipeline(store.clone());
        let mut form = valid_form();
        form.member3 = FamilyMember {
            name: "R2".to_string(),
            age: "151".to_string(),
            business_job: "x".repeat(101),
        };
        form.member4 = FamilyMember {
            name: "   ".to_string(),
            ..Default::default()
        };
        let mut state = FormState::from_form(form);

        assert!(pipeline.submit(&mut state).await.is_err());
        assert_eq!(state.errors().len(), 3);
        assert_eq!(
            state.errors().get(&FieldPath::family(3, FamilyField::Age)),
            Some("Age must be a valid number between 0 and 150")
        );
        assert!(state.errors().contains(&FieldPath::family(3, FamilyField::Name)));
        assert!(state.errors().contains(&FieldPath::family(3, FamilyField::BusinessJob)));
        assert!(!state.errors().contains(&FieldPath::family(4, FamilyField::Name)));
        assert_eq!(store.append_calls(), 0);
    }

    #[tokio::test]
    async fn test_append_failure_retains_form_and_emits_nothing() {
        let store = Arc::new(MemoryStore::default());
        store
            .set_append_failure(Some(StoreError::Append("Failed to add member: 500".into())))
            .await;
        let (pipeline, bus) = pipeline(store.clone());
        let mut rx = bus.subscribe();
        let mut state = FormState::from_form(valid_form());

        let err = pipeline.submit(&mut state).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to add member: 500");
        assert_eq!(state.form(), &valid_form());
        assert_eq!(store.append_calls(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submit_form_hands_back_form_on_error() {
        let store = Arc::new(MemoryStore::default());
        let (pipeline, _bus) = pipeline(store);
        let mut form = valid_form();
        form.mobile = "12".to_string();

        let (err, returned) = pipeline.submit_form(form.clone()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(_)));
        assert_eq!(returned, form);
    }
}
