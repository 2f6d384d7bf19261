use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::ContactSubmission;
use crate::repository::{ContactStore, StoreError};
use crate::validate::{is_valid_email, FieldErrors};

#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("contact validation failed: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn validate_contact(req: &ContactRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if req.name.trim().len() < 2 {
        errors.push("name", "Name must be at least 2 characters long.");
    }
    if !is_valid_email(&req.email) {
        errors.push("email", "Enter a valid email address.");
    }
    if req.subject.trim().is_empty() {
        errors.push("subject", "This field is required.");
    }
    if req.message.trim().len() < 10 {
        errors.push("message", "Message must be at least 10 characters long.");
    }
    errors.into_result()
}

/// Validate and persist a contact-form message. Nothing is persisted on a
/// validation failure; the support notification is the caller's concern.
pub async fn submit_contact(
    contacts: &dyn ContactStore,
    req: &ContactRequest,
    now: DateTime<Utc>,
) -> Result<ContactSubmission, ContactError> {
    validate_contact(req).map_err(ContactError::Validation)?;

    let submission = contacts
        .insert_submission(
            req.name.trim(),
            req.email.trim(),
            req.subject.trim(),
            req.message.trim(),
            now,
        )
        .await?;

    tracing::info!(submission_id = %submission.id, "contact submission stored");
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::repository::ContactStore;

    fn request() -> ContactRequest {
        ContactRequest {
            name: "Amine Ben Salah".to_string(),
            email: "amine@example.com".to_string(),
            subject: "Baggage allowance".to_string(),
            message: "How many bags can I check in on TU100?".to_string(),
        }
    }

    #[tokio::test]
    async fn valid_submission_persists_unresolved() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let submission = submit_contact(&store, &request(), now).await.unwrap();

        assert!(!submission.is_resolved);
        assert_eq!(submission.submitted_at, now);
        assert_eq!(store.list_submissions(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn short_name_and_message_are_rejected() {
        let store = MemoryStore::new();
        let req = ContactRequest {
            name: "Al".to_string(),
            message: "short".to_string(),
            ..request()
        };
        let err = submit_contact(&store, &req, Utc::now()).await.unwrap_err();
        match err {
            ContactError::Validation(errors) => {
                // "Al" trims to exactly 2 chars, which is allowed.
                assert!(!errors.has("name"));
                assert!(errors.has("message"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.list_submissions(None).await.unwrap().is_empty());
    }

    #[test]
    fn trimming_is_applied_before_length_checks() {
        let req = ContactRequest {
            name: " A ".to_string(),
            message: "   padded    ".to_string(),
            ..request()
        };
        let errors = validate_contact(&req).unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("message"));

        let ok = ContactRequest {
            name: "  Al  ".to_string(),
            message: "  exactly ten chars here  ".to_string(),
            ..request()
        };
        assert!(validate_contact(&ok).is_ok());
    }

    #[test]
    fn empty_subject_is_rejected() {
        let req = ContactRequest {
            subject: "   ".to_string(),
            ..request()
        };
        let errors = validate_contact(&req).unwrap_err();
        assert!(errors.has("subject"));
    }
}
