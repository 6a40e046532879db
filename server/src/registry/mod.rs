//! Person Registry collaborator
//!
//! The registry creates a person or resolves an existing one:
//! `create_or_reuse(person) -> {person_id, existed}`. The legacy service
//! reports an already-registered person as a *failure* whose payload still
//! carries the person id; this client translates that shape — recognized by
//! the structured error code when present, or by the exact set of observed
//! legacy message substrings — into `RegistryError::Duplicate`. Callers only
//! ever branch on the typed error, never on message text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical person description sent to the registry.
#[derive(Debug, Clone, Serialize)]
pub struct PersonCreateRequest {
    #[serde(rename = "p_first_name")]
    pub first_name: String,
    #[serde(rename = "p_last_name")]
    pub last_name: String,
    #[serde(rename = "p_middle_name")]
    pub middle_name: Option<String>,
    #[serde(rename = "p_date_of_birth")]
    pub date_of_birth: Option<String>,
    #[serde(rename = "p_gender")]
    pub gender: Option<String>,
    #[serde(rename = "p_nationality_country")]
    pub nationality: Option<String>,
    #[serde(rename = "p_marital_status")]
    pub marital_status: Option<String>,
    #[serde(rename = "p_occupation")]
    pub occupation: String,
    #[serde(rename = "p_person_role_id")]
    pub person_role_id: i32,
    #[serde(rename = "p_documents")]
    pub documents: Vec<PersonDocument>,
    #[serde(rename = "p_addresses")]
    pub addresses: Vec<PersonAddress>,
}

impl PersonCreateRequest {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonDocument {
    pub is_primary: bool,
    pub document_type: String,
    pub document_number: String,
    pub issuing_country_id: Option<i32>,
    pub document_issue_date: Option<String>,
    pub document_expiry_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonAddress {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city_id: Option<i32>,
    pub postal_code: Option<String>,
    pub address_type: String,
    pub is_principal: bool,
}

/// Successful resolution: a person id plus whether it pre-existed.
#[derive(Debug, Clone)]
pub struct RegistryOutcome {
    pub person_id: String,
    pub existed: bool,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The person is already registered. When the payload carried the
    /// existing id, the resolver reuses it.
    #[error("person already registered: {message}")]
    Duplicate {
        person_id: Option<String>,
        message: String,
    },
    /// The registry rejected the person (validation or internal error).
    #[error("registry rejected person: {0}")]
    Rejected(String),
    /// The registry could not be reached or returned garbage.
    #[error("registry transport failure: {0}")]
    Transport(String),
}

#[async_trait]
pub trait PersonRegistry: Send + Sync {
    async fn create_or_reuse(
        &self,
        person: &PersonCreateRequest,
    ) -> Result<RegistryOutcome, RegistryError>;
}

/// Error code the registry emits for duplicate persons.
const DUPLICATE_CODE: &str = "DUPLICATE_PERSON";

/// Message substrings observed from the legacy registry. Do not extend this
/// list speculatively; unrecognized failures stay failures.
const LEGACY_DUPLICATE_MARKERS: [&str; 6] = [
    "ya está registrada",
    "already registered",
    "persona ya existe",
    "already exists",
    "duplicate",
    "duplicado",
];

fn is_legacy_duplicate_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    LEGACY_DUPLICATE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[derive(Debug, Deserialize)]
struct RegistryWireResponse {
    #[serde(default)]
    success: bool,
    person_id: Option<String>,
    #[serde(default)]
    person_exists: bool,
    message: Option<String>,
    error_code: Option<String>,
    data: Option<RegistryWireData>,
}

#[derive(Debug, Deserialize)]
struct RegistryWireData {
    person_id: Option<String>,
}

impl RegistryWireResponse {
    fn into_outcome(self) -> Result<RegistryOutcome, RegistryError> {
        if self.success {
            if let Some(person_id) = self.person_id {
                return Ok(RegistryOutcome {
                    person_id,
                    existed: self.person_exists,
                });
            }
            return Err(RegistryError::Transport(
                "registry reported success without a person id".to_string(),
            ));
        }

        let message = self.message.unwrap_or_else(|| "person creation failed".to_string());
        let payload_id = self.data.and_then(|d| d.person_id);

        let duplicate = self.error_code.as_deref() == Some(DUPLICATE_CODE)
            || is_legacy_duplicate_message(&message);
        if duplicate {
            return Err(RegistryError::Duplicate {
                person_id: payload_id,
                message,
            });
        }

        Err(RegistryError::Rejected(message))
    }
}

/// HTTP implementation against the external registry service.
pub struct HttpPersonRegistry {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPersonRegistry {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl PersonRegistry for HttpPersonRegistry {
    async fn create_or_reuse(
        &self,
        person: &PersonCreateRequest,
    ) -> Result<RegistryOutcome, RegistryError> {
        let url = format!("{}/persons/complete", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(person)
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let wire: RegistryWireResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Transport(format!("invalid registry response: {e}")))?;

        wire.into_outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(message: &str, code: Option<&str>, payload_id: Option<&str>) -> RegistryWireResponse {
        RegistryWireResponse {
            success: false,
            person_id: None,
            person_exists: false,
            message: Some(message.to_string()),
            error_code: code.map(String::from),
            data: Some(RegistryWireData {
                person_id: payload_id.map(String::from),
            }),
        }
    }

    #[test]
    fn success_maps_to_outcome() {
        let wire = RegistryWireResponse {
            success: true,
            person_id: Some("p-1".into()),
            person_exists: true,
            message: None,
            error_code: None,
            data: None,
        };
        let outcome = wire.into_outcome().unwrap();
        assert_eq!(outcome.person_id, "p-1");
        assert!(outcome.existed);
    }

    #[test]
    fn structured_code_wins_over_message_text() {
        let err = failure("opaque internal message", Some(DUPLICATE_CODE), Some("p-2"))
            .into_outcome()
            .unwrap_err();
        match err {
            RegistryError::Duplicate { person_id, .. } => {
                assert_eq!(person_id.as_deref(), Some("p-2"));
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[test]
    fn observed_legacy_messages_map_to_duplicate() {
        for message in [
            "La persona ya está registrada",
            "Person already registered",
            "persona ya existe en el sistema",
            "record already exists",
            "duplicate key value",
            "registro duplicado",
        ] {
            let err = failure(message, None, Some("p-3")).into_outcome().unwrap_err();
            assert!(
                matches!(err, RegistryError::Duplicate { .. }),
                "{message} should classify as duplicate"
            );
        }
    }

    #[test]
    fn unrecognized_failures_stay_rejections() {
        let err = failure("document validation failed", None, Some("p-4"))
            .into_outcome()
            .unwrap_err();
        assert!(matches!(err, RegistryError::Rejected(_)));
    }
}
