//! Contract row, participant associations and referral links
//!
//! Each sub-step commits on its own; association failures are collected and
//! reported, never raised. Only the contract row itself is load-bearing for
//! the rest of the pipeline.

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::PersistenceWarning;
use crate::models::contract::{Contract, NewContract};
use crate::models::participant::{NewContractParticipant, ParticipantRole, ResolvedParticipant};
use crate::models::referral::NewClientReferrer;
use crate::models::request::{ContractRequest, ParagraphRequest};
use crate::util::dates::parse_contract_date;

pub struct ContractRecordWriter {
    pool: DbPool,
}

impl ContractRecordWriter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist the contract row. Dates are `DD/MM/YYYY`; missing or
    /// malformed values default to today.
    pub async fn create_contract(
        &self,
        request: &ContractRequest,
        contract_number: &str,
    ) -> Result<Contract> {
        let contract_type = request
            .contract_type
            .clone()
            .unwrap_or_else(|| "mortgage".to_string());
        let start_date = parse_contract_date(request.contract_date.as_deref());
        let end_date = parse_contract_date(request.contract_end_date.as_deref());
        let (client_service_type_id, investor_service_type_id) =
            derive_service_type_ids(&request.paragraph_request);

        let now = Local::now().naive_local();
        let new_contract = NewContract {
            id: Uuid::new_v4().to_string(),
            contract_number: contract_number.to_string(),
            contract_type: contract_type.clone(),
            contract_type_id: request.contract_type_id.unwrap_or(1),
            client_service_type_id,
            investor_service_type_id,
            status: "draft".to_string(),
            contract_date: start_date,
            start_date: Some(start_date),
            end_date: Some(end_date),
            title: request.description.clone(),
            description: request.description.clone(),
            template_name: Some(format!("{contract_type}_template.html")),
            version: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let contract = db::db_insert_contract(&self.pool, new_contract).await?;
        info!(contract_id = %contract.id, contract_number, "Contract record created");
        Ok(contract)
    }

    /// Insert one association row per resolved participant, continuing past
    /// individual failures. Returns `(inserted, failures)`.
    pub async fn register_participants(
        &self,
        contract_id: &str,
        participants: &[ResolvedParticipant],
    ) -> (usize, Vec<PersistenceWarning>) {
        let mut inserted = 0;
        let mut failures = Vec::new();

        for participant in participants {
            let now = Local::now().naive_local();
            let row = NewContractParticipant {
                id: Uuid::new_v4().to_string(),
                contract_id: contract_id.to_string(),
                person_id: participant.person_id.clone(),
                company_id: participant.company_id.clone(),
                role: participant.role.as_str().to_string(),
                role_type_id: participant.role.role_type_id(),
                is_primary: participant.is_primary,
                is_active: true,
                created_at: now,
                updated_at: now,
            };

            match db::db_insert_participant(&self.pool, row).await {
                Ok(()) => inserted += 1,
                Err(err) => {
                    warn!(contract_id, role = participant.role.as_str(), error = %err, "Participant association insert failed");
                    failures.push(PersistenceWarning {
                        entity: format!("contract_participant:{}", participant.role.as_str()),
                        index: None,
                        detail: err.to_string(),
                    });
                }
            }
        }

        (inserted, failures)
    }

    /// Derive referral links between resolved clients and resolved
    /// referrers. A client with no storage-level client row is skipped, a
    /// referrer missing from the referrer registry is skipped, and an
    /// existing active pair is never duplicated.
    ///
    /// The link row stores the referrer's person id; the referrer row only
    /// gates existence.
    pub async fn create_referral_links(
        &self,
        participants: &[ResolvedParticipant],
    ) -> (usize, Vec<PersistenceWarning>) {
        let client_person_ids: Vec<&String> = participants
            .iter()
            .filter(|p| p.role == ParticipantRole::Client)
            .filter_map(|p| p.person_id.as_ref())
            .collect();
        let referrer_person_ids: Vec<&String> = participants
            .iter()
            .filter(|p| p.role == ParticipantRole::Referrer)
            .filter_map(|p| p.person_id.as_ref())
            .collect();

        let mut created = 0;
        let mut failures = Vec::new();

        if client_person_ids.is_empty() || referrer_person_ids.is_empty() {
            return (created, failures);
        }

        for client_person_id in &client_person_ids {
            let client_id = match db::db_find_client_by_person(&self.pool, client_person_id).await {
                Ok(Some(client_id)) => client_id,
                Ok(None) => continue,
                Err(err) => {
                    warn!(error = %err, "Client lookup failed during referral derivation");
                    continue;
                }
            };

            for referrer_person_id in &referrer_person_ids {
                let link_result = async {
                    let referrer_exists =
                        db::db_find_referrer_by_person(&self.pool, referrer_person_id)
                            .await?
                            .is_some();
                    if !referrer_exists {
                        return anyhow::Ok(false);
                    }

                    if db::db_active_referral_exists(&self.pool, &client_id, referrer_person_id)
                        .await?
                    {
                        return anyhow::Ok(false);
                    }

                    let now = Local::now().naive_local();
                    db::db_insert_client_referrer(
                        &self.pool,
                        NewClientReferrer {
                            id: Uuid::new_v4().to_string(),
                            client_id: client_id.clone(),
                            referrer_id: (*referrer_person_id).clone(),
                            relation_date: now,
                            is_active: true,
                            created_at: now,
                            updated_at: now,
                        },
                    )
                    .await?;
                    anyhow::Ok(true)
                }
                .await;

                match link_result {
                    Ok(true) => created += 1,
                    Ok(false) => {}
                    Err(err) => failures.push(PersistenceWarning {
                        entity: "client_referrer".to_string(),
                        index: None,
                        detail: err.to_string(),
                    }),
                }
            }
        }

        (created, failures)
    }
}

/// The first `paragraph_request` entry whose role is client supplies the
/// client-side service-type id, the first investor entry the investor-side
/// one; the search stops once both are found.
pub fn derive_service_type_ids(requests: &[ParagraphRequest]) -> (Option<i32>, Option<i32>) {
    let mut client = None;
    let mut investor = None;

    for request in requests {
        match request.person_role.as_str() {
            "client" | "cliente" if client.is_none() => {
                client = service_type_id(&request.contract_type);
            }
            "investor" | "inversionista" if investor.is_none() => {
                investor = service_type_id(&request.contract_type);
            }
            _ => {}
        }
        if client.is_some() && investor.is_some() {
            break;
        }
    }

    (client, investor)
}

fn service_type_id(contract_type: &str) -> Option<i32> {
    match contract_type {
        "juridica" => Some(1),
        "fisica_soltera" => Some(2),
        "fisica_casada" => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: &str, ctype: &str) -> ParagraphRequest {
        ParagraphRequest {
            person_role: role.into(),
            contract_type: ctype.into(),
            section: "identification".into(),
            contract_services: Some("mortgage".into()),
        }
    }

    #[test]
    fn first_matching_entries_supply_type_ids() {
        let requests = vec![
            entry("client", "fisica_soltera"),
            entry("client", "juridica"),
            entry("investor", "juridica"),
            entry("investor", "fisica_casada"),
        ];
        assert_eq!(derive_service_type_ids(&requests), (Some(2), Some(1)));
    }

    #[test]
    fn unknown_types_and_roles_are_ignored() {
        let requests = vec![
            entry("witness", "juridica"),
            entry("client", "desconocida"),
            entry("investor", "fisica_casada"),
        ];
        assert_eq!(derive_service_type_ids(&requests), (None, Some(3)));
    }

    #[test]
    fn empty_request_list_yields_nothing() {
        assert_eq!(derive_service_type_ids(&[]), (None, None));
    }
}
