//! Participant normalization and resolution
//!
//! Walks every role group of the request document, normalizes each block
//! into a canonical person description, resolves it against the Person
//! Registry and classifies the outcome. Companies resolve against local
//! storage by tax id (RNC). Individual failures never stop the sweep; the
//! pipeline aborts only when nothing at all resolved.

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::{ParticipantError, ResolutionSummary};
use crate::logging::sanitize::sanitize_person_id;
use crate::models::company::{NewCompany, NewCompanyAddress, NewCompanyManager};
use crate::models::participant::{ParticipantRole, Resolution, ResolvedParticipant};
use crate::models::request::{CompanyBlock, ContractRequest, ParticipantBlock};
use crate::registry::{
    PersonAddress, PersonCreateRequest, PersonDocument, PersonRegistry, RegistryError,
};

/// Result of sweeping every participant group.
#[derive(Debug)]
pub struct ResolutionOutcome {
    pub participants: Vec<ResolvedParticipant>,
    pub errors: Vec<ParticipantError>,
    pub summary: ResolutionSummary,
}

impl ResolutionOutcome {
    /// The one hard-failure condition: errors occurred and nothing resolved.
    pub fn is_total_failure(&self) -> bool {
        !self.errors.is_empty() && self.participants.is_empty()
    }
}

/// Normalize one raw participant block into a registry create request.
///
/// Role quirks disappear here: notary blocks carry `p_`-prefixed person
/// fields and a `notary_document`, referrer blocks use bare field names;
/// all of them come out as the same canonical shape. Absent name fields
/// stay empty strings - the registry is the validation authority.
pub fn normalize_participant(
    block: &ParticipantBlock,
    role: ParticipantRole,
) -> PersonCreateRequest {
    let person = &block.person;

    let mut documents: Vec<PersonDocument> = person
        .documents
        .iter()
        .map(|doc| PersonDocument {
            is_primary: doc.is_primary.unwrap_or(true),
            document_type: doc
                .document_type
                .clone()
                .unwrap_or_else(|| "Cédula".to_string()),
            document_number: doc.document_number.clone(),
            issuing_country_id: doc.issuing_country_id,
            document_issue_date: doc.document_issue_date.clone(),
            document_expiry_date: doc.document_expiry_date.clone(),
        })
        .collect();

    if documents.is_empty() {
        if let Some(doc) = block
            .person_document
            .as_ref()
            .or(block.notary_document.as_ref())
        {
            documents.push(PersonDocument {
                is_primary: true,
                document_type: doc
                    .document_type
                    .clone()
                    .unwrap_or_else(|| "Cédula".to_string()),
                document_number: doc.document_number.clone(),
                issuing_country_id: doc.issuing_country_id,
                document_issue_date: doc.document_issue_date.clone(),
                document_expiry_date: doc.document_expiry_date.clone(),
            });
        }
    }

    let mut addresses: Vec<PersonAddress> = person
        .addresses
        .iter()
        .map(|addr| PersonAddress {
            address_line1: addr.address_line1.clone(),
            address_line2: addr.address_line2.clone(),
            city_id: addr.city_id,
            postal_code: addr.postal_code.clone(),
            address_type: addr
                .address_type
                .clone()
                .unwrap_or_else(|| "Casa".to_string()),
            is_principal: addr.is_principal.unwrap_or(true),
        })
        .collect();

    if addresses.is_empty() {
        if let Some(addr) = &block.address {
            addresses.push(PersonAddress {
                address_line1: addr.address_line1.clone(),
                address_line2: addr.address_line2.clone(),
                city_id: addr.city_id,
                postal_code: addr.postal_code.clone(),
                address_type: addr
                    .address_type
                    .clone()
                    .unwrap_or_else(|| "Casa".to_string()),
                is_principal: addr.is_principal.unwrap_or(true),
            });
        }
    }

    PersonCreateRequest {
        first_name: person.first_name.clone(),
        last_name: person.last_name.clone(),
        middle_name: person.middle_name.clone(),
        date_of_birth: person.date_of_birth.clone(),
        gender: person.gender.clone(),
        nationality: person.nationality.clone(),
        marital_status: person.marital_status.clone(),
        occupation: person
            .occupation
            .clone()
            .unwrap_or_else(|| role.default_occupation().to_string()),
        person_role_id: person.person_role_id.unwrap_or_else(|| role.role_type_id()),
        documents,
        addresses,
    }
}

/// Drives the normalizer and the registry across every participant group.
pub struct ParticipantResolver {
    registry: Arc<dyn PersonRegistry>,
    pool: DbPool,
}

impl ParticipantResolver {
    pub fn new(registry: Arc<dyn PersonRegistry>, pool: DbPool) -> Self {
        Self { registry, pool }
    }

    pub async fn resolve_all(&self, request: &ContractRequest) -> ResolutionOutcome {
        let mut participants = Vec::new();
        let mut errors = Vec::new();
        let mut summary = ResolutionSummary::default();

        let groups: [(&[ParticipantBlock], ParticipantRole); 5] = [
            (&request.clients, ParticipantRole::Client),
            (&request.investors, ParticipantRole::Investor),
            (&request.witnesses, ParticipantRole::Witness),
            (&request.notaries, ParticipantRole::Notary),
            (&request.referents, ParticipantRole::Referrer),
        ];

        for (entries, role) in groups {
            for (idx, block) in entries.iter().enumerate() {
                summary.total += 1;
                let person = normalize_participant(block, role);
                let display_name = person.display_name();

                match self.registry.create_or_reuse(&person).await {
                    Ok(outcome) => {
                        let resolution = if outcome.existed {
                            summary.existing += 1;
                            Resolution::Existing
                        } else {
                            Resolution::New
                        };
                        summary.successful += 1;
                        info!(
                            role = role.as_str(),
                            person = %sanitize_person_id(&outcome.person_id),
                            ?resolution,
                            "Participant resolved"
                        );
                        participants.push(ResolvedParticipant::person(
                            role,
                            outcome.person_id,
                            idx == 0,
                            resolution,
                        ));
                    }
                    Err(RegistryError::Duplicate {
                        person_id: Some(person_id),
                        message,
                    }) => {
                        // The registry reported a conflict but handed back the
                        // existing id; reuse it.
                        summary.successful += 1;
                        summary.reused += 1;
                        info!(
                            role = role.as_str(),
                            person = %sanitize_person_id(&person_id),
                            message = %message,
                            "Participant reused after duplicate conflict"
                        );
                        participants.push(ResolvedParticipant::person(
                            role,
                            person_id,
                            idx == 0,
                            Resolution::ReusedAfterConflict,
                        ));
                    }
                    Err(err) => {
                        summary.errors += 1;
                        warn!(role = role.as_str(), index = idx, error = %err, "Participant resolution failed");
                        errors.push(ParticipantError {
                            role: role.as_str().to_string(),
                            index: idx,
                            name: display_name,
                            error: err.to_string(),
                        });
                    }
                }
            }
        }

        let companies = [
            (request.client_company.as_ref(), ParticipantRole::ClientCompany),
            (
                request.investor_company.as_ref(),
                ParticipantRole::InvestorCompany,
            ),
        ];

        for (company, role) in companies {
            let Some(block) = company else { continue };
            // Only process company blocks that actually carry a tax id.
            if block.company_rnc.as_deref().unwrap_or("").is_empty() {
                continue;
            }
            summary.total += 1;
            match self.resolve_company(block).await {
                Ok(company_id) => {
                    summary.successful += 1;
                    info!(role = role.as_str(), company = %sanitize_person_id(&company_id), "Company participant resolved");
                    participants.push(ResolvedParticipant::company(role, company_id));
                }
                Err(err) => {
                    summary.errors += 1;
                    errors.push(ParticipantError {
                        role: role.as_str().to_string(),
                        index: 0,
                        name: block.company_name.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        ResolutionOutcome {
            participants,
            errors,
            summary,
        }
    }

    /// Look up the company by RNC, insert when absent, then persist managers
    /// and the single active address. Manager/address failures degrade to
    /// warnings; the company id is still returned.
    async fn resolve_company(&self, block: &CompanyBlock) -> Result<String> {
        let rnc = block.company_rnc.clone().unwrap_or_default();
        let now = Local::now().naive_local();

        let company_id = match db::db_find_company_by_rnc(&self.pool, &rnc).await? {
            Some(existing) => {
                info!(company = %sanitize_person_id(&existing.id), "Existing company found by RNC");
                existing.id
            }
            None => {
                let new_company = NewCompany {
                    id: Uuid::new_v4().to_string(),
                    company_name: block.company_name.clone(),
                    company_rnc: rnc,
                    mercantil_number: block.company_mercantil_number.clone(),
                    nationality: block
                        .nationality
                        .clone()
                        .or_else(|| Some("Dominicana".to_string())),
                    email: block.company_email.clone(),
                    phone: block.company_phone.clone(),
                    company_type: block.company_type.clone(),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                db::db_insert_company(&self.pool, new_company).await?
            }
        };

        if let Err(err) = self.persist_managers(&company_id, block).await {
            warn!(company = %sanitize_person_id(&company_id), error = %err, "Company manager persistence failed");
        }
        if let Err(err) = self.persist_address(&company_id, block).await {
            warn!(company = %sanitize_person_id(&company_id), error = %err, "Company address persistence failed");
        }

        Ok(company_id)
    }

    async fn persist_managers(&self, company_id: &str, block: &CompanyBlock) -> Result<()> {
        for manager in &block.company_manager {
            let Some(document_number) = manager
                .document_number
                .as_deref()
                .filter(|d| !d.is_empty())
            else {
                warn!(name = %manager.name, "Skipping company manager without document number");
                continue;
            };

            if db::db_company_manager_exists(&self.pool, company_id, document_number).await? {
                continue;
            }

            let now = Local::now().naive_local();
            db::db_insert_company_manager(
                &self.pool,
                NewCompanyManager {
                    id: Uuid::new_v4().to_string(),
                    company_id: company_id.to_string(),
                    full_name: manager.name.clone(),
                    position: manager.position.clone(),
                    address: manager.address.clone(),
                    document_number: document_number.to_string(),
                    nationality: manager.nationality.clone(),
                    civil_status: manager.marital_status.clone(),
                    is_principal: manager.is_main_manager,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await?;
        }
        Ok(())
    }

    async fn persist_address(&self, company_id: &str, block: &CompanyBlock) -> Result<()> {
        let Some(address) = &block.company_address else {
            return Ok(());
        };

        let address_type = address
            .address_type
            .clone()
            .unwrap_or_else(|| "Business".to_string());

        match db::db_find_active_company_address(&self.pool, company_id).await? {
            Some(address_id) => {
                db::db_update_company_address(
                    &self.pool,
                    &address_id,
                    &address.address_line1,
                    address.address_line2.clone(),
                    address.city.clone(),
                    address.postal_code.clone(),
                    &address_type,
                    address.email.clone(),
                    address.phone_number.clone(),
                )
                .await
            }
            None => {
                let now = Local::now().naive_local();
                db::db_insert_company_address(
                    &self.pool,
                    NewCompanyAddress {
                        id: Uuid::new_v4().to_string(),
                        company_id: company_id.to_string(),
                        address_line1: address.address_line1.clone(),
                        address_line2: address.address_line2.clone(),
                        city: address.city.clone(),
                        postal_code: address.postal_code.clone(),
                        address_type,
                        email: address.email.clone(),
                        phone: address.phone_number.clone(),
                        is_principal: true,
                        is_active: true,
                        created_at: now,
                        updated_at: now,
                    },
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::{AddressData, DocumentData, PersonBlock};

    fn block_with_person(person: PersonBlock) -> ParticipantBlock {
        ParticipantBlock {
            person,
            person_document: None,
            notary_document: None,
            address: None,
        }
    }

    #[test]
    fn occupation_defaults_from_role() {
        let block = block_with_person(PersonBlock {
            first_name: "Luis".into(),
            last_name: "Mota".into(),
            ..Default::default()
        });
        let normalized = normalize_participant(&block, ParticipantRole::Witness);
        assert_eq!(normalized.occupation, "Testigo");
        assert_eq!(normalized.person_role_id, 3);
    }

    #[test]
    fn missing_names_stay_empty_strings() {
        let block = block_with_person(PersonBlock::default());
        let normalized = normalize_participant(&block, ParticipantRole::Client);
        assert_eq!(normalized.first_name, "");
        assert_eq!(normalized.last_name, "");
        assert_eq!(normalized.display_name(), "");
    }

    #[test]
    fn block_level_document_used_when_person_has_none() {
        let mut block = block_with_person(PersonBlock {
            first_name: "Rosa".into(),
            last_name: "Peralta".into(),
            ..Default::default()
        });
        block.notary_document = Some(DocumentData {
            document_type: None,
            document_number: "00112345678".into(),
            issuing_country_id: Some(62),
            issuing_country: None,
            document_issue_date: None,
            document_expiry_date: None,
            is_primary: None,
            notary_number: Some("4521".into()),
        });

        let normalized = normalize_participant(&block, ParticipantRole::Notary);
        assert_eq!(normalized.documents.len(), 1);
        assert_eq!(normalized.documents[0].document_type, "Cédula");
        assert!(normalized.documents[0].is_primary);
    }

    #[test]
    fn person_level_addresses_win_over_block_address() {
        let mut block = block_with_person(PersonBlock {
            first_name: "Ana".into(),
            last_name: "Diaz".into(),
            addresses: vec![AddressData {
                address_line1: "Calle Primera 10".into(),
                address_line2: None,
                city_id: Some(5),
                city: None,
                postal_code: None,
                address_type: None,
                is_principal: None,
            }],
            ..Default::default()
        });
        block.address = Some(AddressData {
            address_line1: "Otra calle".into(),
            address_line2: None,
            city_id: None,
            city: None,
            postal_code: None,
            address_type: None,
            is_principal: None,
        });

        let normalized = normalize_participant(&block, ParticipantRole::Client);
        assert_eq!(normalized.addresses.len(), 1);
        assert_eq!(normalized.addresses[0].address_line1, "Calle Primera 10");
        assert_eq!(normalized.addresses[0].address_type, "Casa");
    }
}
