//! Pipeline orchestrator
//!
//! Sequences participant resolution, number allocation, record writing,
//! paragraph resolution and document synthesis, merging every error list
//! into one response envelope. Writer steps commit independently; committed
//! steps register a compensation, and the ledger runs in reverse order when
//! a terminal failure strikes after earlier commits. Only two conditions
//! fail the call: zero resolved participants, and a terminal
//! template/render error.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::Settings;
use crate::db::{self, DbPool};
use crate::error::{
    MissingParagraph, ParticipantError, PersistenceWarning, PipelineError, ResolutionSummary,
};
use crate::models::request::ContractRequest;
use crate::registry::PersonRegistry;
use crate::services::contract_writer::ContractRecordWriter;
use crate::services::document::{flatten_request, DocumentSynthesizer, SynthesisContext};
use crate::services::loan_property::{LoanPropertyResult, LoanPropertyWriter};
use crate::services::notifications::{
    notify_contract_generated_nonblocking, NotificationService,
};
use crate::services::numbering::ContractNumberAllocator;
use crate::services::paragraphs::ParagraphResolver;
use crate::services::participants::ParticipantResolver;

/// Committed steps, in commit order. Compensations run newest-first.
#[derive(Debug, Clone, Copy)]
enum Compensation {
    Contract,
    Participants,
    Loans,
    BankAccounts,
    Properties,
}

struct Saga {
    contract_id: String,
    steps: Vec<Compensation>,
}

impl Saga {
    fn new(contract_id: String) -> Self {
        Self {
            contract_id,
            steps: Vec::new(),
        }
    }

    fn record(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    /// Deactivate committed rows in reverse commit order. Compensation is
    /// itself best-effort: a failed step is logged and the rest still run.
    async fn compensate(&self, pool: &DbPool) {
        warn!(contract_id = %self.contract_id, steps = self.steps.len(), "Running saga compensations");
        for step in self.steps.iter().rev() {
            let result = match step {
                Compensation::Contract => db::db_deactivate_contract(pool, &self.contract_id).await,
                Compensation::Participants => {
                    db::db_deactivate_participants(pool, &self.contract_id).await
                }
                Compensation::Loans => db::db_deactivate_loans(pool, &self.contract_id).await,
                Compensation::BankAccounts => {
                    db::db_deactivate_bank_accounts(pool, &self.contract_id).await
                }
                Compensation::Properties => {
                    db::db_deactivate_contract_properties(pool, &self.contract_id).await
                }
            };
            if let Err(err) = result {
                warn!(contract_id = %self.contract_id, ?step, error = %err, "Saga compensation step failed");
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentGeneration {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PersonsDetail {
    pub new_persons: usize,
    pub existing_persons: usize,
    pub reused_persons: usize,
    pub total_successful: usize,
}

#[derive(Debug, Serialize)]
pub struct ProcessedData {
    pub persons_summary: ResolutionSummary,
    pub participants_count: usize,
    pub contract_type: String,
    pub loan_amount: Option<f64>,
    pub properties_count: usize,
    pub document_generation: DocumentGeneration,
    pub loan_property_result: Option<LoanPropertyResult>,
    pub persons_detail: PersonsDetail,
    pub allocation_fallback: bool,
    pub paragraph_warnings: Vec<MissingParagraph>,
}

#[derive(Debug, Serialize)]
pub struct Warnings {
    pub person_errors: Vec<ParticipantError>,
    pub persistence_errors: Vec<PersistenceWarning>,
    pub message: String,
}

/// Response envelope for the generate-complete call.
#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub success: bool,
    pub message: String,
    pub contract_id: String,
    pub contract_number: String,
    pub filename: String,
    pub path: String,
    pub folder_path: String,
    pub template_used: String,
    pub processed_data: ProcessedData,
    pub warnings: Option<Warnings>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
    pub contract_id: String,
    pub version: i32,
    pub updated_fields: Vec<String>,
}

pub struct ContractPipeline {
    pool: DbPool,
    resolver: ParticipantResolver,
    allocator: ContractNumberAllocator,
    writer: ContractRecordWriter,
    loan_property: LoanPropertyWriter,
    paragraphs: ParagraphResolver,
    synthesizer: DocumentSynthesizer,
    notifications: Arc<NotificationService>,
}

impl ContractPipeline {
    pub fn new(pool: DbPool, registry: Arc<dyn PersonRegistry>, settings: &Settings) -> Self {
        Self {
            resolver: ParticipantResolver::new(registry, pool.clone()),
            allocator: ContractNumberAllocator::new(pool.clone()),
            writer: ContractRecordWriter::new(pool.clone()),
            loan_property: LoanPropertyWriter::new(pool.clone()),
            paragraphs: ParagraphResolver::new(pool.clone()),
            synthesizer: DocumentSynthesizer::new(
                settings.template_dir.clone(),
                settings.contracts_dir.clone(),
            ),
            notifications: Arc::new(NotificationService::from_settings(settings)),
            pool,
        }
    }

    pub async fn generate_complete(
        &self,
        request: ContractRequest,
    ) -> Result<PipelineResponse, PipelineError> {
        // 1. Resolve every participant group
        let resolution = self.resolver.resolve_all(&request).await;
        info!(
            total = resolution.summary.total,
            successful = resolution.summary.successful,
            existing = resolution.summary.existing,
            reused = resolution.summary.reused,
            errors = resolution.summary.errors,
            "Participant resolution finished"
        );

        if resolution.is_total_failure() {
            return Err(PipelineError::NoParticipantsResolved {
                errors: resolution.errors,
                summary: resolution.summary,
            });
        }
        if !resolution.errors.is_empty() {
            warn!(
                errors = resolution.errors.len(),
                successful = resolution.summary.successful,
                "Continuing with partially resolved participants"
            );
        }

        // 2. Allocate the contract number
        let contract_type = request
            .contract_type
            .clone()
            .unwrap_or_else(|| "mortgage".to_string());
        let allocated = self.allocator.allocate(&contract_type).await;

        // 3. Contract row (fatal when it fails - nothing to attach to)
        let contract = self
            .writer
            .create_contract(&request, &allocated.number)
            .await?;
        let mut saga = Saga::new(contract.id.clone());
        saga.record(Compensation::Contract);

        // 4. Participant associations, continue-on-error
        let (registered, mut persistence_warnings) = self
            .writer
            .register_participants(&contract.id, &resolution.participants)
            .await;
        if registered > 0 {
            saga.record(Compensation::Participants);
        }

        // 5. Referral links
        let (links_created, referral_warnings) = self
            .writer
            .create_referral_links(&resolution.participants)
            .await;
        if links_created > 0 {
            info!(links_created, "Client-referrer links created");
        }
        persistence_warnings.extend(referral_warnings);

        // 6. Loan, bank account and properties
        let loan_property_result = if request.loan.is_some() || !request.properties.is_empty() {
            let result = self.loan_property.write(&contract.id, &request).await;
            if result.loan_result.as_ref().is_some_and(|r| r.success) {
                saga.record(Compensation::Loans);
            }
            if result
                .bank_account_result
                .as_ref()
                .is_some_and(|r| r.success)
            {
                saga.record(Compensation::BankAccounts);
            }
            if result
                .properties_result
                .as_ref()
                .is_some_and(|r| !r.property_ids.is_empty())
            {
                saga.record(Compensation::Properties);
            }
            collect_loan_property_warnings(&result, &mut persistence_warnings);
            Some(result)
        } else {
            None
        };

        // 7. Flatten and resolve paragraphs against the variable bag
        let ctx = SynthesisContext {
            contract_id: contract.id.clone(),
            contract_number: allocated.number.clone(),
            generated_at: Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S").to_string(),
            loan_property: loan_property_result.clone(),
        };
        let mut bag = flatten_request(&request, &ctx);
        let paragraphs = self.paragraphs.resolve(&request, &bag).await;
        let mut paragraphs_result = Map::new();
        for (key, text) in &paragraphs.variables {
            bag.insert(key.clone(), Value::String(text.clone()));
            paragraphs_result.insert(key.clone(), Value::String(text.clone()));
        }
        bag.insert(
            "paragraphs_result".to_string(),
            Value::Object(paragraphs_result),
        );

        // 8. Select template and render; terminal on failure, with
        // compensations for everything committed so far
        let template_name = match self.synthesizer.select_template(&request) {
            Ok(name) => name,
            Err(err) => {
                saga.compensate(&self.pool).await;
                return Err(err);
            }
        };
        let document = match self
            .synthesizer
            .render_and_store(&template_name, &bag, &allocated.number)
        {
            Ok(document) => document,
            Err(err) => {
                saga.compensate(&self.pool).await;
                return Err(err);
            }
        };

        // 9. Write back the document info
        if let Err(err) = db::db_update_contract_document_info(
            &self.pool,
            &contract.id,
            &document.filename,
            &document.path,
            &document.folder_path,
        )
        .await
        {
            saga.compensate(&self.pool).await;
            return Err(PipelineError::Storage(err));
        }

        // 10. Fire-and-forget notification
        let client_name = bag
            .get("client_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or("Cliente")
            .to_string();
        notify_contract_generated_nonblocking(
            self.notifications.clone(),
            allocated.number.clone(),
            client_name,
            document.path.clone(),
        );

        // 11. Response envelope
        let summary = resolution.summary;
        let warnings = if resolution.errors.is_empty() && persistence_warnings.is_empty() {
            None
        } else {
            Some(Warnings {
                message: format!(
                    "Se procesaron {} personas exitosamente ({} reutilizadas), {} errores reales",
                    summary.successful, summary.reused, summary.errors
                ),
                person_errors: resolution.errors,
                persistence_errors: persistence_warnings,
            })
        };

        Ok(PipelineResponse {
            success: true,
            message: "Contrato completo generado exitosamente".to_string(),
            contract_id: contract.id,
            contract_number: allocated.number,
            filename: document.filename,
            path: document.path,
            folder_path: document.folder_path,
            template_used: document.template_used,
            processed_data: ProcessedData {
                participants_count: resolution.participants.len(),
                contract_type,
                loan_amount: request.loan.as_ref().map(|l| l.amount),
                properties_count: request.properties.len(),
                document_generation: DocumentGeneration {
                    success: true,
                    message: "Contrato generado exitosamente".to_string(),
                },
                loan_property_result,
                persons_detail: PersonsDetail {
                    new_persons: summary
                        .successful
                        .saturating_sub(summary.existing + summary.reused),
                    existing_persons: summary.existing,
                    reused_persons: summary.reused,
                    total_successful: summary.successful,
                },
                allocation_fallback: allocated.fallback,
                paragraph_warnings: paragraphs.warnings,
                persons_summary: summary,
            },
            warnings,
        })
    }

    /// Full update: merge new variables into the stored snapshot, re-render
    /// and bump the contract version.
    pub async fn update_contract(
        &self,
        contract_id: &str,
        updates: Map<String, Value>,
    ) -> Result<UpdateResponse, PipelineError> {
        let contract = db::db_load_contract(&self.pool, contract_id)
            .await
            .map_err(PipelineError::Storage)?;

        let updated_fields: Vec<String> = updates.keys().cloned().collect();
        let (document, _) = self
            .synthesizer
            .update_document(&contract.contract_number, &updates)?;

        db::db_update_contract_document_info(
            &self.pool,
            contract_id,
            &document.filename,
            &document.path,
            &document.folder_path,
        )
        .await
        .map_err(PipelineError::Storage)?;
        let version = db::db_bump_contract_version(&self.pool, contract_id)
            .await
            .map_err(PipelineError::Storage)?;

        Ok(UpdateResponse {
            success: true,
            message: "Contrato actualizado exitosamente".to_string(),
            contract_id: contract_id.to_string(),
            version,
            updated_fields,
        })
    }
}

fn collect_loan_property_warnings(
    result: &LoanPropertyResult,
    warnings: &mut Vec<PersistenceWarning>,
) {
    if let Some(loan) = result.loan_result.as_ref().filter(|r| !r.success) {
        warnings.push(PersistenceWarning {
            entity: "contract_loan".to_string(),
            index: None,
            detail: loan.message.clone(),
        });
    }
    if let Some(bank) = result.bank_account_result.as_ref().filter(|r| !r.success) {
        warnings.push(PersistenceWarning {
            entity: "contract_bank_account".to_string(),
            index: None,
            detail: bank.message.clone(),
        });
    }
    if let Some(properties) = result.properties_result.as_ref() {
        for failure in &properties.errors {
            warnings.push(PersistenceWarning {
                entity: "property".to_string(),
                index: Some(failure.index),
                detail: failure.error.clone(),
            });
        }
    }
}
