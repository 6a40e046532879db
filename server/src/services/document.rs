//! Document synthesis
//!
//! Flattens every resolved structure into one flat variable bag, selects a
//! template by contract shape, renders it with tera and writes the artifact
//! plus a metadata snapshot under the contract folder. A render failure
//! removes the partially-created folder and is terminal for the request.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tera::Tera;
use tracing::{error, info};

use crate::error::PipelineError;
use crate::models::request::{ContractRequest, ParticipantBlock};
use crate::services::loan_property::LoanPropertyResult;
use crate::util::amounts::{amount_to_legal_text, amount_to_simple_text, format_amount};
use crate::util::dates::{
    add_months, legal_date_text, month_name, simple_date_text, try_parse_contract_date,
};

const MORTGAGE_TEMPLATE: &str = "mortgage_template.html";
const DEFAULT_TEMPLATE: &str = "default_template.html";
const UNDETERMINED_DATE: &str = "FECHA A DETERMINAR";

/// Everything the synthesizer needs beyond the raw request.
#[derive(Debug, Clone)]
pub struct SynthesisContext {
    pub contract_id: String,
    pub contract_number: String,
    pub generated_at: String,
    pub loan_property: Option<LoanPropertyResult>,
}

/// The rendered artifact and its snapshot.
#[derive(Debug, Clone)]
pub struct DocumentOutput {
    pub filename: String,
    pub path: String,
    pub folder_path: String,
    pub template_used: String,
    pub variables: Map<String, Value>,
}

pub struct DocumentSynthesizer {
    template_dir: PathBuf,
    contracts_dir: PathBuf,
}

impl DocumentSynthesizer {
    pub fn new(template_dir: PathBuf, contracts_dir: PathBuf) -> Self {
        Self {
            template_dir,
            contracts_dir,
        }
    }

    /// Template selection by contract shape: a loan or >= 4 of the six
    /// mortgage indicators selects the mortgage template; a named template
    /// that is missing falls back to the default, then to any available
    /// template; none at all is a terminal error.
    pub fn select_template(&self, request: &ContractRequest) -> Result<String, PipelineError> {
        let wanted = if request.loan.is_some() || request.mortgage_indicator_count() >= 4 {
            MORTGAGE_TEMPLATE.to_string()
        } else {
            request
                .template_name
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string())
        };

        if self.template_dir.join(&wanted).is_file() {
            return Ok(wanted);
        }
        if wanted != DEFAULT_TEMPLATE && self.template_dir.join(DEFAULT_TEMPLATE).is_file() {
            return Ok(DEFAULT_TEMPLATE.to_string());
        }

        // Last resort: first available template, deterministically.
        let mut available: Vec<String> = fs::read_dir(&self.template_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .filter(|name| name.ends_with(".html"))
                    .collect()
            })
            .unwrap_or_default();
        available.sort();

        available
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::TemplateNotFound(wanted))
    }

    /// Render the selected template against the variable bag and persist the
    /// artifact + metadata snapshot. Cleans up the contract folder on
    /// failure.
    pub fn render_and_store(
        &self,
        template_name: &str,
        variables: &Map<String, Value>,
        contract_number: &str,
    ) -> Result<DocumentOutput, PipelineError> {
        let folder_name = format!("contract_{contract_number}");
        let folder = self.contracts_dir.join(&folder_name);
        fs::create_dir_all(folder.join("attachments"))
            .map_err(|e| PipelineError::RenderFailed(format!("cannot create contract folder: {e}")))?;

        match self.render_into(template_name, variables, contract_number, &folder) {
            Ok(output) => Ok(output),
            Err(err) => {
                error!(contract_number, error = %err, "Document synthesis failed, cleaning up folder");
                let _ = fs::remove_dir_all(&folder);
                Err(err)
            }
        }
    }

    fn render_into(
        &self,
        template_name: &str,
        variables: &Map<String, Value>,
        contract_number: &str,
        folder: &Path,
    ) -> Result<DocumentOutput, PipelineError> {
        let glob = format!("{}/*.html", self.template_dir.display());
        let tera = Tera::new(&glob)
            .map_err(|e| PipelineError::RenderFailed(format!("template parse error: {e}")))?;

        let context = tera::Context::from_serialize(Value::Object(variables.clone()))
            .map_err(|e| PipelineError::RenderFailed(format!("context build error: {e}")))?;
        let rendered = tera
            .render(template_name, &context)
            .map_err(|e| PipelineError::RenderFailed(format!("render error: {e}")))?;

        let filename = format!("contract_{contract_number}.html");
        let path = folder.join(&filename);
        fs::write(&path, rendered.as_bytes())
            .map_err(|e| PipelineError::RenderFailed(format!("cannot write document: {e}")))?;

        self.save_metadata(folder, contract_number, variables, template_name, 1)
            .map_err(|e| PipelineError::RenderFailed(format!("cannot write metadata: {e}")))?;

        info!(contract_number, template = template_name, "Contract document generated");

        Ok(DocumentOutput {
            filename,
            path: path.display().to_string(),
            folder_path: folder.display().to_string(),
            template_used: template_name.to_string(),
            variables: variables.clone(),
        })
    }

    fn save_metadata(
        &self,
        folder: &Path,
        contract_number: &str,
        variables: &Map<String, Value>,
        template_used: &str,
        version: i64,
    ) -> std::io::Result<()> {
        let metadata = json!({
            "contract_number": contract_number,
            "template_used": template_used,
            "version": version,
            "storage_type": "local",
            "variables": variables,
        });
        fs::write(
            folder.join("metadata.json"),
            serde_json::to_vec_pretty(&metadata).expect("metadata serializes"),
        )
    }

    /// Re-render an existing contract with updated variables and bump the
    /// snapshot version. Returns the new version.
    pub fn update_document(
        &self,
        contract_number: &str,
        updates: &Map<String, Value>,
    ) -> Result<(DocumentOutput, i64), PipelineError> {
        let folder = self.contracts_dir.join(format!("contract_{contract_number}"));
        let metadata_path = folder.join("metadata.json");
        let raw = fs::read(&metadata_path).map_err(|e| {
            PipelineError::Storage(anyhow::anyhow!(
                "metadata for contract {contract_number} not readable: {e}"
            ))
        })?;
        let metadata: Value = serde_json::from_slice(&raw)
            .map_err(|e| PipelineError::RenderFailed(format!("corrupt metadata: {e}")))?;

        let mut variables = metadata
            .get("variables")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (key, value) in updates {
            variables.insert(key.clone(), value.clone());
        }

        let template_used = metadata
            .get("template_used")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TEMPLATE)
            .to_string();
        let version = metadata.get("version").and_then(Value::as_i64).unwrap_or(1) + 1;

        let glob = format!("{}/*.html", self.template_dir.display());
        let tera = Tera::new(&glob)
            .map_err(|e| PipelineError::RenderFailed(format!("template parse error: {e}")))?;
        let context = tera::Context::from_serialize(Value::Object(variables.clone()))
            .map_err(|e| PipelineError::RenderFailed(format!("context build error: {e}")))?;
        let rendered = tera
            .render(&template_used, &context)
            .map_err(|e| PipelineError::RenderFailed(format!("render error: {e}")))?;

        let filename = format!("contract_{contract_number}.html");
        let path = folder.join(&filename);
        fs::write(&path, rendered.as_bytes())
            .map_err(|e| PipelineError::RenderFailed(format!("cannot write document: {e}")))?;
        self.save_metadata(&folder, contract_number, &variables, &template_used, version)
            .map_err(|e| PipelineError::RenderFailed(format!("cannot write metadata: {e}")))?;

        Ok((
            DocumentOutput {
                filename,
                path: path.display().to_string(),
                folder_path: folder.display().to_string(),
                template_used,
                variables,
            },
            version,
        ))
    }
}

// ============================================================================
// Flattening
// ============================================================================

fn set(bag: &mut Map<String, Value>, key: &str, value: impl Into<Value>) {
    bag.insert(key.to_string(), value.into());
}

/// Uppercased legal full name with normalized spacing.
fn format_full_name(first: &str, middle: Option<&str>, last: &str) -> String {
    [first, middle.unwrap_or(""), last]
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Flatten one participant block into the per-person map exposed to
/// templates.
fn flatten_participant(block: &ParticipantBlock) -> Map<String, Value> {
    let person = &block.person;
    let document = person
        .documents
        .first()
        .or(block.person_document.as_ref())
        .or(block.notary_document.as_ref());
    let address = person.addresses.first().or(block.address.as_ref());

    let mut flat = Map::new();
    set(&mut flat, "first_name", person.first_name.clone());
    set(&mut flat, "last_name", person.last_name.clone());
    set(
        &mut flat,
        "middle_name",
        person.middle_name.clone().unwrap_or_default(),
    );
    set(
        &mut flat,
        "full_name",
        format_full_name(
            &person.first_name,
            person.middle_name.as_deref(),
            &person.last_name,
        ),
    );
    set(
        &mut flat,
        "date_of_birth",
        person.date_of_birth.clone().unwrap_or_default(),
    );
    set(&mut flat, "gender", person.gender.clone().unwrap_or_default());
    set(
        &mut flat,
        "nationality",
        person.nationality.clone().unwrap_or_default(),
    );
    set(
        &mut flat,
        "marital_status",
        person.marital_status.clone().unwrap_or_default(),
    );
    set(
        &mut flat,
        "phone_number",
        person.phone_number.clone().unwrap_or_default(),
    );
    set(&mut flat, "email", person.email.clone().unwrap_or_default());

    if let Some(doc) = document {
        set(
            &mut flat,
            "document_type",
            doc.document_type.clone().unwrap_or_default(),
        );
        set(&mut flat, "document_number", doc.document_number.clone());
        set(
            &mut flat,
            "issuing_country",
            doc.issuing_country.clone().unwrap_or_default(),
        );
        set(
            &mut flat,
            "document_issue_date",
            doc.document_issue_date.clone().unwrap_or_default(),
        );
        set(
            &mut flat,
            "document_expiry_date",
            doc.document_expiry_date.clone().unwrap_or_default(),
        );
        if let Some(notary_number) = &doc.notary_number {
            set(&mut flat, "notary_number", notary_number.clone());
        }
    }

    if let Some(addr) = address {
        set(&mut flat, "address_line1", addr.address_line1.clone());
        set(
            &mut flat,
            "address_line2",
            addr.address_line2.clone().unwrap_or_default(),
        );
        set(&mut flat, "city", addr.city.clone().unwrap_or_default());
        set(
            &mut flat,
            "postal_code",
            addr.postal_code.clone().unwrap_or_default(),
        );
    }

    flat
}

fn str_of<'a>(flat: &'a Map<String, Value>, key: &str) -> &'a str {
    flat.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Copy selected fields of a flattened person under a key prefix.
fn project_prefixed(
    bag: &mut Map<String, Value>,
    prefix: &str,
    flat: &Map<String, Value>,
    keys: &[(&str, &str)],
) {
    for (source, target) in keys {
        if let Some(value) = flat.get(*source) {
            bag.insert(format!("{prefix}{target}"), value.clone());
        }
    }
}

const INDEXED_KEYS: [(&str, &str); 6] = [
    ("full_name", "full_name"),
    ("first_name", "first_name"),
    ("last_name", "last_name"),
    ("document_number", "document_number"),
    ("address_line1", "address"),
    ("city", "city"),
];

/// Flatten the whole request plus pipeline context into one flat variable
/// bag for templates and paragraph substitution.
pub fn flatten_request(request: &ContractRequest, ctx: &SynthesisContext) -> Map<String, Value> {
    let mut bag = Map::new();
    let today = chrono::Local::now().date_naive();

    // Contract basics
    set(
        &mut bag,
        "contract_type",
        request.contract_type.clone().unwrap_or_default(),
    );
    set(
        &mut bag,
        "contract_date",
        request
            .contract_date
            .clone()
            .unwrap_or_else(|| legal_date_text(today)),
    );
    set(
        &mut bag,
        "description",
        request.description.clone().unwrap_or_default(),
    );
    set(&mut bag, "contract_id", ctx.contract_id.clone());
    set(&mut bag, "contract_number", ctx.contract_number.clone());
    set(&mut bag, "generated_at", ctx.generated_at.clone());

    // Loan
    if let Some(loan) = &request.loan {
        let currency = loan.currency.clone().unwrap_or_else(|| "USD".to_string());
        set(&mut bag, "loan_amount", format_amount(loan.amount));
        set(&mut bag, "loan_amount_raw", loan.amount);
        set(
            &mut bag,
            "loan_amount_text",
            amount_to_legal_text(loan.amount, &currency),
        );
        set(
            &mut bag,
            "loan_amount_text_simple",
            amount_to_simple_text(loan.amount, &currency),
        );
        set(&mut bag, "loan_currency", currency.clone());
        if let Some(rate) = loan.interest_rate {
            set(&mut bag, "interest_rate", rate);
        }
        if let Some(term) = loan.term_months {
            set(&mut bag, "loan_term_months", term);
        }
        set(
            &mut bag,
            "start_date",
            loan.start_date.clone().unwrap_or_default(),
        );
        set(&mut bag, "end_date", loan.end_date.clone().unwrap_or_default());
        set(
            &mut bag,
            "loan_type",
            loan.loan_type.clone().unwrap_or_default(),
        );

        if let Some(payments) = &loan.loan_payments_details {
            let monthly = payments.monthly_payment.unwrap_or(0.0);
            let fin = payments.final_payment.unwrap_or(0.0);
            set(&mut bag, "monthly_payment", format_amount(monthly));
            set(&mut bag, "monthly_payment_raw", monthly);
            set(
                &mut bag,
                "monthly_payment_text",
                amount_to_legal_text(monthly, &currency),
            );
            set(&mut bag, "final_payment", format_amount(fin));
            set(&mut bag, "final_payment_raw", fin);
            set(
                &mut bag,
                "final_payment_text",
                amount_to_legal_text(fin, &currency),
            );
            if let Some(rate) = payments.discount_rate {
                set(&mut bag, "discount_rate", rate);
            }
            if let Some(quotes) = payments.payment_qty_quotes {
                set(&mut bag, "payment_qty_quotes", quotes);
            }
            set(
                &mut bag,
                "payment_type",
                payments.payment_type.clone().unwrap_or_default(),
            );
        }

        if let Some(bank) = &loan.bank_account {
            set(
                &mut bag,
                "bank_name",
                bank.bank_name.clone().unwrap_or_default(),
            );
            set(
                &mut bag,
                "bank_account_number",
                bank.bank_account_number.clone().unwrap_or_default(),
            );
            set(
                &mut bag,
                "bank_account_type",
                bank.bank_account_type.clone().unwrap_or_default(),
            );
        }
    }

    // Bank account as actually persisted (overrides raw request fields)
    if let Some(bank_result) = ctx
        .loan_property
        .as_ref()
        .and_then(|lp| lp.bank_account_result.as_ref())
        .filter(|r| r.success)
    {
        set(&mut bag, "bank_holder_name", bank_result.holder_name.clone());
        set(&mut bag, "bank_name", bank_result.bank_name.clone());
        set(
            &mut bag,
            "bank_account_number",
            bank_result.account_number.clone(),
        );
        set(
            &mut bag,
            "bank_account_type",
            bank_result.account_type.clone(),
        );
        set(&mut bag, "bank_currency", bank_result.currency.clone());
        if let Some(id) = &bank_result.bank_account_id {
            set(&mut bag, "bank_account_id", id.clone());
        }
    }

    // Properties: first one is primary, the full list stays iterable
    if let Some(prop) = request.properties.first() {
        set(
            &mut bag,
            "property_type",
            prop.property_type.clone().unwrap_or_default(),
        );
        set(
            &mut bag,
            "property_cadastral",
            prop.cadastral_number.clone().unwrap_or_default(),
        );
        set(
            &mut bag,
            "property_title",
            prop.title_number.clone().unwrap_or_default(),
        );
        if let Some(area) = prop.surface_area {
            set(&mut bag, "property_surface_area", area);
        }
        if let Some(area) = prop.covered_area {
            set(&mut bag, "property_covered_area", area);
        }
        set(
            &mut bag,
            "property_address",
            prop.address_line1.clone().unwrap_or_default(),
        );
        set(
            &mut bag,
            "property_address2",
            prop.address_line2.clone().unwrap_or_default(),
        );
        set(
            &mut bag,
            "property_postal_code",
            prop.postal_code.clone().unwrap_or_default(),
        );
        let value = prop.property_value.unwrap_or(0.0);
        set(&mut bag, "property_value", format_amount(value));
        set(&mut bag, "property_value_raw", value);
        set(
            &mut bag,
            "property_currency",
            prop.currency.clone().unwrap_or_else(|| "USD".to_string()),
        );
        set(
            &mut bag,
            "property_description",
            prop.description.clone().unwrap_or_default(),
        );

        let all: Vec<Value> = request
            .properties
            .iter()
            .map(|p| serde_json::to_value(p).unwrap_or(Value::Null))
            .collect();
        set(&mut bag, "all_properties", all);
        set(&mut bag, "properties_count", request.properties.len());
    }

    // Companies and their principal manager
    for (company, prefix) in [
        (request.investor_company.as_ref(), "investor_"),
        (request.client_company.as_ref(), "client_"),
    ] {
        let Some(company) = company else { continue };
        set(
            &mut bag,
            &format!("{prefix}company_name"),
            company.company_name.clone(),
        );
        set(
            &mut bag,
            &format!("{prefix}company_rnc"),
            company.company_rnc.clone().unwrap_or_default(),
        );
        set(
            &mut bag,
            &format!("{prefix}company_mercantil_number"),
            company.company_mercantil_number.clone().unwrap_or_default(),
        );
        set(
            &mut bag,
            &format!("{prefix}company_phone"),
            company.company_phone.clone().unwrap_or_default(),
        );
        set(
            &mut bag,
            &format!("{prefix}company_email"),
            company.company_email.clone().unwrap_or_default(),
        );
        set(
            &mut bag,
            &format!("{prefix}company_type"),
            company.company_type.clone().unwrap_or_default(),
        );
        if let Some(address) = &company.company_address {
            set(
                &mut bag,
                &format!("{prefix}company_address"),
                address.address_line1.clone(),
            );
            set(
                &mut bag,
                &format!("{prefix}company_city"),
                address.city.clone().unwrap_or_default(),
            );
        }
        let main_manager = company
            .company_manager
            .iter()
            .find(|m| m.is_main_manager)
            .or_else(|| company.company_manager.first());
        if let Some(manager) = main_manager {
            set(
                &mut bag,
                &format!("{prefix}manager_name"),
                manager.name.clone(),
            );
            set(
                &mut bag,
                &format!("{prefix}manager_position"),
                manager.position.clone().unwrap_or_default(),
            );
            set(
                &mut bag,
                &format!("{prefix}manager_document_number"),
                manager.document_number.clone().unwrap_or_default(),
            );
            set(
                &mut bag,
                &format!("{prefix}manager_nationality"),
                manager.nationality.clone().unwrap_or_default(),
            );
            set(
                &mut bag,
                &format!("{prefix}manager_marital_status"),
                manager.marital_status.clone().unwrap_or_default(),
            );
            set(
                &mut bag,
                &format!("{prefix}manager_address"),
                manager.address.clone().unwrap_or_default(),
            );
        }
    }

    // Clients: full list, first-occupant fields and indexed fields
    if !request.clients.is_empty() {
        let flats: Vec<Map<String, Value>> =
            request.clients.iter().map(flatten_participant).collect();

        let first = &flats[0];
        set(
            &mut bag,
            "client_name",
            format!("{} {}", str_of(first, "first_name"), str_of(first, "last_name"))
                .trim()
                .to_string(),
        );
        project_prefixed(
            &mut bag,
            "client_",
            first,
            &[
                ("full_name", "full_name"),
                ("first_name", "first_name"),
                ("last_name", "last_name"),
                ("middle_name", "middle_name"),
                ("date_of_birth", "date_of_birth"),
                ("gender", "gender"),
                ("nationality", "nationality"),
                ("marital_status", "marital_status"),
                ("phone_number", "phone"),
                ("email", "email"),
                ("document_type", "document_type"),
                ("document_number", "document_number"),
                ("issuing_country", "issuing_country"),
                ("address_line1", "address"),
                ("address_line2", "address2"),
                ("city", "city"),
                ("postal_code", "postal_code"),
            ],
        );

        for (idx, flat) in flats.iter().enumerate() {
            project_prefixed(&mut bag, &format!("client{}_", idx + 1), flat, &INDEXED_KEYS);
        }

        set(&mut bag, "clients_count", flats.len());
        set(
            &mut bag,
            "clients",
            flats.into_iter().map(Value::Object).collect::<Vec<_>>(),
        );
    }

    // Investors
    if !request.investors.is_empty() {
        let flats: Vec<Map<String, Value>> =
            request.investors.iter().map(flatten_participant).collect();

        let first = &flats[0];
        set(
            &mut bag,
            "investor_name",
            format!("{} {}", str_of(first, "first_name"), str_of(first, "last_name"))
                .trim()
                .to_string(),
        );
        project_prefixed(
            &mut bag,
            "investor_",
            first,
            &[
                ("full_name", "full_name"),
                ("first_name", "first_name"),
                ("last_name", "last_name"),
                ("middle_name", "middle_name"),
                ("marital_status", "marital_status"),
                ("document_number", "document_number"),
                ("address_line1", "address"),
                ("city", "city"),
                ("phone_number", "phone"),
                ("email", "email"),
            ],
        );

        for (idx, flat) in flats.iter().enumerate() {
            project_prefixed(
                &mut bag,
                &format!("investor{}_", idx + 1),
                flat,
                &INDEXED_KEYS,
            );
        }

        set(&mut bag, "investors_count", flats.len());
        set(
            &mut bag,
            "investors",
            flats.into_iter().map(Value::Object).collect::<Vec<_>>(),
        );
    }

    // Witnesses
    if let Some(witness) = request.witnesses.first() {
        let flat = flatten_participant(witness);
        set(
            &mut bag,
            "witness_name",
            format!("{} {}", str_of(&flat, "first_name"), str_of(&flat, "last_name"))
                .trim()
                .to_string(),
        );
        project_prefixed(
            &mut bag,
            "witness_",
            &flat,
            &[
                ("full_name", "full_name"),
                ("first_name", "first_name"),
                ("last_name", "last_name"),
                ("document_number", "document_number"),
                ("address_line1", "address"),
            ],
        );
        set(&mut bag, "witnesses_count", request.witnesses.len());
    }

    // Notaries
    if let Some(notary) = request.notaries.first() {
        let flat = flatten_participant(notary);
        set(
            &mut bag,
            "notary_name",
            format!("{} {}", str_of(&flat, "first_name"), str_of(&flat, "last_name"))
                .trim()
                .to_string(),
        );
        project_prefixed(
            &mut bag,
            "notary_",
            &flat,
            &[
                ("full_name", "full_name"),
                ("first_name", "first_name"),
                ("last_name", "last_name"),
                ("document_number", "document_number"),
                ("address_line1", "address"),
                ("city", "city"),
            ],
        );
        if let Some(license) = flat.get("notary_number") {
            set(&mut bag, "notary_license_number", license.clone());
            set(&mut bag, "notary_number", license.clone());
        }
    }

    // Referrers
    if let Some(referrer) = request.referents.first() {
        let flat = flatten_participant(referrer);
        set(
            &mut bag,
            "referrer_name",
            format!("{} {}", str_of(&flat, "first_name"), str_of(&flat, "last_name"))
                .trim()
                .to_string(),
        );
        project_prefixed(
            &mut bag,
            "referrer_",
            &flat,
            &[("document_number", "document_number")],
        );
    }

    // Dates and legal date text
    set(&mut bag, "current_date", legal_date_text(today));
    set(&mut bag, "current_year", chrono::Datelike::year(&today) as i64);
    set(
        &mut bag,
        "current_month",
        month_name(chrono::Datelike::month(&today)),
    );
    set(
        &mut bag,
        "current_day",
        chrono::Datelike::day(&today) as i64,
    );

    match try_parse_contract_date(request.contract_date.as_deref()) {
        Some(contract_date) => {
            let first_payment = add_months(contract_date, 1);
            set(&mut bag, "loan_start_date_text", legal_date_text(contract_date));
            set(&mut bag, "loan_start_date_simple", simple_date_text(contract_date));
            set(&mut bag, "first_payment_date_text", legal_date_text(first_payment));
            set(
                &mut bag,
                "first_payment_date_simple",
                simple_date_text(first_payment),
            );
        }
        None => {
            for key in [
                "loan_start_date_text",
                "loan_start_date_simple",
                "first_payment_date_text",
                "first_payment_date_simple",
            ] {
                set(&mut bag, key, UNDETERMINED_DATE);
            }
        }
    }

    match try_parse_contract_date(request.contract_end_date.as_deref()) {
        Some(end_date) => {
            set(&mut bag, "last_payment_date_text", legal_date_text(end_date));
            set(&mut bag, "last_payment_date_simple", simple_date_text(end_date));
        }
        None => {
            set(&mut bag, "last_payment_date_text", UNDETERMINED_DATE);
            set(&mut bag, "last_payment_date_simple", UNDETERMINED_DATE);
        }
    }

    // Unrecognized scalar top-level fields pass through verbatim
    for (key, value) in &request.extra {
        if !value.is_object() && !value.is_array() && !bag.contains_key(key) {
            bag.insert(key.clone(), value.clone());
        }
    }

    // Compatibility: company-only contracts read the manager's name where a
    // person name would go.
    if str_of(&bag, "client_full_name").is_empty() {
        if let Some(manager_name) = bag.get("client_manager_name").cloned() {
            bag.insert("client_full_name".to_string(), manager_name);
        }
    }
    if str_of(&bag, "investor_full_name").is_empty() {
        if let Some(manager_name) = bag.get("investor_manager_name").cloned() {
            bag.insert("investor_full_name".to_string(), manager_name);
        }
    }

    bag
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> SynthesisContext {
        SynthesisContext {
            contract_id: "c-1".into(),
            contract_number: "MORTGAGE-2026-000001".into(),
            generated_at: "2026-06-27T12:00:00".into(),
            loan_property: None,
        }
    }

    fn request_from(value: Value) -> ContractRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn flatten_exposes_loan_amount_forms() {
        let request = request_from(json!({
            "contract_type": "mortgage",
            "loan": {"amount": 20000.0, "currency": "USD", "term_months": 12}
        }));
        let bag = flatten_request(&request, &ctx());
        assert_eq!(bag["loan_amount"], json!("20,000.00"));
        assert_eq!(bag["loan_amount_raw"], json!(20000.0));
        assert_eq!(
            bag["loan_amount_text"],
            json!("VEINTE MIL DÓLARES ESTADOUNIDENSES (USD 20,000.00)")
        );
        assert_eq!(bag["loan_term_months"], json!(12));
    }

    #[test]
    fn flatten_builds_first_and_indexed_client_fields() {
        let request = request_from(json!({
            "clients": [
                {
                    "person": {"first_name": "Juan", "middle_name": "A.", "last_name": "Pérez"},
                    "person_document": {"document_type": "Cédula", "document_number": "00112345678"},
                    "address": {"address_line1": "Calle 1", "city": "Santo Domingo"}
                },
                {"person": {"first_name": "María", "last_name": "Gómez"}}
            ]
        }));
        let bag = flatten_request(&request, &ctx());
        assert_eq!(bag["client_full_name"], json!("JUAN A. PÉREZ"));
        assert_eq!(bag["client_document_number"], json!("00112345678"));
        assert_eq!(bag["client1_full_name"], json!("JUAN A. PÉREZ"));
        assert_eq!(bag["client2_full_name"], json!("MARÍA GÓMEZ"));
        assert_eq!(bag["clients_count"], json!(2));
        assert_eq!(bag["client_city"], json!("Santo Domingo"));
    }

    #[test]
    fn flatten_passes_unknown_scalars_through() {
        let request = request_from(json!({
            "contract_type": "services",
            "custom_reference": "ABC-9",
            "nested_ignored": {"a": 1}
        }));
        let bag = flatten_request(&request, &ctx());
        assert_eq!(bag["custom_reference"], json!("ABC-9"));
        assert!(!bag.contains_key("nested_ignored"));
    }

    #[test]
    fn flatten_defaults_payment_dates_when_dates_missing() {
        let request = request_from(json!({}));
        let bag = flatten_request(&request, &ctx());
        assert_eq!(bag["loan_start_date_text"], json!(UNDETERMINED_DATE));
        assert_eq!(bag["last_payment_date_simple"], json!(UNDETERMINED_DATE));
    }

    #[test]
    fn flatten_derives_payment_dates_from_contract_dates() {
        let request = request_from(json!({
            "contract_date": "27/06/2026",
            "contract_end_date": "27/06/2027"
        }));
        let bag = flatten_request(&request, &ctx());
        assert_eq!(bag["loan_start_date_text"], json!("27 de junio de 2026"));
        assert_eq!(bag["first_payment_date_text"], json!("27 de julio de 2026"));
        assert_eq!(bag["last_payment_date_simple"], json!("27/06/2027"));
    }

    #[test]
    fn company_manager_name_backfills_full_name() {
        let request = request_from(json!({
            "client_company": {
                "company_name": "GRUPO REYSA, S.R.L.",
                "company_rnc": "1-3225325-6",
                "company_manager": [
                    {"name": "Pedro Santana", "is_main_manager": true},
                    {"name": "Otro Gerente"}
                ]
            }
        }));
        let bag = flatten_request(&request, &ctx());
        assert_eq!(bag["client_company_name"], json!("GRUPO REYSA, S.R.L."));
        assert_eq!(bag["client_manager_name"], json!("Pedro Santana"));
        assert_eq!(bag["client_full_name"], json!("Pedro Santana"));
    }
}
