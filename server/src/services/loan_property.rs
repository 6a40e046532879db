//! Loan, bank-account and property persistence
//!
//! A best-effort batch: the loan insert, the optional bank account and each
//! property are attempted independently. A failed property is recorded under
//! its submission index and the batch moves on; it never aborts.

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::models::loan::{BankAccountType, NewBankAccount, NewContractLoan};
use crate::models::property::{NewContractProperty, NewProperty};
use crate::models::request::ContractRequest;

#[derive(Debug, Clone, Serialize)]
pub struct LoanResult {
    pub success: bool,
    pub message: String,
    pub loan_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankAccountResult {
    pub success: bool,
    pub message: String,
    pub bank_account_id: Option<String>,
    pub holder_name: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_type: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedProperty {
    pub property_id: String,
    pub cadastral_number: Option<String>,
    pub title_number: Option<String>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyFailure {
    pub index: usize,
    pub cadastral_number: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertiesResult {
    pub success: bool,
    pub message: String,
    pub property_ids: Vec<String>,
    pub properties: Vec<CreatedProperty>,
    pub errors: Vec<PropertyFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoanPropertyResult {
    pub contract_id: String,
    pub loan_result: Option<LoanResult>,
    pub bank_account_result: Option<BankAccountResult>,
    pub properties_result: Option<PropertiesResult>,
    pub overall_success: bool,
}

pub struct LoanPropertyWriter {
    pool: DbPool,
}

impl LoanPropertyWriter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn write(&self, contract_id: &str, request: &ContractRequest) -> LoanPropertyResult {
        let mut result = LoanPropertyResult {
            contract_id: contract_id.to_string(),
            loan_result: None,
            bank_account_result: None,
            properties_result: None,
            overall_success: false,
        };

        if let Some(loan) = &request.loan {
            let loan_result = self.write_loan(contract_id, request).await;
            if loan.bank_account.is_some() && loan_result.success {
                result.bank_account_result = Some(self.write_bank_account(contract_id, request).await);
            }
            result.loan_result = Some(loan_result);
        }

        if !request.properties.is_empty() {
            result.properties_result = Some(self.write_properties(contract_id, request).await);
        }

        let loan_ok = result
            .loan_result
            .as_ref()
            .map(|r| r.success)
            .unwrap_or(true);
        let properties_ok = result
            .properties_result
            .as_ref()
            .map(|r| r.success)
            .unwrap_or(true);
        result.overall_success = loan_ok && properties_ok;

        result
    }

    async fn write_loan(&self, contract_id: &str, request: &ContractRequest) -> LoanResult {
        let loan = request.loan.as_ref().expect("loan presence checked by caller");
        let payments = loan.loan_payments_details.as_ref();
        let now = Local::now().naive_local();

        let row = NewContractLoan {
            id: Uuid::new_v4().to_string(),
            contract_id: contract_id.to_string(),
            loan_amount: loan.amount,
            currency: loan.currency.clone().unwrap_or_else(|| "USD".to_string()),
            interest_rate: loan.interest_rate,
            term_months: loan.term_months,
            loan_type: loan.loan_type.clone(),
            monthly_payment: payments.and_then(|p| p.monthly_payment),
            final_payment: payments.and_then(|p| p.final_payment),
            discount_rate: payments.and_then(|p| p.discount_rate),
            quote_count: payments.and_then(|p| p.payment_qty_quotes),
            payment_type: payments.and_then(|p| p.payment_type.clone()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        match db::db_insert_loan(&self.pool, row).await {
            Ok(loan_id) => {
                info!(contract_id, loan_id = %loan_id, "Loan created");
                LoanResult {
                    success: true,
                    message: "Loan created successfully".to_string(),
                    loan_id: Some(loan_id),
                }
            }
            Err(err) => {
                warn!(contract_id, error = %err, "Loan insert failed");
                LoanResult {
                    success: false,
                    message: format!("Error creating loan: {err}"),
                    loan_id: None,
                }
            }
        }
    }

    async fn write_bank_account(
        &self,
        contract_id: &str,
        request: &ContractRequest,
    ) -> BankAccountResult {
        let loan = request.loan.as_ref().expect("loan presence checked by caller");
        let bank = loan
            .bank_account
            .as_ref()
            .expect("bank account presence checked by caller");

        let holder_name = resolve_holder_name(request);
        let account_type =
            BankAccountType::normalize(bank.bank_account_type.as_deref().unwrap_or(""));
        let bank_name = bank.bank_name.clone().unwrap_or_default();
        let account_number = bank.bank_account_number.clone().unwrap_or_default();
        let currency = bank
            .bank_account_currency
            .clone()
            .or_else(|| loan.currency.clone())
            .unwrap_or_else(|| "USD".to_string());

        let row = NewBankAccount {
            id: Uuid::new_v4().to_string(),
            contract_id: contract_id.to_string(),
            client_person_id: None,
            holder_name: holder_name.clone(),
            bank_name: bank_name.clone(),
            account_number: account_number.clone(),
            account_type: account_type.as_str().to_string(),
            currency: currency.clone(),
            is_active: true,
            created_at: Local::now().naive_local(),
        };

        match db::db_insert_bank_account(&self.pool, row).await {
            Ok(bank_account_id) => BankAccountResult {
                success: true,
                message: "Bank account created successfully".to_string(),
                bank_account_id: Some(bank_account_id),
                holder_name,
                bank_name,
                account_number,
                account_type: account_type.as_str().to_string(),
                currency,
            },
            Err(err) => {
                warn!(contract_id, error = %err, "Bank account insert failed");
                BankAccountResult {
                    success: false,
                    message: format!("Error creating bank account: {err}"),
                    bank_account_id: None,
                    holder_name,
                    bank_name,
                    account_number,
                    account_type: account_type.as_str().to_string(),
                    currency,
                }
            }
        }
    }

    async fn write_properties(
        &self,
        contract_id: &str,
        request: &ContractRequest,
    ) -> PropertiesResult {
        let mut created = Vec::new();
        let mut property_ids = Vec::new();
        let mut errors = Vec::new();

        for (idx, prop) in request.properties.iter().enumerate() {
            let now = Local::now().naive_local();
            let property = NewProperty {
                id: Uuid::new_v4().to_string(),
                property_type: prop
                    .property_type
                    .clone()
                    .unwrap_or_else(|| "inmueble".to_string()),
                cadastral_number: prop.cadastral_number.clone(),
                title_number: prop.title_number.clone(),
                surface_area: prop.surface_area,
                covered_area: prop.covered_area,
                property_value: prop.property_value,
                currency: prop.currency.clone().unwrap_or_else(|| "USD".to_string()),
                description: prop.description.clone(),
                address_line1: prop.address_line1.clone(),
                address_line2: prop.address_line2.clone(),
                city_id: prop.city_id,
                postal_code: prop.postal_code.clone(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };

            let outcome = async {
                let property_id = db::db_insert_property(&self.pool, property).await?;
                db::db_insert_contract_property(
                    &self.pool,
                    NewContractProperty {
                        id: Uuid::new_v4().to_string(),
                        contract_id: contract_id.to_string(),
                        property_id: property_id.clone(),
                        property_role: prop
                            .property_role
                            .clone()
                            .unwrap_or_else(|| "garantia".to_string()),
                        is_primary: idx == 0,
                        notes: prop.notes.clone(),
                        is_active: true,
                        created_at: now,
                        updated_at: now,
                    },
                )
                .await?;
                anyhow::Ok(property_id)
            }
            .await;

            match outcome {
                Ok(property_id) => {
                    property_ids.push(property_id.clone());
                    created.push(CreatedProperty {
                        property_id,
                        cadastral_number: prop.cadastral_number.clone(),
                        title_number: prop.title_number.clone(),
                        is_primary: idx == 0,
                    });
                }
                Err(err) => {
                    warn!(contract_id, index = idx, error = %err, "Property insert failed, continuing batch");
                    errors.push(PropertyFailure {
                        index: idx,
                        cadastral_number: prop.cadastral_number.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        if created.is_empty() {
            PropertiesResult {
                success: false,
                message: "No properties could be created".to_string(),
                property_ids,
                properties: created,
                errors,
            }
        } else {
            PropertiesResult {
                success: true,
                message: format!("Created {} properties successfully", created.len()),
                property_ids,
                properties: created,
                errors,
            }
        }
    }
}

/// Bank-account holder resolution priority: client company name, investor
/// company name, first client's full name, then the fallback placeholder.
pub fn resolve_holder_name(request: &ContractRequest) -> String {
    if let Some(company) = &request.client_company {
        if !company.company_name.is_empty() {
            return company.company_name.clone();
        }
    }
    if let Some(company) = &request.investor_company {
        if !company.company_name.is_empty() {
            return company.company_name.clone();
        }
    }
    if let Some(client) = request.clients.first() {
        let person = &client.person;
        let full = [
            person.first_name.as_str(),
            person.middle_name.as_deref().unwrap_or(""),
            person.last_name.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        if !full.is_empty() {
            return full;
        }
    }
    "TITULAR NO ESPECIFICADO".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::{CompanyBlock, ParticipantBlock, PersonBlock};

    fn client(first: &str, middle: Option<&str>, last: &str) -> ParticipantBlock {
        ParticipantBlock {
            person: PersonBlock {
                first_name: first.into(),
                middle_name: middle.map(String::from),
                last_name: last.into(),
                ..Default::default()
            },
            person_document: None,
            notary_document: None,
            address: None,
        }
    }

    fn company(name: &str) -> CompanyBlock {
        CompanyBlock {
            company_name: name.into(),
            company_rnc: Some("1-01-00001-1".into()),
            company_mercantil_number: None,
            company_phone: None,
            company_email: None,
            company_type: None,
            nationality: None,
            company_address: None,
            company_manager: vec![],
        }
    }

    #[test]
    fn holder_prefers_client_company() {
        let mut request = ContractRequest::default();
        request.client_company = Some(company("GRUPO REYSA, S.R.L."));
        request.investor_company = Some(company("INVERSIONES X"));
        request.clients = vec![client("Juan", None, "Pérez")];
        assert_eq!(resolve_holder_name(&request), "GRUPO REYSA, S.R.L.");
    }

    #[test]
    fn holder_falls_back_to_investor_company_then_client() {
        let mut request = ContractRequest::default();
        request.investor_company = Some(company("INVERSIONES X"));
        request.clients = vec![client("Juan", Some("A."), "Pérez")];
        assert_eq!(resolve_holder_name(&request), "INVERSIONES X");

        request.investor_company = None;
        assert_eq!(resolve_holder_name(&request), "Juan A. Pérez");

        request.clients.clear();
        assert_eq!(resolve_holder_name(&request), "TITULAR NO ESPECIFICADO");
    }
}
