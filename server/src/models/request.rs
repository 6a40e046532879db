//! Wire shape of the contract-generation request document
//!
//! The document is deeply nested and role-structured. Legacy field spellings
//! (`notary` vs `notaries`, `p_`-prefixed person fields in notary blocks)
//! are absorbed with serde aliases so every block deserializes into the same
//! canonical shape. Shape errors reject the request before the pipeline runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContractRequest {
    #[validate(length(max = 50, message = "contract_type max 50 characters"))]
    pub contract_type: Option<String>,
    #[validate(length(max = 10, message = "contract_date must be DD/MM/YYYY"))]
    pub contract_date: Option<String>,
    #[validate(length(max = 10, message = "contract_end_date must be DD/MM/YYYY"))]
    pub contract_end_date: Option<String>,
    pub contract_type_id: Option<i32>,
    #[validate(length(max = 2000, message = "description max 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 100, message = "template_name max 100 characters"))]
    pub template_name: Option<String>,
    #[serde(default)]
    pub paragraph_request: Vec<ParagraphRequest>,
    pub loan: Option<LoanData>,
    #[serde(default)]
    pub properties: Vec<PropertyData>,
    #[serde(default)]
    pub clients: Vec<ParticipantBlock>,
    #[serde(default)]
    pub investors: Vec<ParticipantBlock>,
    #[serde(default)]
    pub witnesses: Vec<ParticipantBlock>,
    #[serde(default, alias = "notary")]
    pub notaries: Vec<ParticipantBlock>,
    #[serde(default)]
    pub referents: Vec<ParticipantBlock>,
    pub client_company: Option<CompanyBlock>,
    pub investor_company: Option<CompanyBlock>,
    /// Unrecognized top-level fields; scalar values are copied verbatim into
    /// the document variable bag for backward compatibility.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ContractRequest {
    /// Count of the six mortgage indicators present in the request:
    /// loan, properties, clients, investors, witnesses, notaries.
    pub fn mortgage_indicator_count(&self) -> usize {
        [
            self.loan.is_some(),
            !self.properties.is_empty(),
            !self.clients.is_empty(),
            !self.investors.is_empty(),
            !self.witnesses.is_empty(),
            !self.notaries.is_empty(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParagraphRequest {
    pub person_role: String,
    pub contract_type: String,
    pub section: String,
    pub contract_services: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoanData {
    pub amount: f64,
    pub currency: Option<String>,
    pub interest_rate: Option<f64>,
    pub term_months: Option<i32>,
    pub loan_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub loan_payments_details: Option<LoanPaymentDetails>,
    pub bank_account: Option<BankAccountData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoanPaymentDetails {
    pub monthly_payment: Option<f64>,
    pub final_payment: Option<f64>,
    pub discount_rate: Option<f64>,
    pub payment_qty_quotes: Option<i32>,
    pub payment_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BankAccountData {
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_account_type: Option<String>,
    pub bank_account_currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyData {
    pub property_type: Option<String>,
    pub cadastral_number: Option<String>,
    pub title_number: Option<String>,
    pub surface_area: Option<f64>,
    pub covered_area: Option<f64>,
    pub property_value: Option<f64>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city_id: Option<i32>,
    pub postal_code: Option<String>,
    pub property_role: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipantBlock {
    #[serde(default)]
    pub person: PersonBlock,
    pub person_document: Option<DocumentData>,
    pub notary_document: Option<DocumentData>,
    pub address: Option<AddressData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonBlock {
    #[serde(default, alias = "p_first_name")]
    pub first_name: String,
    #[serde(default, alias = "p_last_name")]
    pub last_name: String,
    #[serde(alias = "p_middle_name")]
    pub middle_name: Option<String>,
    #[serde(alias = "p_date_of_birth")]
    pub date_of_birth: Option<String>,
    #[serde(alias = "p_gender")]
    pub gender: Option<String>,
    #[serde(alias = "p_nationality_country", alias = "nationality_country")]
    pub nationality: Option<String>,
    #[serde(alias = "p_marital_status")]
    pub marital_status: Option<String>,
    #[serde(alias = "p_occupation")]
    pub occupation: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "p_person_role_id")]
    pub person_role_id: Option<i32>,
    #[serde(default, alias = "p_documents")]
    pub documents: Vec<DocumentData>,
    #[serde(default, alias = "p_addresses")]
    pub addresses: Vec<AddressData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentData {
    pub document_type: Option<String>,
    #[serde(default)]
    pub document_number: String,
    pub issuing_country_id: Option<i32>,
    pub issuing_country: Option<String>,
    pub document_issue_date: Option<String>,
    pub document_expiry_date: Option<String>,
    pub is_primary: Option<bool>,
    /// Notary license number, present only on notary documents.
    pub notary_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressData {
    #[serde(default)]
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city_id: Option<i32>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub address_type: Option<String>,
    pub is_principal: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyBlock {
    #[serde(default)]
    pub company_name: String,
    pub company_rnc: Option<String>,
    pub company_mercantil_number: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub company_type: Option<String>,
    pub nationality: Option<String>,
    pub company_address: Option<CompanyAddressBlock>,
    #[serde(default)]
    pub company_manager: Vec<CompanyManagerBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyManagerBlock {
    #[serde(default)]
    pub name: String,
    pub position: Option<String>,
    pub address: Option<String>,
    pub document_number: Option<String>,
    pub nationality: Option<String>,
    pub marital_status: Option<String>,
    #[serde(default)]
    pub is_main_manager: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyAddressBlock {
    #[serde(default)]
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub address_type: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notary_singular_key_aliases_to_notaries() {
        let raw = serde_json::json!({
            "contract_type": "mortgage",
            "notary": [{"person": {"p_first_name": "Rosa", "p_last_name": "Peralta"}}]
        });
        let req: ContractRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.notaries.len(), 1);
        assert_eq!(req.notaries[0].person.first_name, "Rosa");
    }

    #[test]
    fn mortgage_indicators_count_presence_not_cardinality() {
        let raw = serde_json::json!({
            "loan": {"amount": 1000.0},
            "clients": [{"person": {"first_name": "Ana", "last_name": "Diaz"}}],
            "investors": [
                {"person": {"first_name": "Luis", "last_name": "Mota"}},
                {"person": {"first_name": "Eva", "last_name": "Rojas"}}
            ]
        });
        let req: ContractRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.mortgage_indicator_count(), 3);
    }

    #[test]
    fn unknown_scalar_fields_land_in_extra() {
        let raw = serde_json::json!({
            "contract_type": "services",
            "custom_reference": "ABC-9"
        });
        let req: ContractRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(
            req.extra.get("custom_reference").and_then(Value::as_str),
            Some("ABC-9")
        );
    }
}
