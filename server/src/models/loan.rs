//! Loan and bank-account rows

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{contract_bank_accounts, contract_loans};

/// Loan row - column order MUST match schema.rs exactly!
#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
#[diesel(table_name = contract_loans)]
pub struct ContractLoan {
    pub id: String,
    pub contract_id: String,
    pub loan_amount: f64,
    pub currency: String,
    pub interest_rate: Option<f64>,
    pub term_months: Option<i32>,
    pub loan_type: Option<String>,
    pub monthly_payment: Option<f64>,
    pub final_payment: Option<f64>,
    pub discount_rate: Option<f64>,
    pub quote_count: Option<i32>,
    pub payment_type: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contract_loans)]
pub struct NewContractLoan {
    pub id: String,
    pub contract_id: String,
    pub loan_amount: f64,
    pub currency: String,
    pub interest_rate: Option<f64>,
    pub term_months: Option<i32>,
    pub loan_type: Option<String>,
    pub monthly_payment: Option<f64>,
    pub final_payment: Option<f64>,
    pub discount_rate: Option<f64>,
    pub quote_count: Option<i32>,
    pub payment_type: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Closed set of persisted account types (stored as their Spanish labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankAccountType {
    Ahorros,
    Corriente,
    Inversion,
}

impl BankAccountType {
    /// Normalize a free-form wire value. Unknown values fall back to
    /// `Corriente`, the most common account type in stored contracts.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "ahorros" | "ahorro" | "savings" => BankAccountType::Ahorros,
            "inversion" | "inversión" | "investment" => BankAccountType::Inversion,
            "corriente" | "checking" => BankAccountType::Corriente,
            other => {
                if !other.is_empty() {
                    tracing::warn!(account_type = other, "Unknown bank account type, defaulting to corriente");
                }
                BankAccountType::Corriente
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BankAccountType::Ahorros => "ahorros",
            BankAccountType::Corriente => "corriente",
            BankAccountType::Inversion => "inversion",
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contract_bank_accounts)]
pub struct NewBankAccount {
    pub id: String,
    pub contract_id: String,
    pub client_person_id: Option<String>,
    pub holder_name: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_type: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_type_normalization_covers_synonyms() {
        assert_eq!(BankAccountType::normalize("Savings"), BankAccountType::Ahorros);
        assert_eq!(BankAccountType::normalize("ahorro"), BankAccountType::Ahorros);
        assert_eq!(BankAccountType::normalize("checking"), BankAccountType::Corriente);
        assert_eq!(BankAccountType::normalize("INVERSION"), BankAccountType::Inversion);
        assert_eq!(BankAccountType::normalize("investment"), BankAccountType::Inversion);
        assert_eq!(BankAccountType::normalize("plazo fijo"), BankAccountType::Corriente);
    }
}
