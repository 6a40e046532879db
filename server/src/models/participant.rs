//! Participant roles, resolution outcomes and association rows

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::contract_participants;

/// Closed set of contractual roles. Every branch in the normalizer and the
/// resolver dispatches on this enum, never on raw role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Client,
    Investor,
    Witness,
    Notary,
    Referrer,
    ClientCompany,
    InvestorCompany,
}

impl ParticipantRole {
    /// Person-role id as stored in `contract_participants.role_type_id`.
    pub fn role_type_id(self) -> i32 {
        match self {
            ParticipantRole::Client | ParticipantRole::ClientCompany => 1,
            ParticipantRole::Investor | ParticipantRole::InvestorCompany => 2,
            ParticipantRole::Witness => 3,
            ParticipantRole::Notary => 7,
            ParticipantRole::Referrer => 8,
        }
    }

    /// Canonical role label used in association rows and error reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantRole::Client => "cliente",
            ParticipantRole::Investor => "inversionista",
            ParticipantRole::Witness => "testigo",
            ParticipantRole::Notary => "notario",
            ParticipantRole::Referrer => "referente",
            ParticipantRole::ClientCompany => "client_company",
            ParticipantRole::InvestorCompany => "investor_company",
        }
    }

    /// Occupation filled in when the person block carries none.
    pub fn default_occupation(self) -> &'static str {
        match self {
            ParticipantRole::Client => "Cliente",
            ParticipantRole::Investor => "Inversionista",
            ParticipantRole::Witness => "Testigo",
            ParticipantRole::Notary => "Notario",
            ParticipantRole::Referrer => "Referente",
            ParticipantRole::ClientCompany | ParticipantRole::InvestorCompany => "Empresa",
        }
    }

    pub fn is_company(self) -> bool {
        matches!(
            self,
            ParticipantRole::ClientCompany | ParticipantRole::InvestorCompany
        )
    }
}

/// How a participant ended up with an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    New,
    Existing,
    ReusedAfterConflict,
}

/// A resolved role occupant. Exactly one of `person_id` / `company_id` is
/// set; the resolver upholds this when constructing values.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedParticipant {
    pub role: ParticipantRole,
    pub person_id: Option<String>,
    pub company_id: Option<String>,
    pub is_primary: bool,
    pub resolution: Resolution,
}

impl ResolvedParticipant {
    pub fn person(role: ParticipantRole, person_id: String, is_primary: bool, resolution: Resolution) -> Self {
        Self {
            role,
            person_id: Some(person_id),
            company_id: None,
            is_primary,
            resolution,
        }
    }

    pub fn company(role: ParticipantRole, company_id: String) -> Self {
        // A company occupant is always the primary of its role group.
        Self {
            role,
            person_id: None,
            company_id: Some(company_id),
            is_primary: true,
            resolution: Resolution::New,
        }
    }
}

/// Association row binding a resolved participant to a contract.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
#[diesel(table_name = contract_participants)]
pub struct ContractParticipant {
    pub id: String,
    pub contract_id: String,
    pub person_id: Option<String>,
    pub company_id: Option<String>,
    pub role: String,
    pub role_type_id: i32,
    pub is_primary: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contract_participants)]
pub struct NewContractParticipant {
    pub id: String,
    pub contract_id: String,
    pub person_id: Option<String>,
    pub company_id: Option<String>,
    pub role: String,
    pub role_type_id: i32,
    pub is_primary: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_type_ids_match_reference_values() {
        assert_eq!(ParticipantRole::Client.role_type_id(), 1);
        assert_eq!(ParticipantRole::Investor.role_type_id(), 2);
        assert_eq!(ParticipantRole::Witness.role_type_id(), 3);
        assert_eq!(ParticipantRole::Notary.role_type_id(), 7);
        assert_eq!(ParticipantRole::Referrer.role_type_id(), 8);
        assert_eq!(ParticipantRole::ClientCompany.role_type_id(), 1);
        assert_eq!(ParticipantRole::InvestorCompany.role_type_id(), 2);
    }

    #[test]
    fn person_and_company_ids_are_mutually_exclusive() {
        let p = ResolvedParticipant::person(
            ParticipantRole::Client,
            "person-1".into(),
            true,
            Resolution::New,
        );
        assert!(p.person_id.is_some() && p.company_id.is_none());

        let c = ResolvedParticipant::company(ParticipantRole::ClientCompany, "company-1".into());
        assert!(c.company_id.is_some() && c.person_id.is_none());
        assert!(c.is_primary);
    }
}
