//! Legal paragraph templates
//!
//! Reference data keyed by (person_role, contract_type, section,
//! contract_services). `order_position` orders candidates inside a section;
//! the resolver takes the first active match.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::contract_paragraphs;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
#[diesel(table_name = contract_paragraphs)]
pub struct ContractParagraph {
    pub id: String,
    pub person_role: String,
    pub contract_type: String,
    pub section: String,
    pub contract_services: String,
    pub title: Option<String>,
    pub content: String,
    pub order_position: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contract_paragraphs)]
pub struct NewContractParagraph {
    pub id: String,
    pub person_role: String,
    pub contract_type: String,
    pub section: String,
    pub contract_services: String,
    pub title: Option<String>,
    pub content: String,
    pub order_position: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
