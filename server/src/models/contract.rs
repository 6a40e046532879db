//! Contract model and insert struct

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::contracts;

/// Contract row - column order MUST match schema.rs exactly!
/// Diesel's Queryable trait requires fields in the same order as the table columns.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
#[diesel(table_name = contracts)]
pub struct Contract {
    pub id: String,
    pub contract_number: String,
    pub contract_type: String,
    pub contract_type_id: i32,
    pub client_service_type_id: Option<i32>,
    pub investor_service_type_id: Option<i32>,
    pub status: String,
    pub contract_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub template_name: Option<String>,
    // Document fields are set after synthesis, by the document-info update
    pub generated_filename: Option<String>,
    pub file_path: Option<String>,
    pub folder_path: Option<String>,
    pub version: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contracts)]
pub struct NewContract {
    pub id: String,
    pub contract_number: String,
    pub contract_type: String,
    pub contract_type_id: i32,
    pub client_service_type_id: Option<i32>,
    pub investor_service_type_id: Option<i32>,
    pub status: String,
    pub contract_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub template_name: Option<String>,
    pub version: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
