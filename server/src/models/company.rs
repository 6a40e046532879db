//! Company rows plus manager and address sub-records

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{companies, company_addresses, company_managers};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
#[diesel(table_name = companies)]
pub struct Company {
    pub id: String,
    pub company_name: String,
    pub company_rnc: String,
    pub mercantil_number: Option<String>,
    pub nationality: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_type: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = companies)]
pub struct NewCompany {
    pub id: String,
    pub company_name: String,
    pub company_rnc: String,
    pub mercantil_number: Option<String>,
    pub nationality: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_type: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = company_managers)]
pub struct NewCompanyManager {
    pub id: String,
    pub company_id: String,
    pub full_name: String,
    pub position: Option<String>,
    pub address: Option<String>,
    pub document_number: String,
    pub nationality: Option<String>,
    pub civil_status: Option<String>,
    pub is_principal: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = company_addresses)]
pub struct NewCompanyAddress {
    pub id: String,
    pub company_id: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub address_type: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_principal: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
