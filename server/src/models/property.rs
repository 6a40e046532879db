//! Property rows and contract-property associations

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{contract_properties, properties};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
#[diesel(table_name = properties)]
pub struct Property {
    pub id: String,
    pub property_type: String,
    pub cadastral_number: Option<String>,
    pub title_number: Option<String>,
    pub surface_area: Option<f64>,
    pub covered_area: Option<f64>,
    pub property_value: Option<f64>,
    pub currency: String,
    pub description: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city_id: Option<i32>,
    pub postal_code: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = properties)]
pub struct NewProperty {
    pub id: String,
    pub property_type: String,
    pub cadastral_number: Option<String>,
    pub title_number: Option<String>,
    pub surface_area: Option<f64>,
    pub covered_area: Option<f64>,
    pub property_value: Option<f64>,
    pub currency: String,
    pub description: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city_id: Option<i32>,
    pub postal_code: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
#[diesel(table_name = contract_properties)]
pub struct ContractProperty {
    pub id: String,
    pub contract_id: String,
    pub property_id: String,
    pub property_role: String,
    pub is_primary: bool,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contract_properties)]
pub struct NewContractProperty {
    pub id: String,
    pub contract_id: String,
    pub property_id: String,
    pub property_role: String,
    pub is_primary: bool,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
