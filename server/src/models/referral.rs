//! Client-referrer relationship rows

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::client_referrers;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
#[diesel(table_name = client_referrers)]
pub struct ClientReferrer {
    pub id: String,
    pub client_id: String,
    pub referrer_id: String,
    pub relation_date: NaiveDateTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = client_referrers)]
pub struct NewClientReferrer {
    pub id: String,
    pub client_id: String,
    pub referrer_id: String,
    pub relation_date: NaiveDateTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
