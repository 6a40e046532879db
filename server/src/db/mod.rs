//! Database pool and access helpers
//!
//! Every persistence call goes through a `db_*` free function that takes the
//! shared pool, grabs a connection and runs the blocking diesel query inside
//! `tokio::task::spawn_blocking`. Writer steps commit independently; there is
//! no enclosing transaction across pipeline steps (see the saga ledger in
//! `services::pipeline`).

use anyhow::{Context, Result};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sql_query;

use crate::models::company::{Company, NewCompany, NewCompanyAddress, NewCompanyManager};
use crate::models::contract::{Contract, NewContract};
use crate::models::loan::{NewBankAccount, NewContractLoan};
use crate::models::paragraph::NewContractParagraph;
use crate::models::participant::NewContractParticipant;
use crate::models::property::{NewContractProperty, NewProperty};
use crate::models::referral::NewClientReferrer;
use crate::schema::{
    client_referrers, clients, companies, company_addresses, company_managers,
    contract_bank_accounts, contract_loans, contract_paragraphs, contract_participants,
    contract_properties, contract_sequences, contracts, properties, referrers,
};

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

/// Applies per-connection pragmas: FK enforcement and a lock wait window.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmaCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmaCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        sql_query("PRAGMA foreign_keys = ON;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        // Wait for locks instead of failing immediately
        sql_query("PRAGMA busy_timeout = 5000;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;

        Ok(())
    }
}

pub fn create_pool(database_url: &str) -> Result<DbPool> {
    create_pool_with_size(database_url, 10)
}

pub fn create_pool_with_size(database_url: &str, max_size: u32) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(max_size)
        .connection_timeout(std::time::Duration::from_secs(30))
        .connection_customizer(Box::new(SqlitePragmaCustomizer))
        .build(manager)
        .context("Failed to create database connection pool")?;
    Ok(pool)
}

/// Create all tables this crate owns. Idempotent.
pub fn initialize_schema(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    conn.batch_execute(SCHEMA_SQL)
        .context("Failed to initialize database schema")?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS contracts (
    id TEXT PRIMARY KEY NOT NULL,
    contract_number TEXT NOT NULL UNIQUE,
    contract_type TEXT NOT NULL,
    contract_type_id INTEGER NOT NULL,
    client_service_type_id INTEGER,
    investor_service_type_id INTEGER,
    status TEXT NOT NULL,
    contract_date DATE NOT NULL,
    start_date DATE,
    end_date DATE,
    title TEXT,
    description TEXT,
    template_name TEXT,
    generated_filename TEXT,
    file_path TEXT,
    folder_path TEXT,
    version INTEGER NOT NULL DEFAULT 1,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_participants (
    id TEXT PRIMARY KEY NOT NULL,
    contract_id TEXT NOT NULL,
    person_id TEXT,
    company_id TEXT,
    role TEXT NOT NULL,
    role_type_id INTEGER NOT NULL,
    is_primary BOOLEAN NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_loans (
    id TEXT PRIMARY KEY NOT NULL,
    contract_id TEXT NOT NULL,
    loan_amount DOUBLE NOT NULL,
    currency TEXT NOT NULL DEFAULT 'USD',
    interest_rate DOUBLE,
    term_months INTEGER,
    loan_type TEXT,
    monthly_payment DOUBLE,
    final_payment DOUBLE,
    discount_rate DOUBLE,
    quote_count INTEGER,
    payment_type TEXT,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS properties (
    id TEXT PRIMARY KEY NOT NULL,
    property_type TEXT NOT NULL,
    cadastral_number TEXT UNIQUE,
    title_number TEXT,
    surface_area DOUBLE,
    covered_area DOUBLE,
    property_value DOUBLE,
    currency TEXT NOT NULL DEFAULT 'USD',
    description TEXT,
    address_line1 TEXT,
    address_line2 TEXT,
    city_id INTEGER,
    postal_code TEXT,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_properties (
    id TEXT PRIMARY KEY NOT NULL,
    contract_id TEXT NOT NULL,
    property_id TEXT NOT NULL,
    property_role TEXT NOT NULL DEFAULT 'garantia',
    is_primary BOOLEAN NOT NULL DEFAULT 0,
    notes TEXT,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_bank_accounts (
    id TEXT PRIMARY KEY NOT NULL,
    contract_id TEXT NOT NULL,
    client_person_id TEXT,
    holder_name TEXT NOT NULL,
    bank_name TEXT NOT NULL,
    account_number TEXT NOT NULL,
    account_type TEXT NOT NULL CHECK (account_type IN ('ahorros', 'corriente', 'inversion')),
    currency TEXT NOT NULL DEFAULT 'USD',
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY NOT NULL,
    company_name TEXT NOT NULL,
    company_rnc TEXT NOT NULL,
    mercantil_number TEXT,
    nationality TEXT,
    email TEXT,
    phone TEXT,
    company_type TEXT,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS company_managers (
    id TEXT PRIMARY KEY NOT NULL,
    company_id TEXT NOT NULL,
    full_name TEXT NOT NULL,
    position TEXT,
    address TEXT,
    document_number TEXT NOT NULL,
    nationality TEXT,
    civil_status TEXT,
    is_principal BOOLEAN NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS company_addresses (
    id TEXT PRIMARY KEY NOT NULL,
    company_id TEXT NOT NULL,
    address_line1 TEXT NOT NULL,
    address_line2 TEXT,
    city TEXT,
    postal_code TEXT,
    address_type TEXT NOT NULL DEFAULT 'Business',
    email TEXT,
    phone TEXT,
    is_principal BOOLEAN NOT NULL DEFAULT 1,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY NOT NULL,
    person_id TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS referrers (
    id TEXT PRIMARY KEY NOT NULL,
    person_id TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS client_referrers (
    id TEXT PRIMARY KEY NOT NULL,
    client_id TEXT NOT NULL,
    referrer_id TEXT NOT NULL,
    relation_date TIMESTAMP NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_paragraphs (
    id TEXT PRIMARY KEY NOT NULL,
    person_role TEXT NOT NULL,
    contract_type TEXT NOT NULL,
    section TEXT NOT NULL,
    contract_services TEXT NOT NULL,
    title TEXT,
    content TEXT NOT NULL,
    order_position INTEGER NOT NULL DEFAULT 1,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_sequences (
    contract_type TEXT PRIMARY KEY NOT NULL,
    last_value INTEGER NOT NULL DEFAULT 0,
    updated_at TIMESTAMP NOT NULL
);
"#;

// ============================================================================
// Contracts
// ============================================================================

pub async fn db_insert_contract(pool: &DbPool, new_contract: NewContract) -> Result<Contract> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let contract_id = new_contract.id.clone();
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(contracts::table)
            .values(&new_contract)
            .execute(&mut conn)
            .map_err(|e| {
                tracing::error!("Database insert error for contract {}: {:?}", contract_id, e);
                anyhow::anyhow!("Failed to insert contract: {}", e)
            })?;

        contracts::table
            .filter(contracts::id.eq(&contract_id))
            .first(&mut conn)
            .map_err(|e| anyhow::anyhow!("Failed to retrieve created contract: {}", e))
    })
    .await?
}

pub async fn db_load_contract(pool: &DbPool, contract_id: &str) -> Result<Contract> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = contract_id.to_string();
    tokio::task::spawn_blocking(move || {
        contracts::table
            .filter(contracts::id.eq(&id))
            .first(&mut conn)
            .context(format!("Contract with ID {} not found", id))
    })
    .await?
}

pub async fn db_update_contract_document_info(
    pool: &DbPool,
    contract_id: &str,
    generated_filename: &str,
    file_path: &str,
    folder_path: &str,
) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = contract_id.to_string();
    let filename = generated_filename.to_string();
    let file = file_path.to_string();
    let folder = folder_path.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::update(contracts::table.filter(contracts::id.eq(&id)))
            .set((
                contracts::generated_filename.eq(filename),
                contracts::file_path.eq(file),
                contracts::folder_path.eq(folder),
                contracts::updated_at.eq(chrono::Local::now().naive_local()),
            ))
            .execute(&mut conn)
            .context(format!("Failed to update contract {} document info", id))
    })
    .await??;
    Ok(())
}

/// Full-update path: bump the version counter. Returns the new version.
pub async fn db_bump_contract_version(pool: &DbPool, contract_id: &str) -> Result<i32> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = contract_id.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::update(contracts::table.filter(contracts::id.eq(&id)))
            .set((
                contracts::version.eq(contracts::version + 1),
                contracts::updated_at.eq(chrono::Local::now().naive_local()),
            ))
            .execute(&mut conn)
            .context(format!("Failed to bump contract {} version", id))?;

        contracts::table
            .filter(contracts::id.eq(&id))
            .select(contracts::version)
            .first::<i32>(&mut conn)
            .context("Failed to read bumped contract version")
    })
    .await?
}

pub async fn db_deactivate_contract(pool: &DbPool, contract_id: &str) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = contract_id.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::update(contracts::table.filter(contracts::id.eq(&id)))
            .set(contracts::is_active.eq(false))
            .execute(&mut conn)
            .context(format!("Failed to deactivate contract {}", id))
    })
    .await??;
    Ok(())
}

// ============================================================================
// Participants
// ============================================================================

pub async fn db_insert_participant(
    pool: &DbPool,
    participant: NewContractParticipant,
) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(contract_participants::table)
            .values(&participant)
            .execute(&mut conn)
            .context("Failed to insert contract participant")
    })
    .await??;
    Ok(())
}

pub async fn db_deactivate_participants(pool: &DbPool, contract_id: &str) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = contract_id.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::update(
            contract_participants::table.filter(contract_participants::contract_id.eq(&id)),
        )
        .set(contract_participants::is_active.eq(false))
        .execute(&mut conn)
        .context(format!("Failed to deactivate participants of contract {}", id))
    })
    .await??;
    Ok(())
}

// ============================================================================
// Loans, properties, bank accounts
// ============================================================================

pub async fn db_insert_loan(pool: &DbPool, loan: NewContractLoan) -> Result<String> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let loan_id = loan.id.clone();
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(contract_loans::table)
            .values(&loan)
            .execute(&mut conn)
            .context("Failed to insert contract loan")
    })
    .await??;
    Ok(loan_id)
}

pub async fn db_deactivate_loans(pool: &DbPool, contract_id: &str) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = contract_id.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::update(contract_loans::table.filter(contract_loans::contract_id.eq(&id)))
            .set(contract_loans::is_active.eq(false))
            .execute(&mut conn)
            .context(format!("Failed to deactivate loans of contract {}", id))
    })
    .await??;
    Ok(())
}

pub async fn db_insert_bank_account(pool: &DbPool, account: NewBankAccount) -> Result<String> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let account_id = account.id.clone();
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(contract_bank_accounts::table)
            .values(&account)
            .execute(&mut conn)
            .context("Failed to insert contract bank account")
    })
    .await??;
    Ok(account_id)
}

pub async fn db_deactivate_bank_accounts(pool: &DbPool, contract_id: &str) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = contract_id.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::update(
            contract_bank_accounts::table.filter(contract_bank_accounts::contract_id.eq(&id)),
        )
        .set(contract_bank_accounts::is_active.eq(false))
        .execute(&mut conn)
        .context(format!("Failed to deactivate bank accounts of contract {}", id))
    })
    .await??;
    Ok(())
}

pub async fn db_insert_property(pool: &DbPool, property: NewProperty) -> Result<String> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let property_id = property.id.clone();
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(properties::table)
            .values(&property)
            .execute(&mut conn)
            .context("Failed to insert property")
    })
    .await??;
    Ok(property_id)
}

pub async fn db_insert_contract_property(
    pool: &DbPool,
    association: NewContractProperty,
) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(contract_properties::table)
            .values(&association)
            .execute(&mut conn)
            .context("Failed to insert contract-property association")
    })
    .await??;
    Ok(())
}

pub async fn db_deactivate_contract_properties(pool: &DbPool, contract_id: &str) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = contract_id.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::update(
            contract_properties::table.filter(contract_properties::contract_id.eq(&id)),
        )
        .set(contract_properties::is_active.eq(false))
        .execute(&mut conn)
        .context(format!("Failed to deactivate properties of contract {}", id))
    })
    .await??;
    Ok(())
}

pub async fn db_count_contract_properties(pool: &DbPool, contract_id: &str) -> Result<i64> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = contract_id.to_string();
    tokio::task::spawn_blocking(move || {
        contract_properties::table
            .filter(contract_properties::contract_id.eq(&id))
            .filter(contract_properties::is_active.eq(true))
            .count()
            .get_result(&mut conn)
            .context("Failed to count contract properties")
    })
    .await?
}

// ============================================================================
// Companies
// ============================================================================

pub async fn db_find_company_by_rnc(pool: &DbPool, rnc: &str) -> Result<Option<Company>> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let rnc = rnc.to_string();
    tokio::task::spawn_blocking(move || {
        companies::table
            .filter(companies::company_rnc.eq(&rnc))
            .filter(companies::is_active.eq(true))
            .first::<Company>(&mut conn)
            .optional()
            .context("Failed to look up company by RNC")
    })
    .await?
}

pub async fn db_insert_company(pool: &DbPool, company: NewCompany) -> Result<String> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let company_id = company.id.clone();
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(companies::table)
            .values(&company)
            .execute(&mut conn)
            .context("Failed to insert company")
    })
    .await??;
    Ok(company_id)
}

pub async fn db_company_manager_exists(
    pool: &DbPool,
    company_id: &str,
    document_number: &str,
) -> Result<bool> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let company_id = company_id.to_string();
    let document_number = document_number.to_string();
    tokio::task::spawn_blocking(move || {
        let count: i64 = company_managers::table
            .filter(company_managers::company_id.eq(&company_id))
            .filter(company_managers::document_number.eq(&document_number))
            .filter(company_managers::is_active.eq(true))
            .count()
            .get_result(&mut conn)
            .context("Failed to check company manager")?;
        Ok(count > 0)
    })
    .await?
}

pub async fn db_insert_company_manager(pool: &DbPool, manager: NewCompanyManager) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(company_managers::table)
            .values(&manager)
            .execute(&mut conn)
            .context("Failed to insert company manager")
    })
    .await??;
    Ok(())
}

pub async fn db_find_active_company_address(
    pool: &DbPool,
    company_id: &str,
) -> Result<Option<String>> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let company_id = company_id.to_string();
    tokio::task::spawn_blocking(move || {
        company_addresses::table
            .filter(company_addresses::company_id.eq(&company_id))
            .filter(company_addresses::is_active.eq(true))
            .select(company_addresses::id)
            .first::<String>(&mut conn)
            .optional()
            .context("Failed to look up company address")
    })
    .await?
}

pub async fn db_insert_company_address(pool: &DbPool, address: NewCompanyAddress) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(company_addresses::table)
            .values(&address)
            .execute(&mut conn)
            .context("Failed to insert company address")
    })
    .await??;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn db_update_company_address(
    pool: &DbPool,
    address_id: &str,
    address_line1: &str,
    address_line2: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    address_type: &str,
    email: Option<String>,
    phone: Option<String>,
) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = address_id.to_string();
    let line1 = address_line1.to_string();
    let kind = address_type.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::update(company_addresses::table.filter(company_addresses::id.eq(&id)))
            .set((
                company_addresses::address_line1.eq(line1),
                company_addresses::address_line2.eq(address_line2),
                company_addresses::city.eq(city),
                company_addresses::postal_code.eq(postal_code),
                company_addresses::address_type.eq(kind),
                company_addresses::email.eq(email),
                company_addresses::phone.eq(phone),
                company_addresses::updated_at.eq(chrono::Local::now().naive_local()),
            ))
            .execute(&mut conn)
            .context("Failed to update company address")
    })
    .await??;
    Ok(())
}

// ============================================================================
// Clients, referrers and referral links
// ============================================================================

pub async fn db_find_client_by_person(pool: &DbPool, person_id: &str) -> Result<Option<String>> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let person_id = person_id.to_string();
    tokio::task::spawn_blocking(move || {
        clients::table
            .filter(clients::person_id.eq(&person_id))
            .filter(clients::is_active.eq(true))
            .select(clients::id)
            .first::<String>(&mut conn)
            .optional()
            .context("Failed to look up client by person id")
    })
    .await?
}

pub async fn db_find_referrer_by_person(pool: &DbPool, person_id: &str) -> Result<Option<String>> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let person_id = person_id.to_string();
    tokio::task::spawn_blocking(move || {
        referrers::table
            .filter(referrers::person_id.eq(&person_id))
            .filter(referrers::is_active.eq(true))
            .select(referrers::id)
            .first::<String>(&mut conn)
            .optional()
            .context("Failed to look up referrer by person id")
    })
    .await?
}

pub async fn db_active_referral_exists(
    pool: &DbPool,
    client_id: &str,
    referrer_id: &str,
) -> Result<bool> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let client_id = client_id.to_string();
    let referrer_id = referrer_id.to_string();
    tokio::task::spawn_blocking(move || {
        let count: i64 = client_referrers::table
            .filter(client_referrers::client_id.eq(&client_id))
            .filter(client_referrers::referrer_id.eq(&referrer_id))
            .filter(client_referrers::is_active.eq(true))
            .count()
            .get_result(&mut conn)
            .context("Failed to check referral link")?;
        Ok(count > 0)
    })
    .await?
}

pub async fn db_insert_client_referrer(pool: &DbPool, link: NewClientReferrer) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(client_referrers::table)
            .values(&link)
            .execute(&mut conn)
            .context("Failed to insert client-referrer link")
    })
    .await??;
    Ok(())
}

// ============================================================================
// Paragraph templates
// ============================================================================

/// First active paragraph for the lookup key, ordered by position.
pub async fn db_lookup_paragraph(
    pool: &DbPool,
    person_role: &str,
    contract_type: &str,
    section: &str,
    contract_services: &str,
) -> Result<Option<String>> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let role = person_role.to_string();
    let ctype = contract_type.to_string();
    let section = section.to_string();
    let services = contract_services.to_string();
    tokio::task::spawn_blocking(move || {
        contract_paragraphs::table
            .filter(contract_paragraphs::person_role.eq(&role))
            .filter(contract_paragraphs::contract_type.eq(&ctype))
            .filter(contract_paragraphs::section.eq(&section))
            .filter(contract_paragraphs::contract_services.eq(&services))
            .filter(contract_paragraphs::is_active.eq(true))
            .order(contract_paragraphs::order_position.asc())
            .select(contract_paragraphs::content)
            .first::<String>(&mut conn)
            .optional()
            .context("Failed to look up contract paragraph")
    })
    .await?
}

pub async fn db_insert_paragraph(pool: &DbPool, paragraph: NewContractParagraph) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(contract_paragraphs::table)
            .values(&paragraph)
            .execute(&mut conn)
            .context("Failed to insert contract paragraph")
    })
    .await??;
    Ok(())
}

// ============================================================================
// Contract number sequences
// ============================================================================

/// Advance and return the per-type counter backing contract numbers.
pub async fn db_next_contract_sequence(pool: &DbPool, contract_type: &str) -> Result<i32> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let ctype = contract_type.to_string();
    tokio::task::spawn_blocking(move || {
        conn.immediate_transaction(|conn| {
            let existing: Option<i32> = contract_sequences::table
                .filter(contract_sequences::contract_type.eq(&ctype))
                .select(contract_sequences::last_value)
                .first(conn)
                .optional()?;

            let next = existing.unwrap_or(0) + 1;
            let now = chrono::Local::now().naive_local();

            if existing.is_some() {
                diesel::update(
                    contract_sequences::table
                        .filter(contract_sequences::contract_type.eq(&ctype)),
                )
                .set((
                    contract_sequences::last_value.eq(next),
                    contract_sequences::updated_at.eq(now),
                ))
                .execute(conn)?;
            } else {
                diesel::insert_into(contract_sequences::table)
                    .values((
                        contract_sequences::contract_type.eq(&ctype),
                        contract_sequences::last_value.eq(next),
                        contract_sequences::updated_at.eq(now),
                    ))
                    .execute(conn)?;
            }

            diesel::result::QueryResult::Ok(next)
        })
        .context("Failed to advance contract number sequence")
    })
    .await?
}

// ============================================================================
// Seed helpers (client / referrer registries live outside this pipeline but
// referral derivation reads them)
// ============================================================================

pub async fn db_insert_client(pool: &DbPool, client_id: &str, person_id: &str) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = client_id.to_string();
    let person = person_id.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(clients::table)
            .values((
                clients::id.eq(&id),
                clients::person_id.eq(&person),
                clients::is_active.eq(true),
                clients::created_at.eq(chrono::Local::now().naive_local()),
            ))
            .execute(&mut conn)
            .context("Failed to insert client")
    })
    .await??;
    Ok(())
}

pub async fn db_insert_referrer(pool: &DbPool, referrer_id: &str, person_id: &str) -> Result<()> {
    let mut conn = pool.get().context("Failed to get DB connection")?;
    let id = referrer_id.to_string();
    let person = person_id.to_string();
    tokio::task::spawn_blocking(move || {
        diesel::insert_into(referrers::table)
            .values((
                referrers::id.eq(&id),
                referrers::person_id.eq(&person),
                referrers::is_active.eq(true),
                referrers::created_at.eq(chrono::Local::now().naive_local()),
            ))
            .execute(&mut conn)
            .context("Failed to insert referrer")
    })
    .await??;
    Ok(())
}
