//! End-to-end pipeline tests over a file-backed sqlite database and an
//! in-process mock person registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Local;
use diesel::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use server::config::Settings;
use server::db::{self, DbPool};
use server::error::PipelineError;
use server::models::paragraph::NewContractParagraph;
use server::models::request::ContractRequest;
use server::registry::{
    PersonCreateRequest, PersonRegistry, RegistryError, RegistryOutcome,
};
use server::schema::{client_referrers, contract_loans, contract_participants, contracts};
use server::services::pipeline::ContractPipeline;

// ============================================================================
// Mock registry
// ============================================================================

/// Registry double keyed by primary document number. Resubmitting the same
/// document yields the same id (existed = true), or a duplicate conflict
/// carrying the id when `conflict_mode` is on.
struct MockRegistry {
    by_document: Mutex<HashMap<String, String>>,
    conflict_mode: bool,
    fail_all: bool,
}

impl MockRegistry {
    fn new() -> Self {
        Self {
            by_document: Mutex::new(HashMap::new()),
            conflict_mode: false,
            fail_all: false,
        }
    }

    fn with_conflict_mode() -> Self {
        Self {
            conflict_mode: true,
            ..Self::new()
        }
    }

    fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    fn preregister(&self, document_number: &str, person_id: &str) {
        self.by_document
            .lock()
            .unwrap()
            .insert(document_number.to_string(), person_id.to_string());
    }
}

#[async_trait]
impl PersonRegistry for MockRegistry {
    async fn create_or_reuse(
        &self,
        person: &PersonCreateRequest,
    ) -> Result<RegistryOutcome, RegistryError> {
        if self.fail_all {
            return Err(RegistryError::Rejected("registry unavailable".to_string()));
        }

        let key = person
            .documents
            .first()
            .map(|d| d.document_number.clone())
            .unwrap_or_else(|| person.display_name());

        let mut map = self.by_document.lock().unwrap();
        if let Some(existing) = map.get(&key) {
            if self.conflict_mode {
                return Err(RegistryError::Duplicate {
                    person_id: Some(existing.clone()),
                    message: "La persona ya está registrada".to_string(),
                });
            }
            return Ok(RegistryOutcome {
                person_id: existing.clone(),
                existed: true,
            });
        }

        let person_id = Uuid::new_v4().to_string();
        map.insert(key, person_id.clone());
        Ok(RegistryOutcome {
            person_id,
            existed: false,
        })
    }
}

// ============================================================================
// Test environment
// ============================================================================

struct TestEnv {
    _tmp: TempDir,
    pool: DbPool,
    pipeline: ContractPipeline,
}

const MORTGAGE_TEMPLATE: &str = r#"<html><body>
<h1>CONTRATO DE PRESTAMO HIPOTECARIO {{ contract_number }}</h1>
<p>{{ client_paragraph | default(value="") }}</p>
<p>{{ investor_paragraph | default(value="") }}</p>
<p>Monto: {{ loan_amount_text | default(value="") }}</p>
<p>Fecha: {{ current_date }}</p>
</body></html>"#;

const DEFAULT_TEMPLATE: &str = r#"<html><body>
<h1>CONTRATO {{ contract_number }}</h1>
<p>{{ description | default(value="") }}</p>
</body></html>"#;

fn setup_with(registry: Arc<dyn PersonRegistry>, templates: &[(&str, &str)]) -> TestEnv {
    let tmp = TempDir::new().expect("tempdir");
    let template_dir = tmp.path().join("templates");
    let contracts_dir = tmp.path().join("generated_contracts");
    std::fs::create_dir_all(&template_dir).unwrap();
    std::fs::create_dir_all(&contracts_dir).unwrap();
    for (name, content) in templates {
        std::fs::write(template_dir.join(name), content).unwrap();
    }

    let db_path = tmp.path().join("contracts.db");
    let pool = db::create_pool_with_size(db_path.to_str().unwrap(), 4).expect("pool");
    db::initialize_schema(&pool).expect("schema");

    let settings = Settings {
        database_url: db_path.display().to_string(),
        template_dir,
        contracts_dir,
        registry_base_url: "http://unused.invalid".to_string(),
        smtp: None,
        contract_email_recipients: vec![],
    };

    let pipeline = ContractPipeline::new(pool.clone(), registry, &settings);
    TestEnv {
        _tmp: tmp,
        pool,
        pipeline,
    }
}

fn setup(registry: Arc<dyn PersonRegistry>) -> TestEnv {
    setup_with(
        registry,
        &[
            ("mortgage_template.html", MORTGAGE_TEMPLATE),
            ("default_template.html", DEFAULT_TEMPLATE),
        ],
    )
}

fn request_from(value: serde_json::Value) -> ContractRequest {
    serde_json::from_value(value).expect("valid request document")
}

fn client_block(first: &str, last: &str, document: &str) -> serde_json::Value {
    json!({
        "person": {
            "first_name": first,
            "last_name": last,
            "marital_status": "soltero",
            "nationality": "Dominicana"
        },
        "person_document": {
            "document_type": "Cédula",
            "document_number": document,
            "issuing_country_id": 62
        },
        "address": {
            "address_line1": "Calle Primera 10",
            "city": "Santo Domingo",
            "city_id": 1
        }
    })
}

fn mortgage_request() -> ContractRequest {
    request_from(json!({
        "contract_type": "mortgage",
        "contract_date": "27/06/2026",
        "contract_end_date": "27/06/2027",
        "contract_type_id": 1,
        "description": "Préstamo hipotecario de prueba",
        "paragraph_request": [
            {
                "person_role": "client",
                "contract_type": "fisica_soltera",
                "section": "clients",
                "contract_services": "mortgage"
            },
            {
                "person_role": "investor",
                "contract_type": "juridica",
                "section": "investors",
                "contract_services": "mortgage"
            }
        ],
        "clients": [client_block("Juan", "Pérez", "00112345678")],
        "investor_company": {
            "company_name": "INVERSIONES ATLAS, S.R.L.",
            "company_rnc": "1-3225325-6",
            "company_mercantil_number": "3187SPM",
            "company_manager": [
                {"name": "Pedro Santana", "document_number": "00199999999", "is_main_manager": true}
            ],
            "company_address": {"address_line1": "Av. Independencia 100", "city": "Santo Domingo"}
        },
        "loan": {
            "amount": 20000.0,
            "currency": "USD",
            "interest_rate": 2.5,
            "term_months": 12,
            "loan_payments_details": {
                "monthly_payment": 1750.0,
                "final_payment": 1750.0,
                "payment_qty_quotes": 12,
                "payment_type": "fija"
            },
            "bank_account": {
                "bank_name": "Banco Popular",
                "bank_account_number": "794-1234567",
                "bank_account_type": "savings",
                "bank_account_currency": "USD"
            }
        },
        "properties": [
            {
                "property_type": "apartamento",
                "cadastral_number": "402345678901",
                "title_number": "3000012345",
                "surface_area": 120.5,
                "property_value": 85000.0,
                "currency": "USD",
                "address_line1": "Res. Mirador Sur, Apt 4B"
            }
        ]
    }))
}

async fn seed_paragraph(pool: &DbPool, role: &str, ctype: &str, section: &str, content: &str) {
    let now = Local::now().naive_local();
    db::db_insert_paragraph(
        pool,
        NewContractParagraph {
            id: Uuid::new_v4().to_string(),
            person_role: role.to_string(),
            contract_type: ctype.to_string(),
            section: section.to_string(),
            contract_services: "mortgage".to_string(),
            title: None,
            content: content.to_string(),
            order_position: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("seed paragraph");
}

fn count_contracts(pool: &DbPool) -> i64 {
    let mut conn = pool.get().unwrap();
    contracts::table.count().get_result(&mut conn).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn end_to_end_mortgage_contract() {
    let env = setup(Arc::new(MockRegistry::new()));
    seed_paragraph(
        &env.pool,
        "client",
        "fisica_soltera",
        "clients",
        "De la otra parte, {{client_full_name}}, portador de la cédula No. {{client_document_number}}, por un monto de {{loan_amount_text}}.",
    )
    .await;
    // No investor paragraph is seeded: the second request entry must degrade
    // to the generated placeholder and record a warning.

    let response = env
        .pipeline
        .generate_complete(mortgage_request())
        .await
        .expect("pipeline succeeds");

    assert!(response.success);
    assert!(!response.contract_number.is_empty());
    assert_eq!(response.template_used, "mortgage_template.html");
    assert_eq!(response.processed_data.properties_count, 1);
    assert_eq!(response.processed_data.loan_amount, Some(20000.0));
    assert_eq!(response.processed_data.persons_summary.successful, 2);

    // Document artifact exists and carries the substituted + placeholder text
    let rendered = std::fs::read_to_string(&response.path).expect("document written");
    assert!(rendered.contains("JUAN PÉREZ"));
    assert!(rendered.contains("00112345678"));
    assert!(rendered.contains("VEINTE MIL DÓLARES ESTADOUNIDENSES (USD 20,000.00)"));
    assert!(rendered.contains("Párrafo por defecto para investor - investors"));
    assert_eq!(response.processed_data.paragraph_warnings.len(), 1);
    assert_eq!(
        response.processed_data.paragraph_warnings[0].section,
        "investors"
    );

    // Contract row has the document paths written back
    let contract = db::db_load_contract(&env.pool, &response.contract_id)
        .await
        .unwrap();
    assert!(contract.file_path.is_some());
    assert_eq!(contract.version, 1);
    assert_eq!(contract.client_service_type_id, Some(2));
    assert_eq!(contract.investor_service_type_id, Some(1));

    // One person participant + one company participant, ids mutually exclusive
    let mut conn = env.pool.get().unwrap();
    let rows: Vec<(Option<String>, Option<String>, String, bool)> = contract_participants::table
        .filter(contract_participants::contract_id.eq(&response.contract_id))
        .select((
            contract_participants::person_id,
            contract_participants::company_id,
            contract_participants::role,
            contract_participants::is_primary,
        ))
        .load(&mut conn)
        .unwrap();
    assert_eq!(rows.len(), 2);
    for (person_id, company_id, _, _) in &rows {
        assert!(person_id.is_some() != company_id.is_some());
    }
    assert!(rows
        .iter()
        .any(|(_, company_id, role, is_primary)| company_id.is_some()
            && role == "investor_company"
            && *is_primary));

    // Loan row persisted with the requested amount
    let loan_amounts: Vec<f64> = contract_loans::table
        .filter(contract_loans::contract_id.eq(&response.contract_id))
        .select(contract_loans::loan_amount)
        .load(&mut conn)
        .unwrap();
    assert_eq!(loan_amounts, vec![20000.0]);

    // Bank account result used the savings normalization and company holder
    let bank = response
        .processed_data
        .loan_property_result
        .as_ref()
        .unwrap()
        .bank_account_result
        .as_ref()
        .unwrap();
    assert!(bank.success);
    assert_eq!(bank.account_type, "ahorros");
    assert_eq!(bank.holder_name, "INVERSIONES ATLAS, S.R.L.");

    // Property association: single row, primary
    let properties = response
        .processed_data
        .loan_property_result
        .as_ref()
        .unwrap()
        .properties_result
        .as_ref()
        .unwrap();
    assert_eq!(properties.property_ids.len(), 1);
    assert!(properties.properties[0].is_primary);
}

#[tokio::test]
async fn contract_numbers_are_sequential_and_unique() {
    let env = setup(Arc::new(MockRegistry::new()));

    let first = env
        .pipeline
        .generate_complete(mortgage_request())
        .await
        .unwrap();
    let second = env
        .pipeline
        .generate_complete(mortgage_request())
        .await
        .unwrap();

    assert_ne!(first.contract_number, second.contract_number);
    assert!(first.contract_number.starts_with("MORTGAGE-"));
    assert!(first.contract_number.ends_with("-000001"));
    assert!(second.contract_number.ends_with("-000002"));
    assert_eq!(count_contracts(&env.pool), 2);
}

#[tokio::test]
async fn resubmitted_person_resolves_to_the_same_id() {
    let env = setup(Arc::new(MockRegistry::new()));

    let first = env
        .pipeline
        .generate_complete(mortgage_request())
        .await
        .unwrap();
    let second = env
        .pipeline
        .generate_complete(mortgage_request())
        .await
        .unwrap();

    assert_eq!(first.processed_data.persons_detail.new_persons, 2);
    // The client comes back as existing; the company slot is re-counted as
    // processed on every run.
    assert_eq!(second.processed_data.persons_detail.existing_persons, 1);
    assert_eq!(second.processed_data.persons_detail.new_persons, 1);

    // Same person id attached to both contracts
    let mut conn = env.pool.get().unwrap();
    let person_ids: Vec<Option<String>> = contract_participants::table
        .filter(contract_participants::role.eq("cliente"))
        .select(contract_participants::person_id)
        .load(&mut conn)
        .unwrap();
    assert_eq!(person_ids.len(), 2);
    assert_eq!(person_ids[0], person_ids[1]);
}

#[tokio::test]
async fn duplicate_conflict_with_id_is_reused() {
    let registry = MockRegistry::with_conflict_mode();
    registry.preregister("00112345678", "person-fixed-1");
    let env = setup(Arc::new(registry));

    let response = env
        .pipeline
        .generate_complete(mortgage_request())
        .await
        .unwrap();

    assert_eq!(response.processed_data.persons_detail.reused_persons, 1);
    assert_eq!(response.processed_data.persons_summary.successful, 2);

    let mut conn = env.pool.get().unwrap();
    let person_ids: Vec<Option<String>> = contract_participants::table
        .filter(contract_participants::role.eq("cliente"))
        .select(contract_participants::person_id)
        .load(&mut conn)
        .unwrap();
    assert_eq!(person_ids, vec![Some("person-fixed-1".to_string())]);
}

#[tokio::test]
async fn referral_link_created_once_per_pair() {
    let registry = MockRegistry::new();
    registry.preregister("00112345678", "person-client-1");
    registry.preregister("00155555555", "person-referrer-1");
    let env = setup(Arc::new(registry));

    db::db_insert_client(&env.pool, "client-1", "person-client-1")
        .await
        .unwrap();
    db::db_insert_referrer(&env.pool, "referrer-1", "person-referrer-1")
        .await
        .unwrap();

    let make_request = || {
        request_from(json!({
            "contract_type": "services",
            "clients": [client_block("Juan", "Pérez", "00112345678")],
            "referents": [{
                "person": {"first_name": "Carla", "last_name": "Núñez"},
                "person_document": {"document_number": "00155555555"}
            }]
        }))
    };

    env.pipeline
        .generate_complete(make_request())
        .await
        .expect("first run");
    env.pipeline
        .generate_complete(make_request())
        .await
        .expect("second run");

    let mut conn = env.pool.get().unwrap();
    let links: Vec<(String, String, bool)> = client_referrers::table
        .select((
            client_referrers::client_id,
            client_referrers::referrer_id,
            client_referrers::is_active,
        ))
        .load(&mut conn)
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].0, "client-1");
    assert_eq!(links[0].1, "person-referrer-1");
    assert!(links[0].2);
}

#[tokio::test]
async fn property_batch_continues_past_failures() {
    let env = setup(Arc::new(MockRegistry::new()));

    let mut request = mortgage_request();
    request.properties = serde_json::from_value(json!([
        {"property_type": "solar", "cadastral_number": "CAD-1"},
        {"property_type": "solar", "cadastral_number": "CAD-1"},
        {"property_type": "solar", "cadastral_number": "CAD-3"}
    ]))
    .unwrap();

    let response = env.pipeline.generate_complete(request).await.unwrap();
    assert!(response.success);

    let properties = response
        .processed_data
        .loan_property_result
        .as_ref()
        .unwrap()
        .properties_result
        .as_ref()
        .unwrap();
    assert_eq!(properties.property_ids.len(), 2);
    assert_eq!(properties.errors.len(), 1);
    assert_eq!(properties.errors[0].index, 1);
    assert!(properties.properties[0].is_primary);
    assert!(!properties.properties[1].is_primary);

    assert_eq!(
        db::db_count_contract_properties(&env.pool, &response.contract_id)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn three_indicators_select_default_template_four_select_mortgage() {
    let env = setup(Arc::new(MockRegistry::new()));

    let three = request_from(json!({
        "contract_type": "services",
        "clients": [client_block("Juan", "Pérez", "00112345678")],
        "investors": [client_block("Luis", "Mota", "00122222222")],
        "witnesses": [client_block("Eva", "Rojas", "00133333333")]
    }));
    let response = env.pipeline.generate_complete(three).await.unwrap();
    assert_eq!(response.template_used, "default_template.html");

    let four = request_from(json!({
        "contract_type": "services",
        "clients": [client_block("Juan", "Pérez", "00112345678")],
        "investors": [client_block("Luis", "Mota", "00122222222")],
        "witnesses": [client_block("Eva", "Rojas", "00133333333")],
        "notaries": [client_block("Rosa", "Peralta", "00144444444")]
    }));
    let response = env.pipeline.generate_complete(four).await.unwrap();
    assert_eq!(response.template_used, "mortgage_template.html");
}

#[tokio::test]
async fn pipeline_aborts_when_no_participant_resolves() {
    let env = setup(Arc::new(MockRegistry::failing()));

    let request = request_from(json!({
        "contract_type": "services",
        "clients": [client_block("Juan", "Pérez", "00112345678")]
    }));

    let err = env
        .pipeline
        .generate_complete(request)
        .await
        .expect_err("must abort");
    match err {
        PipelineError::NoParticipantsResolved { errors, summary } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(summary.errors, 1);
            assert_eq!(summary.successful, 0);
        }
        other => panic!("expected NoParticipantsResolved, got {other:?}"),
    }

    // Nothing was committed before the abort
    assert_eq!(count_contracts(&env.pool), 0);
}

#[tokio::test]
async fn render_failure_runs_compensations() {
    // The only template references an undefined variable; strict rendering
    // fails after the contract row and sub-entities were committed.
    let env = setup_with(
        Arc::new(MockRegistry::new()),
        &[(
            "default_template.html",
            "<html>{{ variable_that_does_not_exist }}</html>",
        )],
    );

    let request = request_from(json!({
        "contract_type": "services",
        "clients": [client_block("Juan", "Pérez", "00112345678")]
    }));

    let err = env
        .pipeline
        .generate_complete(request)
        .await
        .expect_err("render must fail");
    assert!(matches!(err, PipelineError::RenderFailed(_)));

    // The committed contract row was compensated (deactivated), not left
    // dangling as live state.
    let mut conn = env.pool.get().unwrap();
    let rows: Vec<(bool,)> = contracts::table
        .select((contracts::is_active,))
        .load(&mut conn)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].0);

    let participant_active: Vec<bool> = contract_participants::table
        .select(contract_participants::is_active)
        .load(&mut conn)
        .unwrap();
    assert!(participant_active.iter().all(|active| !active));
}

#[tokio::test]
async fn update_contract_bumps_version_and_rerenders() {
    let env = setup(Arc::new(MockRegistry::new()));

    let created = env
        .pipeline
        .generate_complete(mortgage_request())
        .await
        .unwrap();

    let mut updates = serde_json::Map::new();
    updates.insert(
        "description".to_string(),
        json!("Descripción corregida del contrato"),
    );
    let updated = env
        .pipeline
        .update_contract(&created.contract_id, updates)
        .await
        .unwrap();

    assert!(updated.success);
    assert_eq!(updated.version, 2);
    assert_eq!(updated.updated_fields, vec!["description".to_string()]);

    let contract = db::db_load_contract(&env.pool, &created.contract_id)
        .await
        .unwrap();
    assert_eq!(contract.version, 2);
}
