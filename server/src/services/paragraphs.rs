//! Legal paragraph resolution and placeholder substitution
//!
//! Stored paragraphs are keyed by (person_role, contract_type, section,
//! contract_services). Placeholders use `{{variable}}` or `[variable]`;
//! unknown variables render as `[variable]` so a missing value is visible in
//! the document instead of silently blank. A lookup with no stored match
//! degrades to a generated placeholder paragraph plus a warning.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::info;

use crate::db::{self, DbPool};
use crate::error::MissingParagraph;
use crate::models::request::ContractRequest;

/// Sections fetched in the broad (inferred) mode, in document order.
const STANDARD_SECTIONS: [&str; 10] = [
    "identification",
    "investors",
    "clients",
    "witnesses",
    "notaries",
    "guarantees",
    "terms_conditions",
    "payment_terms",
    "legal_clauses",
    "signatures",
];

/// Document variable a section's text lands in. `identification` resolves
/// per person role.
fn section_variable(section: &str, person_role: &str) -> Option<&'static str> {
    match section {
        "identification" => Some(if person_role.starts_with("client") || person_role == "cliente" {
            "client_paragraph"
        } else {
            "investor_paragraph"
        }),
        "investors" => Some("investor_paragraph"),
        "clients" => Some("client_paragraph"),
        "witnesses" => Some("witness_paragraph"),
        "notaries" => Some("notary_paragraph"),
        "guarantees" => Some("guarantee_paragraph"),
        "terms_conditions" => Some("terms_paragraph"),
        "payment_terms" => Some("payment_paragraph"),
        "legal_clauses" => Some("legal_paragraph"),
        "signatures" => Some("signature_paragraph"),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct ResolvedParagraphs {
    /// Document variable (or composite `role_type_section` key) -> text.
    pub variables: BTreeMap<String, String>,
    pub warnings: Vec<MissingParagraph>,
}

pub struct ParagraphResolver {
    pool: DbPool,
}

impl ParagraphResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Resolve paragraphs for the request against the flattened variable
    /// bag. With an explicit `paragraph_request` each entry is looked up
    /// individually; without one, role and contract type are inferred and
    /// the standard section set is fetched for both client and investor.
    pub async fn resolve(
        &self,
        request: &ContractRequest,
        data: &Map<String, Value>,
    ) -> ResolvedParagraphs {
        if !request.paragraph_request.is_empty() {
            self.resolve_requested(request, data).await
        } else {
            self.resolve_inferred(request, data).await
        }
    }

    async fn resolve_requested(
        &self,
        request: &ContractRequest,
        data: &Map<String, Value>,
    ) -> ResolvedParagraphs {
        let mut resolved = ResolvedParagraphs::default();

        for entry in &request.paragraph_request {
            let services = entry
                .contract_services
                .clone()
                .unwrap_or_else(|| entry.contract_type.clone());

            let lookup = db::db_lookup_paragraph(
                &self.pool,
                &entry.person_role,
                &entry.contract_type,
                &entry.section,
                &services,
            )
            .await;

            let key = section_variable(&entry.section, &entry.person_role)
                .map(String::from)
                .unwrap_or_else(|| {
                    format!(
                        "{}_{}_{}",
                        entry.person_role, entry.contract_type, entry.section
                    )
                });

            match lookup {
                Ok(Some(template)) => {
                    resolved
                        .variables
                        .insert(key, process_paragraph(&template, data));
                }
                Ok(None) => {
                    resolved.variables.insert(
                        key,
                        format!(
                            "Párrafo por defecto para {} - {}",
                            entry.person_role, entry.section
                        ),
                    );
                    resolved.warnings.push(MissingParagraph {
                        person_role: entry.person_role.clone(),
                        contract_type: entry.contract_type.clone(),
                        section: entry.section.clone(),
                        message: format!(
                            "No se encontró párrafo para {} - {}",
                            entry.person_role, entry.section
                        ),
                    });
                }
                Err(err) => {
                    resolved.warnings.push(MissingParagraph {
                        person_role: entry.person_role.clone(),
                        contract_type: entry.contract_type.clone(),
                        section: entry.section.clone(),
                        message: format!("Error obteniendo párrafo: {err}"),
                    });
                }
            }
        }

        resolved
    }

    async fn resolve_inferred(
        &self,
        request: &ContractRequest,
        data: &Map<String, Value>,
    ) -> ResolvedParagraphs {
        let contract_type = inferred_contract_type(request);
        let services = request
            .extra
            .get("contract_services")
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| request.contract_type.clone())
            .unwrap_or_else(|| "mortgage".to_string());

        info!(%contract_type, %services, "Resolving standard paragraph set for both roles");

        let mut resolved = ResolvedParagraphs::default();
        for role in ["client", "investor"] {
            for section in STANDARD_SECTIONS {
                let lookup =
                    db::db_lookup_paragraph(&self.pool, role, &contract_type, section, &services)
                        .await;
                if let Ok(Some(template)) = lookup {
                    if let Some(variable) = section_variable(section, role) {
                        resolved
                            .variables
                            .insert(variable.to_string(), process_paragraph(&template, data));
                    }
                }
            }
        }

        resolved
    }
}

/// Contract type for the inferred mode, normalized to the stored closed set.
fn inferred_contract_type(request: &ContractRequest) -> String {
    let raw = request
        .extra
        .get("contract_type_db")
        .or_else(|| request.extra.get("contract_type_person"))
        .and_then(Value::as_str)
        .unwrap_or("juridica");
    match raw {
        "juridica" | "fisica_soltera" | "fisica_casada" => raw.to_string(),
        _ => "juridica".to_string(),
    }
}

/// Substitute `{{variable}}` and `[variable]` placeholders from the flat
/// variable bag. Unknown variables render as `[variable]`.
pub fn process_paragraph(template: &str, data: &Map<String, Value>) -> String {
    if template.is_empty() {
        return String::new();
    }

    let curly = Regex::new(r"\{\{(\w+)\}\}").expect("static regex");
    let brackets = Regex::new(r"\[(\w+)\]").expect("static regex");

    let mut variables: Vec<String> = curly
        .captures_iter(template)
        .chain(brackets.captures_iter(template))
        .map(|cap| cap[1].to_string())
        .collect();
    variables.sort();
    variables.dedup();

    let mut processed = template.to_string();
    for variable in variables {
        let replacement = match data.get(&variable) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Null) | None => format!("[{variable}]"),
            Some(other) => other.to_string(),
        };
        processed = processed.replace(&format!("{{{{{variable}}}}}"), &replacement);
        processed = processed.replace(&format!("[{variable}]"), &replacement);
    }

    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn substitutes_both_placeholder_syntaxes() {
        let data = bag(&[
            ("client_full_name", json!("JUAN PÉREZ")),
            ("loan_amount", json!("20,000.00")),
        ]);
        let out = process_paragraph(
            "El señor {{client_full_name}} debe [loan_amount] USD.",
            &data,
        );
        assert_eq!(out, "El señor JUAN PÉREZ debe 20,000.00 USD.");
    }

    #[test]
    fn unknown_variables_render_bracketed() {
        let out = process_paragraph("Firma: {{notary_full_name}}", &Map::new());
        assert_eq!(out, "Firma: [notary_full_name]");
    }

    #[test]
    fn numbers_and_nulls_stringify_predictably() {
        let data = bag(&[("current_year", json!(2026)), ("missing", Value::Null)]);
        let out = process_paragraph("Año {{current_year}}, dato [missing]", &data);
        assert_eq!(out, "Año 2026, dato [missing]");
    }

    #[test]
    fn identification_section_maps_by_role() {
        assert_eq!(
            section_variable("identification", "client"),
            Some("client_paragraph")
        );
        assert_eq!(
            section_variable("identification", "investor"),
            Some("investor_paragraph")
        );
        assert_eq!(section_variable("signatures", "client"), Some("signature_paragraph"));
        assert_eq!(section_variable("unheard_of", "client"), None);
    }
}
