//! Runtime settings, loaded from the environment

use std::path::PathBuf;

use anyhow::Result;
use secrecy::SecretString;

/// Settings shared by the pipeline services.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    /// Directory holding the document templates (tera).
    pub template_dir: PathBuf,
    /// Directory where generated contract folders are written.
    pub contracts_dir: PathBuf,
    /// Base URL of the external person registry.
    pub registry_base_url: String,
    pub smtp: Option<SmtpSettings>,
    /// Recipients of the generated-contract notification email.
    pub contract_email_recipients: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl Settings {
    /// Load configuration from environment or use defaults.
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "contracts.db".to_string());

        let template_dir = PathBuf::from(
            std::env::var("CONTRACT_TEMPLATE_DIR").unwrap_or_else(|_| "./templates".to_string()),
        );

        let contracts_dir = PathBuf::from(
            std::env::var("GENERATED_CONTRACTS_DIR")
                .unwrap_or_else(|_| "./generated_contracts".to_string()),
        );

        let registry_base_url = std::env::var("PERSON_REGISTRY_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8900".to_string());

        let smtp = match (std::env::var("SMTP_HOST"), std::env::var("SMTP_FROM")) {
            (Ok(host), Ok(from_address)) => Some(SmtpSettings {
                host,
                port: std::env::var("SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(587),
                username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
                password: SecretString::from(
                    std::env::var("SMTP_PASSWORD").unwrap_or_default(),
                ),
                from_address,
            }),
            _ => None,
        };

        let contract_email_recipients = std::env::var("CONTRACT_EMAIL_RECIPIENTS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            template_dir,
            contracts_dir,
            registry_base_url,
            smtp,
            contract_email_recipients,
        })
    }
}
