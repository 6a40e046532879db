//! Contract API handlers

use actix_web::{post, put, web, HttpResponse, Responder};
use serde_json::json;
use tracing::error;
use validator::Validate;

use crate::error::PipelineError;
use crate::models::request::ContractRequest;
use crate::services::pipeline::ContractPipeline;

/// Generate a complete contract from the structured request document:
/// participants, contract record, loan/properties, paragraphs and the
/// rendered document.
#[post("/contracts/generate-complete")]
pub async fn generate_contract_complete(
    pipeline: web::Data<ContractPipeline>,
    payload: web::Json<ContractRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    if let Err(validation) = request.validate() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Invalid contract request",
            "errors": validation,
        }));
    }

    match pipeline.generate_complete(request).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => error_response(err),
    }
}

/// Merge updated variables into an existing contract, re-render the
/// document and bump the contract version.
#[put("/contracts/{contract_id}")]
pub async fn update_contract(
    pipeline: web::Data<ContractPipeline>,
    path: web::Path<String>,
    payload: web::Json<serde_json::Map<String, serde_json::Value>>,
) -> impl Responder {
    let contract_id = path.into_inner();
    match pipeline
        .update_contract(&contract_id, payload.into_inner())
        .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => error_response(err),
    }
}

fn error_response(err: PipelineError) -> HttpResponse {
    match err {
        PipelineError::NoParticipantsResolved { errors, summary } => {
            HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": "Error procesando todas las personas",
                "errors": errors,
                "summary": summary,
            }))
        }
        PipelineError::TemplateNotFound(template) => HttpResponse::NotFound().json(json!({
            "success": false,
            "message": format!("No se encontraron plantillas disponibles: {template}"),
        })),
        PipelineError::RenderFailed(message) => HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": format!("Error generando contrato: {message}"),
        })),
        PipelineError::Storage(err) => {
            error!(error = %err, "Contract pipeline storage failure");
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": "Internal storage error",
            }))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(generate_contract_complete)
        .service(update_contract);
}
