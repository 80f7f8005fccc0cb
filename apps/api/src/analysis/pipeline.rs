//! Analysis pipeline — one resume upload against one job description.
//!
//! Flow: store upload → extract text → parse resume (LLM) → parse JD (LLM) →
//!       ATS match (LLM) → respond with all three texts.
//!
//! The three calls are strictly sequential; any failure aborts the whole run
//! and no partial result leaves this module.

use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::analysis::match_score::detect_match_percentage;
use crate::analysis::prompts::{
    build_job_description_prompt, build_match_prompt, build_resume_prompt,
};
use crate::errors::AppError;
use crate::extraction::{DocumentExtractor, ExtractionReport};
use crate::llm_client::TextGenerator;
use crate::state::AppState;

/// A resume file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A validated `POST /analyze` request.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub resume: UploadedDocument,
    pub job_description: String,
}

/// The three model outputs, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResponse {
    pub parsed_resume: String,
    pub parsed_job_description: String,
    pub ats_result: String,
}

/// Runs the full pipeline for one request.
pub async fn analyze(
    state: &AppState,
    request: AnalyzeRequest,
) -> Result<AnalysisResponse, AppError> {
    let AnalyzeRequest {
        resume,
        job_description,
    } = request;

    // Step 1: Persist the upload under a generated name
    let stored = state.uploads.save(&resume.file_name, &resume.bytes).await?;

    // Step 2: Extract text on the blocking pool
    let report = extract_blocking(state.extractor.clone(), stored.path.clone()).await?;
    info!(
        "Extracted {} chars from '{}' ({} pages, {} failed)",
        report.text.len(),
        stored.original_name,
        report.pages,
        report.failed_pages
    );

    // Steps 3-5: The three model calls
    run_model_calls(state.generator.as_ref(), &report.text, &job_description).await
}

/// Sequences the resume, job description, and match calls.
pub async fn run_model_calls(
    llm: &dyn TextGenerator,
    resume_text: &str,
    job_description: &str,
) -> Result<AnalysisResponse, AppError> {
    info!("Parsing resume with {}", llm.model());
    let parsed_resume = llm.generate(&build_resume_prompt(resume_text)).await?;

    info!("Parsing job description with {}", llm.model());
    let parsed_job_description = llm
        .generate(&build_job_description_prompt(job_description))
        .await?;

    info!("Running ATS match with {}", llm.model());
    let ats_result = llm
        .generate(&build_match_prompt(&parsed_resume, &parsed_job_description))
        .await?;

    match detect_match_percentage(&ats_result) {
        Some(percent) => info!("ATS match complete: {percent}%"),
        None => info!("ATS match complete: no percentage found in model output"),
    }

    Ok(AnalysisResponse {
        parsed_resume,
        parsed_job_description,
        ats_result,
    })
}

async fn extract_blocking(
    extractor: Arc<dyn DocumentExtractor>,
    path: std::path::PathBuf,
) -> Result<ExtractionReport, AppError> {
    tokio::task::spawn_blocking(move || extractor.extract(&path))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Text extraction task failed: {e}")))
}
