//! Axum route handlers for the Analysis API.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::info;

use crate::analysis::pipeline::{analyze, AnalysisResponse, AnalyzeRequest, UploadedDocument};
use crate::errors::AppError;
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const JOB_DESCRIPTION_FIELD: &str = "job_description";

/// POST /analyze
///
/// Multipart upload of a resume file plus job description text.
/// Validation happens before anything is stored or sent to the model.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let multipart = multipart.map_err(|e| invalid_multipart(&e))?;
    let request = read_analyze_request(multipart).await?;

    info!(
        "Analyzing resume '{}' ({} bytes, {}) against a {}-char job description",
        request.resume.file_name,
        request.resume.bytes.len(),
        request
            .resume
            .content_type
            .as_deref()
            .unwrap_or("unknown type"),
        request.job_description.len()
    );

    let response = analyze(&state, request).await?;
    Ok(Json(response))
}

async fn read_analyze_request(mut multipart: Multipart) -> Result<AnalyzeRequest, AppError> {
    let mut resume: Option<UploadedDocument> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid_multipart(&e))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(RESUME_FIELD) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| invalid_multipart(&e))?;
                // An empty file input still posts a nameless, empty part.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                resume = Some(UploadedDocument {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some(JOB_DESCRIPTION_FIELD) => {
                job_description = Some(field.text().await.map_err(|e| invalid_multipart(&e))?);
            }
            _ => {}
        }
    }

    let resume =
        resume.ok_or_else(|| AppError::Validation("Resume PDF is required".to_string()))?;
    let job_description = job_description
        .filter(|jd| !jd.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Job description is required".to_string()))?;

    Ok(AnalyzeRequest {
        resume,
        job_description,
    })
}

fn invalid_multipart(err: &dyn std::fmt::Display) -> AppError {
    AppError::Validation(format!("Invalid multipart request: {err}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::analysis::pipeline::test_support::{FixedExtractor, ScriptedGenerator};
    use crate::config::Config;
    use crate::errors::ANALYSIS_FAILED;
    use crate::extraction::{DocumentExtractor, ResumeTextExtractor};
    use crate::routes::build_router;
    use crate::state::AppState;
    use crate::storage::UploadStore;

    const BOUNDARY: &str = "ats-test-boundary";

    enum Part<'a> {
        File {
            name: &'a str,
            file_name: &'a str,
            bytes: &'a [u8],
        },
        Text {
            name: &'a str,
            value: &'a str,
        },
    }

    fn multipart_body(parts: &[Part]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File {
                    name,
                    file_name,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn analyze_request(parts: &[Part]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    struct Harness {
        app: Router,
        generator: Arc<ScriptedGenerator>,
        uploads: TempDir,
    }

    async fn harness_with(
        generator: ScriptedGenerator,
        extractor: Arc<dyn DocumentExtractor>,
    ) -> Harness {
        harness_with_limit(generator, extractor, None).await
    }

    async fn harness_with_limit(
        generator: ScriptedGenerator,
        extractor: Arc<dyn DocumentExtractor>,
        max_upload_bytes: Option<usize>,
    ) -> Harness {
        let uploads = tempfile::tempdir().unwrap();
        let upload_dir = uploads.path().to_string_lossy().to_string();
        let config = Config::from_lookup(|key| match key {
            "GENAI_API_KEY" => Some("test-key".to_string()),
            "UPLOAD_DIR" => Some(upload_dir.clone()),
            "MAX_UPLOAD_BYTES" => max_upload_bytes.map(|limit| limit.to_string()),
            _ => None,
        })
        .unwrap();

        let generator = Arc::new(generator);
        let state = AppState {
            generator: generator.clone(),
            extractor,
            uploads: UploadStore::open(&config.upload_dir).await.unwrap(),
            config,
        };

        Harness {
            app: build_router(state),
            generator,
            uploads,
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn stored_files(dir: &TempDir) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_missing_resume_is_bad_request() {
        let extractor = Arc::new(FixedExtractor::new("unused"));
        let h = harness_with(ScriptedGenerator::answering(&[]), extractor.clone()).await;

        let response = h
            .app
            .oneshot(analyze_request(&[Part::Text {
                name: "job_description",
                value: "Looking for Python developer",
            }]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Resume PDF is required");
        assert!(h.generator.prompts().is_empty());
        assert_eq!(extractor.calls(), 0);
        assert!(stored_files(&h.uploads).is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_input_counts_as_missing() {
        let h = harness_with(
            ScriptedGenerator::answering(&[]),
            Arc::new(FixedExtractor::new("unused")),
        )
        .await;

        let response = h
            .app
            .oneshot(analyze_request(&[
                Part::File {
                    name: "resume",
                    file_name: "",
                    bytes: b"",
                },
                Part::Text {
                    name: "job_description",
                    value: "Looking for Python developer",
                },
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Resume PDF is required");
    }

    #[tokio::test]
    async fn test_missing_job_description_is_bad_request() {
        let extractor = Arc::new(FixedExtractor::new("unused"));
        let h = harness_with(ScriptedGenerator::answering(&[]), extractor.clone()).await;

        let response = h
            .app
            .oneshot(analyze_request(&[Part::File {
                name: "resume",
                file_name: "cv.pdf",
                bytes: b"%PDF-1.4",
            }]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Job description is required"
        );
        assert_eq!(extractor.calls(), 0);
        assert!(h.generator.prompts().is_empty());
        assert!(stored_files(&h.uploads).is_empty());
    }

    #[tokio::test]
    async fn test_blank_job_description_is_bad_request() {
        let h = harness_with(
            ScriptedGenerator::answering(&[]),
            Arc::new(FixedExtractor::new("unused")),
        )
        .await;

        let response = h
            .app
            .oneshot(analyze_request(&[
                Part::File {
                    name: "resume",
                    file_name: "cv.pdf",
                    bytes: b"%PDF-1.4",
                },
                Part::Text {
                    name: "job_description",
                    value: "  \n\t ",
                },
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_bad_request() {
        let h = harness_with(
            ScriptedGenerator::answering(&[]),
            Arc::new(FixedExtractor::new("unused")),
        )
        .await;

        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"job_description":"x"}"#))
            .unwrap();
        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert!(h.generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_before_any_side_effect() {
        let extractor = Arc::new(FixedExtractor::new("unused"));
        let h = harness_with_limit(
            ScriptedGenerator::answering(&["r", "j", "m"]),
            extractor.clone(),
            Some(1024),
        )
        .await;

        let oversized = vec![b'a'; 4 * 1024];
        let response = h
            .app
            .oneshot(analyze_request(&[
                Part::Text {
                    name: "job_description",
                    value: "Python developer",
                },
                Part::File {
                    name: "resume",
                    file_name: "cv.txt",
                    bytes: &oversized,
                },
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert!(h.generator.prompts().is_empty());
        assert_eq!(extractor.calls(), 0);
        assert!(stored_files(&h.uploads).is_empty());
    }

    #[tokio::test]
    async fn test_successful_analysis_returns_three_fields() {
        let extractor = Arc::new(FixedExtractor::new("Python, SQL, 3 years experience"));
        let h = harness_with(
            ScriptedGenerator::answering(&[
                "- Skills: Python, SQL",
                "- Required skills: Python, SQL",
                "1. Match percentage (0-100): 92%",
            ]),
            extractor.clone(),
        )
        .await;

        let response = h
            .app
            .oneshot(analyze_request(&[
                Part::File {
                    name: "resume",
                    file_name: "../cv.pdf",
                    bytes: b"%PDF-1.4 fake",
                },
                Part::Text {
                    name: "job_description",
                    value: "Looking for Python developer with SQL skills",
                },
                Part::Text {
                    name: "ignored",
                    value: "extra field",
                },
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let fields = body.as_object().unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(body["parsed_resume"], "- Skills: Python, SQL");
        assert_eq!(body["parsed_job_description"], "- Required skills: Python, SQL");
        assert_eq!(body["ats_result"], "1. Match percentage (0-100): 92%");

        let prompts = h.generator.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("Python, SQL, 3 years experience"));
        assert!(prompts[1].contains("Looking for Python developer with SQL skills"));
        assert!(prompts[2].contains("- Skills: Python, SQL"));
        assert!(prompts[2].contains("- Required skills: Python, SQL"));

        assert_eq!(extractor.calls(), 1);
        let stored = stored_files(&h.uploads);
        assert_eq!(stored.len(), 1);
        assert_eq!(std::fs::read(&stored[0]).unwrap(), b"%PDF-1.4 fake");
        assert_ne!(stored[0].file_name().unwrap(), "cv.pdf");
    }

    #[tokio::test]
    async fn test_plain_text_resume_flows_through_real_extractor() {
        let h = harness_with(
            ScriptedGenerator::answering(&["r", "j", "m"]),
            Arc::new(ResumeTextExtractor),
        )
        .await;

        let response = h
            .app
            .oneshot(analyze_request(&[
                Part::File {
                    name: "resume",
                    file_name: "cv.txt",
                    bytes: b"Rust, Tokio, 5 years experience",
                },
                Part::Text {
                    name: "job_description",
                    value: "Rust engineer",
                },
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(h.generator.prompts()[0].contains("Rust, Tokio, 5 years experience"));
    }

    #[tokio::test]
    async fn test_model_failure_returns_server_error_without_partial_results() {
        let h = harness_with(
            ScriptedGenerator::new(vec![Ok("resume"), Ok("jd"), Err("model overloaded")]),
            Arc::new(FixedExtractor::new("text")),
        )
        .await;

        let response = h
            .app
            .oneshot(analyze_request(&[
                Part::File {
                    name: "resume",
                    file_name: "cv.pdf",
                    bytes: b"%PDF-1.4",
                },
                Part::Text {
                    name: "job_description",
                    value: "Python developer",
                },
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], ANALYSIS_FAILED);
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("model overloaded"));
        assert!(body.get("parsed_resume").is_none());
        assert!(body.get("ats_result").is_none());
    }
}
