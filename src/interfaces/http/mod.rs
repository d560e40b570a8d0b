//! HTTP surface: three cleaning endpoints plus a liveness probe.
//!
//! Each endpoint is a thin composition of decode -> clean pipeline ->
//! serialize. Failures are caught once at this boundary, logged, and
//! reported as a `{"detail": ...}` body with a stage-specific prefix.

use crate::application::CleanPipeline;
use crate::domain::error::{AppError, Result};
use crate::domain::table::{Record, SourceFormat};
use crate::infrastructure::config::ServiceConfig;
use crate::infrastructure::db::DbQueryExecutor;
use crate::infrastructure::decode;
use crate::infrastructure::remote::RemoteApiFetcher;
use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

/// Collaborators injected into the router at startup. Shared immutably
/// across requests; per-request state lives on the stack of each handler.
pub struct AppState {
    pub pipeline: CleanPipeline,
    pub db: DbQueryExecutor,
    pub remote: RemoteApiFetcher,
}

#[derive(Serialize)]
struct CleanedResponse {
    cleaned_data: Vec<Record>,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CleanDbRequest {
    #[validate(length(min = 1, message = "db_url must not be empty"))]
    pub db_url: String,
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CleanApiRequest {
    #[validate(url(message = "api_url must be a valid URL"))]
    pub api_url: String,
}

#[post("/clean-data")]
async fn clean_data(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let result = process_upload(&state, payload).await;
    respond(result, "Error processing file")
}

async fn process_upload(state: &AppState, payload: Multipart) -> Result<Vec<Record>> {
    let (bytes, filename) = read_upload(payload).await?;
    info!(file = %filename, size = bytes.len(), "File received");

    let format = SourceFormat::from_filename(&filename)?;
    let table = decode::decode_bytes(&bytes, format)?;
    let cleaned = state.pipeline.execute(table).await?;
    Ok(cleaned.into_records())
}

#[post("/clean-db")]
async fn clean_db(state: web::Data<AppState>, req: web::Json<CleanDbRequest>) -> impl Responder {
    let result = process_db(&state, &req).await;
    respond(result, "Error fetching data from database")
}

async fn process_db(state: &AppState, req: &CleanDbRequest) -> Result<Vec<Record>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    info!("Fetching data from database");
    let table = state.db.fetch_table(&req.db_url, &req.query).await?;
    let cleaned = state.pipeline.execute(table).await?;
    Ok(cleaned.into_records())
}

#[post("/clean-api")]
async fn clean_api(state: web::Data<AppState>, req: web::Json<CleanApiRequest>) -> impl Responder {
    let result = process_api(&state, &req).await;
    respond(result, "Error processing API data")
}

async fn process_api(state: &AppState, req: &CleanApiRequest) -> Result<Vec<Record>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    info!(url = %req.api_url, "Fetching data from API");
    let table = state.remote.fetch_table(&req.api_url).await?;
    let cleaned = state.pipeline.execute(table).await?;
    Ok(cleaned.into_records())
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Read the `file` field of a multipart upload into memory.
async fn read_upload(mut payload: Multipart) -> Result<(Vec<u8>, String)> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != "file" {
            continue;
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Validation("Upload is missing a filename".to_string()))?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
        {
            bytes.extend_from_slice(&chunk);
        }

        return Ok((bytes, filename));
    }

    Err(AppError::Validation(
        "Multipart field 'file' is required".to_string(),
    ))
}

fn respond(result: Result<Vec<Record>>, stage: &str) -> HttpResponse {
    match result {
        Ok(cleaned_data) => HttpResponse::Ok().json(CleanedResponse { cleaned_data }),
        Err(err) => {
            error!("{}: {}", stage, err);
            failure_response(&err, stage)
        }
    }
}

// Unsupported formats, bad payloads and upstream status failures are the
// client's fault; everything else is a server error carrying the stage
// prefix and the original message.
fn failure_response(err: &AppError, stage: &str) -> HttpResponse {
    match err {
        AppError::UnsupportedFormat(_) | AppError::UpstreamStatus(_) | AppError::Validation(_) => {
            HttpResponse::BadRequest().json(ErrorBody {
                detail: err.to_string(),
            })
        }
        _ => HttpResponse::InternalServerError().json(ErrorBody {
            detail: format!("{}: {}", stage, err),
        }),
    }
}

pub fn start_server(config: &ServiceConfig, state: Arc<AppState>) -> std::io::Result<Server> {
    let data = web::Data::from(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(data.clone())
            .service(clean_data)
            .service(clean_db)
            .service(clean_api)
            .service(health)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::ai_agent::{CleaningAgent, PassthroughAgent};
    use crate::application::use_cases::rule_cleaner::TableTransformer;
    use crate::domain::table::{AgentOutput, Table};
    use actix_web::{test, App};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct IdentityCleaner;

    impl TableTransformer for IdentityCleaner {
        fn transform(&self, table: Table) -> crate::domain::error::Result<Table> {
            Ok(table)
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl CleaningAgent for FailingAgent {
        async fn process(&self, _: &Table) -> crate::domain::error::Result<AgentOutput> {
            Err(AppError::Agent("model unavailable".to_string()))
        }
    }

    fn test_state() -> web::Data<AppState> {
        web::Data::new(AppState {
            pipeline: CleanPipeline::new(Arc::new(IdentityCleaner), Arc::new(PassthroughAgent)),
            db: DbQueryExecutor::new(),
            remote: RemoteApiFetcher::new(),
        })
    }

    fn failing_agent_state() -> web::Data<AppState> {
        web::Data::new(AppState {
            pipeline: CleanPipeline::new(Arc::new(IdentityCleaner), Arc::new(FailingAgent)),
            db: DbQueryExecutor::new(),
            remote: RemoteApiFetcher::new(),
        })
    }

    fn multipart_body(filename: &str, content: &[u8]) -> (String, Vec<u8>) {
        let boundary = "----tablewash-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    async fn spawn_upstream(
        configure: fn(&mut web::ServiceConfig),
    ) -> std::io::Result<(String, actix_web::dev::ServerHandle)> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let server = HttpServer::new(move || App::new().configure(configure))
            .listen(listener)?
            .workers(1)
            .run();
        let handle = server.handle();
        tokio::spawn(server);
        Ok((format!("http://{}", addr), handle))
    }

    #[actix_web::test]
    async fn test_clean_data_csv_upload() {
        let app = test::init_service(App::new().app_data(test_state()).service(clean_data)).await;

        let (content_type, body) = multipart_body("data.csv", b"name,age\nAlice,30\nBob,25\n");
        let req = test::TestRequest::post()
            .uri("/clean-data")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(
            json,
            json!({"cleaned_data": [
                {"name": "Alice", "age": 30},
                {"name": "Bob", "age": 25}
            ]})
        );
    }

    #[actix_web::test]
    async fn test_clean_data_rejects_txt_upload() {
        let app = test::init_service(App::new().app_data(test_state()).service(clean_data)).await;

        let (content_type, body) = multipart_body("data.txt", b"just some text");
        let req = test::TestRequest::post()
            .uri("/clean-data")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let json: Value = test::read_body_json(resp).await;
        let detail = json["detail"].as_str().unwrap();
        assert!(detail.contains("Unsupported file format"));
    }

    #[actix_web::test]
    async fn test_clean_data_pipeline_failure_is_server_error() {
        let app = test::init_service(
            App::new()
                .app_data(failing_agent_state())
                .service(clean_data),
        )
        .await;

        let (content_type, body) = multipart_body("data.csv", b"name\nAlice\n");
        let req = test::TestRequest::post()
            .uri("/clean-data")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);

        let json: Value = test::read_body_json(resp).await;
        let detail = json["detail"].as_str().unwrap();
        assert!(detail.starts_with("Error processing file:"));
        assert!(detail.contains("model unavailable"));
    }

    #[actix_web::test]
    async fn test_clean_db_zero_rows() {
        let app = test::init_service(App::new().app_data(test_state()).service(clean_db)).await;

        let req = test::TestRequest::post()
            .uri("/clean-db")
            .set_json(json!({
                "db_url": "sqlite::memory:",
                "query": "SELECT 'a' AS name WHERE 1 = 0"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json, json!({"cleaned_data": []}));
    }

    #[actix_web::test]
    async fn test_clean_db_failure_carries_stage_prefix() {
        let app = test::init_service(App::new().app_data(test_state()).service(clean_db)).await;

        let req = test::TestRequest::post()
            .uri("/clean-db")
            .set_json(json!({
                "db_url": "sqlite::memory:",
                "query": "SELEKT nonsense"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);

        let json: Value = test::read_body_json(resp).await;
        let detail = json["detail"].as_str().unwrap();
        assert!(detail.starts_with("Error fetching data from database:"));
    }

    #[actix_web::test]
    async fn test_clean_db_rejects_empty_payload_fields() {
        let app = test::init_service(App::new().app_data(test_state()).service(clean_db)).await;

        let req = test::TestRequest::post()
            .uri("/clean-db")
            .set_json(json!({"db_url": "", "query": "SELECT 1"}))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_clean_api_success() {
        fn routes(cfg: &mut web::ServiceConfig) {
            cfg.route(
                "/records",
                web::get().to(|| async {
                    HttpResponse::Ok().json(json!([
                        {"name": "Alice", "age": 30},
                        {"name": "Bob", "age": 25}
                    ]))
                }),
            );
        }
        let (base_url, handle) = spawn_upstream(routes).await.unwrap();

        let app = test::init_service(App::new().app_data(test_state()).service(clean_api)).await;
        let req = test::TestRequest::post()
            .uri("/clean-api")
            .set_json(json!({"api_url": format!("{}/records", base_url)}))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let json: Value = test::read_body_json(resp).await;
        assert_eq!(
            json,
            json!({"cleaned_data": [
                {"name": "Alice", "age": 30},
                {"name": "Bob", "age": 25}
            ]})
        );

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_clean_api_upstream_404_is_client_error() {
        fn routes(cfg: &mut web::ServiceConfig) {
            cfg.route(
                "/missing",
                web::get().to(|| async { HttpResponse::NotFound().finish() }),
            );
        }
        let (base_url, handle) = spawn_upstream(routes).await.unwrap();

        let app = test::init_service(App::new().app_data(test_state()).service(clean_api)).await;
        let req = test::TestRequest::post()
            .uri("/clean-api")
            .set_json(json!({"api_url": format!("{}/missing", base_url)}))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let json: Value = test::read_body_json(resp).await;
        let detail = json["detail"].as_str().unwrap();
        assert!(detail.contains("Failed to fetch data from API"));

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }
}
