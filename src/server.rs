use actix_cors::Cors;
use actix_multipart::{Field, Multipart};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, post, web};
use futures_util::TryStreamExt;
use log::{debug, error, info, warn};

use crate::audio::decode_audio;
use crate::dto::{ExportRequest, TranscriptionDto};
use crate::error::TranscribeError;
use crate::transcript::{ExportArtifact, json_artifact, text_artifact};
use crate::whisper::config::WhisperConfig;
use crate::whisper::transcriber::Transcriber;

const INDEX_HTML: &str = include_str!("../static/index.html");

pub struct AppState {
    pub transcriber: Transcriber,
}

/// The uploaded file as received: bytes plus the client's filename, held in
/// memory for this request only.
struct AudioUpload {
    bytes: Vec<u8>,
    filename: Option<String>,
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[get("/api/v1/health")]
async fn health_check() -> impl Responder {
    debug!("Health check endpoint called");
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Transcription service is running"
    }))
}

#[post("/api/v1/transcribe")]
async fn transcribe_upload(data: web::Data<AppState>, payload: Multipart) -> impl Responder {
    debug!("Transcription request received");

    let upload = match read_audio_upload(payload).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            warn!("No audio file provided in transcription request");
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "No audio file provided"
            }));
        }
        Err(e) => {
            error!("Failed to read upload: {e}");
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Failed to read audio data"
            }));
        }
    };

    info!(
        "Processing upload '{}': {} bytes",
        upload.filename.as_deref().unwrap_or("<unnamed>"),
        upload.bytes.len()
    );

    let decoded = match decode_audio(upload.bytes, upload.filename.as_deref()) {
        Ok(decoded) => decoded,
        Err(e) => return error_response(&e),
    };

    info!(
        "Decoded {:.2}s of audio at {}Hz, starting transcription",
        decoded.duration_secs(),
        decoded.sample_rate
    );

    match data.transcriber.transcribe(&decoded) {
        Ok(transcript) => {
            info!(
                "Transcription completed: {} segments, language {:?}",
                transcript.segments.len(),
                transcript.language
            );
            HttpResponse::Ok().json(TranscriptionDto {
                text: transcript.display_text(),
                language: transcript.language,
                segments: transcript.segments,
            })
        }
        Err(e) => error_response(&e),
    }
}

#[post("/api/v1/export/text")]
async fn export_text(body: web::Json<ExportRequest>) -> impl Responder {
    artifact_response(text_artifact(&body.segments))
}

#[post("/api/v1/export/json")]
async fn export_json(body: web::Json<ExportRequest>) -> impl Responder {
    match json_artifact(&body.segments) {
        Ok(artifact) => artifact_response(artifact),
        Err(e) => {
            error!("JSON export failed: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to serialize transcript"
            }))
        }
    }
}

fn artifact_response(artifact: ExportArtifact) -> HttpResponse {
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(artifact.filename.to_string())],
    };
    HttpResponse::Ok()
        .content_type(artifact.content_type)
        .insert_header(disposition)
        .body(artifact.bytes)
}

fn error_response(err: &TranscribeError) -> HttpResponse {
    error!("Transcription pipeline failed: {err}");
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        TranscribeError::Decode(_) => HttpResponse::BadRequest().json(body),
        TranscribeError::ModelUnavailable(_) => HttpResponse::InternalServerError().json(body),
    }
}

/// Pulls the `audio` field out of the multipart form. Returns `Ok(None)`
/// when the form carries no usable file.
async fn read_audio_upload(mut payload: Multipart) -> Result<Option<AudioUpload>, actix_web::Error> {
    let mut upload: Option<AudioUpload> = None;

    while let Some(field) = payload.try_next().await? {
        match field.name() {
            Some("audio") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);
                let bytes = read_field_data(field).await?;
                debug!("Audio data received: {} bytes", bytes.len());
                upload = Some(AudioUpload { bytes, filename });
            }
            _ => continue,
        }
    }

    Ok(upload.filter(|u| !u.bytes.is_empty()))
}

async fn read_field_data(mut field: Field) -> Result<Vec<u8>, actix_web::Error> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

pub async fn run_server(host: String, port: u16, config: WhisperConfig) -> std::io::Result<()> {
    info!("Initializing transcriber...");
    info!(
        "Using configuration: model_path={:?}, language={:?}, num_threads={}",
        config.model_path, config.language, config.num_threads
    );

    let transcriber = match Transcriber::new(config) {
        Ok(t) => {
            info!("Transcriber initialized successfully");
            t
        }
        Err(e) => {
            error!("Failed to initialize transcriber: {e}");
            std::process::exit(1);
        }
    };

    let app_state = web::Data::new(AppState { transcriber });

    info!("Starting HTTP server on {host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::JsonConfig::default().limit(50 * 1024 * 1024)) // 50MB
            .app_data(
                actix_multipart::form::MultipartFormConfig::default()
                    .total_limit(100 * 1024 * 1024), // 100MB
            )
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(index)
            .service(health_check)
            .service(transcribe_upload)
            .service(export_text)
            .service(export_json)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Segment;
    use actix_web::{body::to_bytes, http::StatusCode, test};

    fn sample_body() -> serde_json::Value {
        serde_json::json!({
            "segments": [
                { "text": "hello world", "start": 0.0, "end": 2.9 },
                { "text": "second line", "start": 2.9, "end": 5.4 }
            ]
        })
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let app = test::init_service(App::new().service(health_check)).await;
        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn index_serves_the_page() {
        let app = test::init_service(App::new().service(index)).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(std::str::from_utf8(&body).unwrap().contains("<html"));
    }

    #[actix_web::test]
    async fn text_export_joins_segments_with_newlines() {
        let app = test::init_service(App::new().service(export_text)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/export/text")
            .set_json(sample_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            resp.headers()
                .get("content-disposition")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("transcript.txt")
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"hello world\nsecond line");
    }

    #[actix_web::test]
    async fn json_export_round_trips_the_segments() {
        let app = test::init_service(App::new().service(export_json)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/export/json")
            .set_json(sample_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let decoded: Vec<Segment> = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].text, "hello world");
        assert_eq!(decoded[1].start, 2.9);
    }

    #[actix_web::test]
    async fn re_export_is_byte_identical() {
        let app = test::init_service(App::new().service(export_text).service(export_json)).await;
        let mut bodies = Vec::new();
        for uri in ["/api/v1/export/text", "/api/v1/export/json"] {
            for _ in 0..2 {
                let req = test::TestRequest::post()
                    .uri(uri)
                    .set_json(sample_body())
                    .to_request();
                let resp = test::call_service(&app, req).await;
                bodies.push(to_bytes(resp.into_body()).await.unwrap());
            }
        }
        assert_eq!(bodies[0], bodies[1]);
        assert_eq!(bodies[2], bodies[3]);
    }

    #[actix_web::test]
    async fn empty_segment_list_exports_empty_text() {
        let app = test::init_service(App::new().service(export_text)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/export/text")
            .set_json(serde_json::json!({ "segments": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(body.is_empty());
    }
}
