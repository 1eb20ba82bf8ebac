use std::collections::BTreeMap;
use std::path::PathBuf;
use actix_web::{get, post, web, HttpResponse, Responder};
use actix_web::web::Data;
use serde::Deserialize;
use crate::errors::{TransferErr, TEXT_PLAIN};
use crate::services::transfer_service::{TransferService, UploadRequest};

const SERVICE_NAME: &str = "Image Uploader Tool";
const UPLOAD_OK: &str = "Thank you, you have successfully uploaded your image.";
const DOWNLOAD_OK: &str = "Image is successfully downloaded.";

pub struct AppState {
    pub(crate) transfer: TransferService,
    pub(crate) downloads_dir: PathBuf,
}

#[derive(Deserialize)]
struct DownloadParams {
    filename: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(upload_image)
        .service(list_all_images)
        .service(download_image);
}

#[get("/")]
async fn home() -> impl Responder {
    HttpResponse::Ok().content_type(TEXT_PLAIN).body(SERVICE_NAME)
}

#[post("/upload/")]
async fn upload_image(
    request_json_bytes: web::Bytes,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, TransferErr> {
    let req: UploadRequest = serde_json::from_slice(&request_json_bytes).map_err(|parse_err| {
        tracing::warn!("rejected upload body: {}", parse_err);
        TransferErr::InvalidRequest(parse_err.to_string())
    })?;

    web::block(move || shared_state.transfer.upload(req)).await??;
    Ok(HttpResponse::Ok().content_type(TEXT_PLAIN).body(UPLOAD_OK))
}

#[get("/list/")]
async fn list_all_images(shared_state: Data<AppState>) -> Result<HttpResponse, TransferErr> {
    let images = web::block(move || shared_state.transfer.list_all()).await?;

    // one single-key object per image
    let body: Vec<BTreeMap<String, String>> = images
        .into_iter()
        .map(|image| BTreeMap::from([(image.filename, image.description)]))
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

#[get("/download")]
async fn download_image(
    params: web::Query<DownloadParams>,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, TransferErr> {
    let filename = params
        .into_inner()
        .filename
        .ok_or_else(|| TransferErr::InvalidRequest("missing filename query parameter".to_string()))?;

    web::block(move || shared_state.transfer.download(&filename, &shared_state.downloads_dir)).await??;
    Ok(HttpResponse::Ok().content_type(TEXT_PLAIN).body(DOWNLOAD_OK))
}
