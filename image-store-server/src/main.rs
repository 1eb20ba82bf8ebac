mod config;
mod errors;
mod params;
mod services;

use std::fs::OpenOptions;
use std::path::Path;
use std::process;
use std::sync::{Arc, Mutex};
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use blob_store::{BlobStore, Engine};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use crate::config::{downloads_dir, AppConfig};
use crate::params::Args;
use crate::services::image_service::{self, AppState};
use crate::services::transfer_service::TransferService;

fn init_tracing(log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref())?;

    let conf = match AppConfig::resolve(&args.config, args.conn_str.clone()) {
        Ok(conf) => conf,
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(2);
        }
    };
    let downloads_dir = match downloads_dir(args.downloads_dir.clone()) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(2);
        }
    };

    // Opened once, shared by every worker, closed when the server exits.
    let engine = match Engine::connect(&conf.conn_str, args.connect_timeout()) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            tracing::error!("Creating connection with db failed: {}", e);
            process::exit(1);
        }
    };

    let state = web::Data::new(AppState {
        transfer: TransferService::new(BlobStore::new(engine)),
        downloads_dir,
    });

    tracing::info!("listening on {}", args.http_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(image_service::configure)
    })
        .bind(args.http_addr.clone())?
        .run()
        .await
}
