use std::path::Path;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{
    dev::Server, http::header, middleware, web, App, HttpServer, Scope,
};
use tracing::{info, warn};

use crate::{
    configuration::{AppState, State},
    controller::{borrow_quote, loans, pools, prices, version, wallet},
    error::Error,
};

/// Request bodies are small JSON documents, quotes being the largest.
const JSON_LIMIT: usize = 4096;

pub async fn server_task(app_state: &AppState<State>) -> Result<(), Error> {
    let app = app_state.clone();
    tokio::spawn(async move {
        let server = init_server(app)?;
        server.await?;
        Ok(())
    })
    .await?
}

pub fn api_scope() -> Scope {
    web::scope("/api")
        .service(version::index)
        .service(pools::index)
        .service(prices::index)
        .service(wallet::index)
        .service(loans::index)
        .service(borrow_quote::index)
}

/// `*` in the list allows every origin.
pub fn origin_allowed(allowed: &[String], origin: &str) -> bool {
    allowed
        .iter()
        .any(|item| item == "*" || item.trim_end_matches('/') == origin)
}

fn cors(allowed: Vec<String>) -> Cors {
    Cors::default()
        .allowed_origin_fn(move |origin, _| match origin.to_str() {
            Ok(origin) => origin_allowed(&allowed, origin),
            Err(_) => false,
        })
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::ACCEPT])
        .allowed_header(header::CONTENT_TYPE)
}

fn init_server(app_state: AppState<State>) -> Result<Server, Error> {
    let host = app_state.config.server_host.to_owned();
    let port = app_state.config.port;
    let static_dir = app_state.config.static_dir.to_owned();
    let serve_static = Path::new(&static_dir).is_dir();

    if !serve_static {
        warn!("Static directory {} not found, serving the API only", static_dir);
    }

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors(app_state.config.allowed_origins.clone()))
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT))
            .service(api_scope())
            .configure(|config| {
                if serve_static {
                    config.service(
                        Files::new("/", &static_dir).index_file("index.html"),
                    );
                }
            })
    })
    .bind((host.as_str(), port))?
    .disable_signals()
    .run();

    info!("Listening on {}:{}", host, port);

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origins(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn test_origin_allowed() {
        let allowed = origins(&["http://localhost:4321", "https://laina.example/"]);

        assert!(origin_allowed(&allowed, "http://localhost:4321"));
        assert!(origin_allowed(&allowed, "https://laina.example"));
        assert!(!origin_allowed(&allowed, "http://localhost:3000"));
        assert!(!origin_allowed(&[], "http://localhost:4321"));
    }

    #[test]
    fn test_wildcard_origin() {
        assert!(origin_allowed(&origins(&["*"]), "https://anywhere.example"));
    }
}
