//! HTTP resource over the catalog.
//!
//! `/protein/{key}` is keyed by name for `GET` and by id for `PUT` and
//! `PATCH`. Errors are returned as `{"message": ...}` with the status from
//! [`CatalogError`].

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{HttpRequest, HttpResponse, HttpServer, ResponseError, web};
use serde::Serialize;
use tracing::{error, info};

use crate::app::App;
use crate::domain::{NewProtein, ProteinPatch};
use crate::error::CatalogError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl ResponseError for CatalogError {
    fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::Conflict(_) => StatusCode::CONFLICT,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {self}");
        }
        HttpResponse::build(status).json(ErrorBody {
            message: self.to_string(),
        })
    }
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    CatalogError::Validation(err.to_string()).into()
}

/// Runs a store-bound closure on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, CatalogError>
where
    F: FnOnce() -> Result<T, CatalogError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await.map_err(CatalogError::store)?
}

async fn health(app: web::Data<App>) -> HttpResponse {
    let app = app.get_ref().clone();
    match run_blocking(move || app.store().ping())
        .await
        .inspect_err(|err| error!("health check failed: {err}"))
    {
        Ok(()) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

async fn lookup(
    app: web::Data<App>,
    name: web::Path<String>,
) -> Result<HttpResponse, CatalogError> {
    let app = app.get_ref().clone();
    let name = name.into_inner();
    let records = run_blocking(move || app.lookup(&name)).await?;
    Ok(HttpResponse::Ok().json(records))
}

async fn create(
    app: web::Data<App>,
    id: web::Path<String>,
    body: web::Json<NewProtein>,
) -> Result<HttpResponse, CatalogError> {
    let app = app.get_ref().clone();
    let id = id.into_inner();
    let request = body.into_inner();
    let created = run_blocking(move || app.create(&id, &request)).await?;
    Ok(HttpResponse::Created().json(created))
}

async fn update(
    app: web::Data<App>,
    id: web::Path<String>,
    body: web::Json<ProteinPatch>,
) -> Result<HttpResponse, CatalogError> {
    let app = app.get_ref().clone();
    let id = id.into_inner();
    let patch = body.into_inner();
    let updated = run_blocking(move || app.update(&id, &patch)).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Registers the catalog routes. Callers provide `web::Data<App>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/health", web::get().to(health))
        .service(
            web::resource("/protein/{key}")
                .route(web::get().to(lookup))
                .route(web::put().to(create))
                .route(web::patch().to(update)),
        );
}

pub async fn serve(app: App, bind: &str) -> std::io::Result<()> {
    let app = web::Data::new(app);
    info!(bind, "starting protein catalog service");
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .app_data(app.clone())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}
