// File: services/bodywork_backend/src/main.rs
mod app_state;
mod service_factory;

use app_state::{build_booking_state, StartupError};
use axum::{routing::get, Router};
use bodywork_booking::routes as booking_routes;
use bodywork_config::{load_config, SECRET_FROM_ENV};
use http::{HeaderName, Method};
use service_factory::BodyworkServiceFactory;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    bodywork_common::logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            bodywork_common::log_error(&err, "Server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = load_config()?;
    let services = BodyworkServiceFactory::new(&config);
    let state = build_booking_state(&config, &services).await?;

    // An unresolved marker means the environment variable was missing
    let admin_secret = config
        .admin
        .shared_secret
        .clone()
        .filter(|secret| !secret.is_empty() && secret != SECRET_FROM_ENV);
    if admin_secret.is_none() {
        error!("admin.shared_secret is not set; admin endpoints will refuse every request");
    }

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Bodywork booking API!" }))
        .merge(booking_routes(state, admin_secret));

    #[allow(unused_mut)] // only mutated with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use bodywork_booking::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Bodywork Booking API",
                version = "0.1.0",
                description = "Appointment booking for a massage practice",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            components(),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            http::header::CONTENT_TYPE,
            HeaderName::from_static("x-admin-secret"),
            HeaderName::from_static("x-actor-id"),
        ]);
    let app = app.layer(cors).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
