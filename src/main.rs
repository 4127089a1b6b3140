#![cfg_attr(debug_assertions, allow(dead_code, unused_imports))]

use axum::{
    extract::DefaultBodyLimit, http::Method, Router
};

use http::HeaderValue;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use model::SwapController;
use server::ServerConfig;
use tokio::net::TcpListener;
use tools::log::{log_info, LogServiceType};
use tower::ServiceBuilder;
use tower_http::cors::{CorsLayer, Any};
pub use self::error::{Result, Error};

mod model;
mod routes;
mod error;
mod tools;
mod server;
mod domain;
mod plugins;


#[tokio::main]
async fn main() ->  Result<()> {
    log_info(LogServiceType::Register, format!("Starting facemix server"));
    log_info(LogServiceType::Register, format!("Initializing config"));
    let config = server::initialize_config().await?;

    let local_port = config.server_port();
    let app = app(&config)?;

    let listener = TcpListener::bind(format!("0.0.0.0:{}", local_port)).await?;
    log_info(LogServiceType::Register, format!("->> LISTENING on {:?}\n", listener.local_addr()));

    axum::serve(listener, app).await?;

    Ok(())
}


fn app(config: &ServerConfig) -> Result<Router> {
    let mc = SwapController::new(config)?;

    let cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::HEAD, Method::OPTIONS, Method::POST])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);
    // the allowed origin is configuration, not a per-deployment code edit
    let cors = match &config.cors {
        Some(origin) => cors.allow_origin(origin.parse::<HeaderValue>().map_err(|_| Error::Error { message: format!("Invalid CORS origin: {}", origin) })?),
        None => cors.allow_origin(Any),
    };

    Ok(Router::new()
        .nest("/ping", routes::ping::routes())
        .nest("/api", routes::swap::routes(mc.clone()).merge(routes::download::routes(mc.clone())))
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(cors)
        )
    )
}
