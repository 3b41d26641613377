//! Demo server wiring the context subsystem end to end.
//!
//! Registers the default providers, synthesizes and activates the logging
//! configuration, then installs the generated middlewares on an axum
//! router in registry order (first registered = outermost inbound).

use axum::{routing::get, Extension, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use log_context::{ContextBag, LogConfigurator, LogSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = LogSettings::default();
    settings
        .log_contexts
        .push("response_time".to_string());

    let configurator = LogConfigurator::bootstrap(settings)?;
    configurator.configure(None, true)?;

    tracing::info!("log-context demo starting");

    let mut app = Router::new()
        .route("/", get(index))
        .layer(TraceLayer::new_for_http());

    // Router::layer wraps outside-in, so install in reverse registry order
    // to keep the first-registered provider outermost.
    for (name, layer) in configurator.all_middlewares().into_iter().rev() {
        tracing::debug!(middleware = %name, "installing context middleware");
        app = app.layer(layer);
    }

    let listener = TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(bag: Option<Extension<ContextBag>>) -> String {
    tracing::info!("handling request");

    let mut tags: Vec<String> = bag
        .map(|Extension(bag)| {
            bag.iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect()
        })
        .unwrap_or_default();
    tags.sort();
    tags.join("\n")
}
