use std::net::SocketAddr;

use anyhow::Context;
use tower_http::trace::TraceLayer;

use resource_booking::{
    auth::bootstrap::{build_credentials, seed_admin},
    config::AppConfig,
    db::connection,
    logging::init_tracing,
    mail::{EmailQueue, RetryPolicy, build_sender},
    routes::app,
    services::ServiceContext,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        eprintln!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().context("failed to load config")?;
    init_tracing(&cfg.logging)?;

    let db = connection::connect(&cfg.database).await?;
    let services = ServiceContext::new(&db);

    let credentials = build_credentials(&cfg.auth, &services);
    seed_admin(&cfg.auth, &services, credentials.as_ref()).await?;

    let sender = build_sender(&cfg.email)?;
    let (mailer, _email_worker) = EmailQueue::spawn(
        sender,
        RetryPolicy::from_config(&cfg.email),
        cfg.email.queue_capacity,
    );

    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port)
        .parse()
        .context("invalid host/port")?;
    let state = AppState::new(cfg, db, credentials, mailer);
    let router = app(state).layer(TraceLayer::new_for_http());

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
