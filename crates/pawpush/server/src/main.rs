//! Pawpush Server - push notification endpoint.

use axum::Router;
use color_eyre::eyre::WrapErr as _;
use push_fcm::{CachedExchanger, FcmSender, GoogleTokenExchanger};
use push_service::{Backend, PushService, Settings};
use push_storage::{AllStorage, SqliteStorage, SupabaseStore};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("pawpush-server starting");

    let settings = Settings::resolve().wrap_err("failed to load settings")?;

    match settings.backend() {
        Backend::Sqlite { database_url } => {
            let storage =
                SqliteStorage::open(&database_url).wrap_err("failed to initialize storage")?;

            tracing::info!(database_url = %database_url, "using sqlite backend");
            serve(settings, storage).await
        }
        Backend::Supabase => {
            // Missing values surface per request as configuration errors.
            let storage = SupabaseStore::new(
                settings.supabase_url.as_deref().unwrap_or_default(),
                settings.supabase_anon_key.as_deref().unwrap_or_default(),
                settings
                    .supabase_service_role_key
                    .as_deref()
                    .unwrap_or_default(),
            );

            tracing::info!("using supabase backend");
            serve(settings, storage).await
        }
    }
}

async fn serve<S>(settings: Settings, storage: S) -> color_eyre::eyre::Result<()>
where
    S: AllStorage + Clone + 'static,
{
    let addr = settings.bind_addr;

    let sender = match settings.fcm_base_url.as_deref() {
        Some(base_url) if !base_url.is_empty() => FcmSender::with_base_url(base_url),
        _ => FcmSender::new(),
    };
    let exchanger = CachedExchanger::new(GoogleTokenExchanger::new());

    let service = PushService::new(settings, storage, exchanger, sender);

    let app = Router::new()
        .merge(push_http::push_router(service))
        .layer(TraceLayer::new_for_http());

    tracing::info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err("failed to bind")?;

    axum::serve(listener, app).await.wrap_err("server error")?;

    Ok(())
}
