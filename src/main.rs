use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use vc_actions::{build_dispatch_table, ActionPlanExecutor};
use vc_actions::audit::TracingAuditSink;
use vc_dialer::{DialerWorker, PendingCallRegistry};
use vc_persistence::{MockPersistenceClient, PersistenceClient, RestPersistenceClient};
use vc_providers::ProviderRegistry;
use vc_queue::{MockQueueBackend, QueueBackend, QueueService, RedisQueueBackend};
use vc_sessions::call_store::CallSessionStore;
use vc_sessions::transcript::TranscriptWriter;

use vocalis::config::Config;
use vocalis::dialer_supervisor::DialerSupervisor;
use vocalis::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vocalis=info,tower_http=info")),
        )
        .json()
        .init();

    tracing::info!("Vocalis starting");

    // ── Config ─────────────────────────────────────────────────────
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".into());
    let config = Config::load_or_default(&config_path);
    let production = config.is_production();

    tracing::info!(
        production,
        port = config.server.port,
        worker_count = config.dialer.worker_count,
        "configuration loaded"
    );

    std::fs::create_dir_all(&config.recordings_dir)?;

    // ── Queue backend ──────────────────────────────────────────────
    let queue_backend: Arc<dyn QueueBackend> = match &config.queue.redis_url {
        Some(url) => Arc::new(RedisQueueBackend::connect(url).await?),
        None if !production => {
            tracing::warn!("no redis_url configured; falling back to in-memory queue backend");
            Arc::new(MockQueueBackend::new())
        }
        None => anyhow::bail!("queue.redis_url is required in production"),
    };
    let queue = Arc::new(QueueService::new(queue_backend));

    // ── Persistence client ─────────────────────────────────────────
    let persistence: Arc<dyn PersistenceClient> = if !config.persistence.base_url.is_empty() {
        Arc::new(RestPersistenceClient::new(&config.persistence)?)
    } else if !production {
        tracing::warn!("no persistence.base_url configured; falling back to in-memory persistence client");
        Arc::new(MockPersistenceClient::new())
    } else {
        anyhow::bail!("persistence.base_url is required in production");
    };

    // ── Providers ──────────────────────────────────────────────────
    let providers = Arc::new(ProviderRegistry::from_config(&config.providers));

    // ── Sessions, transcripts, pending-call registry ──────────────
    // §4.5: absence of a configured shared store is a fatal startup error
    // in production; a dev deployment may fall back to in-memory-only.
    if config.session.shared_store_url.is_none() {
        if production {
            anyhow::bail!("session.shared_store_url is required in production");
        }
        tracing::warn!("no session.shared_store_url configured; falling back to in-memory-only session state");
    }
    let sessions = Arc::new(CallSessionStore::new());
    let transcripts = Arc::new(TranscriptWriter::new(&config.recordings_dir));
    let pending_calls = Arc::new(PendingCallRegistry::new());

    // ── Action-plan executor ───────────────────────────────────────
    let dispatch_table = build_dispatch_table(&config.actions);
    let actions = Arc::new(ActionPlanExecutor::new(
        dispatch_table,
        Arc::new(TracingAuditSink),
        config.actions.clone(),
        persistence.clone(),
    ));

    // ── Dialer supervisor ──────────────────────────────────────────
    // Requires all four provider kinds; a deployment that's only running
    // the control surface (or is still mid-setup) stays in dev mode with
    // `dialer: None` and the start/stop/status routes report that cleanly.
    let dialer = match (providers.stt(), providers.llm(), providers.tts(), providers.telephony()) {
        (Ok(stt), Ok(llm), Ok(tts), Ok(telephony)) => {
            let worker = Arc::new(DialerWorker {
                queue: queue.clone(),
                telephony,
                stt,
                llm,
                tts,
                sessions: sessions.clone(),
                transcripts: transcripts.clone(),
                pending_calls: pending_calls.clone(),
                persistence: persistence.clone(),
                dialer_config: config.dialer.clone(),
                pipeline_config: config.pipeline.clone(),
                recordings_dir: config.recordings_dir.clone(),
                webhook_base_url: config.public_base_url.clone(),
            });
            Some(Arc::new(DialerSupervisor::new(
                worker,
                config.dialer.worker_count,
                queue.clone(),
                config.queue.promote_interval_ms,
            )))
        }
        _ if production => {
            anyhow::bail!("stt, llm, tts, and telephony providers must all be configured in production");
        }
        _ => {
            tracing::warn!("stt/llm/tts/telephony providers not all configured; dialer disabled");
            None
        }
    };

    // ── App state ──────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let config = Arc::new(config);
    let state = AppState {
        config,
        queue,
        providers,
        sessions,
        persistence,
        actions,
        pending_calls,
        dialer,
    };

    // ── Router ─────────────────────────────────────────────────────
    let app = api::router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // ── Server ─────────────────────────────────────────────────────
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
