//! Application entry point for the transcript reviewer.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Load the job manifest (first CLI argument, else `job.manifest_path`).
//! 4. Create the [`tokio`] runtime.
//! 5. Build the transport ([`HttpTransport`] or [`NullTransport`]).
//! 6. Build the suggestion index (cache, file, URL, job texts).
//! 7. Spawn the outbox worker.
//! 8. Open the audio deck and load the job's clips.
//! 9. Run [`eframe::run_native`], which blocks until the window is closed.
//! 10. Wait for the outbox worker to deliver what is still queued.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use eframe::egui;
use tokio::sync::mpsc;
use transcript_review::{
    app::ReviewApp,
    audio::AudioDeck,
    config::{AppConfig, AppPaths},
    session::{Job, ReviewSession, SessionOptions},
    suggest::SuggestionIndex,
    transport::{drain_outbox, run_outbox, HttpTransport, NullTransport, Outbox, ReviewTransport},
};

/// Queued messages per outbox queue before `try_send` starts failing.
const OUTBOX_CAPACITY: usize = 256;
const REPORT_CAPACITY: usize = 64;
/// Deck rate when no output device is available.
const FALLBACK_RATE: u32 = 48_000;

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Merge every configured word source into one index.  Unavailable sources
/// are logged and skipped.
async fn load_suggestions(
    config: &AppConfig,
    transport: &dyn ReviewTransport,
    cache: &Path,
    job: &Job,
) -> SuggestionIndex {
    let limit = config.suggest.limit;
    let mut index = SuggestionIndex::new(limit);

    let files = [Some(cache), config.suggest.prefetch_path.as_deref()];
    for path in files.into_iter().flatten() {
        if !path.exists() {
            continue;
        }
        match SuggestionIndex::load_from(path, limit) {
            Ok(loaded) => index.extend(loaded.entries()),
            Err(e) => log::warn!("suggestions: {}: {e}", path.display()),
        }
    }

    if let Some(url) = &config.suggest.prefetch_url {
        match transport.fetch_words(url).await {
            Ok(words) => {
                log::info!("suggestions: {} words from {url}", words.len());
                index.extend(words);
            }
            Err(e) => log::warn!("suggestions: could not fetch {url}: {e}"),
        }
    }

    index.seed_from_job(job);
    log::info!("suggestions: {} entries", index.len());
    index
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Open the configured output device; without one the session still works,
/// clips simply never advance.
fn open_deck(config: &AppConfig, job: &Job) -> AudioDeck {
    let mut deck = match AudioDeck::open(config.playback.output_device.as_deref()) {
        Ok(deck) => deck,
        Err(e) => {
            log::warn!("Audio output unavailable: {e}. Playback is silent.");
            AudioDeck::detached(FALLBACK_RATE)
        }
    };
    deck.load_job(job);
    deck
}

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Transcript Review")
        .with_inner_size([width, height])
        .with_min_inner_size([640.0, 360.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Transcript review starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let paths = AppPaths::new();

    // 3. Job
    let manifest: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.job.manifest_path.clone())
        .context("no job manifest: pass its path or set job.manifest_path in settings.toml")?;
    let job = Job::load(&manifest)?;

    // 4. Tokio runtime (outbox worker and the word-list fetch)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 5. Transport
    let transport: Arc<dyn ReviewTransport> = if config.server.enabled {
        log::info!("Review server: {}", config.server.base_url);
        Arc::new(HttpTransport::from_config(&config.server))
    } else {
        log::info!("Review server disabled; working offline");
        Arc::new(NullTransport)
    };

    // 6. Suggestions
    let suggestions = rt.block_on(load_suggestions(
        &config,
        transport.as_ref(),
        &paths.words_cache_file,
        &job,
    ));

    // 7. Outbox worker
    let (outbox, outbox_rx) = Outbox::channel(job.job_id.clone(), OUTBOX_CAPACITY);
    let (report_tx, report_rx) = mpsc::channel(REPORT_CAPACITY);
    let worker = rt.spawn(run_outbox(Arc::clone(&transport), outbox_rx, report_tx));

    // 8. Audio
    let deck = open_deck(&config, &job);

    // 9. Session + UI (blocks until the window is closed)
    let session = ReviewSession::new(
        job,
        Box::new(deck),
        outbox,
        suggestions,
        SessionOptions::from(&config),
    )?;
    let app = ReviewApp::new(session, report_rx, Some(paths.words_cache_file));

    eframe::run_native(
        "Transcript Review",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))?;

    // The app and its outbox are gone, so the worker exits once the queues
    // are empty.
    let limit = Duration::from_secs(config.server.timeout_secs);
    if rt.block_on(drain_outbox(worker, limit)) {
        log::info!("Outbox drained");
    }
    rt.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}
