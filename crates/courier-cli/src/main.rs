//! courier: classify uploaded files from the upload log.
//!
//! Built with `--features kafka` it consumes from the broker configured by
//! `KAFKA_*`. Otherwise it runs a local demo: every file in `UPLOAD_DIR`
//! becomes a job on an in-memory log, and the process exits once all of them
//! are resolved.

use std::sync::Arc;

use anyhow::{Context, Result};
use courier_core::app::{AnalysisPool, ClassificationPipeline, EngineBuilder, ShutdownHandle};
use courier_core::config::Settings;
use courier_core::impls::{InMemoryStatusStore, LocalObjectStore, PatternAnalyzer};
use courier_core::observability::DeliveryCounts;
use tracing::{info, warn};

mod telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(dotenvy::Error::Io(_)) => None,
        Err(e) => return Err(e).context("failed to parse .env"),
    };

    let settings = Settings::from_env().context("invalid configuration")?;
    telemetry::init(settings.log_format).context("failed to install tracing subscriber")?;
    if let Some(path) = env_file {
        info!(path = %path.display(), "loaded environment file");
    }
    info!(
        topic = %settings.kafka.topic,
        max_retries = settings.max_retries,
        backoff_secs = settings.retry_backoff.as_secs(),
        backoff_multiplier = ?settings.retry_backoff_multiplier,
        workers = settings.worker_processes,
        "starting courier"
    );

    let analyzer = PatternAnalyzer::standard().context("failed to compile analyzer patterns")?;
    let status = Arc::new(InMemoryStatusStore::new());
    let objects = Arc::new(LocalObjectStore::new(&settings.upload_dir));
    info!(root = %objects.root().display(), "reading uploads from local directory");
    let pipeline = Arc::new(ClassificationPipeline::new(
        objects,
        AnalysisPool::new(Arc::new(analyzer), settings.worker_processes),
        status.clone(),
    ));

    let shutdown = ShutdownHandle::new();
    listen_for_ctrl_c(shutdown.clone());

    let builder = EngineBuilder::new()
        .processor(pipeline)
        .config(settings.engine_config())
        .shutdown(shutdown.clone());

    let counts = run(&settings, builder, status, shutdown).await?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}

fn listen_for_ctrl_c(shutdown: ShutdownHandle) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            return;
        }
        info!("ctrl-c received, shutting down");
        shutdown.trigger();
    });
}

#[cfg(feature = "kafka")]
async fn run(
    settings: &Settings,
    builder: EngineBuilder,
    _status: Arc<InMemoryStatusStore>,
    _shutdown: ShutdownHandle,
) -> Result<DeliveryCounts> {
    use courier_core::impls::kafka::{KafkaDeadLetterSink, KafkaLogConsumer};

    let engine = builder
        .consumer(Arc::new(KafkaLogConsumer::connect(&settings.kafka)?))
        .dead_letters(Arc::new(KafkaDeadLetterSink::connect(&settings.kafka)?))
        .build()?;

    Ok(engine.spawn().join().await?)
}

#[cfg(not(feature = "kafka"))]
async fn run(
    settings: &Settings,
    builder: EngineBuilder,
    status: Arc<InMemoryStatusStore>,
    shutdown: ShutdownHandle,
) -> Result<DeliveryCounts> {
    use std::time::Duration;

    use courier_core::domain::{JobRecord, Topic};
    use courier_core::impls::{InMemoryDeadLetterSink, InMemoryLog};

    let log = Arc::new(InMemoryLog::new());
    let topic = Topic::new(&settings.kafka.topic);

    let mut entries = tokio::fs::read_dir(&settings.upload_dir)
        .await
        .with_context(|| format!("cannot read upload dir {}", settings.upload_dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut jobs = Vec::with_capacity(files.len());
    for path in &files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "skipping file with non UTF-8 name");
            continue;
        };
        let job = JobRecord::new(name, path.to_string_lossy());
        log.append(&topic, 0, job.to_payload()?).await;
        jobs.push(job.job_id);
    }
    info!(jobs = jobs.len(), dir = %settings.upload_dir.display(), "demo log seeded");

    let dead_letters = Arc::new(InMemoryDeadLetterSink::new());
    let running = builder
        .consumer(log.clone())
        .dead_letters(dead_letters.clone())
        .build()?
        .spawn();

    let mut signal = shutdown.signal();
    loop {
        tokio::select! {
            _ = signal.triggered() => break,
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                if running.is_finished() || log.is_drained().await {
                    break;
                }
            }
        }
    }
    let counts = running.shutdown_and_join().await?;

    for job_id in &jobs {
        match status.status(job_id).await {
            Some((state, detail)) if state.is_final() => {
                let findings = status.results(job_id).await.map_or(0, |f| f.len());
                println!(
                    "{job_id}: {state} findings={findings}{}",
                    detail.map(|d| format!(" error={d}")).unwrap_or_default()
                );
            }
            Some((state, _)) => println!("{job_id}: {state} (unresolved)"),
            None => println!("{job_id}: unresolved"),
        }
    }
    for (dlq, record) in dead_letters.records().await {
        println!("{dlq}: {}", serde_json::to_string(&record)?);
    }

    Ok(counts)
}
