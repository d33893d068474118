use std::io::{BufRead, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use crossbeam_channel::RecvTimeoutError;
use tracing::{info, warn};

use respondr::categorizer::Category;
use respondr::config::Config;
use respondr::db::{Database, MetadataStore};
use respondr::fixtures::sample_documents;
use respondr::metadata::{DocumentRecord, SourceLocation};
use respondr::pipeline::{Pipeline, PipelineConfig};
use respondr::report::{format_bytes, ranked, Dashboard, DocumentQuery, Statistics};
use respondr::storage::{FsObjectStore, ObjectStore};
use respondr::worker::{handle_event_json, Job, JobResult, StorageEvent, WorkerPool};

use crate::Commands;

pub fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Process { container, key } => cmd_process(&config, container, key),
        Commands::HandleEvent { input } => cmd_handle_event(&config, &input),
        Commands::Worker { workers } => cmd_worker(&config, workers),
        Commands::Backfill {
            container,
            prefix,
            workers,
        } => cmd_backfill(&config, &container, prefix.as_deref(), workers),
        Commands::Verify => cmd_verify(&config),
        Commands::Report { org, doctype, json } => {
            cmd_report(&config, DocumentQuery::new(org, doctype), json)
        }
        Commands::Text { document_id } => cmd_text(&config, &document_id),
        Commands::MakeFixtures { dir, upload, org } => {
            cmd_make_fixtures(&config, &dir, upload.as_deref(), &org)
        }
    }
}

fn build_pipeline(config: &Config) -> anyhow::Result<Arc<Pipeline>> {
    let pipeline_config = Arc::new(PipelineConfig::from_config(config));
    let pipeline = Pipeline::from_config(pipeline_config).context("Failed to set up pipeline")?;
    Ok(Arc::new(pipeline))
}

fn open_dashboard(config: &Config) -> anyhow::Result<Dashboard> {
    let db = Database::open(Path::new(&config.database_path))
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;
    let store = FsObjectStore::new(&config.storage_root);
    Ok(Dashboard::new(
        Arc::new(db),
        Arc::new(store),
        config.parsed_container.clone(),
    ))
}

fn cmd_process(config: &Config, container: String, key: String) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let source = SourceLocation::new(container, key);
    if !source.is_pdf() {
        warn!(key = %source.key, "Object does not have a .pdf suffix; processing anyway");
    }

    let record = pipeline
        .process(source.clone())
        .with_context(|| format!("Processing {} failed", source))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn cmd_handle_event(config: &Config, input: &str) -> anyhow::Result<()> {
    let body = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read notification from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read notification file {}", input))?
    };

    let pipeline = build_pipeline(config)?;
    let response = handle_event_json(&pipeline, &body);
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        bail!("{}", response.body);
    }
    Ok(())
}

/// Prints results as they arrive; returns (succeeded, failed).
fn spawn_result_printer(pool: &WorkerPool) -> thread::JoinHandle<(usize, usize)> {
    let results = pool.results();
    thread::spawn(move || {
        let mut counts = (0, 0);
        for result in results.iter() {
            print_result(&result, &mut counts);
        }
        counts
    })
}

fn print_result(result: &JobResult, counts: &mut (usize, usize)) {
    if result.success {
        counts.0 += 1;
        println!(
            "OK   {} -> {} ({})",
            result.source,
            result.document_id.as_deref().unwrap_or("-"),
            result
                .document_type
                .map(|t| t.as_str())
                .unwrap_or("unknown"),
        );
    } else {
        counts.1 += 1;
        println!(
            "FAIL {}: {}",
            result.source,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

fn finish_pool(pool: WorkerPool, printer: thread::JoinHandle<(usize, usize)>) {
    let leftovers = pool.wait();
    let mut counts = printer.join().unwrap_or((0, 0));
    for result in &leftovers {
        print_result(result, &mut counts);
    }
    println!("\n{} succeeded, {} failed", counts.0, counts.1);
}

fn cmd_worker(config: &Config, workers: Option<usize>) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let worker_count = workers.unwrap_or(config.worker_count).max(1);

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    let (line_tx, line_rx) = crossbeam_channel::unbounded::<std::io::Result<String>>();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let pool = WorkerPool::new(pipeline, worker_count);
    let printer = spawn_result_printer(&pool);
    info!("Reading notifications from stdin (Ctrl-C to stop)");

    while running.load(Ordering::SeqCst) {
        match line_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok(line)) if line.trim().is_empty() => continue,
            Ok(Ok(line)) => match StorageEvent::from_json(&line) {
                Ok(event) => {
                    for source in event.sources() {
                        if !source.is_pdf() {
                            info!(key = %source.key, "Skipping non-PDF object");
                            continue;
                        }
                        pool.submit(Job::new(source))?;
                    }
                }
                Err(e) => warn!(error = %e, "Ignoring malformed notification"),
            },
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if !running.load(Ordering::SeqCst) {
        pool.shutdown();
    }
    finish_pool(pool, printer);
    Ok(())
}

fn cmd_backfill(
    config: &Config,
    container: &str,
    prefix: Option<&str>,
    workers: Option<usize>,
) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let keys: Vec<String> = pipeline
        .object_store()
        .list(container, prefix)
        .with_context(|| format!("Failed to list container {}", container))?
        .into_iter()
        .filter(|key| SourceLocation::new(container, key.as_str()).is_pdf())
        .collect();

    if keys.is_empty() {
        println!("No PDF objects found in {}", container);
        return Ok(());
    }
    println!("Backfilling {} documents from {}", keys.len(), container);

    let pool = WorkerPool::new(pipeline, workers.unwrap_or(config.worker_count).max(1));
    let printer = spawn_result_printer(&pool);
    for key in keys {
        pool.submit(Job::new(SourceLocation::new(container, key)))?;
    }
    finish_pool(pool, printer);
    Ok(())
}

fn na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

fn joined<C: Category>(items: &[C]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
}

fn print_record(index: usize, record: &DocumentRecord) {
    println!("\n{}", "=".repeat(70));
    println!("DOCUMENT {}", index + 1);
    println!("{}", "=".repeat(70));

    println!("\nADMINISTRATIVE");
    println!("  Doc ID:         {}", record.document_id);
    println!("  Organization:   {}", record.organization_id);
    println!("  Source:         {}", record.source);
    println!("  Version:        {}", na(&record.version));
    println!("  Effective Date: {}", na(&record.effective_date));
    println!("  Author:         {}", na(&record.author));
    println!("  Processed:      {}", record.processed_at.to_rfc3339());

    println!("\nTECHNICAL");
    println!("  Pages:          {}", record.page_count);
    println!("  File Size:      {}", format_bytes(record.file_size_bytes));
    println!("  MIME Type:      {}", record.mime_type);
    println!(
        "  Checksum:       {}...",
        &record.checksum[..record.checksum.len().min(32)]
    );
    println!("  OCR Coverage:   {}%", record.ocr_coverage_pct);

    println!("\nCLASSIFICATION");
    println!("  Document Type:  {}", record.document_type);
    println!("  Roles:          {}", joined(&record.roles_involved));
    println!("  Hazards:        {}", joined(&record.hazard_types));
    println!("  Facility:       {}", na(&record.facility));
    println!("  Jurisdiction:   {}", na(&record.jurisdiction));
    println!("  Classification: {}", record.classification);
    println!(
        "  PII Present:    {}",
        if record.pii_present { "yes" } else { "no" }
    );

    let preview: String = record.text_preview.chars().take(200).collect();
    println!("\nTEXT PREVIEW\n  {}", preview.replace('\n', "\n  "));
}

fn print_counts(title: &str, counts: &std::collections::BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    println!("\n{}", title);
    for (name, count) in ranked(counts) {
        println!("  {:<20} {}", name, count);
    }
}

fn print_summary(stats: &Statistics) {
    println!("\nSUMMARY");
    println!("  Documents:      {}", stats.total_docs);
    println!("  Organizations:  {}", stats.total_orgs);
    println!("  Total Pages:    {}", stats.total_pages);
    println!("  Avg Pages:      {:.1}", stats.avg_pages);
    println!("  Total Size:     {}", format_bytes(stats.total_size));
    print_counts("DOCUMENT TYPES", &stats.document_types);
    print_counts("ROLES", &stats.roles);
    print_counts("HAZARDS", &stats.hazards);
    print_counts("ORGANIZATIONS", &stats.organizations);
}

fn cmd_verify(config: &Config) -> anyhow::Result<()> {
    let db = Database::open(Path::new(&config.database_path))
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;
    let mut records = db.scan_all().context("Error fetching documents")?;

    if records.is_empty() {
        println!("No documents found. Upload a PDF and run `respondr process` first.");
        return Ok(());
    }

    records.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
    println!("Found {} processed documents", records.len());
    for (index, record) in records.iter().enumerate() {
        print_record(index, record);
    }
    print_summary(&Statistics::from_records(&records));
    Ok(())
}

fn cmd_report(config: &Config, query: DocumentQuery, json: bool) -> anyhow::Result<()> {
    let dashboard = open_dashboard(config)?;
    let (stats, listing) = dashboard.statistics(&query);

    if json {
        let output = serde_json::json!({
            "statistics": stats,
            "documents": listing.documents,
            "error": listing.error,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(error) = &listing.error {
        println!("WARNING: {}", error);
    }
    print_summary(&stats);

    println!("\nDOCUMENTS");
    if listing.documents.is_empty() {
        println!("  (none)");
    }
    for record in &listing.documents {
        println!(
            "  {}  {:<16} {:<12} {}",
            record.processed_at.format("%Y-%m-%d %H:%M"),
            record.document_type.as_str(),
            record.organization_id,
            record.source.key,
        );
    }
    Ok(())
}

fn cmd_text(config: &Config, document_id: &str) -> anyhow::Result<()> {
    let retrieval = open_dashboard(config)?.full_text(document_id);
    if let Some(error) = retrieval.error {
        bail!(error);
    }
    println!("{}", retrieval.text);
    Ok(())
}

fn cmd_make_fixtures(
    config: &Config,
    dir: &Path,
    upload: Option<&str>,
    org: &str,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let store = upload.map(|_| FsObjectStore::new(&config.storage_root));

    for sample in sample_documents() {
        let pdf = sample
            .to_pdf()
            .with_context(|| format!("Failed to render {}", sample.file_name))?;
        let path = dir.join(sample.file_name);
        std::fs::write(&path, &pdf)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Created {}", path.display());

        if let (Some(store), Some(container)) = (&store, upload) {
            let key = format!("{}/{}", org, sample.file_name);
            store.put(container, &key, &pdf)?;
            println!("  stored as {}/{}", container, key);
        }
    }
    Ok(())
}
