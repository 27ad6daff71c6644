use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use docsort_agent::AgentRunner;
use docsort_catalog::{CatalogClient, Document, DocumentPatch};
use docsort_engine::{CategorizationEngine, CategorizationResult, EntityKind, PendingSender};
use std::fs;
use std::path::PathBuf;

mod config;
mod render;

use config::Settings;

#[derive(Parser)]
#[command(name = "docsort")]
#[command(about = "Agent-assisted metadata suggestions for a document catalog", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the catalog connection and credentials
    #[command(name = "test-connection")]
    TestConnection,

    /// List documents currently in the inbox
    #[command(name = "list-inbox")]
    ListInbox(ListInboxArgs),

    /// Propose metadata for documents and optionally apply it
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
struct ListInboxArgs {
    /// Emit documents as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Analyze a single document by id (skips inbox listing)
    #[arg(long)]
    id: Option<u64>,

    /// Analyze at most N inbox documents
    #[arg(long)]
    limit: Option<usize>,

    /// Emit results as JSON on stdout
    #[arg(long, conflicts_with = "apply")]
    json: bool,

    /// Write results as JSON to a file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Interactively create proposed correspondents and update documents
    #[arg(long)]
    apply: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::ListInbox(args) => args.json,
        Commands::Analyze(args) => args.json,
        Commands::TestConnection => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let settings = Settings::from_env()?;

    match cli.command {
        Commands::TestConnection => test_connection(&settings).await,
        Commands::ListInbox(args) => list_inbox(&settings, args).await,
        Commands::Analyze(args) => analyze(settings, args).await,
    }
}

async fn test_connection(settings: &Settings) -> Result<()> {
    let client = CatalogClient::new(&settings.catalog_url, &settings.catalog_token)?;
    client
        .test_connection()
        .await
        .with_context(|| format!("connecting to {}", settings.catalog_url))?;
    println!("Connected to {}", settings.catalog_url);
    Ok(())
}

async fn list_inbox(settings: &Settings, args: ListInboxArgs) -> Result<()> {
    let client = CatalogClient::new(&settings.catalog_url, &settings.catalog_token)?;
    let documents = client
        .list_inbox_documents(None)
        .await
        .context("listing inbox documents")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(());
    }

    if documents.is_empty() {
        println!("Inbox is empty.");
        return Ok(());
    }
    for document in &documents {
        println!("{}", render::inbox_line(document));
    }
    println!("{} document(s) in inbox", documents.len());
    Ok(())
}

async fn analyze(settings: Settings, args: AnalyzeArgs) -> Result<()> {
    let client = CatalogClient::new(&settings.catalog_url, &settings.catalog_token)?;
    let documents = fetch_documents(&client, &settings, &args).await?;

    if documents.is_empty() {
        log::info!("no unprocessed inbox documents");
        if args.json {
            println!("[]");
        } else {
            println!("Nothing to analyze.");
        }
        return Ok(());
    }

    let runner = settings.build_runner();
    log::info!(
        "analyzing {} document(s) with the {} agent",
        documents.len(),
        runner.backend_name()
    );

    let mut engine =
        CategorizationEngine::new(client, runner, settings.protected_tags.clone());

    let mut results: Vec<CategorizationResult> = Vec::with_capacity(documents.len());
    for document in &documents {
        let result = engine
            .resolve(document)
            .await
            .with_context(|| format!("categorizing document {}", document.id))?;
        if !args.json {
            println!("{}\n", render::result_block(&result));
        }
        results.push(result);
    }

    if !args.json && !engine.pending_senders().is_empty() {
        println!("New correspondents proposed this run:");
        for entry in engine.pending_senders() {
            let ids: Vec<String> = entry.document_ids.iter().map(u64::to_string).collect();
            println!("  {} (documents: {})", entry.name, ids.join(", "));
        }
        println!();
    }

    if args.apply {
        run_apply(&mut engine, &documents, &mut results, &settings).await?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    if let Some(path) = &args.export {
        fs::write(path, serde_json::to_string_pretty(&results)?)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("exported {} result(s) to {}", results.len(), path.display());
    }

    Ok(())
}

async fn fetch_documents(
    client: &CatalogClient,
    settings: &Settings,
    args: &AnalyzeArgs,
) -> Result<Vec<Document>> {
    if let Some(id) = args.id {
        let document = client
            .get_document(id)
            .await
            .with_context(|| format!("fetching document {id}"))?;
        return Ok(vec![document]);
    }

    let processed_tag_id = find_tag_id(client, &settings.processed_tag).await?;
    let mut documents = client
        .list_inbox_documents(processed_tag_id)
        .await
        .context("listing inbox documents")?;
    if let Some(limit) = args.limit {
        documents.truncate(limit);
    }
    Ok(documents)
}

async fn find_tag_id(client: &CatalogClient, name: &str) -> Result<Option<u64>> {
    let tags = client.list_tags().await.context("listing tags")?;
    Ok(tags
        .iter()
        .find(|tag| tag.name.eq_ignore_ascii_case(name))
        .map(|tag| tag.id))
}

/// The interactive apply flow: create confirmed correspondents, re-resolve
/// the documents that proposed them, then push confirmed updates (always
/// adding the processed tag).
async fn run_apply(
    engine: &mut CategorizationEngine<CatalogClient, AgentRunner>,
    documents: &[Document],
    results: &mut [CategorizationResult],
    settings: &Settings,
) -> Result<()> {
    let pending: Vec<PendingSender> = engine.pending_senders().to_vec();
    let mut affected: Vec<u64> = Vec::new();

    for entry in &pending {
        let create = Confirm::new()
            .with_prompt(format!("Create correspondent {:?}?", entry.name))
            .default(true)
            .interact()?;
        if !create {
            continue;
        }
        let created = engine
            .store()
            .create_correspondent(&entry.name)
            .await
            .with_context(|| format!("creating correspondent {:?}", entry.name))?;
        log::info!("created correspondent {:?} (id {})", created.name, created.id);
        affected.extend(entry.document_ids.iter().copied());
    }

    if !affected.is_empty() {
        engine.invalidate(EntityKind::Correspondent);
        engine.clear_pending();

        for document in documents.iter().filter(|d| affected.contains(&d.id)) {
            log::info!("re-categorizing document {} after correspondent creation", document.id);
            let refreshed = engine
                .resolve(document)
                .await
                .with_context(|| format!("re-categorizing document {}", document.id))?;
            if let Some(slot) = results.iter_mut().find(|r| r.document_id == document.id) {
                *slot = refreshed;
            }
        }
    }

    let processed_tag_id = ensure_tag(engine.store(), &settings.processed_tag).await?;

    for result in results.iter() {
        if !result.has_suggestions() {
            continue;
        }
        let patch = build_patch(result, processed_tag_id);
        if patch.is_empty() {
            continue;
        }

        println!("{}", render::result_block(result));
        let confirmed = Confirm::new()
            .with_prompt(format!("Apply updates to document {}?", result.document_id))
            .default(true)
            .interact()?;
        if !confirmed {
            continue;
        }

        engine
            .store()
            .update_document(result.document_id, &patch)
            .await
            .with_context(|| format!("updating document {}", result.document_id))?;
        log::info!("updated document {}", result.document_id);
    }

    Ok(())
}

async fn ensure_tag(client: &CatalogClient, name: &str) -> Result<u64> {
    if let Some(id) = find_tag_id(client, name).await? {
        return Ok(id);
    }
    let tag = client
        .create_tag(name)
        .await
        .with_context(|| format!("creating tag {name:?}"))?;
    log::info!("created tag {:?} (id {})", tag.name, tag.id);
    Ok(tag.id)
}

/// Build the write-back patch for one successful result. Unresolved (new)
/// entities are skipped; the processed tag is always part of the tag set.
fn build_patch(result: &CategorizationResult, processed_tag_id: u64) -> DocumentPatch {
    let mut tags = result.suggested_tag_ids.clone();
    if !tags.contains(&processed_tag_id) {
        tags.push(processed_tag_id);
    }

    DocumentPatch {
        title: result
            .suggested_title
            .clone()
            .filter(|title| *title != result.current.title),
        correspondent: result
            .suggested_correspondent
            .as_ref()
            .and_then(|entity| entity.id),
        document_type: result.suggested_type.as_ref().and_then(|entity| entity.id),
        storage_path: result
            .suggested_storage_path
            .as_ref()
            .and_then(|entity| entity.id),
        tags: Some(tags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsort_engine::{CurrentFields, Status, SuggestedEntity};
    use pretty_assertions::assert_eq;

    fn result_with_suggestions() -> CategorizationResult {
        CategorizationResult {
            document_id: 42,
            status: Status::Success,
            current: CurrentFields {
                title: "scan_42".to_string(),
                ..Default::default()
            },
            suggested_title: Some("Electricity Bill".to_string()),
            suggested_type: Some(SuggestedEntity {
                name: "Invoice".to_string(),
                id: Some(21),
                is_new: false,
            }),
            suggested_tags: vec![],
            suggested_tag_ids: vec![2, 7],
            suggested_correspondent: Some(SuggestedEntity {
                name: "Netflix".to_string(),
                id: None,
                is_new: true,
            }),
            suggested_storage_path: None,
            error_message: None,
        }
    }

    #[test]
    fn patch_always_includes_processed_tag() {
        let patch = build_patch(&result_with_suggestions(), 99);
        assert_eq!(patch.tags, Some(vec![2, 7, 99]));

        let mut result = result_with_suggestions();
        result.suggested_tag_ids = vec![99];
        let patch = build_patch(&result, 99);
        assert_eq!(patch.tags, Some(vec![99]));
    }

    #[test]
    fn patch_skips_unresolved_entities_and_unchanged_title() {
        let patch = build_patch(&result_with_suggestions(), 99);
        assert_eq!(patch.correspondent, None);
        assert_eq!(patch.document_type, Some(21));
        assert_eq!(patch.title.as_deref(), Some("Electricity Bill"));

        let mut result = result_with_suggestions();
        result.suggested_title = Some("scan_42".to_string());
        let patch = build_patch(&result, 99);
        assert_eq!(patch.title, None);
    }
}
