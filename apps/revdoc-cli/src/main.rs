//! # revdoc CLI
//!
//! Edits an asset stored on disk as `document.<ext>` (the published text)
//! and `draft.<ext>` (present only while there are unpublished changes).
//! Every edit goes through the authoritative document exactly as a remote
//! client's would, so drafts, publishing and exports behave the same.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::*;
use revdoc_core::{char_len, ClientId, DocumentId, TextOperation};
use revdoc_sdk::{ClientConfigBuilder, DocumentServer, EditorClient, MemoryTransport};
use revdoc_store::{
    export_to_dir, AssetCommand, AssetEvent, DocumentStore, EditText, FsPersistence,
    Persistence, PlainTextExporter, SharedDocument, StoreConfigBuilder,
};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "revdoc")]
#[command(about = "Edit, publish and export revdoc assets")]
#[command(version)]
struct Cli {
    /// Asset directory
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Extension of the asset files
    #[arg(long, default_value = "txt")]
    ext: String,

    /// Identity edits are made under
    #[arg(short, long, default_value = "cli")]
    user: String,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new asset with the given published text
    Init {
        #[arg(default_value = "")]
        text: String,
    },
    /// Print the published text, or the draft with --draft
    Show {
        #[arg(long)]
        draft: bool,
    },
    /// Insert text into the draft at a char position
    Insert { position: usize, text: String },
    /// Delete chars from the draft
    Delete { position: usize, count: usize },
    /// Publish the draft
    Publish,
    /// Render the published text into an output directory
    Export {
        out: PathBuf,
        /// Entry path the output name is derived from
        #[arg(long, default_value = "document")]
        entry: String,
    },
    /// Show draft state and sizes
    Status,
    /// Two in-process clients edit concurrently and converge
    Demo,
}

// ─── Asset access ─────────────────────────────────────────────────────────

fn store_for(cli: &Cli) -> DocumentStore {
    let config = StoreConfigBuilder::new()
        .file_extension(cli.ext.as_str())
        .build();
    DocumentStore::new(config)
}

struct Asset {
    store: DocumentStore,
    persistence: FsPersistence,
    id: DocumentId,
    document: SharedDocument,
}

impl Asset {
    fn open(cli: &Cli) -> CliResult<Self> {
        let store = store_for(cli);
        let persistence = store.persistence_in(&cli.dir);
        let id = DocumentId::from_string(cli.dir.display().to_string());
        let document = store.open(id.clone(), &persistence)?;
        tracing::debug!(dir = %cli.dir.display(), revision = %document.lock().revision(), "Opened asset");
        Ok(Self {
            store,
            persistence,
            id,
            document,
        })
    }

    fn edit(
        &self,
        user: &ClientId,
        build: impl FnOnce(usize) -> CliResult<TextOperation>,
    ) -> CliResult<AssetEvent> {
        let (len, base) = {
            let document = self.document.lock();
            (char_len(document.draft()), document.revision())
        };
        let op = build(len)?;
        let command = AssetCommand::EditText(EditText::new(user.clone(), &op, base));
        self.dispatch(user, command)
    }

    fn dispatch(&self, user: &ClientId, command: AssetCommand) -> CliResult<AssetEvent> {
        let (event, changes) = self.store.dispatch(&self.id, user, command)?;
        for change in changes {
            tracing::debug!(dir = %self.persistence.dir().display(), ?change, "Document changed");
        }
        Ok(event)
    }

    fn save(&self) -> CliResult<()> {
        self.store.save(&self.id, &self.persistence)?;
        Ok(())
    }
}

// ─── Pretty printing ──────────────────────────────────────────────────────

fn header(text: &str) {
    let bar = "═".repeat(60);
    println!("\n{}", bar.bright_cyan());
    println!("  {}", text.bold().bright_white());
    println!("{}", bar.bright_cyan());
}

fn step(text: &str) {
    println!("  {} {}", "•".bright_green(), text);
}

fn badge(has_draft: bool) -> ColoredString {
    if has_draft {
        "draft".bright_yellow()
    } else {
        "published".bright_green()
    }
}

// ─── Commands ─────────────────────────────────────────────────────────────

fn run_init(cli: &Cli, text: &str) -> CliResult<()> {
    let persistence = store_for(cli).persistence_in(&cli.dir);
    if persistence.document_path().exists() {
        return Err(format!("{} already exists", persistence.document_path().display()).into());
    }
    persistence.save(text, None)?;
    if cli.json {
        println!("{}", serde_json::json!({ "created": persistence.document_path() }));
    } else {
        step(&format!("Created {}", persistence.document_path().display()));
    }
    Ok(())
}

fn run_show(cli: &Cli, draft: bool) -> CliResult<()> {
    let asset = Asset::open(cli)?;
    let document = asset.document.lock();
    let content = if draft { document.draft() } else { document.text() };
    if cli.json {
        println!("{}", serde_json::json!({ "content": content, "hasDraft": document.has_draft() }));
    } else {
        print!("{}", content);
    }
    Ok(())
}

fn run_edit(cli: &Cli, build: impl FnOnce(usize) -> CliResult<TextOperation>) -> CliResult<()> {
    let asset = Asset::open(cli)?;
    let user = ClientId::new(cli.user.as_str());
    let event = asset.edit(&user, build)?;
    asset.save()?;

    if cli.json {
        println!("{}", serde_json::to_string(&event)?);
    } else {
        let document = asset.document.lock();
        step(&format!(
            "{} ({} chars, {})",
            "Edited draft".bold(),
            char_len(document.draft()),
            badge(document.has_draft())
        ));
    }
    Ok(())
}

fn run_publish(cli: &Cli) -> CliResult<()> {
    let asset = Asset::open(cli)?;
    let event = asset.dispatch(&ClientId::new(cli.user.as_str()), AssetCommand::ApplyDraftChanges)?;
    asset.save()?;

    if cli.json {
        println!("{}", serde_json::to_string(&event)?);
    } else {
        step(&format!("{}", "Published draft".bold()));
    }
    Ok(())
}

fn run_export(cli: &Cli, out: &Path, entry: &str) -> CliResult<()> {
    let asset = Asset::open(cli)?;
    let document = asset.document.lock();
    let entry = format!("{}.{}", entry.trim_end_matches(&format!(".{}", cli.ext)), cli.ext);
    let path = export_to_dir(&PlainTextExporter, document.text(), out, &entry, &cli.ext)?;

    if cli.json {
        println!("{}", serde_json::json!({ "exported": path }));
    } else {
        step(&format!("Exported to {}", path.display()));
    }
    Ok(())
}

fn run_status(cli: &Cli) -> CliResult<()> {
    let asset = Asset::open(cli)?;
    let document = asset.document.lock();
    let snapshot = document.snapshot();

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "document": asset.persistence.document_path(),
                "hasDraft": document.has_draft(),
                "textChars": char_len(&snapshot.text),
                "draftChars": char_len(&snapshot.draft),
            })
        );
    } else {
        header(&format!("Asset {}", asset.persistence.dir().display()));
        step(&format!("State:   {}", badge(document.has_draft())));
        step(&format!("Text:    {} chars", char_len(&snapshot.text)));
        step(&format!("Draft:   {} chars", char_len(&snapshot.draft)));
    }
    Ok(())
}

fn run_demo() -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        header("Concurrent editing demo");

        let server = Arc::new(DocumentServer::default());
        let doc = DocumentId::from_string("demo");
        server.create_document(doc.clone(), "AB")?;
        let transport = Arc::new(MemoryTransport::new(server.clone()));

        let config = |name: &str| {
            ClientConfigBuilder::new()
                .user_name(name)
                .client_id(ClientId::new(name))
                .build()
        };
        let mut alice = EditorClient::connect(transport.clone(), doc.clone(), config("alice")).await?;
        let mut bob = EditorClient::connect(transport, doc.clone(), config("bob")).await?;

        step(&format!("Both start from {:?}", "AB"));
        alice.insert(0, "X").await?;
        step(&format!("{} inserts X at 0 → {:?}", "alice".bright_magenta(), alice.draft()));
        bob.insert(2, "Y").await?;
        step(&format!("{} inserts Y at 2 → {:?}", "bob".bright_magenta(), bob.draft()));

        alice.pump().await?;
        bob.pump().await?;
        step(&format!("{} sees {:?}", "alice".bright_magenta(), alice.draft()));
        step(&format!("{} sees {:?}", "bob".bright_magenta(), bob.draft()));

        alice.publish().await?;
        alice.pump().await?;
        bob.pump().await?;

        let snapshot = server.snapshot(&doc)?;
        step(&format!(
            "Published {:?} at revision {} {}",
            snapshot.text,
            snapshot.revision,
            "✓".bright_green()
        ));
        Ok::<(), Box<dyn Error>>(())
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Init { text } => run_init(&cli, text),
        Commands::Show { draft } => run_show(&cli, *draft),
        Commands::Insert { position, text } => run_edit(&cli, |len| {
            Ok(TextOperation::insert_at(len, *position, text)?)
        }),
        Commands::Delete { position, count } => run_edit(&cli, |len| {
            Ok(TextOperation::delete_at(len, *position, *count)?)
        }),
        Commands::Publish => run_publish(&cli),
        Commands::Export { out, entry } => run_export(&cli, out, entry),
        Commands::Status => run_status(&cli),
        Commands::Demo => run_demo(),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".bright_red().bold(), e);
        std::process::exit(1);
    }
}
