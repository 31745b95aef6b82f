//! `content-store` CLI entry-point.
//!
//! Available sub-commands:
//! - `list`: metadata of every page or paste, oldest first.
//! - `get`: one entity including its body.
//! - `insert`: store an entity read as JSON.
//! - `update`: rewrite an entity read as JSON.
//! - `delete`: remove an entity by id.
//! - `static`: print the body stored for a hashed page name.
//!
//! Entities are printed as JSON on stdout; logs go to stderr.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use store::{
    CrudEngine, Deadline, Driver, Entity, Page, Paste, StaticLookup, StoreConfig, StoreError,
    TablePair,
};

#[derive(Parser)]
#[command(
    name = "content-store",
    about = "Read and write record+content entities in a MySQL store",
    version
)]
struct Cli {
    /// TOML config file; flags and env vars override its values.
    #[arg(long, env = "CONTENT_STORE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[arg(long, env = "CONTENT_STORE_SOCKET", global = true)]
    socket: Option<PathBuf>,

    #[arg(long, env = "CONTENT_STORE_USER", global = true)]
    user: Option<String>,

    #[arg(long, env = "CONTENT_STORE_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "CONTENT_STORE_DATABASE", global = true)]
    database: Option<String>,

    /// Debug logging unless RUST_LOG is set.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Page,
    Paste,
}

impl Kind {
    fn default_tables(self) -> (&'static str, &'static str) {
        match self {
            Self::Page => ("pages", "page_contents"),
            Self::Paste => ("pastes", "paste_contents"),
        }
    }
}

#[derive(Debug, Args)]
struct TableArgs {
    #[arg(long)]
    record_table: Option<String>,
    #[arg(long)]
    content_table: Option<String>,
}

impl TableArgs {
    fn resolve(&self, kind: Kind) -> store::Result<TablePair> {
        let (record, content) = kind.default_tables();
        TablePair::new(
            self.record_table.as_deref().unwrap_or(record),
            self.content_table.as_deref().unwrap_or(content),
        )
    }
}

#[derive(Subcommand)]
enum Command {
    /// List metadata of every entity, oldest first.
    List {
        kind: Kind,
        #[command(flatten)]
        tables: TableArgs,
    },
    /// Fetch one entity including its body.
    Get {
        kind: Kind,
        id: String,
        #[command(flatten)]
        tables: TableArgs,
    },
    /// Insert an entity; `-` reads JSON from stdin.
    Insert {
        kind: Kind,
        input: PathBuf,
        #[command(flatten)]
        tables: TableArgs,
    },
    /// Update an entity (its `id` selects the row); `-` reads JSON from stdin.
    Update {
        kind: Kind,
        input: PathBuf,
        #[command(flatten)]
        tables: TableArgs,
    },
    /// Delete an entity by id.
    Delete {
        kind: Kind,
        id: String,
        #[command(flatten)]
        tables: TableArgs,
    },
    /// Print the body stored for a named static page.
    Static {
        name: String,
        #[arg(long, default_value = "page_contents")]
        content_table: String,
        #[arg(long, default_value = "page_hashes")]
        hash_table: String,
    },
}

enum Action {
    List,
    Get(String),
    Insert(PathBuf),
    Update(PathBuf),
    Delete(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.debug) {
        eprintln!("warning: tracing not initialised: {err}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let not_found = err
                .downcast_ref::<StoreError>()
                .is_some_and(StoreError::is_not_found);
            if not_found {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing(debug: bool) -> Result<()> {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let driver = Driver::init(&config).await.context("store not ready")?;

    let outcome = dispatch(&driver, &config, cli.command).await;
    driver.stop().await;
    outcome
}

fn resolve_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::new(
            cli.socket.clone().context("--socket or CONTENT_STORE_SOCKET is required")?,
            cli.user.clone().context("--user or CONTENT_STORE_USER is required")?,
            cli.password.clone().unwrap_or_default(),
            cli.database
                .clone()
                .context("--database or CONTENT_STORE_DATABASE is required")?,
        ),
    };

    if let Some(socket) = &cli.socket {
        config.socket = socket.clone();
    }
    if let Some(user) = &cli.user {
        config.username = user.clone();
    }
    if let Some(password) = &cli.password {
        config.password = password.clone();
    }
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    debug!(?config, "resolved config");
    Ok(config)
}

async fn dispatch(driver: &Driver, config: &StoreConfig, command: Command) -> Result<()> {
    let engine = driver.engine();
    let deadline = config.deadline();

    let (kind, tables, action) = match command {
        Command::List { kind, tables } => (kind, tables, Action::List),
        Command::Get { kind, id, tables } => (kind, tables, Action::Get(id)),
        Command::Insert { kind, input, tables } => (kind, tables, Action::Insert(input)),
        Command::Update { kind, input, tables } => (kind, tables, Action::Update(input)),
        Command::Delete { kind, id, tables } => (kind, tables, Action::Delete(id)),
        Command::Static { name, content_table, hash_table } => {
            let body = driver
                .lookup(&content_table, &hash_table)?
                .body(&name, deadline)
                .await?;
            std::io::stdout().write_all(&body)?;
            return Ok(());
        }
    };

    let tables = tables.resolve(kind)?;
    match kind {
        Kind::Page => run_entity::<Page>(&engine, &tables, action, deadline).await,
        Kind::Paste => run_entity::<Paste>(&engine, &tables, action, deadline).await,
    }
}

async fn run_entity<E>(
    engine: &CrudEngine,
    tables: &TablePair,
    action: Action,
    deadline: Deadline,
) -> Result<()>
where
    E: Entity + Serialize + DeserializeOwned,
{
    match action {
        Action::List => print_json(&engine.list::<E>(tables, deadline).await?),
        Action::Get(id) => print_json(&engine.get::<E>(tables, &id, deadline).await?),
        Action::Insert(input) => {
            let entity: E = read_entity(&input)?;
            print_json(&engine.insert(tables, &entity, deadline).await?)
        }
        Action::Update(input) => {
            let entity: E = read_entity(&input)?;
            print_json(&engine.update(tables, &entity, deadline).await?)
        }
        Action::Delete(id) => {
            engine.delete(tables, &E::for_id(&id), deadline).await?;
            Ok(())
        }
    }
}

fn read_entity<E: DeserializeOwned>(input: &Path) -> Result<E> {
    let content = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("cannot read {}", input.display()))?
    };
    serde_json::from_str(&content).context("invalid entity JSON")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
