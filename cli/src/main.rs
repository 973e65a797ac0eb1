//! `daims` command-line client.
//!
//! ```text
//! $ daims search "cinematic portrait"
//! $ daims search --search-type style --image ./reference.jpg --card-type edit
//! $ daims prompt create/0001.png
//! ```
//!
//! Connection settings come from `DAIMS_API_KEY`, `DAIMS_BASE_URL` and
//! `DAIMS_TIMEOUT_MS`; flags override them. Logs go to stderr, filtered by
//! `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::Engine as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use daims_core::{CardType, ClientConfigBuilder, DaimsClient, DaimsError, SearchRequest, SearchType};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "daims", version, about = "Search DAIMS prompt cards")]
struct Cli {
    #[command(flatten)]
    connection: Connection,

    /// Print raw JSON responses instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Connection {
    /// API key sent as a bearer token [overrides DAIMS_API_KEY]
    #[arg(long)]
    api_key: Option<String>,

    /// [overrides DAIMS_BASE_URL]
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in milliseconds [overrides DAIMS_TIMEOUT_MS]
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search cards by keyword or by reference image
    Search(SearchArgs),
    /// Show the prompt of the card stored under SKEY
    Prompt {
        skey: String,
    },
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Keyword, or an already base64-encoded image
    value: Option<String>,

    /// Image file to base64-encode as the query value
    #[arg(long, conflicts_with = "value")]
    image: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = CardKind::Create)]
    card_type: CardKind,

    #[arg(long, value_enum, default_value_t = SearchMode::Keyword)]
    search_type: SearchMode,

    /// Reference URL passed to the API
    #[arg(long)]
    link: Option<String>,

    /// Send `isPhoto` with this value; omitted when not given
    #[arg(long, value_name = "BOOL")]
    photo: Option<bool>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CardKind {
    Create,
    Edit,
}

impl From<CardKind> for CardType {
    fn from(kind: CardKind) -> Self {
        match kind {
            CardKind::Create => CardType::Create,
            CardKind::Edit => CardType::Edit,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SearchMode {
    Keyword,
    Style,
    Object,
}

impl From<SearchMode> for SearchType {
    fn from(mode: SearchMode) -> Self {
        match mode {
            SearchMode::Keyword => SearchType::Keyword,
            SearchMode::Style => SearchType::Style,
            SearchMode::Object => SearchType::Object,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = build_client(&cli.connection)?;

    match cli.command {
        Command::Search(args) => search(&client, args, cli.json).await,
        Command::Prompt { skey } => prompt(&client, &skey, cli.json).await,
    }
}

fn build_client(connection: &Connection) -> Result<DaimsClient> {
    Ok(DaimsClient::new(config_builder(ClientConfigBuilder::from_env()?, connection).build()?))
}

fn config_builder(mut builder: ClientConfigBuilder, connection: &Connection) -> ClientConfigBuilder {
    if let Some(key) = &connection.api_key {
        builder = builder.api_key(key);
    }
    if let Some(url) = &connection.base_url {
        builder = builder.base_url(url);
    }
    if let Some(ms) = connection.timeout_ms {
        builder = builder.timeout_ms(ms);
    }
    builder
}

fn report(err: DaimsError) -> anyhow::Error {
    let hint = if err.is_retryable() { " (retryable)" } else { "" };
    match err.status() {
        Some(status) => anyhow::anyhow!("{} [{} {status}]{hint}", err.message(), err.code()),
        None => anyhow::anyhow!("{} [{}]{hint}", err.message(), err.code()),
    }
}

fn query_value(args: &SearchArgs) -> Result<String> {
    match (&args.value, &args.image) {
        (Some(value), None) => Ok(value.clone()),
        (None, Some(path)) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading image {}", path.display()))?;
            Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        _ => bail!("provide a search value or --image"),
    }
}

fn search_params(args: &SearchArgs) -> Result<SearchRequest> {
    let search_type = SearchType::from(args.search_type);
    if args.image.is_some() && !search_type.expects_image() {
        bail!("--image needs --search-type style or object");
    }

    let mut params = SearchRequest::new(args.card_type.into(), search_type, query_value(args)?);
    if let Some(link) = &args.link {
        params = params.with_link(link);
    }
    if let Some(is_photo) = args.photo {
        params = params.with_photo(is_photo);
    }
    Ok(params)
}

async fn search(client: &DaimsClient, args: SearchArgs, json: bool) -> Result<()> {
    let params = search_params(&args)?;
    let response = client.search(&params).await.map_err(report)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let page = &response.data;
    println!(
        "{} result(s), showing {} from offset {}{}",
        page.count,
        page.items.len(),
        page.offset,
        if page.has_next { " (more available)" } else { "" }
    );
    for item in &page.items {
        println!(
            "{}\t{}\t{}/{}\t{}",
            item.skey(),
            item.id,
            item.metadata.provider,
            item.metadata.model,
            item.image_url()
        );
    }
    Ok(())
}

async fn prompt(client: &DaimsClient, skey: &str, json: bool) -> Result<()> {
    let response = client.get_prompt(skey).await.map_err(report)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.prompt);
    }
    Ok(())
}
