use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    load_settings, CurrentSearchWidget, FacetWidget, Manager, OutputFormat, PagerWidget,
    Renderer, ReplayTransport, ResultLayout, ResultWidget, Settings, TextRenderer, TextWidget,
};
use shared::{escape_value, windowed_pages, FacetKind, FacetSelection, PageItem, ParameterStore};
use storage::{prepare_database_url, SqlitePersistence, StatePersistence};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "facet-tools")]
struct Cli {
    /// Settings file; `search.toml` in the working directory when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    session_key: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the parameters of a query string.
    Parse { query: String },
    /// Print the page window for a result set.
    Pages {
        #[arg(long)]
        current: u32,
        #[arg(long)]
        total: u32,
        #[arg(long)]
        inner: Option<u32>,
        #[arg(long)]
        outer: Option<u32>,
    },
    /// Quote a filter value the way facet filters do.
    Escape { value: String },
    /// Run one search cycle against a recorded response and print the views.
    Replay {
        #[arg(long)]
        response: PathBuf,
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        fq: Vec<String>,
        #[arg(long = "facet")]
        facets: Vec<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Saved search state.
    #[command(subcommand)]
    State(StateCommand),
}

#[derive(Subcommand, Debug)]
enum StateCommand {
    /// Store the exposed part of `query`.
    Save { query: String },
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    if let Some(session_key) = cli.session_key {
        settings.session_key = session_key;
    }

    match cli.command {
        Command::Parse { query } => parse(&query),
        Command::Pages {
            current,
            total,
            inner,
            outer,
        } => {
            let inner = inner.unwrap_or(settings.inner_window);
            let outer = outer.unwrap_or(settings.outer_window);
            let items: Vec<String> = windowed_pages(current, total, inner, outer)
                .into_iter()
                .map(|item| match item {
                    PageItem::Page(page) if page == current => format!("[{page}]"),
                    PageItem::Page(page) => page.to_string(),
                    PageItem::Gap => "...".to_string(),
                })
                .collect();
            println!("{}", items.join(" "));
        }
        Command::Escape { value } => println!("{}", escape_value(&value)),
        Command::Replay {
            response,
            q,
            fq,
            facets,
            format,
        } => replay(settings, response, q, fq, facets, format.into()).await?,
        Command::State(command) => state(&settings, command).await?,
    }

    Ok(())
}

fn parse(query: &str) {
    let mut store = ParameterStore::new();
    store.parse_string(query);
    let names: Vec<String> = store.names().map(str::to_string).collect();
    for name in names {
        let Some(slot) = store.peek(&name) else {
            continue;
        };
        for param in slot.params() {
            let value = param.val().map(|v| v.to_string()).unwrap_or_default();
            let locals: Vec<String> = param
                .locals()
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            if locals.is_empty() {
                println!("{name} = {value}");
            } else {
                println!("{name} = {value}  {{!{}}}", locals.join(" "));
            }
        }
    }
    println!("-> {}", store.string());
}

async fn replay(
    settings: Settings,
    response: PathBuf,
    q: Option<String>,
    fq: Vec<String>,
    facets: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let transport = ReplayTransport::from_file(&response).await?;
    let (inner, outer) = (settings.inner_window, settings.outer_window);

    let mut manager = Manager::new(settings).with_transport(Arc::new(transport));
    manager.add_widget(Box::new(TextWidget::new("search")));
    for field in &facets {
        manager.add_widget(Box::new(FacetWidget::new(
            field.as_str(),
            FacetSelection::new(field.as_str()).with_kind(FacetKind::Field),
        )));
    }
    manager.add_widget(Box::new(PagerWidget::new("pager", inner, outer)));
    manager.add_widget(Box::new(ResultWidget::new("results", ResultLayout::List)));
    manager.add_widget(Box::new(CurrentSearchWidget::new("current")));

    if let Some(q) = q {
        manager.with_widget::<TextWidget, _>("search", |widget, store| widget.set(store, &q));
    }
    for filter in fq {
        manager.store_mut().add_by_value("fq", filter, None);
    }

    manager
        .do_request(None, None)
        .await
        .with_context(|| format!("replaying '{}'", response.display()))?;

    let mut renderer = TextRenderer::new(format);
    for (widget_id, view) in manager.views() {
        renderer.render(widget_id, view);
    }
    print!("{}", renderer.output());
    Ok(())
}

async fn state(settings: &Settings, command: StateCommand) -> Result<()> {
    let database_url = prepare_database_url(&settings.database_url)?;
    let persistence = SqlitePersistence::new(&database_url, settings.session_key.as_str()).await?;

    match command {
        StateCommand::Save { query } => {
            let mut store = ParameterStore::with_exposed(settings.exposed.iter().cloned());
            store.parse_string(&query);
            let exposed = store.exposed_string();
            persistence.save(&exposed).await?;
            info!(session_key = %settings.session_key, "saved search state");
            println!("saved {exposed}");
        }
        StateCommand::Show => match persistence.stored().await? {
            Some(stored) => println!(
                "{} (updated {})\n{}",
                stored.session_key,
                stored.updated_at.to_rfc3339(),
                stored.exposed
            ),
            None => println!("no state stored for session '{}'", settings.session_key),
        },
    }

    Ok(())
}
