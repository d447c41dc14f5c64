mod app;
mod handler;
mod tui;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use contentcraft_core::content::{self, ContentKind, DataUrl};
use contentcraft_core::input::parse_assignment;
use contentcraft_core::{
    Catalog, Config, ExportOrigin, GenerationInput, Generator, HistoryStore,
};
use dialoguer::{theme::ColorfulTheme, Confirm};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::App;
use tui::{EventHandler, TICK_RATE};

#[derive(Parser)]
#[command(name = "contentcraft")]
#[command(about = "Generate text, images and speech from reusable templates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available templates
    List {
        /// Only show templates whose name or description matches
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Run a template once and print (or save) the result
    Generate {
        /// Template id, e.g. blog-post
        template: String,
        /// Field value as name=value; repeat for each field
        #[arg(short, long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        /// Save media results into this directory instead of the default
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// Show past generations, newest first
    History {
        /// Maximum number of entries
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Delete every saved generation
    ClearHistory {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Config::load_dotenv();
    let config = Config::load()?;
    let data_dir = config.data_dir()?;

    // The TUI owns the terminal, so it logs to a file; CLI commands log to stderr
    let _guard = match cli.command {
        None => Some(init_file_logging(&data_dir)?),
        Some(_) => {
            init_stderr_logging();
            None
        }
    };

    let mut history = HistoryStore::open_file(&config.history_db_path()?);
    if !history.is_persistent() && cli.command.is_some() {
        eprintln!(
            "{}",
            "⚠️  History database could not be opened; results from this run won't be saved."
                .yellow()
        );
    }

    match cli.command {
        None => run_tui(&config, history).await,
        Some(Commands::List { search }) => {
            list_templates(search.as_deref());
            Ok(())
        }
        Some(Commands::Generate {
            template,
            values,
            export,
        }) => {
            let export_dir = export.unwrap_or_else(|| config.export_dir());
            generate_once(&config, &mut history, &template, values, &export_dir).await
        }
        Some(Commands::History { limit }) => {
            show_history(&history, limit);
            Ok(())
        }
        Some(Commands::ClearHistory { yes }) => clear_history(&mut history, yes),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_file_logging(data_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let appender = tracing_appender::rolling::never(data_dir, "contentcraft.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_tui(config: &Config, history: HistoryStore) -> Result<()> {
    tracing::info!("starting TUI");

    let generator = Generator::from_config(config);
    let mut app = App::new(generator, history, config.export_dir());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(TICK_RATE);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

fn list_templates(search: Option<&str>) {
    let catalog = Catalog::builtin();
    let templates = catalog.filter(search.unwrap_or(""));

    if templates.is_empty() {
        println!(
            "{}",
            format!("No templates found matching \"{}\"", search.unwrap_or("")).yellow()
        );
        return;
    }

    println!("\n{}", "📝 Templates".bold().blue());
    for template in templates {
        println!(
            "\n{} {} {}",
            template.id.bold().yellow(),
            template.name.bold(),
            format!("[{}]", template.output.as_str()).dimmed()
        );
        println!("  {}", template.description);
        for field in template.fields {
            let required = if field.required { "*" } else { "" };
            let options = if field.options.is_empty() {
                String::new()
            } else {
                format!(" ({})", field.options.join(" | "))
            };
            println!(
                "    {}{}{}{}",
                field.name.cyan(),
                required.red(),
                format!(" {}", field.label).dimmed(),
                options.dimmed()
            );
        }
    }
}

async fn generate_once(
    config: &Config,
    history: &mut HistoryStore,
    template_id: &str,
    values: Vec<(String, String)>,
    export_dir: &Path,
) -> Result<()> {
    let catalog = Catalog::builtin();
    let Some(template) = catalog.find(template_id) else {
        bail!(
            "Unknown template '{}'. Run `contentcraft list` to see the available ids.",
            template_id
        );
    };

    let mut input = GenerationInput::with_defaults(template);
    for (name, value) in values {
        if template.field(&name).is_none() {
            bail!("Template '{}' has no field named '{}'", template.id, name);
        }
        input.set(name, value);
    }

    println!("{}", format!("⏳ Generating with {}...", template.name).dimmed());

    let generator = Generator::from_config(config);
    let content = generator
        .generate_and_record(template, &input, history)
        .await?;

    match ContentKind::of(&content) {
        ContentKind::Text => {
            println!("\n{}", template.name.bold().green());
            println!("{}", "=".repeat(50).dimmed());
            println!("{}", content);
        }
        kind => {
            let path = content::export(&content, export_dir, ExportOrigin::Generator)?;
            let size = DataUrl::parse(&content).map(|d| d.bytes.len()).unwrap_or(0);
            println!(
                "{} {} ({} bytes, .{})",
                "✅ Saved".green().bold(),
                path.display(),
                size,
                kind.extension()
            );
        }
    }

    Ok(())
}

fn show_history(history: &HistoryStore, limit: usize) {
    if history.is_empty() {
        println!("{}", "No history yet.".yellow());
        return;
    }

    println!("\n{}", format!("🕘 History ({})", history.len()).bold().blue());
    for item in history.items().iter().take(limit) {
        let kind = match item.kind() {
            ContentKind::Image => "image",
            ContentKind::Audio => "audio",
            ContentKind::Text => "text",
        };
        println!(
            "\n{} {} {}",
            item.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            item.template_name.bold().yellow(),
            format!("[{}]", kind).dimmed()
        );
        println!("  {}", item.summary(72));
    }
}

fn clear_history(history: &mut HistoryStore, yes: bool) -> Result<()> {
    if history.is_empty() {
        println!("{}", "History is already empty.".yellow());
        return Ok(());
    }

    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete all {} saved results?", history.len()))
            .default(false)
            .interact()?;

    if confirmed {
        history.clear()?;
        println!("{}", "🗑  History cleared.".green());
    } else {
        println!("{}", "Cancelled.".dimmed());
    }
    Ok(())
}
