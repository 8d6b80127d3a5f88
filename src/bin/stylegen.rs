//! CLI for stylegen - restyle images into preset art styles.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use stylegen::{catalog, ImageTransformer, Session, Settings, TransformOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stylegen")]
#[command(about = "Restyle images into preset art styles via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Gemini model (flash, pro)
    #[arg(long, global = true)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available art styles
    Styles,

    /// Transform one image and save the result
    Transform(TransformArgs),

    /// Run an interactive session on stdin
    Interactive(InteractiveArgs),
}

#[derive(Args)]
struct TransformArgs {
    /// Image to transform
    input: PathBuf,

    /// Style id (see `stylegen styles`)
    #[arg(short, long)]
    style: Option<String>,

    /// Directory to save the result in
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[derive(Args)]
struct InteractiveArgs {
    /// Directory `save` writes to by default
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(ref name) = cli.model {
        settings.model = stylegen::GeminiModel::parse(name)
            .with_context(|| format!("unknown model '{name}' (expected flash or pro)"))?;
    }

    match cli.command {
        Commands::Styles => list_styles(cli.json)?,
        Commands::Transform(args) => {
            if let Some(dir) = args.output_dir.clone() {
                settings.output_dir = dir;
            }
            transform_once(args, &settings, cli.json).await?;
        }
        Commands::Interactive(args) => {
            if let Some(dir) = args.output_dir {
                settings.output_dir = dir;
            }
            run_interactive(&settings).await?;
        }
    }

    Ok(())
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(catalog::styles())?);
        return Ok(());
    }

    println!("Available styles:\n");
    for (i, style) in catalog::styles().iter().enumerate() {
        let marker = if i == 0 { " (default)" } else { "" };
        println!("  {} {:<15} {}{}", style.icon, style.id, style.name, marker);
        println!("      {}", style.description);
    }
    Ok(())
}

async fn transform_once(args: TransformArgs, settings: &Settings, json_output: bool) -> anyhow::Result<()> {
    let mut session = Session::new(settings.transformer());

    session.load_image(Some(args.input.as_path())).await?;
    if let Some(ref id) = args.style {
        session.select_style(id)?;
    }
    let style = session.selected_style();

    match session.transform().await {
        TransformOutcome::Succeeded => {}
        TransformOutcome::Failed(e) => {
            if json_output {
                print_json(&serde_json::json!({
                    "success": false,
                    "style": style.id,
                    "error": e.user_message(),
                }))?;
            }
            anyhow::bail!(e.user_message());
        }
        TransformOutcome::Rejected(reason) => anyhow::bail!("transform not started: {reason}"),
        TransformOutcome::Discarded => anyhow::bail!("transform result was discarded"),
    }

    let path = session.download(&settings.output_dir).await?;
    let state = session.state();
    let size = state.result_image().map(|i| i.size()).unwrap_or_default();

    if json_output {
        print_json(&serde_json::json!({
            "success": true,
            "input": args.input.display().to_string(),
            "style": style.id,
            "output": path.display().to_string(),
            "size_bytes": size,
        }))?;
    } else {
        println!(
            "{} {} -> {} ({} bytes)",
            style.icon,
            style.name,
            path.display(),
            size
        );
    }

    Ok(())
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

const HELP: &str = "\
commands:
  open <path>    load an image (a data: URL also works)
  style <id>     select a style
  styles         list styles
  transform      restyle the loaded image
  save [dir]     save the result
  reset          start over
  status         show the current state
  quit           exit";

async fn run_interactive(settings: &Settings) -> anyhow::Result<()> {
    let mut session = Session::new(settings.transformer());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("stylegen interactive session. Type `help` for commands.");
    print_status(&session);

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };

        match command {
            "" => continue,
            "help" | "?" => println!("{HELP}"),
            "quit" | "exit" => break,
            "styles" => list_styles(false)?,
            "status" => print_status(&session),
            "open" => {
                // A failed read leaves the session as it was
                let loaded = if arg.starts_with("data:") {
                    session.load_image_data_url(arg)
                } else {
                    let path = (!arg.is_empty()).then(|| Path::new(arg));
                    session.load_image(path).await
                };
                if let Err(e) = loaded {
                    println!("could not open image: {e}");
                }
                print_status(&session);
            }
            "style" => match session.select_style(arg) {
                Ok(style) => println!("{} {} selected", style.icon, style.name),
                Err(e) => println!("{e}"),
            },
            "transform" => {
                println!("{} working...", session.selected_style().icon);
                match session.transform().await {
                    TransformOutcome::Rejected(reason) => println!("not started: {reason}"),
                    _ => print_status(&session),
                }
            }
            "save" => {
                let dir = if arg.is_empty() {
                    settings.output_dir.clone()
                } else {
                    PathBuf::from(arg)
                };
                match session.download(&dir).await {
                    Ok(path) => println!("saved {}", path.display()),
                    Err(e) => println!("{e}"),
                }
            }
            "reset" => {
                session.reset();
                print_status(&session);
            }
            other => println!("unknown command '{other}'; type `help`"),
        }
    }

    Ok(())
}

fn print_status<T: ImageTransformer>(session: &Session<T>) {
    let state = session.state();
    let style = session.selected_style();
    println!("[{}] style: {} {} ({})", state.phase(), style.icon, style.name, style.id);
    if let Some(image) = state.original_image() {
        let source = session
            .source_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        println!("  original: {} ({} bytes, {})", source, image.size(), image.format);
    }
    if let Some(image) = state.result_image() {
        println!("  result: {} bytes, ready to save", image.size());
    }
    if let Some(error) = state.error() {
        println!("  error: {error}");
    }
}
