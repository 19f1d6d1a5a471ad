//! Yomikomi CLI - terminal manga chapter reader.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use yomikomi::config::{ChapterOrder, Config};
use yomikomi::console::Console;
use yomikomi::source::{extract_chapter_id, fetch_asset};
use yomikomi::{
    ChapterRequest, Intent, LoadOptions, LoadedChapter, MangaDexSource, Navigation,
    NavigationEngine, PageSource, PageTicket, SessionStatus, SourceError,
};

/// Terminal manga chapter reader.
#[derive(Parser, Debug)]
#[command(name = "yomikomi")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use this config file instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a chapter, given its id or reader URL.
    Read { chapter: String },

    /// List the chapters of a manga.
    Chapters {
        /// Manga id.
        manga: String,

        /// Translated language filter (defaults to the preference).
        #[arg(long)]
        lang: Option<String>,

        /// Sort order, "asc" or "desc" (defaults to the preference).
        #[arg(long, value_parser = parse_order)]
        order: Option<ChapterOrder>,
    },
}

fn parse_order(value: &str) -> Result<ChapterOrder, String> {
    match value.to_ascii_lowercase().as_str() {
        "asc" => Ok(ChapterOrder::Asc),
        "desc" => Ok(ChapterOrder::Desc),
        other => Err(format!("expected 'asc' or 'desc', got '{}'", other)),
    }
}

/// A line of reader input.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Input {
    Intent(Intent),
    Tap(f64),
    Retry,
    Help,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None | Some("n") | Some("next") => Input::Intent(Intent::Advance),
        Some("p") | Some("prev") => Input::Intent(Intent::Retreat),
        Some("t") | Some("toggle") => Input::Intent(Intent::ToggleOverlay),
        Some("tap") => parts
            .next()
            .and_then(|x| x.parse::<f64>().ok())
            .map_or(Input::Unknown, Input::Tap),
        Some("r") | Some("retry") => Input::Retry,
        Some("h") | Some("help") | Some("?") => Input::Help,
        Some("q") | Some("quit") => Input::Quit,
        Some(_) => Input::Unknown,
    }
}

/// Completion of background work.
enum Event {
    Chapter(ChapterRequest, Result<LoadedChapter, SourceError>),
    Asset(PageTicket, Result<usize, SourceError>),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    init_logging(config.source.debug);

    match args.command {
        Command::Read { chapter } => read(&config, &chapter, &console).await,
        Command::Chapters { manga, lang, order } => {
            chapters(&config, &manga, lang.as_deref(), order, &console).await
        }
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

async fn chapters(
    config: &Config,
    manga: &str,
    lang: Option<&str>,
    order: Option<ChapterOrder>,
    console: &Console,
) -> Result<()> {
    let source = MangaDexSource::new(config.source.clone())?;
    let language = lang.or(config.preferences.language_filter());
    let order = order.unwrap_or(config.preferences.chapter_order);

    console.step(&format!("Fetching chapters ({} order)...", order));
    let chapters = source
        .list_chapters(manga, language, order)
        .await
        .context("Failed to fetch chapter list")?;

    if chapters.is_empty() {
        console.warning("No chapters found");
        return Ok(());
    }

    console.success(&format!("Found {} chapters", chapters.len()));
    for chapter in chapters {
        let number = chapter.number.as_deref().unwrap_or("-");
        let title = chapter.title.as_deref().unwrap_or("");
        let group = chapter
            .group
            .as_deref()
            .map(|g| console.muted(&format!(" [{}]", g)))
            .unwrap_or_default();
        println!("{:>7}  {}  {}{}", number, chapter.id, title, group);
    }

    Ok(())
}

async fn read(config: &Config, chapter: &str, console: &Console) -> Result<()> {
    let chapter_id = extract_chapter_id(chapter)
        .ok_or_else(|| anyhow::anyhow!("Not a chapter id or URL: {}", chapter))?;

    let source = Arc::new(MangaDexSource::new(config.source.clone())?);
    let client = source.client().clone();
    let options = LoadOptions {
        language: config.preferences.language_filter().map(str::to_string),
    };
    let width = config.reader.viewport_width;

    let mut engine = NavigationEngine::new(Arc::clone(&source), options);
    let (tx, mut rx) = mpsc::unbounded_channel();

    console.section("Yomikomi Reader");
    console.success(&format!("Using {} source", source.name()));
    print_help(console);

    let request = engine.open(chapter_id);
    spawn_load(&engine, request, &tx);
    console.render(&engine.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };

                let outcome = match parse_input(&line) {
                    Input::Quit => break,
                    Input::Help => {
                        print_help(console);
                        continue;
                    }
                    Input::Unknown => {
                        console.warning(&format!("Unknown command: {}", line.trim()));
                        continue;
                    }
                    Input::Retry => match engine.retry() {
                        Some(request) => Navigation::ChapterRequested(request),
                        None => {
                            console.info("Nothing to retry");
                            continue;
                        }
                    },
                    Input::Intent(intent) => engine.handle(intent),
                    Input::Tap(x) => engine.tap(x, width),
                };

                match outcome {
                    Navigation::Moved(_) => spawn_asset(&engine, &client, &tx),
                    Navigation::ChapterRequested(request) => {
                        console.step(&format!("Loading chapter {}...", request.chapter_id));
                        spawn_load(&engine, request, &tx);
                    }
                    Navigation::OverlayToggled(_) => {}
                    Navigation::Unchanged => {
                        console.info(&console.muted("Nothing further in that direction"));
                    }
                    Navigation::Ignored => {
                        console.warning("Still loading the next chapter; input ignored");
                        continue;
                    }
                }

                console.render(&engine.view());
            }
            Some(event) = rx.recv() => match event {
                Event::Chapter(request, result) => {
                    let failure = result.as_ref().err().map(ToString::to_string);
                    if !engine.apply(&request, result) {
                        continue;
                    }
                    if let Some(message) = failure {
                        console.error(&format!(
                            "Failed to load chapter {}: {}",
                            request.chapter_id, message
                        ));
                    }
                    if engine.session().status() == SessionStatus::Ready {
                        spawn_asset(&engine, &client, &tx);
                    }
                    console.render(&engine.view());
                }
                Event::Asset(ticket, Ok(bytes)) => {
                    if engine.confirm_asset(ticket) {
                        debug!("Page {} loaded ({} bytes)", ticket.index + 1, bytes);
                        console.render(&engine.view());
                    }
                }
                Event::Asset(ticket, Err(err)) => {
                    console.warning(&format!("Page {} failed to load: {}", ticket.index + 1, err));
                }
            },
        }
    }

    console.section("Bye!");
    Ok(())
}

fn spawn_load(
    engine: &NavigationEngine<MangaDexSource>,
    request: ChapterRequest,
    tx: &mpsc::UnboundedSender<Event>,
) {
    let fetch = engine.fetch(&request);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = fetch.await;
        let _ = tx.send(Event::Chapter(request, result));
    });
}

fn spawn_asset(
    engine: &NavigationEngine<MangaDexSource>,
    client: &reqwest::Client,
    tx: &mpsc::UnboundedSender<Event>,
) {
    let (Some(ticket), Some(page)) = (engine.page_ticket(), engine.session().current_page()) else {
        return;
    };

    let url = page.url.clone();
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = fetch_asset(&client, &url).await;
        let _ = tx.send(Event::Asset(ticket, result));
    });
}

fn print_help(console: &Console) {
    console.info("n / Enter: next page   p: previous page   t: toggle overlay");
    console.info("tap X: tap at horizontal position X   r: retry   q: quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(""), Input::Intent(Intent::Advance));
        assert_eq!(parse_input("p"), Input::Intent(Intent::Retreat));
        assert_eq!(parse_input(" t "), Input::Intent(Intent::ToggleOverlay));
        assert_eq!(parse_input("tap 12.5"), Input::Tap(12.5));
        assert_eq!(parse_input("tap"), Input::Unknown);
        assert_eq!(parse_input("q"), Input::Quit);
        assert_eq!(parse_input("jump"), Input::Unknown);
    }

    #[test]
    fn test_parse_order() {
        assert_eq!(parse_order("ASC"), Ok(ChapterOrder::Asc));
        assert_eq!(parse_order("desc"), Ok(ChapterOrder::Desc));
        assert!(parse_order("newest").is_err());
    }
}
