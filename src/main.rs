use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event as CEvent, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use pokedex_gallery::config::{Cli, Settings};
use pokedex_gallery::controller::{Controller, Update, UserInput};
use pokedex_gallery::fetch::{CatalogFetcher, HttpTransport};
use pokedex_gallery::logger::init_logger;
use pokedex_gallery::models::IndexEntry;
use pokedex_gallery::ui::{draw_ui, App, Status};
use pokedex_gallery::utils::{card_label, detail_lines};

type Gallery = Controller<HttpTransport>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from(&cli);
    init_logger(&settings.log_file, settings.verbosity, cli.print)
        .with_context(|| format!("cannot open log file {}", settings.log_file.display()))?;
    log::info!("starting with {:?}", settings);

    let fetcher = Arc::new(CatalogFetcher::new(
        HttpTransport::new(),
        settings.base_url.clone(),
        settings.limit,
    ));
    let controller = Controller::new(fetcher, settings.page_size);

    if cli.print {
        return print_gallery(&controller, cli.query.as_deref(), cli.show).await;
    }
    run_tui(controller).await
}

/// Headless run: startup, optional search, optional detail panel, all to stdout.
async fn print_gallery(controller: &Gallery, query: Option<&str>, show: Option<usize>) -> anyhow::Result<()> {
    let mut app = App::new();
    app.apply(controller.on_startup().await);
    if let Some(q) = query {
        let generation = app.next_generation();
        app.apply(controller.on_query_change(generation, q).await);
    }

    if let Status::Error(message) = &app.status {
        anyhow::bail!("{}", message);
    }
    if app.status == Status::NoResults {
        println!("No results.");
        return Ok(());
    }
    for card in &app.cards {
        println!("{}", card_label(&card.record));
    }

    if let Some(n) = show {
        let card = n
            .checked_sub(1)
            .and_then(|i| app.cards.get(i))
            .with_context(|| format!("no card number {} (showing {})", n, app.cards.len()))?;
        match controller.on_item_select(&card.entry).await {
            Update::Selected(record) => {
                println!();
                for line in detail_lines(&record) {
                    println!("{}", line);
                }
            }
            Update::Failed(message) => anyhow::bail!("{}", message),
            other => log::warn!("unexpected update {:?}", other),
        }
    }
    Ok(())
}

fn spawn_startup(controller: &Gallery, tx: &UnboundedSender<Update>) {
    let controller = controller.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(controller.on_startup().await);
    });
}

fn spawn_select(controller: &Gallery, tx: &UnboundedSender<Update>, entry: IndexEntry) {
    let controller = controller.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let update = controller.on_item_select(&entry).await;
        let record = match &update {
            Update::Selected(record) => Some(record.clone()),
            _ => None,
        };
        let _ = tx.send(update);
        if let Some(record) = record {
            if let Some(sprite) = controller.load_sprite(&record).await {
                let _ = tx.send(sprite);
            }
        }
    });
}

fn spawn_search(controller: &Gallery, tx: &UnboundedSender<Update>, generation: u64, query: String) {
    let controller = controller.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(controller.on_query_change(generation, &query).await);
    });
}

async fn run_tui(controller: Gallery) -> anyhow::Result<()> {
    let (tx, mut rx) = unbounded_channel::<Update>();
    spawn_startup(&controller, &tx);

    // Terminal init
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    app.fetch_state = Some(controller.fetcher().fetch_state());

    let res = event_loop(&mut terminal, &mut app, &controller, &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(LeaveAlternateScreen)?;
    res
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    controller: &Gallery,
    tx: &UnboundedSender<Update>,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<Update>,
) -> anyhow::Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(update) = rx.try_recv() {
            app.apply(update);
        }

        draw_ui(terminal, app)?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let CEvent::Key(key) = event::read()? {
                if app.search_mode {
                    let changed = match key.code {
                        KeyCode::Enter | KeyCode::Esc => {
                            app.search_mode = false;
                            false
                        }
                        KeyCode::Backspace => app.search_query.pop().is_some(),
                        KeyCode::Char(c) => {
                            app.search_query.push(c);
                            true
                        }
                        _ => false,
                    };
                    if changed {
                        let generation = app.next_generation();
                        spawn_search(controller, tx, generation, app.search_query.clone());
                    }
                } else {
                    match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::F(1) | KeyCode::Char('h') => {
                            app.show_help = !app.show_help;
                        }
                        KeyCode::Char('s') => {
                            app.show_sprites = !app.show_sprites;
                        }
                        KeyCode::Char('r') => {
                            // Reload after a failure; the index is only fetched once it succeeds.
                            if matches!(app.status, Status::Error(_)) {
                                app.reload();
                                spawn_startup(controller, tx);
                            }
                        }
                        KeyCode::Char('/') => {
                            app.search_mode = true;
                        }
                        KeyCode::Enter => {
                            if let Some(card) = app.selected_card() {
                                spawn_select(controller, tx, card.entry.clone());
                            }
                        }
                        KeyCode::Down => app.next(),
                        KeyCode::Up => app.previous(),
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}
