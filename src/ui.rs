use crate::controller::{Card, SearchOutcome, Update};
use crate::fetch::FetchState;
use crate::models::DetailRecord;
use crate::utils::{capitalize, card_label, height_line, title_line, weight_line, SpriteThumb};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans};
use ratatui::widgets::Gauge;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;
use std::collections::HashMap;
use std::io;
use std::io::Stdout;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Loading,
    Ready,
    NoResults,
    Error(String),
}

pub struct App {
    /// First page, restored whenever the query is cleared.
    pub first_page: Vec<Card>,
    pub cards: Vec<Card>,
    pub selected_visible: usize,
    pub detail: Option<DetailRecord>,
    pub status: Status,
    pub search_mode: bool,
    pub search_query: String,
    /// Generation of the latest query; older search outcomes are dropped.
    pub generation: u64,
    pub fetch_state: Option<Arc<Mutex<FetchState>>>,
    pub show_sprites: bool,
    pub show_help: bool,
    pub sprite_cache: HashMap<u32, SpriteThumb>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            first_page: Vec::new(),
            cards: Vec::new(),
            selected_visible: 0,
            detail: None,
            status: Status::Loading,
            search_mode: false,
            search_query: String::new(),
            generation: 0,
            fetch_state: None,
            show_sprites: true,
            show_help: false,
            sprite_cache: HashMap::new(),
        }
    }

    /// Bump and return the generation for a new query.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Back to the startup state, keeping the sprite cache.
    pub fn reload(&mut self) {
        self.first_page.clear();
        self.cards.clear();
        self.selected_visible = 0;
        self.detail = None;
        self.search_query.clear();
        self.status = Status::Loading;
    }

    pub fn selected_card(&self) -> Option<&Card> {
        self.cards.get(self.selected_visible)
    }

    pub fn next(&mut self) {
        if !self.cards.is_empty() {
            self.selected_visible = (self.selected_visible + 1) % self.cards.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.cards.is_empty() {
            if self.selected_visible == 0 {
                self.selected_visible = self.cards.len() - 1;
            } else {
                self.selected_visible -= 1;
            }
        }
    }

    fn show(&mut self, cards: Vec<Card>) {
        self.cards = cards;
        self.selected_visible = 0;
        self.detail = None;
        self.status = Status::Ready;
    }

    fn fail(&mut self, message: String) {
        self.cards.clear();
        self.selected_visible = 0;
        self.detail = None;
        self.status = Status::Error(message);
    }

    pub fn apply(&mut self, update: Update) {
        match update {
            Update::Loaded(cards) => {
                self.first_page = cards.clone();
                // A query typed while the first page was loading wins.
                if self.search_query.trim().is_empty() {
                    self.show(cards);
                }
            }
            Update::Search {
                generation,
                outcome,
            } => {
                if generation < self.generation {
                    log::debug!("dropping stale search #{}", generation);
                    return;
                }
                match outcome {
                    SearchOutcome::Restore => {
                        let first = self.first_page.clone();
                        self.show(first);
                    }
                    SearchOutcome::Cards(cards) => self.show(cards),
                    SearchOutcome::NoResults => {
                        self.cards.clear();
                        self.selected_visible = 0;
                        self.detail = None;
                        self.status = Status::NoResults;
                    }
                    SearchOutcome::Failed(message) => self.fail(message),
                }
            }
            Update::Selected(record) => {
                // The card may have been replaced by a newer search meanwhile.
                if !self.cards.iter().any(|c| c.record.id == record.id) {
                    log::debug!("dropping detail for #{}, no longer listed", record.id);
                    return;
                }
                self.detail = Some(record);
                self.status = Status::Ready;
            }
            Update::Sprite { id, thumb } => {
                self.sprite_cache.insert(id, thumb);
            }
            Update::Failed(message) => self.fail(message),
        }
    }

    pub fn get_sprite_pixels(&self, id: u32, w: u32, h: u32) -> Option<Vec<Vec<(u8, u8, u8)>>> {
        self.sprite_cache.get(&id).map(|thumb| thumb.rows(w, h))
    }

    fn busy(&self) -> Option<f64> {
        if self.status == Status::Loading {
            return Some(0.0);
        }
        let st = self.fetch_state.as_ref()?.lock().ok()?.clone();
        if !st.in_progress {
            return None;
        }
        Some(if st.total == 0 {
            0.0
        } else {
            st.fetched as f64 / st.total as f64
        })
    }
}

fn type_color(t: &str) -> (u8, u8, u8) {
    match t.to_lowercase().as_str() {
        "normal" => (168, 168, 120),
        "fire" => (240, 128, 48),
        "water" => (104, 144, 240),
        "grass" => (120, 200, 80),
        "electric" => (248, 208, 48),
        "ice" => (152, 216, 216),
        "fighting" => (192, 48, 40),
        "poison" => (160, 64, 160),
        "ground" => (224, 192, 104),
        "flying" => (168, 144, 240),
        "psychic" => (248, 88, 136),
        "bug" => (168, 184, 32),
        "rock" => (184, 160, 56),
        "ghost" => (112, 88, 152),
        "dragon" => (112, 56, 248),
        "dark" => (112, 88, 72),
        "steel" => (184, 184, 208),
        "fairy" => (238, 153, 172),
        _ => (200, 200, 200),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_w = r.width.saturating_mul(percent_x) / 100;
    let popup_h = r.height.saturating_mul(percent_y) / 100;
    let popup_x = r.x + (r.width.saturating_sub(popup_w) / 2);
    let popup_y = r.y + (r.height.saturating_sub(popup_h) / 2);
    Rect::new(popup_x, popup_y, popup_w, popup_h)
}

fn search_box(app: &App) -> Paragraph<'static> {
    let text = if app.search_mode {
        format!("/{}", app.search_query)
    } else if !app.search_query.is_empty() {
        format!("/{}  (press '/' to edit)", app.search_query)
    } else {
        "Press '/' to search by name or number.".to_string()
    };
    Paragraph::new(vec![Spans::from(Span::raw(text))])
        .block(Block::default().borders(Borders::ALL).title("Search"))
}

fn info_lines(p: &DetailRecord) -> Vec<Spans<'static>> {
    let mut lines: Vec<Spans> = Vec::new();
    lines.push(Spans::from(Span::styled(
        title_line(p),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let mut type_spans: Vec<Span> = vec![Span::raw("Type: ")];
    for (i, t) in p.types.iter().enumerate() {
        let (r, g, b) = type_color(t);
        let lum = 0.2126 * (r as f32) + 0.7152 * (g as f32) + 0.0722 * (b as f32);
        let fg = if lum > 160.0 { Color::Black } else { Color::White };
        type_spans.push(Span::styled(
            format!(" {} ", t),
            Style::default().fg(fg).bg(Color::Rgb(r, g, b)),
        ));
        if i + 1 < p.types.len() {
            type_spans.push(Span::raw(", "));
        }
    }
    lines.push(Spans::from(type_spans));
    lines.push(Spans::from(Span::raw(height_line(p))));
    lines.push(Spans::from(Span::raw(weight_line(p))));
    lines
}

fn stat_lines(p: &DetailRecord, inner_w: usize) -> Vec<Spans<'static>> {
    let name_w = p
        .stats
        .iter()
        .map(|s| s.name.len() + 1)
        .max()
        .unwrap_or(0);
    let val_w = 4usize;
    let bar_max_w = inner_w.saturating_sub(name_w + val_w + 2);
    // Base stats top out at 255.
    let scale_max = 255.0f32;

    p.stats
        .iter()
        .map(|st| {
            let bar_len = (((st.base as f32) / scale_max).min(1.0) * (bar_max_w as f32)).round() as usize;
            let line = format!(
                "{:<name_w$} {:>val_w$} {}",
                format!("{}:", st.name),
                st.base,
                "█".repeat(bar_len),
                name_w = name_w,
                val_w = val_w
            );
            Spans::from(Span::raw(line))
        })
        .collect()
}

pub fn draw_ui(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    terminal
        .draw(|f| {
            let size = f.size();
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(size);

            let left_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(3)])
                .split(chunks[0]);

            let items: Vec<ListItem> = app
                .cards
                .iter()
                .map(|c| ListItem::new(vec![Spans::from(Span::raw(card_label(&c.record)))]))
                .collect();

            let title = match &app.status {
                Status::Loading => "Pokémon (loading...)".to_string(),
                _ => format!("Pokémon ({})", app.cards.len()),
            };
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title(title))
                .highlight_style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                );

            f.render_stateful_widget(list, left_chunks[0], &mut {
                let mut state = ratatui::widgets::ListState::default();
                if !app.cards.is_empty() {
                    state.select(Some(app.selected_visible));
                }
                state
            });

            if let Some(ratio) = app.busy() {
                let gauge = Gauge::default()
                    .block(Block::default().borders(Borders::ALL).title("Loading"))
                    .gauge_style(Style::default().fg(Color::Green))
                    .ratio(ratio.clamp(0.0, 1.0));
                f.render_widget(gauge, left_chunks[1]);
            } else {
                f.render_widget(search_box(app), left_chunks[1]);
            }

            match (&app.status, &app.detail) {
                (Status::Error(message), _) => {
                    let para = Paragraph::new(Span::styled(
                        message.clone(),
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ))
                    .block(Block::default().borders(Borders::ALL).title("Error"));
                    f.render_widget(para, chunks[1]);
                }
                (Status::NoResults, _) => {
                    let para = Paragraph::new("No results.")
                        .block(Block::default().borders(Borders::ALL).title("Details"));
                    f.render_widget(para, chunks[1]);
                }
                (_, Some(p)) => {
                    let detail_chunks = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([Constraint::Length(12), Constraint::Min(6)])
                        .split(chunks[1]);

                    let top_chunks = Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints([Constraint::Length(24), Constraint::Min(10)])
                        .split(detail_chunks[0]);

                    let sprite_para = if app.show_sprites {
                        let rect = top_chunks[0];
                        let sprite_w = u32::from(rect.width.saturating_sub(2).max(1)).min(64);
                        let sprite_h = u32::from(rect.height.saturating_sub(2).max(1)).min(64);
                        if let Some(sprite_lines) = app.get_sprite_pixels(p.id, sprite_w, sprite_h) {
                            let stext: Vec<Spans> = sprite_lines
                                .iter()
                                .map(|row| {
                                    Spans::from(
                                        row.iter()
                                            .map(|&(r, g, b)| {
                                                Span::styled(" ", Style::default().bg(Color::Rgb(r, g, b)))
                                            })
                                            .collect::<Vec<_>>(),
                                    )
                                })
                                .collect();
                            Paragraph::new(stext)
                                .block(Block::default().borders(Borders::ALL).title("Sprite"))
                        } else {
                            Paragraph::new("(no sprite)")
                                .block(Block::default().borders(Borders::ALL).title("Sprite"))
                        }
                    } else {
                        Paragraph::new("(sprites off)")
                            .block(Block::default().borders(Borders::ALL).title("Sprite"))
                    };
                    f.render_widget(sprite_para, top_chunks[0]);

                    let info_para = Paragraph::new(info_lines(p))
                        .block(Block::default().borders(Borders::ALL).title("Info"))
                        .wrap(Wrap { trim: true });
                    f.render_widget(info_para, top_chunks[1]);

                    let stats_rect = detail_chunks[1];
                    let inner_w = stats_rect.width.saturating_sub(2).max(1) as usize;
                    let stats_para = Paragraph::new(stat_lines(p, inner_w))
                        .block(Block::default().borders(Borders::ALL).title("Stats"));
                    f.render_widget(stats_para, stats_rect);
                }
                (_, None) => {
                    let hint = match app.selected_card() {
                        Some(c) => format!("Press Enter to open {}.", capitalize(&c.record.name)),
                        None => String::new(),
                    };
                    let para = Paragraph::new(hint)
                        .block(Block::default().borders(Borders::ALL).title("Details"));
                    f.render_widget(para, chunks[1]);
                }
            }

            if app.show_help {
                let popup = centered_rect(60, 40, f.size());
                let help_lines: Vec<Spans> = vec![
                    Spans::from(Span::styled(
                        "Keybindings",
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Spans::from(Span::raw("")),
                    Spans::from(Span::raw("q          Quit")),
                    Spans::from(Span::raw("/          Enter search mode")),
                    Spans::from(Span::raw("Enter/Esc  Leave search mode")),
                    Spans::from(Span::raw("Up/Down    Navigate cards")),
                    Spans::from(Span::raw("Enter      Show details of the card")),
                    Spans::from(Span::raw("s          Toggle sprites")),
                    Spans::from(Span::raw("r          Reload after an error")),
                    Spans::from(Span::raw("h/F1       Toggle this help")),
                ];
                let help_para = Paragraph::new(help_lines)
                    .block(Block::default().borders(Borders::ALL).title("Help"))
                    .wrap(Wrap { trim: true });
                f.render_widget(help_para, popup);
            }
        })
        .map(|_| ())
}
