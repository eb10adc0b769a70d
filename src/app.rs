use crate::bundle::{ExportBundle, PendingImport};
use crate::card::{Card, CardFields, CardId};
use crate::config::{Config, expand_tilde};
use crate::error::Error;
use crate::scheduler::{Rating, preview_interval};
use crate::session::Phase;
use crate::storage::SqliteStore;
use crate::trainer::Trainer;
use crate::ui::{self, CardFace, CardsView, FormView, ReviewView, Screen, Status};
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{DefaultTerminal, Frame, layout::Rect};
use std::time::Duration;
use tracing::{error, info};

/// Modal input state layered over the current screen
enum Mode {
    Normal,
    Searching,
    Form(FormState),
    ConfirmDelete(CardId),
    ImportPath(String),
    ConfirmImport(PendingImport),
}

/// Add/edit card form contents
struct FormState {
    editing: Option<CardId>,
    fields: [String; 4],
    focus: usize,
}

impl FormState {
    fn new() -> Self {
        Self {
            editing: None,
            fields: Default::default(),
            focus: 0,
        }
    }

    fn edit(card: &Card) -> Self {
        let fields = card.fields();
        Self {
            editing: Some(card.id),
            fields: [
                fields.front,
                fields.back,
                fields.example.unwrap_or_default(),
                fields.alt_form.unwrap_or_default(),
            ],
            focus: 0,
        }
    }

    fn to_fields(&self) -> CardFields {
        CardFields {
            front: self.fields[0].clone(),
            back: self.fields[1].clone(),
            example: Some(self.fields[2].clone()),
            alt_form: Some(self.fields[3].clone()),
        }
    }
}

/// Main application state
pub struct App {
    config: Config,
    trainer: Trainer<SqliteStore>,
    screen: Screen,
    mode: Mode,
    // Card list state
    query: String,
    selected: usize,
    // Status line
    status: Option<(String, bool)>,
    // Exit flag
    should_exit: bool,
}

impl App {
    /// Create a new application
    pub fn new(config: Config) -> Result<Self> {
        let store = SqliteStore::open(&config.db_path)
            .with_context(|| format!("Failed to open database: {}", config.db_path.display()))?;
        let trainer = Trainer::open(store, config.seed_sample_cards, Utc::now())
            .context("Failed to load flashcards")?;

        Ok(Self {
            config,
            trainer,
            screen: Screen::Review,
            mode: Mode::Normal,
            query: String::new(),
            selected: 0,
            status: None,
            should_exit: false,
        })
    }

    /// Run the application
    pub fn run(mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while !self.should_exit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        Ok(())
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some((text.into(), false));
    }

    fn set_error(&mut self, err: impl std::fmt::Display) {
        let text = err.to_string();
        error!("{text}");
        self.status = Some((text, true));
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let status = self.status.as_ref().map(|(text, is_error)| Status {
            text,
            is_error: *is_error,
        });
        let area = ui::render_chrome(frame, self.screen, self.help(), status);

        match self.screen {
            Screen::Review => self.render_review(frame, area),
            Screen::Cards => {
                let cards = self.trainer.search(&self.query);
                let view = CardsView {
                    cards: &cards,
                    selected: self.selected,
                    query: &self.query,
                    searching: matches!(self.mode, Mode::Searching),
                };
                ui::render_cards(frame, area, &view);
            }
            Screen::Stats => {
                let now = Utc::now();
                let recent = self.trainer.stats().recent_days(&now.with_timezone(&Local), 7);
                ui::render_stats(frame, area, &self.trainer.overview(now), &recent);
            }
        }

        match &self.mode {
            Mode::Normal | Mode::Searching => {}
            Mode::Form(form) => {
                let title = if form.editing.is_some() {
                    "Modifier la carte"
                } else {
                    "Ajouter une carte"
                };
                ui::render_form(
                    frame,
                    &FormView {
                        title,
                        fields: &form.fields,
                        focus: form.focus,
                    },
                );
            }
            Mode::ConfirmDelete(id) => {
                let name = self
                    .trainer
                    .card(*id)
                    .map(|c| format!("{} - {}", c.front, c.back))
                    .unwrap_or_default();
                ui::render_confirm(frame, &[format!("Delete {}?", name)]);
            }
            Mode::ImportPath(path) => ui::render_prompt(frame, "Import file", path),
            Mode::ConfirmImport(pending) => {
                let mut message = vec![
                    format!("Import {} cards?", pending.incoming_cards()),
                    format!("This replaces your {} current cards.", pending.current_cards),
                ];
                if let Some(date) = pending.export_date() {
                    message.push(format!(
                        "Exported on {}",
                        date.with_timezone(&Local).format("%Y-%m-%d")
                    ));
                }
                ui::render_confirm(frame, &message);
            }
        }
    }

    fn render_review(&self, frame: &mut Frame, area: Rect) {
        let session = self.trainer.session();
        let face = match (session.phase(), self.trainer.current_card()) {
            (Phase::ShowingFront, Some(card)) => CardFace::Front(card),
            (Phase::ShowingBack, Some(card)) => {
                let previews = self
                    .config
                    .show_intervals
                    .then(|| Rating::ALL.map(|rating| preview_interval(card, rating)));
                CardFace::Back(card, previews)
            }
            (Phase::Finished, _) => CardFace::Finished {
                reviewed: session.reviewed(),
            },
            _ => CardFace::Idle,
        };

        let view = ReviewView {
            face,
            overview: self.trainer.overview(Utc::now()),
            session_remaining: session.remaining(),
        };
        ui::render_review(frame, area, &view);
    }

    fn help(&self) -> &'static str {
        match (&self.mode, self.screen) {
            (Mode::Searching, _) => "Type to filter - Enter/Esc done",
            (Mode::Normal, Screen::Review) => {
                "Enter start - Space flip - 1-4 rate - Tab switch - x export - i import - q quit"
            }
            (Mode::Normal, Screen::Cards) => {
                "a add - Enter edit - d delete - / search - Tab switch - q quit"
            }
            (Mode::Normal, Screen::Stats) => "Tab switch - x export - i import - q quit",
            _ => "",
        }
    }

    /// Handle input events
    fn handle_events(&mut self) -> Result<()> {
        if !event::poll(Duration::from_millis(250))? {
            return Ok(());
        }

        if let Event::Key(key) = event::read()? {
            // Only handle key press events
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }

            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                self.should_exit = true;
                return Ok(());
            }

            let mode = std::mem::replace(&mut self.mode, Mode::Normal);
            self.mode = match mode {
                Mode::Normal => {
                    self.handle_normal(key);
                    // handle_normal may have switched mode itself
                    std::mem::replace(&mut self.mode, Mode::Normal)
                }
                Mode::Searching => self.handle_searching(key),
                Mode::Form(form) => self.handle_form(form, key),
                Mode::ConfirmDelete(id) => {
                    if key.code == KeyCode::Char('y') {
                        self.delete_card(id);
                    }
                    Mode::Normal
                }
                Mode::ImportPath(path) => self.handle_import_path(path, key),
                Mode::ConfirmImport(pending) => {
                    if key.code == KeyCode::Char('y') {
                        self.apply_import(pending);
                    } else {
                        self.set_status("Import cancelled");
                    }
                    Mode::Normal
                }
            };
        }

        Ok(())
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_exit = true,
            KeyCode::Tab => self.switch_screen(1),
            KeyCode::BackTab => self.switch_screen(Screen::ALL.len() - 1),
            KeyCode::Char('x') => self.export(),
            KeyCode::Char('i') => self.mode = Mode::ImportPath(String::new()),
            _ => match self.screen {
                Screen::Review => self.handle_review(key),
                Screen::Cards => self.handle_cards(key),
                Screen::Stats => {}
            },
        }
    }

    fn switch_screen(&mut self, step: usize) {
        let index = Screen::ALL.iter().position(|s| *s == self.screen).unwrap_or(0);
        self.screen = Screen::ALL[(index + step) % Screen::ALL.len()];
    }

    /// Handle review screen input
    fn handle_review(&mut self, key: KeyEvent) {
        let phase = self.trainer.session().phase();
        match (key.code, phase) {
            (KeyCode::Enter, Phase::Idle | Phase::Finished) => {
                self.status = None;
                match self.trainer.start(Utc::now()).map(|_| ()) {
                    Ok(()) => {}
                    Err(e @ Error::NothingToReview) => self.set_status(e.to_string()),
                    Err(e) => self.set_error(e),
                }
            }
            (KeyCode::Char(' ') | KeyCode::Enter, Phase::ShowingFront) => {
                if let Err(e) = self.trainer.flip() {
                    self.set_error(e);
                }
            }
            (KeyCode::Char(c), Phase::ShowingBack) => {
                let Some(rating) = c.to_digit(10).and_then(|d| Rating::from_u8(d as u8)) else {
                    return;
                };
                if let Err(e) = self.trainer.rate(rating, Utc::now()) {
                    self.set_error(e);
                }
            }
            _ => {}
        }
    }

    /// Handle card list input
    fn handle_cards(&mut self, key: KeyEvent) {
        let count = self.trainer.search(&self.query).len();

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            KeyCode::Char('/') => self.mode = Mode::Searching,
            KeyCode::Char('a') => self.mode = Mode::Form(FormState::new()),
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(card) = self.selected_card() {
                    self.mode = Mode::Form(FormState::edit(card));
                }
            }
            KeyCode::Char('d') => {
                if let Some(card) = self.selected_card() {
                    self.mode = Mode::ConfirmDelete(card.id);
                }
            }
            _ => {}
        }
    }

    fn selected_card(&self) -> Option<&Card> {
        self.trainer.search(&self.query).get(self.selected).copied()
    }

    fn handle_searching(&mut self, key: KeyEvent) -> Mode {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => return Mode::Normal,
            KeyCode::Backspace => {
                self.query.pop();
            }
            KeyCode::Char(c) => self.query.push(c),
            _ => {}
        }
        self.selected = 0;
        Mode::Searching
    }

    fn handle_form(&mut self, mut form: FormState, key: KeyEvent) -> Mode {
        let last = form.fields.len() - 1;

        match key.code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Tab | KeyCode::Down => form.focus = (form.focus + 1) % form.fields.len(),
            KeyCode::BackTab | KeyCode::Up => form.focus = (form.focus + last) % form.fields.len(),
            KeyCode::Backspace => {
                form.fields[form.focus].pop();
            }
            KeyCode::Char(c) => form.fields[form.focus].push(c),
            KeyCode::Enter => {
                let result = match form.editing {
                    Some(id) => self.trainer.edit_card(id, form.to_fields()),
                    None => self.trainer.add_card(form.to_fields(), Utc::now()).map(|_| ()),
                };
                match result {
                    Ok(()) => {
                        self.set_status("Card saved");
                        return Mode::Normal;
                    }
                    // Keep the form open so the input is not lost
                    Err(e @ Error::EmptyField(_)) => self.set_error(e),
                    Err(e) => {
                        self.set_error(e);
                        return Mode::Normal;
                    }
                }
            }
            _ => {}
        }

        Mode::Form(form)
    }

    fn delete_card(&mut self, id: CardId) {
        match self.trainer.delete_card(id, Utc::now()) {
            Ok(()) => self.set_status("Card deleted"),
            Err(e) => self.set_error(e),
        }
        let count = self.trainer.search(&self.query).len();
        self.selected = self.selected.min(count.saturating_sub(1));
    }

    fn export(&mut self) {
        let now = Utc::now();
        let bundle = self.trainer.export(now);
        let path = self
            .config
            .export_dir
            .join(ExportBundle::file_name(now));

        let result = bundle
            .to_json()
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                std::fs::create_dir_all(&self.config.export_dir)?;
                std::fs::write(&path, json)?;
                Ok(())
            });

        match result {
            Ok(()) => {
                info!(path = %path.display(), "Export written");
                self.set_status(format!(
                    "Exported {} cards to {}",
                    self.trainer.cards().len(),
                    path.display()
                ));
            }
            Err(e) => self.set_error(format!("Export failed: {e}")),
        }
    }

    fn handle_import_path(&mut self, mut path: String, key: KeyEvent) -> Mode {
        match key.code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Backspace => {
                path.pop();
                Mode::ImportPath(path)
            }
            KeyCode::Char(c) => {
                path.push(c);
                Mode::ImportPath(path)
            }
            KeyCode::Enter => {
                let file = expand_tilde(std::path::Path::new(path.trim()));
                let json = match std::fs::read_to_string(&file) {
                    Ok(json) => json,
                    Err(e) => {
                        self.set_error(format!("Cannot read {}: {e}", file.display()));
                        return Mode::Normal;
                    }
                };
                match self.trainer.prepare_import(&json) {
                    Ok(pending) => Mode::ConfirmImport(pending),
                    Err(e) => {
                        self.set_error(format!("Import failed: {e}"));
                        Mode::Normal
                    }
                }
            }
            _ => Mode::ImportPath(path),
        }
    }

    fn apply_import(&mut self, pending: PendingImport) {
        match self.trainer.apply_import(pending) {
            Ok(()) => self.set_status(format!(
                "Imported {} cards",
                self.trainer.cards().len()
            )),
            Err(e) => self.set_error(e),
        }
        self.selected = 0;
        self.query.clear();
    }
}
