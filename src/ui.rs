use crate::card::Card;
use crate::scheduler::{Rating, format_interval};
use crate::stats::DailyStat;
use crate::trainer::Overview;
use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Review,
    Cards,
    Stats,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Review, Screen::Cards, Screen::Stats];

    fn title(&self) -> &'static str {
        match self {
            Screen::Review => "Review",
            Screen::Cards => "Cards",
            Screen::Stats => "Stats",
        }
    }
}

/// What the review screen shows
pub enum CardFace<'a> {
    /// No session running yet
    Idle,
    Front(&'a Card),
    /// Back of the card, with the interval each rating would give
    Back(&'a Card, Option<[u32; 4]>),
    Finished { reviewed: usize },
}

/// UI state for rendering the review screen
pub struct ReviewView<'a> {
    pub face: CardFace<'a>,
    pub overview: Overview,
    /// Cards left in the running session
    pub session_remaining: usize,
}

/// UI state for rendering the card list
pub struct CardsView<'a> {
    pub cards: &'a [&'a Card],
    pub selected: usize,
    pub query: &'a str,
    pub searching: bool,
}

/// Add/edit card form
pub struct FormView<'a> {
    pub title: &'a str,
    pub fields: &'a [String; 4],
    pub focus: usize,
}

pub const FORM_LABELS: [&str; 4] = ["Français", "Darija", "Exemple", "Arabe classique"];

/// Status line message
pub struct Status<'a> {
    pub text: &'a str,
    pub is_error: bool,
}

/// Split the frame into tabs, body and status line; returns the body area
pub fn render_chrome(
    frame: &mut Frame,
    screen: Screen,
    help: &str,
    status: Option<Status>,
) -> Rect {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Tabs
        Constraint::Fill(1),   // Body
        Constraint::Length(1), // Status
        Constraint::Length(1), // Help
    ])
    .split(frame.area());

    let mut tabs: Vec<Span> = Vec::new();
    for (i, tab) in Screen::ALL.iter().enumerate() {
        if i > 0 {
            tabs.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        let style = if *tab == screen {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        tabs.push(Span::styled(tab.title(), style));
    }
    frame.render_widget(
        Paragraph::new(Line::from(tabs)).alignment(Alignment::Center),
        chunks[0],
    );

    if let Some(status) = status {
        let color = if status.is_error {
            Color::Red
        } else {
            Color::Green
        };
        let line = Paragraph::new(status.text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center);
        frame.render_widget(line, chunks[2]);
    }

    let help = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[3]);

    chunks[1]
}

/// Render the review screen
pub fn render_review(frame: &mut Frame, area: Rect, view: &ReviewView) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Counters
        Constraint::Fill(1),   // Top spacer
        Constraint::Length(2), // Main term
        Constraint::Length(3), // Example and classical form
        Constraint::Length(1), // Spacer
        Constraint::Length(1), // Rating keys or hint
        Constraint::Fill(1),   // Bottom spacer
    ])
    .split(area);

    let counters = format!(
        "Due: {}   Total: {}   Today: {}   Success: {}%   Streak: {}",
        view.overview.cards_remaining,
        view.overview.total_cards,
        view.overview.reviewed_today,
        view.overview.success_rate,
        view.overview.streak,
    );
    frame.render_widget(
        Paragraph::new(counters)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        chunks[0],
    );

    let hint = |text: String| {
        Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
    };

    match &view.face {
        CardFace::Idle => {
            let text = if view.overview.cards_remaining == 0 {
                "Nothing to review right now"
            } else {
                "Ready to review"
            };
            frame.render_widget(centered_text(text, Color::White), chunks[2]);
            frame.render_widget(hint("Press Enter to start".to_string()), chunks[5]);
        }
        CardFace::Front(card) => {
            frame.render_widget(centered_text(&card.front, Color::White), chunks[2]);
            frame.render_widget(
                hint(format!(
                    "{} left - press Space to flip",
                    view.session_remaining
                )),
                chunks[5],
            );
        }
        CardFace::Back(card, previews) => {
            frame.render_widget(centered_text(&card.back, Color::Yellow), chunks[2]);

            let mut extra: Vec<Line> = Vec::new();
            if let Some(example) = &card.example {
                extra.push(Line::from(example.as_str()));
            }
            if let Some(alt_form) = &card.alt_form {
                extra.push(Line::from(Span::styled(
                    alt_form.as_str(),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            frame.render_widget(
                Paragraph::new(extra).alignment(Alignment::Center),
                chunks[3],
            );

            frame.render_widget(
                Paragraph::new(rating_keys(previews.as_ref())).alignment(Alignment::Center),
                chunks[5],
            );
        }
        CardFace::Finished { reviewed } => {
            frame.render_widget(centered_text("Review complete!", Color::Green), chunks[2]);
            frame.render_widget(
                hint(format!("{} cards reviewed - press Enter to restart", reviewed)),
                chunks[5],
            );
        }
    }
}

fn centered_text(text: &str, color: Color) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
}

fn rating_keys(previews: Option<&[u32; 4]>) -> Line<'static> {
    let colors = [Color::Red, Color::Yellow, Color::Green, Color::Cyan];
    let mut spans = Vec::new();

    for (i, rating) in Rating::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        let label = match previews {
            Some(days) => format!(
                "{} {} ({})",
                rating.as_u8(),
                rating.label(),
                format_interval(days[i])
            ),
            None => format!("{} {}", rating.as_u8(), rating.label()),
        };
        spans.push(Span::styled(label, Style::default().fg(colors[i])));
    }

    Line::from(spans)
}

/// Render the card list with its search line
pub fn render_cards(frame: &mut Frame, area: Rect, view: &CardsView) {
    let chunks = Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).split(area);

    let search_style = if view.searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let search = Line::from(vec![
        Span::styled("Search: ", search_style),
        Span::styled(view.query, Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(search), chunks[0]);

    if view.cards.is_empty() {
        frame.render_widget(
            Paragraph::new("No cards")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[1],
        );
        return;
    }

    // Keep the selection on screen
    let height = chunks[1].height.max(1) as usize;
    let offset = view.selected.saturating_sub(height - 1);

    let lines: Vec<Line> = view
        .cards
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(i, card)| {
            let selected = i == view.selected;
            let prefix = if selected { "> " } else { "  " };
            let style = if selected {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            let due = match card.schedule.next_review() {
                Some(next) => format!("  (next {})", next.format("%Y-%m-%d")),
                None => "  (new)".to_string(),
            };
            Line::from(vec![
                Span::styled(format!("{}{} - {}", prefix, card.front, card.back), style),
                Span::styled(due, Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), chunks[1]);
}

/// Render the statistics screen
pub fn render_stats(
    frame: &mut Frame,
    area: Rect,
    overview: &Overview,
    recent: &[(NaiveDate, DailyStat)],
) {
    let mut lines = vec![
        Line::from(Span::styled("Statistics", Style::default().fg(Color::Green))),
        Line::from(""),
        Line::from(format!("Total cards: {}", overview.total_cards)),
        Line::from(format!("Due now: {}", overview.cards_remaining)),
        Line::from(format!("Reviewed today: {}", overview.reviewed_today)),
        Line::from(format!("Success rate today: {}%", overview.success_rate)),
        Line::from(format!("Streak: {} days", overview.streak)),
        Line::from(""),
    ];

    for (day, stat) in recent {
        let line = if stat.reviewed == 0 {
            Span::styled(
                format!("{}   -", day.format("%a %d %b")),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::raw(format!(
                "{}   {} reviewed, {} correct ({}%)",
                day.format("%a %d %b"),
                stat.reviewed,
                stat.correct,
                stat.success_rate()
            ))
        };
        lines.push(Line::from(line));
    }

    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(lines.len() as u16),
        Constraint::Fill(1),
    ])
    .split(area);

    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        chunks[1],
    );
}

/// Render the add/edit form as a popup
pub fn render_form(frame: &mut Frame, view: &FormView) {
    let area = popup_area(frame.area(), 60, (FORM_LABELS.len() * 2 + 3) as u16);
    frame.render_widget(Clear, area);

    let mut lines = Vec::new();
    for (i, label) in FORM_LABELS.iter().enumerate() {
        let focused = i == view.focus;
        let label_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(Span::styled(*label, label_style)));

        let cursor = if focused { "_" } else { "" };
        lines.push(Line::from(format!("{}{}", view.fields[i], cursor)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab next field - Enter save - Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let form = Paragraph::new(lines).block(Block::bordered().title(view.title));
    frame.render_widget(form, area);
}

/// Render a yes/no question as a popup
pub fn render_confirm(frame: &mut Frame, message: &[String]) {
    let area = popup_area(frame.area(), 60, message.len() as u16 + 4);
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = message.iter().map(|m| Line::from(m.as_str())).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "y confirm - any other key cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let popup = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::bordered().title("Confirm"));
    frame.render_widget(popup, area);
}

/// Render a single-line text prompt as a popup
pub fn render_prompt(frame: &mut Frame, title: &str, value: &str) {
    let area = popup_area(frame.area(), 70, 5);
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(format!("{}_", value)),
        Line::from(""),
        Line::from(Span::styled(
            "Enter confirm - Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(title)),
        area,
    );
}

/// Centered rectangle of at most `width` x `height` cells
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(area);

    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(vertical[1]);

    horizontal[1]
}
