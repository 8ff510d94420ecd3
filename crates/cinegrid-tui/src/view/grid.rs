use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use cinegrid_core::SortMode;

use crate::app::App;
use crate::view::{spinner_char, truncate};

/// Render the movie grid: sort tabs on top, the listing table below.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let [tabs, table] = Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).areas(area);
    render_tabs(f, app, tabs);
    render_table(f, app, table);
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let listing = app.screen.listing();
    let active = listing.sort_mode();

    let mut spans = vec![Span::styled(" CINEGRID ", theme.header_style()), Span::raw(" ")];
    for (i, mode) in SortMode::ALL.iter().enumerate() {
        spans.push(Span::styled(
            format!(" {} {} ", i + 1, mode.label()),
            theme.sort_tab_style(*mode, active),
        ));
        spans.push(Span::raw(" "));
    }
    if listing.is_loading() {
        spans.push(Span::styled(
            format!("{} loading", spinner_char(app.tick)),
            Style::default().fg(theme.spinner),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let listing = app.screen.listing();

    let mut title = format!(" {} \u{00b7} {} ", listing.sort_mode().label(), listing.count());
    if listing.has_more() {
        title.push_str("\u{00b7} n: more ");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(title);

    let movies = listing.collection().map(|c| c.items()).unwrap_or_default();
    if movies.is_empty() {
        let text = if listing.is_loading() {
            format!("{} Loading movies...", spinner_char(app.tick))
        } else if listing.sort_mode() == SortMode::Favorites {
            "No favorites yet. Open a movie and press f.".to_string()
        } else {
            "Nothing to show. Press r to retry.".to_string()
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(theme.dim),
        )))
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(["#", "Title", "Year", "Rating", "Votes"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
    }))
    .height(1);

    let title_width = usize::from(area.width.saturating_sub(30));
    let rows: Vec<Row> = movies
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let year = m
                .release_year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| "\u{2014}".to_string());
            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(theme.dim)),
                Cell::from(truncate(m.display_title(), title_width)),
                Cell::from(year).style(Style::default().fg(theme.dim)),
                Cell::from(format!("{:.1}", m.vote_average))
                    .style(Style::default().fg(theme.rating)),
                Cell::from(format!("{}", m.vote_count)).style(Style::default().fg(theme.dim)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(10),
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Length(7),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(theme.highlight_style());

    let mut state = TableState::default();
    state.select(Some(app.cursor));
    f.render_stateful_widget(table, area, &mut state);
}
