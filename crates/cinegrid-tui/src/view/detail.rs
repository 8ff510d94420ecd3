use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use cinegrid_core::{DetailLoader, DetailView};

use crate::app::App;
use crate::theme::Theme;
use crate::view::{spinner_char, truncate};

/// Full-screen detail, opened from the grid in single-pane layout.
pub fn render_screen(f: &mut Frame, app: &App, area: Rect) {
    if let Some(loader) = app.screen.opened() {
        render_loader(f, app, loader, area, " Esc: back ");
    }
}

/// Right-hand detail pane in dual-pane layout.
pub fn render_pane(f: &mut Frame, app: &App, area: Rect) {
    match app.screen.pane() {
        Some(loader) => render_loader(f, app, loader, area, ""),
        None => f.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.border_style()),
            area,
        ),
    }
}

fn render_loader(f: &mut Frame, app: &App, loader: &DetailLoader, area: Rect, hint: &str) {
    let theme = &app.theme;
    let mut title = String::from(" Detail ");
    if loader.is_loading() {
        title = format!(" Detail {} ", spinner_char(app.tick));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.active))
        .title(title)
        .title_bottom(Line::from(hint.to_string()).alignment(Alignment::Right));

    let Some(view) = loader.view() else {
        let text = if loader.is_loading() {
            "Loading movie..."
        } else {
            "Select a movie"
        };
        let paragraph = Paragraph::new(Span::styled(text, Style::default().fg(theme.dim)))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let width = usize::from(area.width.saturating_sub(4));
    let paragraph = Paragraph::new(detail_lines(view, theme, width))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    f.render_widget(paragraph, area);
}

fn detail_lines<'a>(view: &'a DetailView, theme: &Theme, width: usize) -> Vec<Line<'a>> {
    let mut lines = Vec::new();

    let mut heading = vec![Span::styled(
        view.title.as_str(),
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    )];
    if let Some(year) = &view.year {
        heading.push(Span::styled(format!(" ({year})"), Style::default().fg(theme.dim)));
    }
    if view.is_favorite {
        heading.push(Span::styled(" \u{2605}", Style::default().fg(theme.favorite)));
    }
    lines.push(Line::from(heading));

    if !view.original_title.is_empty() && view.original_title != view.title {
        lines.push(Line::from(Span::styled(
            view.original_title.as_str(),
            Style::default().fg(theme.dim).add_modifier(Modifier::ITALIC),
        )));
    }

    let mut meta = vec![Span::styled(
        view.rating.as_str(),
        Style::default().fg(theme.rating),
    )];
    if let Some(runtime) = &view.runtime {
        meta.push(Span::styled(
            format!("  \u{00b7}  {runtime}"),
            Style::default().fg(theme.dim),
        ));
    }
    lines.push(Line::from(meta));
    lines.push(Line::from(""));

    if !view.overview.is_empty() {
        lines.push(Line::from(Span::styled(
            view.overview.as_str(),
            Style::default().fg(theme.text),
        )));
        lines.push(Line::from(""));
    }

    for (label, url) in [("Poster", &view.poster_url), ("Backdrop", &view.backdrop_url)] {
        if let Some(url) = url {
            lines.push(Line::from(vec![
                Span::styled(format!("{label:<9}"), Style::default().fg(theme.dim)),
                Span::styled(url.as_str(), Style::default().fg(theme.active)),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(section(format!("Trailers ({})", view.trailer_count()), theme));
    for t in &view.trailers {
        let mut spans = vec![
            Span::raw("  "),
            Span::styled(truncate(&t.name, width / 2), Style::default().fg(theme.text)),
            Span::styled(format!(" [{}]", t.site), Style::default().fg(theme.dim)),
        ];
        if let Some(url) = &t.url {
            spans.push(Span::styled(format!(" {url}"), Style::default().fg(theme.active)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(section(format!("Reviews ({})", view.review_count()), theme));
    for r in &view.reviews {
        lines.push(Line::from(Span::styled(
            format!("  {}", r.author),
            Style::default().fg(theme.active),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", truncate(&r.content, 600)),
            Style::default().fg(theme.text),
        )));
    }

    if let Some(url) = &view.share_url {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Share  ", Style::default().fg(theme.dim)),
            Span::styled(url.as_str(), Style::default().fg(theme.active)),
        ]));
    }
    lines
}

fn section(title: String, theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().fg(theme.active).add_modifier(Modifier::BOLD),
    ))
}
