use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use cinegrid_core::Layout;

use crate::app::App;
use crate::model::message::MessageKind;

/// The transient message line above the footer.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let Some(msg) = app.messages.current() else {
        return;
    };
    let mut spans = match msg.kind {
        MessageKind::Error => vec![Span::styled(
            format!(" \u{2716} {}", msg.text),
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )],
        MessageKind::Info => vec![Span::styled(
            format!(" {}", msg.text),
            Style::default().fg(theme.active),
        )],
    };
    if let Some(detail) = &msg.detail {
        spans.push(Span::styled(format!(": {detail}"), Style::default().fg(theme.dim)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Key hints on the left, layout on the right.
pub fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let hints = if app.detail_screen_open() {
        " j/k scroll  f favorite  Esc back  ? help  q quit"
    } else {
        " j/k move  Enter open  s sort  f favorite  n more  r reload  ? help  q quit"
    };
    f.render_widget(Paragraph::new(hints).style(theme.footer_style()), area);

    let layout = match app.layout() {
        Layout::SinglePane => "single",
        Layout::DualPane => "dual",
    };
    let right = Line::from(Span::styled(
        format!("{layout} {}x{} ", app.size.0, app.size.1),
        theme.footer_style(),
    ))
    .alignment(Alignment::Right);
    f.render_widget(Paragraph::new(right), area);
}
