mod update;

use ratatui::layout::{Constraint, Layout as Split, Rect};

use cinegrid_core::images::LatestImages;
use cinegrid_core::{
    DetailLoader, Layout, LayoutPreference, ListingSnapshot, Screen, ScreenDeps, SortMode,
};

use crate::model::message::MessageBar;
use crate::theme::Theme;

/// Top-level TUI state. Owns the current [`Screen`]; a resize that flips
/// the layout replaces it with a new one restored from its stash.
pub struct App {
    pub screen: Screen,
    deps: ScreenDeps,
    pub layout_pref: LayoutPreference,
    /// Terminal size (columns, rows).
    pub size: (u16, u16),
    /// Highlighted grid row.
    pub cursor: usize,
    pub detail_scroll: u16,
    pub show_help: bool,
    pub messages: MessageBar,
    pub images: LatestImages,
    pub theme: Theme,
    pub should_quit: bool,
    pub tick: usize,
    /// Grid rows that fit on screen at the last draw, for paging.
    pub page_rows: usize,
}

impl App {
    /// `snapshot` is the listing saved by the last session. A saved
    /// favorites listing is re-queried, as the store may have changed since.
    pub fn new(
        deps: ScreenDeps,
        layout_pref: LayoutPreference,
        default_sort: SortMode,
        size: (u16, u16),
        snapshot: Option<ListingSnapshot>,
        theme: Theme,
    ) -> Self {
        let mut images = LatestImages::default();
        let layout = layout_pref.resolve(size.0);
        let restored = snapshot.is_some();
        let (mut screen, effects) =
            Screen::create(deps.clone(), layout, snapshot, default_sort, &mut images);
        if restored {
            screen.refresh_favorites();
        }
        let cursor = screen.listing().last_index();
        let mut app = Self {
            screen,
            deps,
            layout_pref,
            size,
            cursor,
            detail_scroll: 0,
            show_help: false,
            messages: MessageBar::default(),
            images,
            theme,
            should_quit: false,
            tick: 0,
            page_rows: 10,
        };
        app.apply_effects(effects);
        app
    }

    pub fn layout(&self) -> Layout {
        self.screen.layout()
    }

    pub fn count(&self) -> usize {
        self.screen.listing().count()
    }

    /// The detail surface on screen: the standalone detail screen if one
    /// is open, else the dual-pane loader.
    pub fn detail(&self) -> Option<&DetailLoader> {
        self.screen.opened().or_else(|| self.screen.pane())
    }

    pub fn detail_screen_open(&self) -> bool {
        self.screen.opened().is_some()
    }

    /// State to persist on exit.
    pub fn stash(&self) -> Option<ListingSnapshot> {
        self.screen.stash()
    }

    pub fn view(&mut self, f: &mut ratatui::Frame) {
        let area = f.area();
        let [body, status, footer] = Split::vertical([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        if self.detail_screen_open() {
            crate::view::detail::render_screen(f, self, body);
        } else if self.layout() == Layout::DualPane {
            let [grid, pane] =
                Split::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
                    .areas(body);
            self.render_grid(f, grid);
            crate::view::detail::render_pane(f, self, pane);
        } else {
            self.render_grid(f, body);
        }

        crate::view::status::render(f, self, status);
        crate::view::status::render_footer(f, self, footer);

        if self.show_help {
            crate::view::help::render(f, &self.theme);
        }
    }

    fn render_grid(&mut self, f: &mut ratatui::Frame, area: Rect) {
        // Header row, table borders and the table's own header row.
        self.page_rows = usize::from(area.height.saturating_sub(4)).max(1);
        crate::view::grid::render(f, self, area);
    }
}

#[cfg(test)]
mod tests;
