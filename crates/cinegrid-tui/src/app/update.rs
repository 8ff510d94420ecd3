use cinegrid_core::{CoreEvent, Layout, Screen, ScreenEffect};

use super::App;
use crate::action::Action;

impl App {
    /// Process an action. Returns true if the app should quit.
    pub fn update(&mut self, action: Action) -> bool {
        if self.show_help {
            match action {
                Action::ToggleHelp | Action::NavigateBack => {
                    self.show_help = false;
                    return false;
                }
                Action::Quit | Action::Tick | Action::Resize(..) => {}
                _ => return false,
            }
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::MoveDown => self.step(1),
            Action::MoveUp => self.step(-1),
            Action::PageDown => self.step(self.page_rows as isize),
            Action::PageUp => self.step(-(self.page_rows as isize)),
            Action::GoTop => {
                if self.detail_screen_open() {
                    self.detail_scroll = 0;
                } else {
                    self.move_cursor_to(0);
                }
            }
            Action::GoBottom => {
                if !self.detail_screen_open() {
                    self.move_cursor_to(self.count().saturating_sub(1));
                }
            }
            Action::Select => {
                if !self.detail_screen_open() && self.count() > 0 {
                    self.detail_scroll = 0;
                    let effects = self.screen.select(self.cursor, &mut self.images);
                    self.apply_effects(effects);
                }
            }
            Action::NavigateBack => {
                if self.screen.close_detail() {
                    self.detail_scroll = 0;
                }
            }
            Action::CycleSort => {
                if !self.detail_screen_open() {
                    self.screen.cycle_sort_mode();
                    self.on_sort_changed();
                }
            }
            Action::ChooseSort(mode) => {
                if !self.detail_screen_open() && self.screen.choose_sort_mode(mode) {
                    self.on_sort_changed();
                }
            }
            Action::ToggleFavorite => {
                if !self.screen.toggle_favorite() {
                    self.messages.info("Open a movie to change its favorite", self.tick);
                }
            }
            Action::LoadMore => {
                if !self.screen.load_more() && !self.screen.listing().is_loading() {
                    self.messages.info("No more pages", self.tick);
                }
            }
            Action::Reload => {
                self.messages.clear();
                self.screen.reload();
            }
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::Resize(w, h) => self.resize(w, h),
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
                self.messages.expire(self.tick);
            }
            Action::None => {}
        }
        self.should_quit
    }

    /// Apply a background outcome delivered on the core event channel.
    pub fn handle_core_event(&mut self, event: CoreEvent) {
        let effects = self.screen.handle(event, &mut self.images);
        self.apply_effects(effects);
    }

    pub(super) fn apply_effects(&mut self, effects: Vec<ScreenEffect>) {
        for effect in effects {
            match effect {
                ScreenEffect::ListingReady { .. } => {
                    self.cursor = self.screen.listing().last_index();
                }
                ScreenEffect::DetailOpened(_) => self.detail_scroll = 0,
                ScreenEffect::DetailShown { .. } => {}
                ScreenEffect::FavoriteChanged { is_favorite, .. } => {
                    let text = if is_favorite {
                        "Added to favorites"
                    } else {
                        "Removed from favorites"
                    };
                    self.messages.info(text, self.tick);
                }
                ScreenEffect::Notice(notice) => self.messages.notice(&notice, self.tick),
            }
        }
    }

    /// Scroll the detail screen when one is open, else move the grid cursor.
    /// Stepping down past the last row asks for the next page.
    fn step(&mut self, delta: isize) {
        if self.detail_screen_open() {
            self.detail_scroll = self.detail_scroll.saturating_add_signed(delta as i16);
            return;
        }
        let count = self.count();
        if count == 0 {
            return;
        }
        if delta > 0 && self.cursor + 1 >= count {
            self.screen.load_more();
            return;
        }
        let target = self.cursor.saturating_add_signed(delta).min(count - 1);
        self.move_cursor_to(target);
    }

    fn move_cursor_to(&mut self, index: usize) {
        if index == self.cursor || index >= self.count() {
            return;
        }
        self.cursor = index;
        let effects = self.screen.highlight(index, &mut self.images);
        self.apply_effects(effects);
    }

    fn on_sort_changed(&mut self) {
        self.cursor = 0;
        self.detail_scroll = 0;
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        let target = self.layout_pref.resolve(width);
        if target != self.screen.layout() {
            self.recreate_screen(target);
        }
    }

    /// Swap in a screen for `layout`, seeded from the current one's stash.
    /// The old screen is destroyed, so none of its work reports back.
    fn recreate_screen(&mut self, layout: Layout) {
        tracing::info!(from = ?self.screen.layout(), to = ?layout, "layout changed, recreating screen");
        // A mode switch still loading has nothing to stash yet; the new
        // screen reloads that mode rather than the startup default.
        let stash = self.screen.stash();
        let mode = self.screen.listing().sort_mode();
        let (screen, effects) =
            Screen::create(self.deps.clone(), layout, stash, mode, &mut self.images);
        let old = std::mem::replace(&mut self.screen, screen);
        old.destroy();
        self.cursor = self.screen.listing().last_index();
        self.detail_scroll = 0;
        self.apply_effects(effects);
    }
}
