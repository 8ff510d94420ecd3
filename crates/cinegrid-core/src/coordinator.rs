//! Master-detail routing.
//!
//! The layout is fixed when the coordinator is built. A change in layout
//! capability is handled by destroying the whole screen and building a new
//! one (see [`crate::screen::Screen`]), never by mutating this value.

use serde::{Deserialize, Serialize};

use crate::model::{MovieId, MovieRecord};

/// A movie chosen for detail display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEvent {
    pub movie_id: MovieId,
    /// `false` for re-selections the app makes on its own (after a load or
    /// a restore).
    pub user_initiated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    SinglePane,
    DualPane,
}

/// Configured layout; `Auto` decides from the available width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPreference {
    #[default]
    Auto,
    Single,
    Dual,
}

/// Minimum terminal width (columns) for side-by-side panes in `Auto` mode.
pub const DUAL_PANE_MIN_WIDTH: u16 = 120;

impl LayoutPreference {
    pub fn resolve(&self, width: u16) -> Layout {
        match self {
            Self::Single => Layout::SinglePane,
            Self::Dual => Layout::DualPane,
            Self::Auto if width >= DUAL_PANE_MIN_WIDTH => Layout::DualPane,
            Self::Auto => Layout::SinglePane,
        }
    }
}

impl std::str::FromStr for LayoutPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "single" | "one" => Ok(Self::Single),
            "dual" | "two" => Ok(Self::Dual),
            other => Err(format!("unknown layout: {other}")),
        }
    }
}

/// What a standalone detail screen is opened with: exactly one of an id
/// (fetch fresh) or a materialized record (render as-is, no network).
#[derive(Debug, Clone, PartialEq)]
pub enum DetailTarget {
    Id(MovieId),
    Record(Box<MovieRecord>),
}

impl DetailTarget {
    pub fn movie_id(&self) -> MovieId {
        match self {
            Self::Id(id) => *id,
            Self::Record(m) => m.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Forward to the visible detail pane, which re-fetches.
    ShowInPane(MovieId),
    /// Start a new detail screen.
    OpenScreen(DetailTarget),
    Ignore,
}

#[derive(Debug, Clone, Copy)]
pub struct MasterDetail {
    layout: Layout,
}

impl MasterDetail {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn has_pane(&self) -> bool {
        self.layout == Layout::DualPane
    }

    /// Route a selection. `materialized` is the full record when the active
    /// collection came from the local store; a single-pane screen then opens
    /// with it instead of refetching.
    pub fn route(&self, event: SelectionEvent, materialized: Option<&MovieRecord>) -> Route {
        match self.layout {
            Layout::DualPane => Route::ShowInPane(event.movie_id),
            Layout::SinglePane if event.user_initiated => match materialized {
                Some(record) if record.id == event.movie_id => {
                    Route::OpenScreen(DetailTarget::Record(Box::new(record.clone())))
                }
                _ => Route::OpenScreen(DetailTarget::Id(event.movie_id)),
            },
            Layout::SinglePane => Route::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(id: u32, user: bool) -> SelectionEvent {
        SelectionEvent {
            movie_id: MovieId(id),
            user_initiated: user,
        }
    }

    #[test]
    fn dual_pane_always_updates_pane() {
        let md = MasterDetail::new(Layout::DualPane);
        assert_eq!(md.route(ev(3, false), None), Route::ShowInPane(MovieId(3)));
        assert_eq!(md.route(ev(3, true), None), Route::ShowInPane(MovieId(3)));
    }

    #[test]
    fn single_pane_opens_only_for_user() {
        let md = MasterDetail::new(Layout::SinglePane);
        assert_eq!(
            md.route(ev(11, true), None),
            Route::OpenScreen(DetailTarget::Id(MovieId(11)))
        );
        assert_eq!(md.route(ev(11, false), None), Route::Ignore);
    }

    #[test]
    fn single_pane_passes_materialized_record() {
        let md = MasterDetail::new(Layout::SinglePane);
        let rec = MovieRecord::new(MovieId(5), "Offline");
        match md.route(ev(5, true), Some(&rec)) {
            Route::OpenScreen(DetailTarget::Record(m)) => assert_eq!(*m, rec),
            other => panic!("unexpected route {other:?}"),
        }
        // A record for a different movie is never passed along.
        assert_eq!(
            md.route(ev(6, true), Some(&rec)),
            Route::OpenScreen(DetailTarget::Id(MovieId(6)))
        );
    }

    #[test]
    fn auto_layout_uses_width() {
        assert_eq!(LayoutPreference::Auto.resolve(80), Layout::SinglePane);
        assert_eq!(LayoutPreference::Auto.resolve(160), Layout::DualPane);
        assert_eq!(LayoutPreference::Single.resolve(300), Layout::SinglePane);
        assert_eq!(LayoutPreference::Dual.resolve(40), Layout::DualPane);
    }
}
