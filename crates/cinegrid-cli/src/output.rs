use std::io::Write;

use cinegrid_core::{DetailView, MovieRecord, SortMode, rating_line};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

/// Print one listing page as a table.
pub fn print_listing(
    w: &mut dyn Write,
    mode: SortMode,
    movies: &[MovieRecord],
    color: ColorMode,
) -> std::io::Result<()> {
    let heading = format!("{} ({} movies)", mode.label(), movies.len());
    if color.enabled() {
        writeln!(w, "{}", heading.bold())?;
    } else {
        writeln!(w, "{}", heading)?;
    }
    if movies.is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "(nothing to show)".dimmed())?;
        } else {
            writeln!(w, "(nothing to show)")?;
        }
        return Ok(());
    }
    for (i, m) in movies.iter().enumerate() {
        let year = m
            .release_year()
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        let title = truncate(m.display_title(), 48);
        let rating = rating_line(m.vote_average, m.vote_count);
        if color.enabled() {
            writeln!(
                w,
                "{:>3}. {:<48} {} {:>8}  {}",
                i + 1,
                title,
                year.dimmed(),
                m.id.to_string().cyan(),
                rating
            )?;
        } else {
            writeln!(w, "{:>3}. {:<48} {} {:>8}  {}", i + 1, title, year, m.id, rating)?;
        }
    }
    Ok(())
}

/// Print a rendered detail view.
pub fn print_detail(w: &mut dyn Write, view: &DetailView, color: ColorMode) -> std::io::Result<()> {
    let mut title = view.title.clone();
    if let Some(year) = &view.year {
        title.push_str(&format!(" ({year})"));
    }
    if color.enabled() {
        writeln!(w, "{}", title.bold())?;
    } else {
        writeln!(w, "{}", title)?;
    }
    if !view.original_title.is_empty() && view.original_title != view.title {
        writeln!(w, "Original title: {}", view.original_title)?;
    }
    if let Some(runtime) = &view.runtime {
        writeln!(w, "Runtime: {}", runtime)?;
    }
    if color.enabled() {
        writeln!(w, "Rating: {}", view.rating.yellow())?;
    } else {
        writeln!(w, "Rating: {}", view.rating)?;
    }
    if view.is_favorite {
        if color.enabled() {
            writeln!(w, "{}", "\u{2605} Favorite".magenta())?;
        } else {
            writeln!(w, "* Favorite")?;
        }
    }
    if !view.overview.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", view.overview)?;
    }
    for (label, url) in [("Poster", &view.poster_url), ("Backdrop", &view.backdrop_url)] {
        if let Some(url) = url {
            writeln!(w, "{label}: {url}")?;
        }
    }

    writeln!(w)?;
    writeln!(w, "Trailers ({})", view.trailer_count())?;
    for t in &view.trailers {
        match &t.url {
            Some(url) => writeln!(w, "  - {} [{}] {}", t.name, t.site, url)?,
            None => writeln!(w, "  - {} [{}]", t.name, t.site)?,
        }
    }
    writeln!(w, "Reviews ({})", view.review_count())?;
    for r in &view.reviews {
        if color.enabled() {
            writeln!(w, "  {}: {}", r.author.cyan(), truncate(&r.content, 200))?;
        } else {
            writeln!(w, "  {}: {}", r.author, truncate(&r.content, 200))?;
        }
    }
    if let Some(url) = &view.share_url {
        writeln!(w)?;
        writeln!(w, "Share: {}", url)?;
    }
    Ok(())
}
