//! Poster and backdrop URLs.
//!
//! Decoding and caching pixels is the presentation layer's job; the core
//! only decides which URL belongs in which slot.

use std::fmt;

pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

/// Widths the image CDN serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W92,
    W154,
    W185,
    W342,
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub const POSTER: ImageSize = ImageSize::W185;
    pub const BACKDROP: ImageSize = ImageSize::W780;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::W92 => "w92",
            Self::W154 => "w154",
            Self::W185 => "w185",
            Self::W342 => "w342",
            Self::W500 => "w500",
            Self::W780 => "w780",
            Self::Original => "original",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{base}/{size}{path}`. Tolerates a trailing slash on `base` and a
/// missing leading slash on `path`.
pub fn image_url(base: &str, size: ImageSize, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}/{size}{path}")
    } else {
        format!("{base}/{size}/{path}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Poster,
    Backdrop,
}

/// Receives image URLs as detail views are rendered. `None` clears the
/// slot (the movie has no image of that kind).
pub trait ImageSink {
    fn show(&mut self, slot: ImageSlot, url: Option<&str>);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImages;

impl ImageSink for NoImages {
    fn show(&mut self, _slot: ImageSlot, _url: Option<&str>) {}
}

/// Keeps the most recent URL per slot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LatestImages {
    pub poster: Option<String>,
    pub backdrop: Option<String>,
}

impl ImageSink for LatestImages {
    fn show(&mut self, slot: ImageSlot, url: Option<&str>) {
        let url = url.map(str::to_string);
        match slot {
            ImageSlot::Poster => self.poster = url,
            ImageSlot::Backdrop => self.backdrop = url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_cdn_urls() {
        assert_eq!(
            image_url(DEFAULT_IMAGE_BASE, ImageSize::POSTER, "/abc.jpg"),
            "https://image.tmdb.org/t/p/w185/abc.jpg"
        );
        assert_eq!(
            image_url("http://cdn/", ImageSize::Original, "x.png"),
            "http://cdn/original/x.png"
        );
    }

    #[test]
    fn latest_images_tracks_slots() {
        let mut sink = LatestImages::default();
        sink.show(ImageSlot::Poster, Some("p"));
        sink.show(ImageSlot::Backdrop, Some("b"));
        sink.show(ImageSlot::Poster, None);
        assert_eq!(sink.poster, None);
        assert_eq!(sink.backdrop.as_deref(), Some("b"));
    }
}
