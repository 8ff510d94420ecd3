use cinegrid_core::Notice;

/// How many ticks a message stays on the status line (100ms ticks).
pub const MESSAGE_TICKS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// A transient line shown on the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub text: String,
    pub detail: Option<String>,
    shown_at: usize,
}

/// Holds at most one message; a newer one replaces the old.
#[derive(Debug, Default)]
pub struct MessageBar {
    current: Option<StatusMessage>,
}

impl MessageBar {
    pub fn info(&mut self, text: impl Into<String>, tick: usize) {
        self.current = Some(StatusMessage {
            kind: MessageKind::Info,
            text: text.into(),
            detail: None,
            shown_at: tick,
        });
    }

    pub fn notice(&mut self, notice: &Notice, tick: usize) {
        self.current = Some(StatusMessage {
            kind: MessageKind::Error,
            text: notice.to_string(),
            detail: (!notice.detail.is_empty()).then(|| notice.detail.clone()),
            shown_at: tick,
        });
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    /// Drop the message once it has been up for [`MESSAGE_TICKS`].
    pub fn expire(&mut self, tick: usize) {
        if let Some(msg) = &self.current
            && tick.saturating_sub(msg.shown_at) >= MESSAGE_TICKS
        {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinegrid_core::{MovieId, Operation};

    #[test]
    fn notice_keeps_detail_and_expires() {
        let mut bar = MessageBar::default();
        bar.notice(
            &Notice::new(Operation::DownloadMovie(MovieId(5)), "request timed out"),
            10,
        );
        let msg = bar.current().unwrap();
        assert_eq!(msg.kind, MessageKind::Error);
        assert_eq!(msg.text, "Failed to download movie 5");
        assert_eq!(msg.detail.as_deref(), Some("request timed out"));

        bar.expire(10 + MESSAGE_TICKS - 1);
        assert!(bar.current().is_some());
        bar.expire(10 + MESSAGE_TICKS);
        assert!(bar.current().is_none());
    }

    #[test]
    fn newer_message_replaces_older() {
        let mut bar = MessageBar::default();
        bar.notice(&Notice::new(Operation::DownloadMovies, "x"), 0);
        bar.info("Added to favorites", 3);
        assert_eq!(bar.current().unwrap().kind, MessageKind::Info);
        bar.expire(MESSAGE_TICKS);
        assert!(bar.current().is_some());
    }
}
