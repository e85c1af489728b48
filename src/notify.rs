use tracing::{
    error,
    info,
};

const MAX_FEED: usize = 50;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotifyKind {
    Success,
    Error,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NotifyPosition {
    #[default]
    TopRight,
}

/// One toast entry. Presentation-only; the UI renders the feed as-is.
#[derive(Clone, Debug)]
pub struct Notification {
    pub kind: NotifyKind,
    pub title: String,
    pub message: String,
    pub position: NotifyPosition,
    pub icon: &'static str,
}

/// In-memory notification feed, capped so a long session cannot grow it
/// without bound. Every entry is mirrored to the log.
#[derive(Debug, Default)]
pub struct Notifier {
    feed: Vec<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NotifyKind::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NotifyKind::Error, message.into());
    }

    fn push(&mut self, kind: NotifyKind, message: String) {
        match kind {
            NotifyKind::Success => info!(%message, "notification"),
            NotifyKind::Error => error!(%message, "notification"),
        }
        self.feed.push(Notification {
            kind,
            title: String::from("Transaction Notification"),
            message,
            position: NotifyPosition::TopRight,
            icon: "bell",
        });
        if self.feed.len() > MAX_FEED {
            let drain = self.feed.len() - MAX_FEED;
            self.feed.drain(0..drain);
        }
    }

    /// Latest-first view of the most recent entries.
    pub fn recent(&self, count: usize) -> Vec<Notification> {
        self.feed.iter().rev().take(count).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.feed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feed.is_empty()
    }
}
