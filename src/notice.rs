use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_NOTICES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl NoticeKind {
    pub fn tag(self) -> &'static str {
        match self {
            NoticeKind::Success => "OK",
            NoticeKind::Error => "ERROR",
            NoticeKind::Info => "INFO",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub posted_at: Instant,
}

/// Transient user-facing messages; each one is visible for `ttl`.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    notices: VecDeque<Notice>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            notices: VecDeque::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn push(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.push_at(kind, text, Instant::now());
    }

    pub fn push_at(&mut self, kind: NoticeKind, text: impl Into<String>, now: Instant) {
        self.notices.push_back(Notice {
            kind,
            text: text.into(),
            posted_at: now,
        });
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(NoticeKind::Success, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(NoticeKind::Error, text);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(NoticeKind::Info, text);
    }

    pub fn visible(&self, now: Instant) -> impl Iterator<Item = &Notice> + '_ {
        let ttl = self.ttl;
        self.notices
            .iter()
            .filter(move |n| now.saturating_duration_since(n.posted_at) < ttl)
    }

    /// Every notice still held, expired or not.
    pub fn history(&self) -> impl Iterator<Item = &Notice> + '_ {
        self.notices.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    /// Drops expired notices.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.notices
            .retain(|n| now.saturating_duration_since(n.posted_at) < ttl);
    }
}
