#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient, non-blocking message raised by a page action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Pending notices, drained by whoever displays them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notices {
    pending: Vec<Notice>,
}

impl Notices {
    pub fn success(&mut self, text: impl Into<String>) {
        self.pending.push(Notice::new(NoticeLevel::Success, text));
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.pending.push(Notice::new(NoticeLevel::Info, text));
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.pending.push(Notice::new(NoticeLevel::Warning, text));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.pending.push(Notice::new(NoticeLevel::Error, text));
    }

    #[must_use]
    pub fn pending(&self) -> &[Notice] {
        &self.pending
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Notice> {
        self.pending.last()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }
}
