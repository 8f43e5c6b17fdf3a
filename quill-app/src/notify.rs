/// Severity of a transient user-facing message (the toast analog).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Error,
}

/// Presentation seam for transient notifications. The workflow never decides
/// how a message is rendered, only that one is due.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: Notice, message: &str);
}
