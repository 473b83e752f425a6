use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ClioError;

/// How long a copy acknowledgement stays visible.
pub const COPIED_WINDOW: Duration = Duration::from_secs(2);

pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), ClioError>;
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Whether copied text outlives this process. X11 and Wayland selections are served by
/// the process that set them, so on Linux they vanish when it exits.
pub const RETAINED_AFTER_EXIT: bool = !cfg!(target_os = "linux");

pub struct SystemClipboard {
    inner: arboard::Clipboard,
    hold: Duration,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClioError> {
        Self::with_hold(Duration::ZERO)
    }

    /// On Linux, `write_text` blocks for up to `hold` while serving the selection, or
    /// until another program takes the clipboard over. Elsewhere `hold` is ignored.
    pub fn with_hold(hold: Duration) -> Result<Self, ClioError> {
        let inner =
            arboard::Clipboard::new().map_err(|err| ClioError::Clipboard(err.to_string()))?;
        Ok(Self { inner, hold })
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }
}

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClioError> {
        #[cfg(target_os = "linux")]
        if !self.hold.is_zero() {
            use arboard::SetExtLinux;

            return self
                .inner
                .set()
                .wait_until(Instant::now() + self.hold)
                .text(text)
                .map_err(|err| ClioError::Clipboard(err.to_string()));
        }
        self.inner
            .set_text(text)
            .map_err(|err| ClioError::Clipboard(err.to_string()))
    }
}

/// Where a copied citation stands once the command returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// On the clipboard and kept there by the OS.
    Copied,
    /// Was pasteable while this process served it; gone once it exits.
    Held(Duration),
    /// Set, but nothing keeps it after exit.
    NotRetained,
    NotCopied,
}

impl CopyStatus {
    pub fn resolve(copied: bool, hold: Duration) -> Self {
        match (copied, RETAINED_AFTER_EXIT) {
            (false, _) => CopyStatus::NotCopied,
            (true, true) => CopyStatus::Copied,
            (true, false) if hold.is_zero() => CopyStatus::NotRetained,
            (true, false) => CopyStatus::Held(hold),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CopyStatus::Copied => "copied",
            CopyStatus::Held(_) => "held",
            CopyStatus::NotRetained => "not-retained",
            CopyStatus::NotCopied => "not-copied",
        }
    }

    /// True only when the citation is still on the clipboard after exit.
    pub fn is_retained(self) -> bool {
        matches!(self, CopyStatus::Copied)
    }
}

/// Copies citations and tracks which one was copied last, for [`COPIED_WINDOW`].
/// A newer copy replaces the marker and restarts the window.
pub struct CitationCopier<B: ClipboardSink, C: Clock = SystemClock> {
    sink: B,
    clock: C,
    copied: Option<(String, Instant)>,
}

impl<B: ClipboardSink> CitationCopier<B, SystemClock> {
    pub fn new(sink: B) -> Self {
        Self::with_clock(sink, SystemClock)
    }
}

impl<B: ClipboardSink, C: Clock> CitationCopier<B, C> {
    pub fn with_clock(sink: B, clock: C) -> Self {
        Self {
            sink,
            clock,
            copied: None,
        }
    }

    /// On clipboard failure the marker is left untouched.
    pub fn copy_citation(&mut self, text: &str, id: &str) -> Result<(), ClioError> {
        self.sink.write_text(text)?;
        debug!(id, "citation copied");
        self.copied = Some((id.to_string(), self.clock.now()));
        Ok(())
    }

    pub fn copied_id(&self) -> Option<&str> {
        let (id, at) = self.copied.as_ref()?;
        let elapsed = self.clock.now().saturating_duration_since(*at);
        (elapsed < COPIED_WINDOW).then_some(id.as_str())
    }

    pub fn is_copied(&self, id: &str) -> bool {
        self.copied_id() == Some(id)
    }

    pub fn sink(&self) -> &B {
        &self.sink
    }
}
