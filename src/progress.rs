//! Phase-based progress reporting.
//!
//! Progress is advisory: values go to an optional `mpsc::Sender<u8>` and a
//! dropped receiver is ignored. Within one invocation the reported values are
//! strictly increasing and never exceed 100.

use std::sync::mpsc::Sender;

/// Fixed checkpoints of a single encode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    DecodeStart,
    DecodeComplete,
    DimensionsComputed,
    SurfaceReady,
    QualityFinalized,
    Complete,
}

impl Phase {
    pub fn percent(self) -> u8 {
        match self {
            Self::DecodeStart => 10,
            Self::DecodeComplete => 30,
            Self::DimensionsComputed => 50,
            Self::SurfaceReady => 70,
            Self::QualityFinalized => 80,
            Self::Complete => 100,
        }
    }
}

/// Overall range a pass's phases are mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: u8,
    pub end: u8,
}

impl Window {
    pub const FULL: Window = Window { start: 0, end: 100 };
    pub const STAGE_ONE: Window = Window { start: 20, end: 60 };
    pub const STAGE_TWO: Window = Window { start: 60, end: 90 };

    fn map(self, percent: u8) -> u8 {
        let span = u32::from(self.end.saturating_sub(self.start));
        let offset = span * u32::from(percent.min(100)) / 100;
        (u32::from(self.start) + offset) as u8
    }
}

/// Ordered, windowed progress emitter for one invocation.
#[derive(Debug)]
pub struct ProgressReporter {
    sink: Option<Sender<u8>>,
    window: Window,
    last: Option<u8>,
    emitted: Vec<u8>,
}

impl ProgressReporter {
    pub fn new(sink: Option<Sender<u8>>) -> Self {
        Self {
            sink,
            window: Window::FULL,
            last: None,
            emitted: Vec::new(),
        }
    }

    /// A reporter that only records, for callers that did not subscribe.
    pub fn silent() -> Self {
        Self::new(None)
    }

    /// Map subsequent phases into `window`.
    pub fn set_window(&mut self, window: Window) {
        self.window = window;
    }

    /// Report a pass checkpoint, scaled into the current window.
    pub fn phase(&mut self, phase: Phase) {
        self.emit(self.window.map(phase.percent()));
    }

    /// Report an absolute percentage (stage boundaries, final completion).
    pub fn emit(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        self.emitted.push(percent);
        if let Some(sink) = &self.sink {
            // receiver gone: progress is advisory
            let _ = sink.send(percent);
        }
    }

    /// Every value emitted so far, in order.
    pub fn history(&self) -> &[u8] {
        &self.emitted
    }
}

/// UI label for a progress value.
pub fn progress_stage_text(percent: u8) -> &'static str {
    match percent {
        0..=29 => "Reading file...",
        30..=59 => "Resizing image...",
        60..=89 => "Compressing...",
        _ => "Finishing...",
    }
}
