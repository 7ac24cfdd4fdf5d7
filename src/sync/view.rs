//! Rendering seam for the timeline
//!
//! The synchronizer owns the rendered model; a `TimelineView` is told about
//! every change so it can draw it (terminal, UI, test recorder).

use crate::sync::synchronizer::RenderedStep;
use crate::timeline::StepStatus;

/// Visual weight of an icon or title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Muted,
    Normal,
    Active,
    Positive,
    Negative,
}

/// Icon and style set for a step status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub icon: &'static str,
    pub icon_tone: Tone,
    pub title_tone: Tone,
    pub animated: bool,
}

impl Presentation {
    pub fn for_status(status: StepStatus) -> Self {
        match status {
            StepStatus::Pending => Self {
                icon: "○",
                icon_tone: Tone::Muted,
                title_tone: Tone::Muted,
                animated: false,
            },
            StepStatus::Running => Self {
                icon: "◐",
                icon_tone: Tone::Active,
                title_tone: Tone::Normal,
                animated: true,
            },
            StepStatus::Success => Self {
                icon: "✓",
                icon_tone: Tone::Positive,
                title_tone: Tone::Normal,
                animated: false,
            },
            StepStatus::Fail => Self {
                icon: "✗",
                icon_tone: Tone::Negative,
                title_tone: Tone::Negative,
                animated: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Connected,
    Disconnected,
    Error,
}

/// Connection status banner shown above the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub title: String,
    pub body: String,
}

impl Banner {
    pub fn connected() -> Self {
        Self {
            kind: BannerKind::Connected,
            title: "Connected!".to_string(),
            body: "Waiting for real-time status updates.".to_string(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            kind: BannerKind::Disconnected,
            title: "Connection lost!".to_string(),
            body: "Showing the last known state. Reconnecting...".to_string(),
        }
    }

    pub fn missing_task_id() -> Self {
        Self {
            kind: BannerKind::Error,
            title: "Error!".to_string(),
            body: "Task ID not found. Timeline updates cannot be loaded.".to_string(),
        }
    }
}

pub trait TimelineView: Send {
    /// A step node was re-rendered
    fn render_step(&mut self, step: &RenderedStep);

    /// The connection banner changed
    fn render_banner(&mut self, banner: &Banner);
}

/// View that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopView;

impl TimelineView for NoopView {
    fn render_step(&mut self, _step: &RenderedStep) {}

    fn render_banner(&mut self, _banner: &Banner) {}
}

/// Line-oriented terminal view with optional ANSI colors
#[derive(Debug, Clone, Default)]
pub struct TerminalView {
    color: bool,
}

impl TerminalView {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match tone {
            Tone::Muted => "90",
            Tone::Normal => "0",
            Tone::Active => "34",
            Tone::Positive => "32",
            Tone::Negative => "31",
        };
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }

    /// Format a step as one header line plus indented message lines
    pub fn format_step(&self, step: &RenderedStep) -> String {
        let p = &step.presentation;
        let mut out = format!(
            "{} {}",
            self.paint(p.icon_tone, p.icon),
            self.paint(p.title_tone, &step.title)
        );
        for line in step.message_text.lines() {
            out.push_str("\n      ");
            out.push_str(line);
        }
        out
    }

    pub fn format_banner(&self, banner: &Banner) -> String {
        let tone = match banner.kind {
            BannerKind::Connected => Tone::Positive,
            BannerKind::Disconnected | BannerKind::Error => Tone::Negative,
        };
        format!("{} {}", self.paint(tone, &banner.title), banner.body)
    }
}

impl TimelineView for TerminalView {
    fn render_step(&mut self, step: &RenderedStep) {
        println!("{}", self.format_step(step));
    }

    fn render_banner(&mut self, banner: &Banner) {
        println!("{}", self.format_banner(banner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_per_status() {
        assert_eq!(Presentation::for_status(StepStatus::Success).icon, "✓");
        assert_eq!(Presentation::for_status(StepStatus::Fail).title_tone, Tone::Negative);
        assert!(Presentation::for_status(StepStatus::Running).animated);
        assert!(!Presentation::for_status(StepStatus::Pending).animated);
    }

    #[test]
    fn test_banner_format_without_color() {
        let view = TerminalView::new(false);
        assert_eq!(
            view.format_banner(&Banner::connected()),
            "Connected! Waiting for real-time status updates."
        );
    }
}
