//! Hint output
//!
//! What steps hand to the rendering pass: text lines for the overlay panel
//! and marks on a caller-supplied canvas.

use serde::{Deserialize, Serialize};

/// How a panel line is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Plain,
    /// Content under a title (the step text)
    TitledContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintLine {
    pub text: String,
    pub style: LineStyle,
}

impl HintLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::Plain,
        }
    }

    pub fn titled_content(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::TitledContent,
        }
    }
}

/// Collects overlay panel lines in display order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintPanel {
    lines: Vec<HintLine>,
}

impl HintPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: HintLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[HintLine] {
        &self.lines
    }

    /// Line texts in order
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A tile in the game world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: i32,
    pub y: i32,
    pub plane: i32,
}

/// Drawing surface provided by the rendering subsystem
pub trait OverlayCanvas {
    fn mark_tile(&mut self, point: WorldPoint, label: &str);
    fn highlight_widget(&mut self, group_id: i32, child_id: i32);
}

/// Something drawn on a [`RecordingCanvas`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayMark {
    Tile { point: WorldPoint, label: String },
    Widget { group_id: i32, child_id: i32 },
}

/// Canvas that keeps what was drawn; used for JSON output and tests
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordingCanvas {
    pub marks: Vec<OverlayMark>,
}

impl OverlayCanvas for RecordingCanvas {
    fn mark_tile(&mut self, point: WorldPoint, label: &str) {
        self.marks.push(OverlayMark::Tile {
            point,
            label: label.to_string(),
        });
    }

    fn highlight_widget(&mut self, group_id: i32, child_id: i32) {
        self.marks.push(OverlayMark::Widget { group_id, child_id });
    }
}
