//! Renders the badges as swaybar/i3bar protocol blocks on a writer, usually stdout.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::badges::Engine;

const HEADER: &str = r#"{"version":1}"#;

/// One entry of a status line, in the i3bar protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub full_text: String,
    pub color: String,
    pub background: String,
    pub border: String,
}

/// `0xRRGGBBAA` as `#RRGGBBAA`.
pub fn hex_color(color: u32) -> String {
    format!("#{:08X}", color)
}

/// The blocks of every badge that is at least partly on screen, in slot order.
pub fn frame_blocks(engine: &Engine) -> Vec<Block> {
    (0..engine.badge_count())
        .filter(|index| engine.badge_x_offset(*index) < 1.0)
        .filter_map(|index| {
            let text = engine.badge_text(index)?;
            let colors = engine.badge_colors(index)?;
            Some(Block {
                full_text: text.to_string(),
                color: hex_color(colors.text),
                background: hex_color(colors.background),
                border: hex_color(colors.border),
            })
        })
        .collect()
}

#[derive(Debug)]
pub struct TextRenderer<W: Write> {
    out: W,
    started: bool,
    last_line: Option<String>,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        TextRenderer { out, started: false, last_line: None }
    }

    /// Write the current frame if it differs from the last one. Returns whether anything was
    /// written.
    pub fn render(&mut self, engine: &Engine) -> Result<bool> {
        if !self.started {
            writeln!(self.out, "{}\n[", HEADER).context("Failed to write the bar protocol header")?;
            self.started = true;
        }

        let line = serde_json::to_string(&frame_blocks(engine))?;
        if self.last_line.as_ref() == Some(&line) {
            return Ok(false);
        }
        writeln!(self.out, "{},", line).context("Failed to write status line")?;
        self.out.flush()?;
        self.last_line = Some(line);
        Ok(true)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
