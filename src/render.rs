//! Line-oriented terminal renderer

use std::io::{self, Write};

use colored::Colorize;
use log::warn;

use crate::monitor::ViewSink;
use crate::reconciler::ViewOp;
use crate::status::{Color, PortStatus};

/// Marker shown next to cards that offer a close action
const CLOSE_MARKER: &str = "[close]";

/// Format one operation as a plain line
pub fn format_op(op: &ViewOp) -> String {
    render_line(op, false)
}

fn render_line(op: &ViewOp, paint: bool) -> String {
    match op {
        ViewOp::Create {
            name,
            port,
            status,
            has_close_control,
            ..
        } => card_line('+', name, *port, *status, *has_close_control, paint),
        ViewOp::Update {
            name,
            port,
            status,
            has_close_control,
        } => card_line('~', name, *port, *status, *has_close_control, paint),
        ViewOp::Remove { name } => format!("- {}", name),
    }
}

fn card_line(
    sigil: char,
    name: &str,
    port: u16,
    status: PortStatus,
    close: bool,
    paint: bool,
) -> String {
    let label = if paint {
        paint_status(status)
    } else {
        status.label().to_string()
    };

    let mut line = format!("{} {}: {}  {}", sigil, name, port, label);
    if close {
        line.push_str("  ");
        line.push_str(CLOSE_MARKER);
    }
    line
}

fn paint_status(status: PortStatus) -> String {
    let label = status.label();
    match status.color() {
        Color::Green => label.green().to_string(),
        Color::Red => label.red().to_string(),
        Color::Amber => label.yellow().to_string(),
        Color::Alarm => label.bright_red().bold().to_string(),
    }
}

/// Prints each view operation as one line
pub struct TextRenderer<W: Write> {
    out: W,
    color: bool,
}

impl TextRenderer<io::Stdout> {
    /// Colored renderer on stdout
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            color: true,
        }
    }
}

impl<W: Write> TextRenderer<W> {
    /// Plain renderer on any writer
    pub fn new(out: W) -> Self {
        Self { out, color: false }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_ops(&mut self, ops: &[ViewOp]) -> io::Result<()> {
        for op in ops {
            writeln!(self.out, "{}", render_line(op, self.color))?;
        }
        self.out.flush()
    }
}

impl<W: Write> ViewSink for TextRenderer<W> {
    fn apply(&mut self, ops: &[ViewOp]) {
        if let Err(e) = self.write_ops(ops) {
            warn!("failed to render view operations: {}", e);
        }
    }
}
