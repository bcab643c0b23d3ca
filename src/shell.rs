//! Line-oriented presentation shell.
//!
//! Renders the current screen as text and turns typed commands into
//! session actions. Pointer commands stand in for mouse gestures over the
//! displayed image.

use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::encoded::EncodedImage;
use crate::error::{Error, Result};
use crate::files::ImageFiles;
use crate::geometry::{Corner, Point, Rect, Size};
use crate::history::Storage;
use crate::inpaint::Inpainter;
use crate::session::{Action, ProcessingStatus, Screen, Session};
use crate::App;

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  upload <path>          load an image
  size <w> <h>           set the displayed container size
  down <x> <y>           press the pointer
  move <x> <y>           drag the pointer
  up | leave             release the pointer / leave the image
  select <x> <y> <w> <h> select an exact rectangle
  preset <tl|tr|bl|br>   select a 100x100 corner box
  vanish                 remove the selected mark
  download               save the result
  retry                  discard the result and select again
  reset | home           start over with a new image
  history                list recent edits
  open <n>               show recent edit number n
  help                   show this help
  quit                   leave";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Load an image file.
    Upload(PathBuf),
    /// Resize the container.
    Size(Size),
    /// Pointer press.
    Down(Point),
    /// Pointer drag.
    Move(Point),
    /// Pointer release.
    Up,
    /// Pointer left the container.
    Leave,
    /// Exact rectangle.
    Select(Rect),
    /// Corner preset.
    Preset(Corner),
    /// Submit for processing.
    Vanish,
    /// Save the result.
    Download,
    /// Back to editing.
    Retry,
    /// Back to upload.
    Reset,
    /// List history.
    History,
    /// Open a history entry (1-based).
    Open(usize),
    /// Print help.
    Help,
    /// Exit.
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCommand`] for unknown commands or bad arguments.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();
        let command = match (name.to_lowercase().as_str(), args.as_slice()) {
            ("upload", [_, ..]) => Command::Upload(PathBuf::from(args.join(" "))),
            ("size", [w, h]) => Command::Size(format!("{w}x{h}").parse()?),
            ("down", [x, y]) => Command::Down(point(x, y)?),
            ("move", [x, y]) => Command::Move(point(x, y)?),
            ("up", []) => Command::Up,
            ("leave", []) => Command::Leave,
            ("select", [x, y, w, h]) => {
                Command::Select(Rect::new(number(x)?, number(y)?, number(w)?, number(h)?))
            }
            ("preset", [corner]) => Command::Preset(corner.parse()?),
            ("vanish", []) => Command::Vanish,
            ("download", []) => Command::Download,
            ("retry", []) => Command::Retry,
            ("reset" | "home", []) => Command::Reset,
            ("history", []) => Command::History,
            ("open", [n]) => match n.parse::<usize>() {
                Ok(n) if n >= 1 => Command::Open(n),
                _ => return Err(Error::InvalidCommand(format!("bad history number {n:?}"))),
            },
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => return Err(Error::InvalidCommand(line.trim().to_string())),
        };
        Ok(Some(command))
    }
}

fn number(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidCommand(format!("not a number: {s:?}")))
}

fn point(x: &str, y: &str) -> Result<Point> {
    Ok(Point::new(number(x)?, number(y)?))
}

fn describe(image: &EncodedImage) -> String {
    let dims = image
        .dimensions()
        .map_or_else(|_| "unknown size".to_string(), |(w, h)| format!("{w}x{h}"));
    format!(
        "{} {dims}, ~{} KiB",
        image.media_type(),
        image.approx_byte_len() / 1024
    )
}

fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map_or_else(|| ms.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Render the recent-edits gallery.
#[must_use]
pub fn render_history(session: &Session) -> String {
    let mut out = String::new();
    if session.history().is_empty() {
        out.push_str("No recent edits.\n");
        return out;
    }
    out.push_str("Recent Edits\n");
    for (i, entry) in session.history().entries().iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {}  {}",
            i + 1,
            format_timestamp(entry.timestamp),
            describe(&entry.processed_image)
        );
    }
    out
}

/// Render the current screen.
#[must_use]
pub fn render(session: &Session) -> String {
    let mut out = String::new();
    match session.screen() {
        Screen::Upload => {
            out.push_str("== Make AI Watermarks Disappear ==\n");
            out.push_str("Upload an image to begin: upload <path>  (PNG, JPG, WEBP)\n");
            if let Some(error) = session.error() {
                let _ = writeln!(out, "Error: {error}");
            }
            if !session.history().is_empty() {
                out.push('\n');
                out.push_str(&render_history(session));
            }
        }
        Screen::Editing => {
            out.push_str("== Select the watermark ==\n");
            if let Some(original) = session.original() {
                let _ = writeln!(out, "Image:     {}", describe(original));
            }
            let _ = writeln!(out, "Container: {}", session.container());
            match session.selection() {
                Some(rect) if session.is_dragging() => {
                    let _ = writeln!(out, "Selection: {rect} (dragging)");
                }
                Some(rect) => {
                    let _ = writeln!(out, "Selection: {rect}");
                }
                None => out.push_str("Selection: none\n"),
            }
            if session.status() == ProcessingStatus::Processing {
                out.push_str("Gemini is healing the image...\n");
            }
            if let Some(error) = session.error() {
                let _ = writeln!(out, "Error: {error}");
            }
            let _ = writeln!(
                out,
                "[vanish] {}",
                if session.can_submit() {
                    "ready"
                } else {
                    "disabled (drag a selection at least 5px wide)"
                }
            );
            out.push_str("Presets: ");
            let labels: Vec<&str> = Corner::ALL.iter().map(|c| c.label()).collect();
            out.push_str(&labels.join(", "));
            out.push('\n');
        }
        Screen::Result => {
            out.push_str("== Result Ready ==\n");
            if let Some(original) = session.original() {
                let _ = writeln!(out, "Original:  {}", describe(original));
            }
            if let Some(result) = session.result() {
                let _ = writeln!(out, "Processed: {}", describe(result));
            }
            if let Some(error) = session.error() {
                let _ = writeln!(out, "Error: {error}");
            }
            out.push_str("download | retry | reset\n");
        }
    }
    out
}

/// Read commands from `input` until EOF or `quit`, printing the screen after each.
///
/// # Errors
///
/// Returns an error only if reading input or writing output fails; command
/// failures are printed and the loop continues.
pub fn run<I, S, F, R, W>(app: &mut App<I, S, F>, input: R, mut output: W) -> Result<()>
where
    I: Inpainter,
    S: Storage,
    F: ImageFiles,
    R: BufRead,
    W: Write,
{
    write!(output, "{}", render(app.session()))?;
    for line in input.lines() {
        let line = line?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(output, "{e}. Type `help` for commands.")?;
                continue;
            }
        };
        match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(output, "{HELP}")?;
                continue;
            }
            Command::History => {
                write!(output, "{}", render_history(app.session()))?;
                continue;
            }
            Command::Download => {
                match app.download() {
                    Ok(Some(path)) => writeln!(output, "Saved {}", path.display())?,
                    Ok(None) => writeln!(output, "Nothing to download yet.")?,
                    Err(e) => writeln!(output, "Download failed: {e}")?,
                }
                continue;
            }
            Command::Upload(path) => {
                // failure is shown on the rendered screen
                let _ = app.upload(&path);
            }
            Command::Select(rect) => app.dispatch(Action::Select(rect)),
            Command::Vanish => {
                if app.session().can_submit() {
                    writeln!(output, "Gemini is healing the image...")?;
                    output.flush()?;
                }
                app.dispatch(Action::Submit);
            }
            Command::Size(size) => app.dispatch(Action::Resize(size)),
            Command::Down(p) => app.dispatch(Action::PointerDown(p)),
            Command::Move(p) => app.dispatch(Action::PointerMove(p)),
            Command::Up => app.dispatch(Action::PointerUp),
            Command::Leave => app.dispatch(Action::PointerLeave),
            Command::Preset(corner) => app.dispatch(Action::Preset(corner)),
            Command::Retry => app.dispatch(Action::TryAgain),
            Command::Reset => app.dispatch(Action::Reset),
            Command::Open(n) => app.dispatch(Action::OpenHistory(n - 1)),
        }
        write!(output, "{}", render(app.session()))?;
    }
    Ok(())
}
