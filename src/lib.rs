//! Remove watermarks and logos by asking Gemini to inpaint a selected region.
//!
//! The user draws a rectangle over the mark (or picks a corner preset). The
//! crate turns the rectangle into a coarse positional instruction such as
//! "top right", sends it with the image to a multimodal generation API, and
//! keeps the last five original/result pairs in a small on-disk history.
//! No pixels are touched locally.
//!
//! # Quick Start
//!
//! ```no_run
//! use mark_vanish::{remove_watermark, Config, EncodedImage, GeminiClient, Rect, Size};
//!
//! let config = Config::from_env();
//! let client = GeminiClient::new(&config).expect("failed to build client");
//! let image = EncodedImage::sniff(&std::fs::read("photo.png").unwrap()).unwrap();
//! let (w, h) = image.dimensions().unwrap();
//! let selection = Rect::new(f64::from(w) - 120.0, f64::from(h) - 120.0, 100.0, 100.0);
//! let cleaned = remove_watermark(&client, &image, &selection, Size::from((w, h))).unwrap();
//! mark_vanish::files::write_png(&cleaned, std::path::Path::new("cleaned.png")).unwrap();
//! ```
//!
//! # Interactive flow
//!
//! [`Session`] is a pure state machine driven by [`Action`]s; [`App`] runs it
//! against an [`Inpainter`], a [`Storage`] for history and [`ImageFiles`] for
//! uploads and downloads. All three are traits so the flow can be exercised
//! without a network or a filesystem.

#![deny(missing_docs)]

mod app;
pub mod config;
pub mod encoded;
pub mod error;
pub mod files;
pub mod geometry;
pub mod history;
pub mod inpaint;
pub mod region;
pub mod session;
pub mod shell;

pub use app::{App, Clock};
pub use config::Config;
pub use encoded::{is_supported_image, EncodedImage};
pub use error::{Error, Result};
pub use files::{download_file_name, ImageFiles, LocalFiles};
pub use geometry::{Corner, Point, Rect, SelectionTool, Size};
pub use history::{FileStorage, History, HistoryEntry, MemoryStorage, Storage};
pub use inpaint::{remove_watermark, GeminiClient, Inpainter};
pub use region::{instruction, Region};
pub use session::{Action, Effect, ProcessingStatus, Screen, Session};
