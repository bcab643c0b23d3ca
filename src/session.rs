//! Editing session state machine.
//!
//! All state lives in [`Session`] and changes only through
//! [`Session::update`]. The reducer never performs I/O; anything that needs
//! the outside world comes back as an [`Effect`] for the caller to run.
//!
//! ```text
//! Upload --ImageLoaded--> Editing --Submit--> Editing(Processing)
//!                            ^                    |        |
//!                            |<---InpaintFailed---+        |
//!                            |                    InpaintSucceeded
//!                            +------TryAgain------ Result <-+
//! ```
//!
//! `Reset` returns to `Upload` from anywhere and `OpenHistory` jumps
//! straight to `Result`.

use crate::encoded::EncodedImage;
use crate::geometry::{Corner, Point, Rect, SelectionTool, Size};
use crate::history::{History, HistoryEntry};

/// Message shown when a failure carries no text of its own.
pub const GENERIC_FAILURE: &str = "Failed to process image. Please try again.";

/// Processing status of the current editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A file is being read.
    Uploading,
    /// The inpainting request is outstanding.
    Processing,
    /// A result is available.
    Completed,
    /// The last operation failed.
    Error,
}

/// Which screen the presentation shell should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// No image loaded: upload prompt and history gallery.
    Upload,
    /// Image loaded, selecting a region.
    Editing,
    /// Original and processed images side by side.
    Result,
}

/// Everything that can happen to a session.
#[derive(Debug, Clone)]
pub enum Action {
    /// A file read began.
    UploadStarted,
    /// The file could not be read.
    UploadFailed(String),
    /// A file was decoded and is now the original image.
    ImageLoaded {
        /// Decoded image.
        image: EncodedImage,
        /// Displayed dimensions of the container showing it.
        container: Size,
    },
    /// The container was resized.
    Resize(Size),
    /// Pointer pressed inside the container.
    PointerDown(Point),
    /// Pointer moved inside the container.
    PointerMove(Point),
    /// Pointer released.
    PointerUp,
    /// Pointer left the container.
    PointerLeave,
    /// Quick corner selection.
    Preset(Corner),
    /// Commit an exact rectangle without a drag.
    Select(Rect),
    /// Send the current selection off for inpainting.
    Submit,
    /// The inpainting request produced an image.
    InpaintSucceeded {
        /// Generated image.
        image: EncodedImage,
        /// Id for the new history entry.
        id: String,
        /// Creation time in milliseconds since the Unix epoch.
        timestamp: i64,
    },
    /// The inpainting request failed.
    InpaintFailed(String),
    /// Discard the result and select again on the same image.
    TryAgain,
    /// Discard everything and go back to the upload screen.
    Reset,
    /// Show a stored history entry (0 = most recent).
    OpenHistory(usize),
}

/// Work the reducer asks its caller to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run the inpainting request.
    Inpaint {
        /// Original image.
        image: EncodedImage,
        /// Committed selection.
        selection: Rect,
        /// Container dimensions the selection was drawn in.
        container: Size,
    },
    /// Write the history to durable storage.
    PersistHistory,
}

/// State of one editing session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    original: Option<EncodedImage>,
    result: Option<EncodedImage>,
    tool: SelectionTool,
    container: Size,
    status: ProcessingStatus,
    error: Option<String>,
    history: History,
}

impl Session {
    /// Fresh session on the upload screen with the given history.
    #[must_use]
    pub fn new(history: History) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    /// Current screen.
    #[must_use]
    pub fn screen(&self) -> Screen {
        match (&self.original, &self.result) {
            (None, _) => Screen::Upload,
            (Some(_), Some(_)) => Screen::Result,
            (Some(_), None) => Screen::Editing,
        }
    }

    /// Original image, if loaded.
    #[must_use]
    pub fn original(&self) -> Option<&EncodedImage> {
        self.original.as_ref()
    }

    /// Processed image, if available.
    #[must_use]
    pub fn result(&self) -> Option<&EncodedImage> {
        self.result.as_ref()
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> Option<Rect> {
        self.tool.selection()
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.tool.is_dragging()
    }

    /// Displayed container size.
    #[must_use]
    pub fn container(&self) -> Size {
        self.container
    }

    /// Processing status.
    #[must_use]
    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    /// Last error message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// History of past results.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether the request is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.status == ProcessingStatus::Processing
    }

    /// Whether the "vanish" action is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.screen() == Screen::Editing && !self.is_busy() && self.tool.is_usable()
    }

    fn accepts_input(&self) -> bool {
        self.screen() == Screen::Editing && !self.is_busy()
    }

    /// Apply `action`, returning any side effect to run.
    pub fn update(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::UploadStarted | Action::UploadFailed(_) | Action::ImageLoaded { .. }
                if self.is_busy() =>
            {
                tracing::debug!("upload ignored while processing");
            }
            Action::UploadStarted => {
                self.status = ProcessingStatus::Uploading;
                self.error = None;
            }
            Action::UploadFailed(message) => {
                self.status = ProcessingStatus::Error;
                self.error = Some(failure_message(message));
            }
            Action::ImageLoaded { image, container } => {
                tracing::debug!(%container, media_type = image.media_type(), "image loaded");
                self.original = Some(image);
                self.result = None;
                self.tool.clear();
                self.container = container;
                self.status = ProcessingStatus::Idle;
                self.error = None;
            }
            Action::Resize(size) => self.container = size,
            Action::PointerDown(p) if self.accepts_input() => self.tool.pointer_down(p),
            Action::PointerMove(p) if self.accepts_input() => self.tool.pointer_move(p),
            Action::PointerUp if self.accepts_input() => self.tool.pointer_up(),
            Action::PointerLeave if self.accepts_input() => self.tool.pointer_leave(),
            Action::Preset(corner) if self.accepts_input() => {
                self.tool.apply_preset(corner, self.container);
            }
            Action::Select(rect) if self.accepts_input() => self.tool.set(rect),
            Action::PointerDown(_)
            | Action::PointerMove(_)
            | Action::PointerUp
            | Action::PointerLeave
            | Action::Preset(_)
            | Action::Select(_) => {}
            Action::Submit => return self.submit(),
            Action::InpaintSucceeded {
                image,
                id,
                timestamp,
            } => return self.complete(image, id, timestamp),
            Action::InpaintFailed(message) => {
                if self.is_busy() {
                    let message = failure_message(message);
                    tracing::debug!("processing failed: {message}");
                    self.status = ProcessingStatus::Error;
                    self.error = Some(message);
                }
            }
            Action::TryAgain => {
                if self.screen() == Screen::Result {
                    self.result = None;
                    self.tool.clear();
                    self.status = ProcessingStatus::Idle;
                    self.error = None;
                }
            }
            Action::Reset => {
                self.original = None;
                self.result = None;
                self.tool.clear();
                self.status = ProcessingStatus::Idle;
                self.error = None;
            }
            Action::OpenHistory(index) => {
                if self.is_busy() {
                    return None;
                }
                if let Some(entry) = self.history.get(index) {
                    self.original = Some(entry.original_image.clone());
                    self.result = Some(entry.processed_image.clone());
                    self.tool.clear();
                    self.status = ProcessingStatus::Completed;
                    self.error = None;
                }
            }
        }
        None
    }

    fn submit(&mut self) -> Option<Effect> {
        if !self.can_submit() {
            tracing::debug!("submit ignored: no usable selection");
            return None;
        }
        let image = self.original.clone()?;
        let selection = self.tool.selection()?;
        self.status = ProcessingStatus::Processing;
        self.error = None;
        Some(Effect::Inpaint {
            image,
            selection,
            container: self.container,
        })
    }

    fn complete(&mut self, image: EncodedImage, id: String, timestamp: i64) -> Option<Effect> {
        if !self.is_busy() {
            return None;
        }
        let original = self.original.clone()?;
        self.history.push(HistoryEntry {
            id,
            original_image: original,
            processed_image: image.clone(),
            timestamp,
        });
        self.result = Some(image);
        self.status = ProcessingStatus::Completed;
        self.error = None;
        Some(Effect::PersistHistory)
    }
}

fn failure_message(message: String) -> String {
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tag: u8) -> EncodedImage {
        EncodedImage::from_bytes("image/png", &[tag])
    }

    fn editing() -> Session {
        let mut session = Session::default();
        session.update(Action::ImageLoaded {
            image: image(1),
            container: Size::new(300.0, 300.0),
        });
        session
    }

    fn select(session: &mut Session, x: f64, y: f64, w: f64, h: f64) {
        session.update(Action::PointerDown(Point::new(x, y)));
        session.update(Action::PointerMove(Point::new(x + w, y + h)));
        session.update(Action::PointerUp);
    }

    fn succeed(session: &mut Session, tag: u8) -> Option<Effect> {
        session.update(Action::InpaintSucceeded {
            image: image(tag),
            id: format!("e{tag}"),
            timestamp: i64::from(tag),
        })
    }

    #[test]
    fn starts_on_upload_screen() {
        let session = Session::default();
        assert_eq!(session.screen(), Screen::Upload);
        assert_eq!(session.status(), ProcessingStatus::Idle);
        assert!(!session.can_submit());
    }

    #[test]
    fn upload_enters_editing_and_clears_result() {
        let mut session = editing();
        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        session.update(Action::Submit);
        succeed(&mut session, 2);
        assert_eq!(session.screen(), Screen::Result);

        session.update(Action::UploadStarted);
        assert_eq!(session.status(), ProcessingStatus::Uploading);
        session.update(Action::ImageLoaded {
            image: image(3),
            container: Size::new(100.0, 100.0),
        });
        assert_eq!(session.screen(), Screen::Editing);
        assert_eq!(session.result(), None);
        assert_eq!(session.selection(), None);
        assert_eq!(session.original(), Some(&image(3)));
    }

    #[test]
    fn failed_upload_reports_error_and_stays_put() {
        let mut session = Session::default();
        session.update(Action::UploadStarted);
        session.update(Action::UploadFailed("no such file".to_string()));
        assert_eq!(session.screen(), Screen::Upload);
        assert_eq!(session.status(), ProcessingStatus::Error);
        assert_eq!(session.error(), Some("no such file"));
    }

    #[test]
    fn submit_requires_usable_selection() {
        let mut session = editing();
        assert_eq!(session.update(Action::Submit), None);

        select(&mut session, 10.0, 10.0, 4.0, 80.0);
        assert!(!session.can_submit());
        assert_eq!(session.update(Action::Submit), None);
        assert_eq!(session.status(), ProcessingStatus::Idle);

        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        assert!(session.can_submit());
        let effect = session.update(Action::Submit);
        assert_eq!(
            effect,
            Some(Effect::Inpaint {
                image: image(1),
                selection: Rect::new(10.0, 10.0, 50.0, 50.0),
                container: Size::new(300.0, 300.0),
            })
        );
        assert_eq!(session.status(), ProcessingStatus::Processing);
        assert!(!session.can_submit());
    }

    #[test]
    fn input_is_ignored_while_processing() {
        let mut session = editing();
        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        session.update(Action::Submit);

        session.update(Action::PointerDown(Point::new(200.0, 200.0)));
        session.update(Action::Preset(Corner::BottomRight));
        session.update(Action::Select(Rect::new(0.0, 0.0, 90.0, 90.0)));
        assert_eq!(session.selection(), Some(Rect::new(10.0, 10.0, 50.0, 50.0)));
        assert_eq!(session.screen(), Screen::Editing);
        assert_eq!(session.update(Action::Submit), None);
    }

    #[test]
    fn upload_is_ignored_while_processing() {
        let mut session = editing();
        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        session.update(Action::Submit);

        session.update(Action::UploadStarted);
        session.update(Action::ImageLoaded {
            image: image(9),
            container: Size::new(100.0, 100.0),
        });
        session.update(Action::UploadFailed("late".to_string()));
        assert_eq!(session.status(), ProcessingStatus::Processing);
        assert_eq!(session.original(), Some(&image(1)));
        assert_eq!(session.error(), None);

        assert_eq!(succeed(&mut session, 2), Some(Effect::PersistHistory));
        assert_eq!(session.screen(), Screen::Result);
    }

    #[test]
    fn reset_while_processing_drops_the_late_reply() {
        let mut session = editing();
        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        session.update(Action::Submit);

        session.update(Action::Reset);
        assert_eq!(session.screen(), Screen::Upload);
        assert_eq!(session.status(), ProcessingStatus::Idle);
        assert_eq!(session.original(), None);
        assert_eq!(session.selection(), None);

        assert_eq!(succeed(&mut session, 2), None);
        assert!(session.history().is_empty());
        assert_eq!(session.screen(), Screen::Upload);
    }

    #[test]
    fn select_commits_exact_rectangle() {
        let mut session = editing();
        session.update(Action::Select(Rect::new(3.13, 0.0, 5.0, 5.0)));
        assert!(session.can_submit());
        assert!(!session.is_dragging());

        session.update(Action::Select(Rect::new(3.13, 0.0, 4.9, 5.0)));
        assert!(!session.can_submit());
    }

    #[test]
    fn success_records_history_and_shows_result() {
        let mut session = editing();
        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        session.update(Action::Submit);
        assert_eq!(succeed(&mut session, 2), Some(Effect::PersistHistory));

        assert_eq!(session.screen(), Screen::Result);
        assert_eq!(session.status(), ProcessingStatus::Completed);
        assert_eq!(session.result(), Some(&image(2)));
        assert_eq!(session.history().len(), 1);
        let entry = session.history().get(0).unwrap();
        assert_eq!(entry.original_image, image(1));
        assert_eq!(entry.processed_image, image(2));
        assert_eq!(entry.id, "e2");
    }

    #[test]
    fn stray_success_without_request_is_ignored() {
        let mut session = editing();
        assert_eq!(succeed(&mut session, 2), None);
        assert!(session.history().is_empty());
        assert_eq!(session.screen(), Screen::Editing);
    }

    #[test]
    fn failure_keeps_selection_and_allows_retry() {
        let mut session = editing();
        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        session.update(Action::Submit);
        session.update(Action::InpaintFailed("quota exceeded".to_string()));

        assert_eq!(session.screen(), Screen::Editing);
        assert_eq!(session.status(), ProcessingStatus::Error);
        assert_eq!(session.error(), Some("quota exceeded"));
        assert_eq!(session.selection(), Some(Rect::new(10.0, 10.0, 50.0, 50.0)));
        assert!(session.history().is_empty());
        assert!(session.can_submit());

        session.update(Action::Submit);
        assert_eq!(session.error(), None);
        assert_eq!(session.status(), ProcessingStatus::Processing);
    }

    #[test]
    fn empty_failure_message_gets_generic_text() {
        let mut session = editing();
        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        session.update(Action::Submit);
        session.update(Action::InpaintFailed(String::new()));
        assert_eq!(session.error(), Some(GENERIC_FAILURE));
    }

    #[test]
    fn try_again_keeps_original_and_drops_selection() {
        let mut session = editing();
        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        session.update(Action::Submit);
        succeed(&mut session, 2);

        session.update(Action::TryAgain);
        assert_eq!(session.screen(), Screen::Editing);
        assert_eq!(session.original(), Some(&image(1)));
        assert_eq!(session.selection(), None);
        assert_eq!(session.status(), ProcessingStatus::Idle);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn reset_returns_to_upload() {
        let mut session = editing();
        select(&mut session, 10.0, 10.0, 50.0, 50.0);
        session.update(Action::Reset);
        assert_eq!(session.screen(), Screen::Upload);
        assert_eq!(session.original(), None);
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn open_history_jumps_to_result() {
        let mut history = History::new();
        history.push(HistoryEntry {
            id: "old".to_string(),
            original_image: image(7),
            processed_image: image(8),
            timestamp: 1,
        });
        let mut session = Session::new(history);
        session.update(Action::OpenHistory(0));
        assert_eq!(session.screen(), Screen::Result);
        assert_eq!(session.original(), Some(&image(7)));
        assert_eq!(session.result(), Some(&image(8)));

        session.update(Action::TryAgain);
        assert_eq!(session.screen(), Screen::Editing);
        assert_eq!(session.original(), Some(&image(7)));

        session.update(Action::OpenHistory(3));
        assert_eq!(session.screen(), Screen::Editing);
    }

    #[test]
    fn presets_use_container_size() {
        let mut session = editing();
        session.update(Action::Preset(Corner::BottomRight));
        assert_eq!(session.selection(), Some(Rect::new(180.0, 180.0, 100.0, 100.0)));

        session.update(Action::Resize(Size::new(500.0, 400.0)));
        session.update(Action::Preset(Corner::TopRight));
        assert_eq!(session.selection(), Some(Rect::new(380.0, 20.0, 100.0, 100.0)));
    }

    #[test]
    fn six_successes_evict_the_oldest() {
        let mut session = editing();
        for tag in 1..=6 {
            select(&mut session, 10.0, 10.0, 50.0, 50.0);
            session.update(Action::Submit);
            succeed(&mut session, 10 + tag);
            session.update(Action::TryAgain);
        }
        let ids: Vec<&str> = session
            .history()
            .entries()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, ["e16", "e15", "e14", "e13", "e12"]);
    }

    #[test]
    fn pointer_input_ignored_outside_editing() {
        let mut session = Session::default();
        session.update(Action::PointerDown(Point::new(1.0, 1.0)));
        assert_eq!(session.selection(), None);
    }
}
