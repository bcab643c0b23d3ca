//! Runs the session reducer against real (or stubbed) capabilities.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;
use crate::files::{download_file_name, ImageFiles};
use crate::geometry::Size;
use crate::history::{History, Storage};
use crate::inpaint::{self, Inpainter};
use crate::session::{Action, Effect, Session};

/// Milliseconds since the Unix epoch.
pub type Clock = Box<dyn Fn() -> i64>;

fn system_clock() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A session wired to its inpainter, storage and file access.
///
/// Everything runs on the caller's thread; [`App::dispatch`] returns only
/// after the request an action triggered has finished.
pub struct App<I, S, F> {
    session: Session,
    inpainter: I,
    storage: S,
    files: F,
    clock: Clock,
}

impl<I: Inpainter, S: Storage, F: ImageFiles> App<I, S, F> {
    /// Create an app, loading history from `storage` once.
    pub fn new(inpainter: I, storage: S, files: F) -> Self {
        let history = History::load(&storage);
        Self {
            session: Session::new(history),
            inpainter,
            storage,
            files,
            clock: Box::new(system_clock),
        }
    }

    /// Replace the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Current session state.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Storage backing the history.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Inpainting capability.
    #[must_use]
    pub fn inpainter(&self) -> &I {
        &self.inpainter
    }

    /// Apply `action` and run every effect it leads to.
    pub fn dispatch(&mut self, action: Action) {
        let mut next = self.session.update(action);
        while let Some(effect) = next.take() {
            next = self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect) -> Option<Effect> {
        match effect {
            Effect::Inpaint {
                image,
                selection,
                container,
            } => {
                let action =
                    match inpaint::remove_watermark(&self.inpainter, &image, &selection, container)
                    {
                        Ok(image) => Action::InpaintSucceeded {
                            image,
                            id: Uuid::new_v4().to_string(),
                            timestamp: (self.clock)(),
                        },
                        Err(e) => {
                            tracing::error!("inpainting failed: {e}");
                            Action::InpaintFailed(e.to_string())
                        }
                    };
                self.session.update(action)
            }
            Effect::PersistHistory => {
                if let Err(e) = self.session.history().save(&mut self.storage) {
                    tracing::warn!("failed to persist history: {e}");
                }
                None
            }
        }
    }

    /// Read `path` and make it the original image.
    ///
    /// The container size defaults to the image's pixel dimensions. Failures
    /// are recorded on the session as well as returned.
    ///
    /// # Errors
    ///
    /// Returns the read or decode error.
    pub fn upload(&mut self, path: &Path) -> Result<()> {
        self.dispatch(Action::UploadStarted);
        let loaded = self
            .files
            .read_image(path)
            .and_then(|image| image.dimensions().map(|dims| (image, Size::from(dims))));
        match loaded {
            Ok((image, container)) => {
                self.dispatch(Action::ImageLoaded { image, container });
                Ok(())
            }
            Err(e) => {
                self.dispatch(Action::UploadFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Save the current result, if any, under a timestamped name.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be written.
    pub fn download(&self) -> Result<Option<PathBuf>> {
        let Some(result) = self.session.result() else {
            return Ok(None);
        };
        let name = download_file_name((self.clock)());
        self.files.save_image(result, &name).map(Some)
    }
}
