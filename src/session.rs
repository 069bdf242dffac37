//! Session context and scoped document access.
//!
//! A [`Session`] owns the shared host handle together with the state the
//! operations need between calls: the working directory, the selected source
//! file and the [`Settings`]. Documents are borrowed through a
//! [`DocumentGuard`] that closes them when it goes out of scope.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::extract::extract_records;
use crate::grid::{FilterHistory, Projection};
use crate::host::HostApplication;

/// An open document that is closed on [`close`](Self::close) or on drop.
///
/// Dropping the guard closes without saving.
pub struct DocumentGuard<'a, A: HostApplication + ?Sized> {
    app: &'a A,
    path: PathBuf,
    doc: Option<A::Document>,
}

impl<'a, A: HostApplication + ?Sized> DocumentGuard<'a, A> {
    /// Open a document.
    pub fn open<P: AsRef<Path>>(app: &'a A, path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = app.open(&path).map_err(|e| Error::Open {
            path: path.clone(),
            reason: e.message,
        })?;
        Ok(Self {
            app,
            path,
            doc: Some(doc),
        })
    }

    /// Path the document was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the document, saving changes if requested.
    pub fn close(mut self, save: bool) -> Result<()> {
        match self.doc.take() {
            Some(doc) => {
                self.app.close(doc, save)?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<A: HostApplication + ?Sized> Deref for DocumentGuard<'_, A> {
    type Target = A::Document;

    fn deref(&self) -> &Self::Target {
        // Only `close` and `drop` take the document.
        match &self.doc {
            Some(doc) => doc,
            None => unreachable!("document guard used after close"),
        }
    }
}

impl<A: HostApplication + ?Sized> DerefMut for DocumentGuard<'_, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.doc {
            Some(doc) => doc,
            None => unreachable!("document guard used after close"),
        }
    }
}

impl<A: HostApplication + ?Sized> Drop for DocumentGuard<'_, A> {
    fn drop(&mut self) {
        if let Some(doc) = self.doc.take() {
            if let Err(e) = self.app.close(doc, false) {
                log::error!("Error closing {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Explicit context for a sequence of operations against one host.
pub struct Session<A: HostApplication> {
    app: Arc<A>,
    settings: Settings,
    current_dir: Option<PathBuf>,
    source_file: Option<PathBuf>,
}

impl<A: HostApplication> Session<A> {
    /// Create a session over a host with the given settings.
    pub fn new(app: Arc<A>, settings: Settings) -> Self {
        Self {
            app,
            settings,
            current_dir: None,
            source_file: None,
        }
    }

    /// The host.
    pub fn app(&self) -> &A {
        &self.app
    }

    /// A shared handle to the host, for worker threads.
    pub fn app_handle(&self) -> Arc<A> {
        Arc::clone(&self.app)
    }

    /// Session settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable session settings.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Directory that relative document names resolve against.
    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Change the working directory.
    pub fn set_current_dir(&mut self, dir: impl Into<PathBuf>) {
        self.current_dir = Some(dir.into());
    }

    /// The source file chosen for header copying.
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Select the source file for header copying.
    pub fn select_source(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        log::info!("Selected source file {}", path.display());
        self.source_file = Some(path);
    }

    /// Resolve a document name against the working directory.
    pub fn resolve<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        let name = name.as_ref();
        match &self.current_dir {
            Some(dir) if name.is_relative() => dir.join(name),
            _ => name.to_path_buf(),
        }
    }

    /// Open a document by name or path.
    pub fn open<P: AsRef<Path>>(&self, name: P) -> Result<DocumentGuard<'_, A>> {
        DocumentGuard::open(self.app.as_ref(), self.resolve(name))
    }

    /// An empty projection with the persisted filter history.
    pub fn projection(&self) -> Projection {
        Projection::with_history(FilterHistory::load(&self.settings.history_path))
    }

    /// Open a document, extract its records and load them into a projection.
    pub fn load_projection<P: AsRef<Path>>(&self, name: P) -> Result<Projection> {
        let guard = self.open(name)?;
        let records = extract_records(&*guard, &self.settings.extract)?;
        guard.close(false)?;

        let mut projection = self.projection();
        projection.load(&records);
        Ok(projection)
    }

    /// Persist a projection's filter history.
    pub fn save_history(&self, projection: &Projection) -> Result<()> {
        projection.history().save(&self.settings.history_path)
    }
}
