//! The [`CalendarProvider`] trait and its collaborator seams.
//!
//! Providers create events and report a structured [`EventOutcome`]; they
//! never raise past the trait boundary. The browser and the notification
//! surface are collaborators owned by the host process, abstracted behind
//! the [`Browser`] and [`Notifier`] traits so the provider logic can be
//! exercised without a desktop session.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info, warn};

use calrelay_core::{EventOutcome, EventRequest};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the provider trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core abstraction for calendar backends.
///
/// Implementations must be `Send + Sync`; authentication state is managed
/// internally. `create_event` returns an outcome rather than a `Result`:
/// validation failures, provider errors, and auth-required conditions are
/// all encoded in the [`EventOutcome`].
pub trait CalendarProvider: Send + Sync {
    /// Returns the provider name (e.g. "google", "outlook").
    fn name(&self) -> &str;

    /// Attempts to create a calendar event.
    fn create_event(&self, event: EventRequest) -> BoxFuture<'_, EventOutcome>;
}

/// Opaque handle to a browser tab opened by a [`Browser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabHandle(pub u64);

/// A navigation event observed by the host.
///
/// `tab` identifies the originating tab when the host can track it; a
/// pasted redirect URL arrives with no tab attached.
#[derive(Debug, Clone)]
pub struct Navigation {
    /// The tab that navigated, if known.
    pub tab: Option<TabHandle>,
    /// The destination URL, including the query string.
    pub url: String,
}

impl Navigation {
    /// Creates a navigation event without an originating tab.
    pub fn untracked(url: impl Into<String>) -> Self {
        Self {
            tab: None,
            url: url.into(),
        }
    }
}

/// Opens and closes browser tabs.
///
/// `open` must not block on user action and must not fail loudly: a
/// browser that cannot be launched is logged and swallowed, since the
/// authorization URL can still be opened by hand.
pub trait Browser: Send + Sync {
    /// Opens the URL in a new tab, returning a handle when trackable.
    fn open(&self, url: &str) -> Option<TabHandle>;

    /// Closes a previously opened tab. Best effort.
    fn close(&self, tab: TabHandle);
}

/// Fires short user-visible notifications (title + message).
pub trait Notifier: Send + Sync {
    /// Shows a notification. Must not block or fail loudly.
    fn notify(&self, title: &str, message: &str);
}

/// [`Browser`] backed by the system default browser.
///
/// The system browser is a separate process; opened tabs cannot be
/// tracked or closed, so `open` always returns `None`.
#[derive(Debug, Default)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> Option<TabHandle> {
        match open::that(url) {
            Ok(()) => info!("opened authorization URL in system browser"),
            Err(e) => {
                warn!(error = %e, "failed to open browser");
                eprintln!("\nPlease open this URL in your browser:\n\n{url}\n");
            }
        }
        None
    }

    fn close(&self, _tab: TabHandle) {
        debug!("system browser tabs cannot be closed remotely");
    }
}

/// [`Notifier`] that only writes to the log.
///
/// Used where no desktop notification surface is available.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title = %title, message = %message, "notification");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording doubles shared by provider tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    /// Browser double that records opened URLs and closed tabs.
    #[derive(Debug, Default)]
    pub struct RecordingBrowser {
        next_tab: AtomicU64,
        pub opened: Mutex<Vec<String>>,
        pub closed: Mutex<Vec<TabHandle>>,
    }

    impl Browser for RecordingBrowser {
        fn open(&self, url: &str) -> Option<TabHandle> {
            self.opened.lock().unwrap().push(url.to_string());
            Some(TabHandle(self.next_tab.fetch_add(1, Ordering::SeqCst)))
        }

        fn close(&self, tab: TabHandle) {
            self.closed.lock().unwrap().push(tab);
        }
    }

    /// Notifier double that records (title, message) pairs.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub fired: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, message: &str) {
            self.fired
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }
}
