//! Desktop notifications.

use notify_rust::Notification;
use tracing::warn;

use calrelay_providers::Notifier;

/// [`Notifier`] backed by the desktop notification service.
#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        let result = Notification::new()
            .appname("calrelay")
            .summary(title)
            .body(message)
            .show();
        if let Err(e) = result {
            warn!(error = %e, title = %title, "failed to show desktop notification");
        }
    }
}
