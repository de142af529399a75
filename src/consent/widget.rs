use super::record::{ConsentCategory, ConsentRecord};
use tracing::debug;

/// Third-party consent script, when one is loaded on the page.
pub trait ConsentWidgetBridge: Send + Sync {
    fn accept_category(&self, category: ConsentCategory);
    fn reject_category(&self, category: ConsentCategory);
    /// Reopen the widget's own settings dialog.
    fn show_settings(&self);
}

/// Bring the widget's categories in line with `record`.
pub(crate) fn sync_widget(widget: &dyn ConsentWidgetBridge, record: &ConsentRecord) {
    for category in ConsentCategory::ALL {
        if record.allows(category) {
            widget.accept_category(category);
        } else {
            widget.reject_category(category);
        }
    }
    debug!(
        analytics = record.allows_analytics(),
        preferences = record.allows_preferences(),
        "Synced consent widget"
    );
}
