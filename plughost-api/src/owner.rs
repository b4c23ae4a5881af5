//! PluginOwner - the owner context a plugin receives at construction

use tokio::sync::mpsc::UnboundedSender;

/// Lifecycle notifications flowing from plugin instances to the manager.
///
/// `serial` identifies one particular load of a plugin, so notifications
/// about an instance that is already gone never affect a later instance
/// registered under the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The plugin asked to be torn down.
    DestroyRequested { id: String, serial: u64 },
    /// The instance has been dropped.
    Destroyed { id: String, serial: u64 },
}

impl LifecycleEvent {
    /// Plugin id the event refers to
    pub fn id(&self) -> &str {
        match self {
            Self::DestroyRequested { id, .. } | Self::Destroyed { id, .. } => id,
        }
    }

    /// Load serial the event refers to
    pub fn serial(&self) -> u64 {
        match self {
            Self::DestroyRequested { serial, .. } | Self::Destroyed { serial, .. } => *serial,
        }
    }
}

/// Plugin's handle back to the manager that owns it.
///
/// Passed to the factory and to [`Plugin::on_load`](crate::Plugin::on_load).
/// Plugins may keep a clone; it does not keep the manager or the instance
/// alive.
#[derive(Debug, Clone)]
pub struct PluginOwner {
    plugin_id: String,
    serial: u64,
    events: UnboundedSender<LifecycleEvent>,
}

impl PluginOwner {
    /// Create an owner context for one load of `plugin_id`
    pub fn new(
        plugin_id: impl Into<String>,
        serial: u64,
        events: UnboundedSender<LifecycleEvent>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            serial,
            events,
        }
    }

    /// Id the plugin is registered under
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Serial of this load
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Ask the manager to tear this instance down.
    ///
    /// The request is handled the next time the host pumps lifecycle events.
    /// Asking more than once, or after the instance was unloaded, is a no-op.
    pub fn request_destroy(&self) {
        let event = LifecycleEvent::DestroyRequested {
            id: self.plugin_id.clone(),
            serial: self.serial,
        };
        if self.events.send(event).is_err() {
            tracing::debug!(plugin = %self.plugin_id, "Manager gone, destroy request dropped");
        }
    }

    /// Log an info message
    pub fn log_info(&self, message: &str) {
        tracing::info!(plugin = %self.plugin_id, "{}", message);
    }

    /// Log a warning message
    pub fn log_warn(&self, message: &str) {
        tracing::warn!(plugin = %self.plugin_id, "{}", message);
    }

    /// Log a debug message
    pub fn log_debug(&self, message: &str) {
        tracing::debug!(plugin = %self.plugin_id, "{}", message);
    }
}
