//! System conditions and broadcast priorities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of operationally meaningful system conditions.
///
/// Wire names map case-insensitively onto the variant names, so
/// `"maintenance_started"` and `"MAINTENANCE_STARTED"` both resolve to
/// [`SystemEventKind::MaintenanceStarted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemEventKind {
    /// The server asks clients to restart.
    RestartRequested,
    /// The server asks clients to shut down.
    ShutdownRequested,
    /// A client update is available.
    UpdateAvailable,
    /// A client update has started.
    UpdateStarted,
    /// A client update has finished.
    UpdateCompleted,
    /// Maintenance has been scheduled.
    MaintenanceScheduled,
    /// Maintenance has started.
    MaintenanceStarted,
    /// Maintenance has ended.
    MaintenanceEnded,
    /// Network trouble reported by the server.
    NetworkError,
    /// The server is reconnecting an upstream.
    Reconnecting,
    /// An upstream connection was restored.
    ConnectionRestored,
    /// Data synchronisation started.
    SyncStarted,
    /// Data synchronisation finished.
    SyncCompleted,
    /// Data synchronisation failed.
    SyncFailed,
    /// Stored data is corrupted.
    DataCorrupted,
    /// A backup started.
    BackupStarted,
    /// A backup finished.
    BackupCompleted,
    /// The user's session expired.
    SessionExpired,
    /// An unauthorized access was detected.
    UnauthorizedAccess,
    /// The user must log in again.
    LoginRequired,
    /// The user's password expires soon.
    PasswordExpiring,
    /// A resource was locked.
    ResourceLocked,
    /// A resource was unlocked.
    ResourceUnlocked,
    /// Conflicting edits on a resource.
    ResourceConflict,
    /// The server is low on memory.
    LowMemory,
    /// The server is under high CPU load.
    HighCpuUsage,
    /// The server is low on disk space.
    DiskSpaceLow,
}

impl SystemEventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 27] = [
        Self::RestartRequested,
        Self::ShutdownRequested,
        Self::UpdateAvailable,
        Self::UpdateStarted,
        Self::UpdateCompleted,
        Self::MaintenanceScheduled,
        Self::MaintenanceStarted,
        Self::MaintenanceEnded,
        Self::NetworkError,
        Self::Reconnecting,
        Self::ConnectionRestored,
        Self::SyncStarted,
        Self::SyncCompleted,
        Self::SyncFailed,
        Self::DataCorrupted,
        Self::BackupStarted,
        Self::BackupCompleted,
        Self::SessionExpired,
        Self::UnauthorizedAccess,
        Self::LoginRequired,
        Self::PasswordExpiring,
        Self::ResourceLocked,
        Self::ResourceUnlocked,
        Self::ResourceConflict,
        Self::LowMemory,
        Self::HighCpuUsage,
        Self::DiskSpaceLow,
    ];

    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RestartRequested => "RESTART_REQUESTED",
            Self::ShutdownRequested => "SHUTDOWN_REQUESTED",
            Self::UpdateAvailable => "UPDATE_AVAILABLE",
            Self::UpdateStarted => "UPDATE_STARTED",
            Self::UpdateCompleted => "UPDATE_COMPLETED",
            Self::MaintenanceScheduled => "MAINTENANCE_SCHEDULED",
            Self::MaintenanceStarted => "MAINTENANCE_STARTED",
            Self::MaintenanceEnded => "MAINTENANCE_ENDED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Reconnecting => "RECONNECTING",
            Self::ConnectionRestored => "CONNECTION_RESTORED",
            Self::SyncStarted => "SYNC_STARTED",
            Self::SyncCompleted => "SYNC_COMPLETED",
            Self::SyncFailed => "SYNC_FAILED",
            Self::DataCorrupted => "DATA_CORRUPTED",
            Self::BackupStarted => "BACKUP_STARTED",
            Self::BackupCompleted => "BACKUP_COMPLETED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
            Self::LoginRequired => "LOGIN_REQUIRED",
            Self::PasswordExpiring => "PASSWORD_EXPIRING",
            Self::ResourceLocked => "RESOURCE_LOCKED",
            Self::ResourceUnlocked => "RESOURCE_UNLOCKED",
            Self::ResourceConflict => "RESOURCE_CONFLICT",
            Self::LowMemory => "LOW_MEMORY",
            Self::HighCpuUsage => "HIGH_CPU_USAGE",
            Self::DiskSpaceLow => "DISK_SPACE_LOW",
        }
    }

    /// Resolves a wire string by case-insensitive exact match.
    ///
    /// Returns `None` for unknown names; callers log and drop those.
    ///
    /// ```
    /// use resolvinator_core::events::SystemEventKind;
    ///
    /// assert_eq!(
    ///     SystemEventKind::from_wire("disk_space_low"),
    ///     Some(SystemEventKind::DiskSpaceLow)
    /// );
    /// assert_eq!(SystemEventKind::from_wire("disk space low"), None);
    /// ```
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SystemEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a news broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPriority {
    /// Background information.
    Low,
    /// Regular broadcast.
    #[default]
    Normal,
    /// Needs the user's attention.
    High,
    /// Needs immediate attention.
    Critical,
}

impl EventPriority {
    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Resolves a wire string by case-insensitive exact match.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        [Self::Low, Self::Normal, Self::High, Self::Critical]
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for EventPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_is_case_insensitive() {
        assert_eq!(
            SystemEventKind::from_wire("MAINTENANCE_STARTED"),
            Some(SystemEventKind::MaintenanceStarted)
        );
        assert_eq!(
            SystemEventKind::from_wire("Session_Expired"),
            Some(SystemEventKind::SessionExpired)
        );
    }

    #[test]
    fn test_from_wire_requires_exact_name() {
        assert_eq!(SystemEventKind::from_wire("maintenance"), None);
        assert_eq!(SystemEventKind::from_wire(""), None);
        assert_eq!(SystemEventKind::from_wire("restart-requested"), None);
    }

    #[test]
    fn test_every_kind_resolves_from_its_name() {
        for kind in SystemEventKind::ALL {
            assert_eq!(SystemEventKind::from_wire(kind.as_str()), Some(kind));
            assert_eq!(
                SystemEventKind::from_wire(&kind.as_str().to_lowercase()),
                Some(kind)
            );
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&SystemEventKind::DiskSpaceLow).unwrap();
        assert_eq!(json, "\"DISK_SPACE_LOW\"");
    }

    #[test]
    fn test_priority_from_wire() {
        assert_eq!(EventPriority::from_wire("high"), Some(EventPriority::High));
        assert_eq!(EventPriority::from_wire("NORMAL"), Some(EventPriority::Normal));
        assert_eq!(EventPriority::from_wire("urgent"), None);
        assert!(EventPriority::Critical > EventPriority::Low);
    }
}
