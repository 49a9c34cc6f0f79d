//! Soname to package name mapping.

use crate::privilege::NativeManager;

// =============================================================================
// Runtime libraries the Cursor AppImage needs on a bare system
// =============================================================================

static APT_TABLE: &[(&str, &str)] = &[
    ("libfuse.so.2", "libfuse2"),
    ("libxkbcommon.so.0", "libxkbcommon0"),
    ("libxkbcommon-x11.so.0", "libxkbcommon-x11-0"),
    ("libnss3.so", "libnss3"),
    ("libasound.so.2", "libasound2"),
    ("libgtk-3.so.0", "libgtk-3-0"),
    ("libX11-xcb.so.1", "libx11-xcb1"),
    ("libsecret-1.so.0", "libsecret-1-0"),
    ("libgbm.so.1", "libgbm1"),
    ("libdrm.so.2", "libdrm2"),
];

static PACMAN_TABLE: &[(&str, &str)] = &[
    ("libfuse.so.2", "fuse2"),
    ("libxkbcommon.so.0", "libxkbcommon"),
    ("libxkbcommon-x11.so.0", "libxkbcommon-x11"),
    ("libnss3.so", "nss"),
    ("libasound.so.2", "alsa-lib"),
    ("libgtk-3.so.0", "gtk3"),
    ("libX11-xcb.so.1", "libx11"),
    ("libsecret-1.so.0", "libsecret"),
    ("libgbm.so.1", "mesa"),
    ("libdrm.so.2", "libdrm"),
];

static DNF_TABLE: &[(&str, &str)] = &[
    ("libfuse.so.2", "fuse-libs"),
    ("libxkbcommon.so.0", "libxkbcommon"),
    ("libxkbcommon-x11.so.0", "libxkbcommon-x11"),
    ("libnss3.so", "nss"),
    ("libasound.so.2", "alsa-lib"),
    ("libgtk-3.so.0", "gtk3"),
    ("libX11-xcb.so.1", "libX11-xcb"),
    ("libsecret-1.so.0", "libsecret"),
    ("libgbm.so.1", "mesa-libgbm"),
    ("libdrm.so.2", "libdrm"),
];

/// Pure, static lookup from shared-library identifier to package name.
///
/// The table is injected into the resolver, so tests substitute their
/// own without touching the loop logic. Lookups have no side effects
/// and no state: the same soname always yields the same answer.
#[derive(Debug, Clone, Copy)]
pub struct PackageMapping {
    entries: &'static [(&'static str, &'static str)],
}

impl PackageMapping {
    pub const fn from_entries(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Table matching the system's native package manager. Falls back
    /// to the Debian names when the manager is unknown.
    pub fn for_manager(manager: Option<NativeManager>) -> Self {
        let entries = match manager {
            Some(NativeManager::Pacman) => PACMAN_TABLE,
            Some(NativeManager::Dnf) | Some(NativeManager::Zypper) => DNF_TABLE,
            Some(NativeManager::Apt) | None => APT_TABLE,
        };
        Self::from_entries(entries)
    }

    /// Suggest a package for an unresolved soname.
    ///
    /// Unknown identifiers and blank package entries both yield `None`.
    pub fn suggest(&self, soname: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(lib, _)| *lib == soname)
            .map(|(_, pkg)| *pkg)
            .filter(|pkg| !pkg.trim().is_empty())
    }
}
