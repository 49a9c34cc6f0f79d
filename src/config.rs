use crate::error::SetupError;
use std::path::{Path, PathBuf};
use sudo::RunningAs;

pub const APP_NAME: &str = "cursor";
pub const ARTIFACT_NAME: &str = "cursor.AppImage";

/// Immutable per-run configuration.
///
/// Built exactly once at startup and borrowed by every component. All
/// install paths are derived from it so there is a single source of
/// truth and no ambient mutable state.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// The unprivileged user the install belongs to.
    pub user: String,
    /// That user's home directory.
    pub home: PathBuf,
    /// Whether this process already runs with root rights.
    pub elevated: bool,
}

impl InstallConfig {
    /// Resolve the target user and home directory.
    ///
    /// Running elevated requires an unprivileged identity to install
    /// for: `$SUDO_USER` if set, otherwise a sole directory under
    /// /home. Running unelevated uses the current user. Failure to
    /// resolve either is fatal.
    pub fn resolve() -> Result<Self, SetupError> {
        match sudo::check() {
            RunningAs::Root | RunningAs::Suid => {
                let sudo_user = std::env::var("SUDO_USER").ok();
                let user = elevated_target_user(sudo_user.as_deref(), &list_home_users())
                    .ok_or(SetupError::UnresolvedUser)?;
                let home = PathBuf::from("/home").join(&user);
                if !home.is_dir() {
                    return Err(SetupError::UnresolvedHome(user));
                }
                Ok(Self {
                    user,
                    home,
                    elevated: true,
                })
            }
            RunningAs::User => {
                let user = current_username().ok_or(SetupError::UnresolvedUser)?;
                let home = dirs::home_dir().ok_or_else(|| SetupError::UnresolvedHome(user.clone()))?;
                Ok(Self {
                    user,
                    home,
                    elevated: false,
                })
            }
        }
    }

    /// Build a config for an explicit user and home.
    #[cfg(test)]
    pub fn for_user(user: impl Into<String>, home: impl Into<PathBuf>, elevated: bool) -> Self {
        Self {
            user: user.into(),
            home: home.into(),
            elevated,
        }
    }

    /// Application data directory: `~/.local/share/cursor`
    pub fn data_dir(&self) -> PathBuf {
        self.home.join(".local/share").join(APP_NAME)
    }

    /// The pinned artifact: `~/.local/share/cursor/cursor.AppImage`
    pub fn artifact_path(&self) -> PathBuf {
        self.data_dir().join(ARTIFACT_NAME)
    }

    /// Directory the AppImage is extracted into.
    pub fn extract_dir(&self) -> PathBuf {
        self.data_dir().join("opt")
    }

    /// Root of the extracted filesystem tree.
    pub fn squashfs_root(&self) -> PathBuf {
        self.extract_dir().join("squashfs-root")
    }

    /// The extracted application ELF.
    pub fn app_binary(&self) -> PathBuf {
        self.squashfs_root().join(APP_NAME)
    }

    /// Entry point script inside the extracted tree.
    pub fn apprun(&self) -> PathBuf {
        self.squashfs_root().join("AppRun")
    }

    /// The setuid sandbox helper inside the extracted tree.
    pub fn sandbox_helper(&self) -> PathBuf {
        self.squashfs_root().join("chrome-sandbox")
    }

    /// Launcher script: `~/.local/bin/cursor`
    pub fn launcher_path(&self) -> PathBuf {
        self.home.join(".local/bin").join(APP_NAME)
    }

    /// Application menu entry: `~/.local/share/applications/cursor.desktop`
    pub fn desktop_entry_path(&self) -> PathBuf {
        self.home
            .join(".local/share/applications")
            .join(format!("{APP_NAME}.desktop"))
    }

    /// Installed icon: `~/.local/share/icons/cursor.png`
    pub fn icon_path(&self) -> PathBuf {
        self.home
            .join(".local/share/icons")
            .join(format!("{APP_NAME}.png"))
    }

    /// Directories the duplicate scan covers. Deliberately not the
    /// whole home tree: these are the places browsers and prior runs
    /// drop AppImages and menu entries.
    pub fn scan_roots(&self) -> Vec<PathBuf> {
        vec![
            self.home.clone(),
            self.home.join("Downloads"),
            self.home.join("Desktop"),
            self.home.join(".local/share/applications"),
            self.data_dir(),
        ]
    }

    /// Executables the dependency resolver inspects.
    pub fn resolver_binaries(&self) -> Vec<PathBuf> {
        vec![self.app_binary(), self.artifact_path()]
    }

    /// Hand ownership of freshly written files to the target user.
    ///
    /// Only meaningful when running elevated; otherwise files already
    /// belong to the right user. Directories are chowned recursively,
    /// so an extracted tree ends up fully user-owned and the user can
    /// update or remove the install later. Best-effort per entry.
    pub fn restore_ownership(&self, path: &Path) {
        if !self.elevated {
            return;
        }
        let Ok(Some(user)) = nix::unistd::User::from_name(&self.user) else {
            return;
        };
        for entry in ownership_targets(path) {
            let _ = nix::unistd::chown(&entry, Some(user.uid), Some(user.gid));
        }
    }
}

/// Every path a recursive ownership fix must touch: the root itself
/// plus, for directories, everything below it.
fn ownership_targets(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .collect()
}

/// Pick the unprivileged identity for an elevated run: a usable
/// `$SUDO_USER` wins, otherwise a sole real directory under /home.
fn elevated_target_user(sudo_user: Option<&str>, home_users: &[String]) -> Option<String> {
    if let Some(user) = sudo_user
        && !user.is_empty()
        && user != "root"
    {
        return Some(user.to_string());
    }
    if home_users.len() == 1 {
        Some(home_users[0].clone())
    } else {
        None
    }
}

/// Resolve the current unprivileged username.
fn current_username() -> Option<String> {
    if let Ok(user) = std::env::var("USER")
        && !user.is_empty()
    {
        return Some(user);
    }
    nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|u| u.name)
}

/// Real user directories under /home.
fn list_home_users() -> Vec<String> {
    let home = Path::new("/home");
    if !home.exists() {
        return Vec::new();
    }

    let entries = match std::fs::read_dir(home) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut users = Vec::new();
    for entry in entries.flatten() {
        if let Ok(file_type) = entry.file_type()
            && file_type.is_dir()
            && let Ok(name) = entry.file_name().into_string()
            && name != "lost+found"
        {
            users.push(name);
        }
    }
    users
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InstallConfig {
        InstallConfig::for_user("alice", "/home/alice", false)
    }

    #[test]
    fn derived_paths_are_user_scoped() {
        let cfg = config();
        assert_eq!(
            cfg.artifact_path(),
            PathBuf::from("/home/alice/.local/share/cursor/cursor.AppImage")
        );
        assert_eq!(cfg.launcher_path(), PathBuf::from("/home/alice/.local/bin/cursor"));
        assert_eq!(
            cfg.desktop_entry_path(),
            PathBuf::from("/home/alice/.local/share/applications/cursor.desktop")
        );
        assert_eq!(cfg.app_binary(), PathBuf::from("/home/alice/.local/share/cursor/opt/squashfs-root/cursor"));
    }

    #[test]
    fn scan_roots_include_data_dir_and_downloads() {
        let cfg = config();
        let roots = cfg.scan_roots();
        assert!(roots.contains(&cfg.data_dir()));
        assert!(roots.contains(&PathBuf::from("/home/alice/Downloads")));
    }

    #[test]
    fn sudo_user_wins_when_usable() {
        let homes = vec!["bob".to_string()];
        assert_eq!(
            elevated_target_user(Some("alice"), &homes),
            Some("alice".to_string())
        );
    }

    #[test]
    fn empty_or_root_sudo_user_falls_back_to_sole_home_dir() {
        let homes = vec!["bob".to_string()];
        assert_eq!(elevated_target_user(Some(""), &homes), Some("bob".to_string()));
        assert_eq!(elevated_target_user(Some("root"), &homes), Some("bob".to_string()));
        assert_eq!(elevated_target_user(None, &homes), Some("bob".to_string()));
    }

    #[test]
    fn ambiguous_home_listing_resolves_nobody() {
        assert_eq!(elevated_target_user(None, &[]), None);
        let homes = vec!["alice".to_string(), "bob".to_string()];
        assert_eq!(elevated_target_user(Some("root"), &homes), None);
    }

    #[test]
    fn ownership_walk_covers_nested_entries() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tree/sub");
        std::fs::create_dir_all(&nested).unwrap();
        let file = nested.join("file.txt");
        std::fs::write(&file, b"x").unwrap();

        let targets = ownership_targets(&dir.path().join("tree"));
        assert!(targets.contains(&dir.path().join("tree")));
        assert!(targets.contains(&nested));
        assert!(targets.contains(&file));
    }

    #[test]
    fn ownership_restoration_keeps_the_tree_owned_by_the_target_user() {
        use std::os::unix::fs::MetadataExt;

        // chown to the file's current owner is permitted unprivileged,
        // so the recursive walk can be exercised against ourselves.
        let me = nix::unistd::User::from_uid(nix::unistd::getuid())
            .unwrap()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let cfg = InstallConfig::for_user(&me.name, dir.path(), true);

        let nested = dir.path().join("tree/sub");
        std::fs::create_dir_all(&nested).unwrap();
        let file = nested.join("file.txt");
        std::fs::write(&file, b"x").unwrap();

        cfg.restore_ownership(&dir.path().join("tree"));

        assert_eq!(std::fs::metadata(&file).unwrap().uid(), me.uid.as_raw());
        assert_eq!(std::fs::metadata(&nested).unwrap().uid(), me.uid.as_raw());
    }
}
