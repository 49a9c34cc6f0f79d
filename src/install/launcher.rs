//! Launcher script, menu entry and icon registration.

use crate::config::InstallConfig;
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

/// Desktop entry structure
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    pub name: String,
    pub comment: String,
    pub exec: String,
    pub icon: String,
    pub wm_class: String,
    pub categories: Vec<String>,
    pub mime_types: Vec<String>,
}

impl DesktopEntry {
    fn for_install(config: &InstallConfig) -> Self {
        Self {
            name: "Cursor".to_string(),
            comment: "AI-first code editor".to_string(),
            exec: format!("{} %F", config.launcher_path().display()),
            icon: config.icon_path().display().to_string(),
            wm_class: "Cursor".to_string(),
            categories: vec!["Development".to_string(), "IDE".to_string()],
            mime_types: vec![
                "text/plain".to_string(),
                "inode/directory".to_string(),
            ],
        }
    }

    fn to_desktop_file_content(&self) -> String {
        let mut content = String::new();
        content.push_str("[Desktop Entry]\n");
        content.push_str("Type=Application\n");
        content.push_str(&format!("Name={}\n", self.name));
        content.push_str(&format!("Comment={}\n", self.comment));
        content.push_str(&format!("Exec={}\n", self.exec));
        content.push_str(&format!("Icon={}\n", self.icon));
        content.push_str("Terminal=false\n");
        content.push_str(&format!("StartupWMClass={}\n", self.wm_class));
        content.push_str(&format!("Categories={};\n", self.categories.join(";")));
        content.push_str(&format!("MimeType={};\n", self.mime_types.join(";")));
        content
    }
}

/// Write the launcher script onto the user's executable search path.
pub fn register_launcher(config: &InstallConfig) -> Result<PathBuf> {
    let launcher = config.launcher_path();
    let parent = launcher.parent().context("launcher path has no parent")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;

    let script = format!(
        "#!/bin/sh\nexec \"{}\" \"$@\"\n",
        config.apprun().display()
    );
    fs::write(&launcher, script)
        .with_context(|| format!("writing launcher at {}", launcher.display()))?;
    fs::set_permissions(&launcher, fs::Permissions::from_mode(0o755))
        .context("marking launcher executable")?;
    // The bin directory itself may have just been created root-owned.
    config.restore_ownership(parent);

    Ok(launcher)
}

/// Write the application-menu entry.
pub fn register_menu_entry(config: &InstallConfig) -> Result<PathBuf> {
    let entry_path = config.desktop_entry_path();
    let parent = entry_path.parent().context("desktop entry path has no parent")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;

    let entry = DesktopEntry::for_install(config);
    fs::write(&entry_path, entry.to_desktop_file_content())
        .with_context(|| format!("writing desktop entry at {}", entry_path.display()))?;
    config.restore_ownership(parent);

    Ok(entry_path)
}

/// Copy the product icon out of the extracted tree.
///
/// AppImages ship their icon at the squashfs root; Cursor also keeps
/// a copy under `usr/share/icons`. The first png named after the app
/// wins. A missing icon is an error the caller downgrades to a
/// warning.
pub fn install_icon(config: &InstallConfig) -> Result<PathBuf> {
    let source = find_icon(config).ok_or_else(|| anyhow!("no icon found in extracted tree"))?;

    let icon_path = config.icon_path();
    let parent = icon_path.parent().context("icon path has no parent")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;
    fs::copy(&source, &icon_path)
        .with_context(|| format!("copying icon from {}", source.display()))?;
    config.restore_ownership(parent);

    Ok(icon_path)
}

fn find_icon(config: &InstallConfig) -> Option<PathBuf> {
    let direct = config.squashfs_root().join("cursor.png");
    if direct.is_file() {
        return Some(direct);
    }
    walkdir::WalkDir::new(config.squashfs_root())
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| {
            e.file_type().is_file()
                && e.file_name()
                    .to_string_lossy()
                    .eq_ignore_ascii_case("cursor.png")
        })
        .map(|e| e.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> InstallConfig {
        InstallConfig::for_user("alice", dir, false)
    }

    #[test]
    fn desktop_entry_carries_required_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let content = DesktopEntry::for_install(&config).to_desktop_file_content();

        assert!(content.starts_with("[Desktop Entry]\n"));
        assert!(content.contains("Name=Cursor\n"));
        assert!(content.contains("Comment=AI-first code editor\n"));
        assert!(content.contains(&format!("Exec={} %F\n", config.launcher_path().display())));
        assert!(content.contains(&format!("Icon={}\n", config.icon_path().display())));
        assert!(content.contains("StartupWMClass=Cursor\n"));
        assert!(content.contains("MimeType=text/plain;inode/directory;\n"));
    }

    #[test]
    fn launcher_script_execs_the_extracted_apprun() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let launcher = register_launcher(&config).unwrap();

        let script = fs::read_to_string(&launcher).unwrap();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains(&config.apprun().display().to_string()));
        let mode = fs::metadata(&launcher).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn menu_entry_lands_at_the_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let path = register_menu_entry(&config).unwrap();

        assert_eq!(path, config.desktop_entry_path());
        assert!(path.is_file());
    }

    #[test]
    fn missing_icon_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(config.squashfs_root()).unwrap();

        assert!(install_icon(&config).is_err());
    }

    #[test]
    fn icon_is_copied_from_the_extracted_tree() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let nested = config.squashfs_root().join("usr/share/icons");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("cursor.png"), b"png-bytes").unwrap();

        let icon = install_icon(&config).unwrap();

        assert_eq!(icon, config.icon_path());
        assert_eq!(fs::read(&icon).unwrap(), b"png-bytes");
    }
}
