//! Remote artifact acquisition.

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

const DOWNLOAD_API_URL: &str =
    "https://www.cursor.com/api/download?platform=linux-x64&releaseTrack=stable";

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DownloadInfo {
    download_url: String,
    #[serde(default)]
    version: String,
}

/// A freshly downloaded artifact, parked in a temporary directory
/// until it gets pinned. Dropping it discards the download.
pub struct FetchedArtifact {
    pub path: PathBuf,
    pub version: String,
    _temp: tempfile::TempDir,
}

fn client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(format!("cursor-setup/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Ask the download API for the current stable build and download it.
pub fn fetch_latest() -> Result<FetchedArtifact> {
    let client = client()?;

    let response = client
        .get(DOWNLOAD_API_URL)
        .header("Accept", "application/json")
        .send()
        .context("Failed to query the download API")?;

    if !response.status().is_success() {
        return Err(anyhow!("download API returned status: {}", response.status()));
    }

    let info: DownloadInfo = response
        .json()
        .context("Failed to parse download API response")?;

    let temp = tempfile::tempdir().context("Failed to create temporary download directory")?;
    let path = temp.path().join("cursor.AppImage");

    let mut response = client
        .get(&info.download_url)
        .send()
        .context("Failed to download artifact")?;

    if !response.status().is_success() {
        return Err(anyhow!("artifact download failed with status: {}", response.status()));
    }

    let mut file = std::fs::File::create(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    response
        .copy_to(&mut file)
        .context("Failed to write downloaded artifact")?;

    Ok(FetchedArtifact {
        path,
        version: info.version,
        _temp: temp,
    })
}
