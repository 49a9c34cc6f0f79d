//! Dynamic linkage inspection.

use anyhow::{Context, Result};
use std::path::Path;

/// Seam for querying a binary's unresolved shared libraries.
pub trait LinkageInspector {
    /// Whether an inspection tool exists on this system at all.
    fn available(&self) -> bool;

    /// Sonames the dynamic linker cannot resolve for `binary`.
    fn missing_libraries(&self, binary: &Path) -> Result<Vec<String>>;
}

/// Inspector backed by `ldd`.
pub struct LddInspector;

impl LinkageInspector for LddInspector {
    fn available(&self) -> bool {
        which::which("ldd").is_ok()
    }

    fn missing_libraries(&self, binary: &Path) -> Result<Vec<String>> {
        // ldd exits nonzero for static binaries, so don't treat the
        // status as an error; an empty parse is the right answer there.
        let output = duct::cmd("ldd", [binary])
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .with_context(|| format!("running ldd on {}", binary.display()))?;

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(parse_missing(&text))
    }
}

/// Pull sonames out of `ldd` lines of the form
/// `\tlibfoo.so.1 => not found`.
fn parse_missing(ldd_output: &str) -> Vec<String> {
    let mut missing = Vec::new();
    for line in ldd_output.lines() {
        if !line.contains("not found") {
            continue;
        }
        if let Some(soname) = line.trim().split_whitespace().next()
            && !missing.iter().any(|m| m == soname)
        {
            missing.push(soname.to_string());
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_not_found_lines() {
        let output = "\tlinux-vdso.so.1 (0x00007ffd5b1f2000)\n\
                      \tlibfuse.so.2 => not found\n\
                      \tlibc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007f2a1c000000)\n\
                      \tlibxkbcommon.so.0 => not found\n";
        assert_eq!(parse_missing(output), vec!["libfuse.so.2", "libxkbcommon.so.0"]);
    }

    #[test]
    fn clean_linkage_yields_nothing() {
        let output = "\tlibc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007f2a1c000000)\n";
        assert!(parse_missing(output).is_empty());
    }

    #[test]
    fn duplicate_sonames_are_reported_once() {
        let output = "\tlibfuse.so.2 => not found\n\tlibfuse.so.2 => not found\n";
        assert_eq!(parse_missing(output), vec!["libfuse.so.2"]);
    }
}
