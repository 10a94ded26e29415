//! Output file naming and writing.
//!
//! Missing parts of the output path fall back to the configured directory,
//! base name and extension (`~`, `output`, `ngc` by default).

use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tangentcam_settings::OutputSettings;
use tracing::info;

/// Where a program is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// Target for a program. `explicit` is the path given on the command
    /// line, where `-` means standard output.
    pub fn resolve(settings: &OutputSettings, explicit: Option<&Path>, group: Option<&str>) -> Self {
        if explicit.is_some_and(|p| p.as_os_str() == "-") {
            return Self::Stdout;
        }
        Self::File(output_path(settings, explicit, group))
    }

    pub fn write(&self, gcode: &str) -> anyhow::Result<()> {
        match self {
            Self::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(gcode.as_bytes()).context("failed to write to stdout")?;
                stdout.flush()?;
            }
            Self::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                fs::write(path, gcode).with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), bytes = gcode.len(), "Wrote program");
            }
        }
        Ok(())
    }
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Group names become part of a file name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Full output path for a program.
pub fn output_path(settings: &OutputSettings, explicit: Option<&Path>, group: Option<&str>) -> PathBuf {
    let explicit_dir = explicit
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty());
    let directory = match (explicit_dir, &settings.directory) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(dir)) => dir.clone(),
        (None, None) => PathBuf::from("~"),
    };
    let directory = expand_home(&directory);

    let mut stem = explicit
        .and_then(Path::file_stem)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| settings.basename.clone());
    if let Some(name) = group.filter(|name| !name.is_empty()) {
        stem = format!("{stem}_{}", sanitize(name));
    }
    let extension = explicit
        .and_then(Path::extension)
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| settings.extension.trim_start_matches('.').to_string());

    let file_name = if settings.auto_suffix {
        let next = highest_suffix(&directory, &stem, &extension) + 1;
        format!("{stem}_{next:04}.{extension}")
    } else {
        format!("{stem}.{extension}")
    };
    directory.join(file_name)
}

/// Highest `NNNN` among existing `{stem}_NNNN.{extension}` files, 0 if none.
pub fn highest_suffix(directory: &Path, stem: &str, extension: &str) -> u32 {
    let Ok(entries) = fs::read_dir(directory) else {
        return 0;
    };
    let prefix = format!("{stem}_");
    let suffix = format!(".{extension}");
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let digits = name.strip_prefix(&prefix)?.strip_suffix(&suffix)?.to_string();
            if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
                digits.parse::<u32>().ok()
            } else {
                None
            }
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_fill_missing_parts() {
        let settings = OutputSettings {
            directory: Some(PathBuf::from("/tmp/jobs")),
            ..OutputSettings::default()
        };
        assert_eq!(output_path(&settings, None, None), PathBuf::from("/tmp/jobs/output.ngc"));
        assert_eq!(
            output_path(&settings, Some(Path::new("part")), None),
            PathBuf::from("/tmp/jobs/part.ngc")
        );
        assert_eq!(
            output_path(&settings, Some(Path::new("out/part.nc")), None),
            PathBuf::from("out/part.nc")
        );
    }

    #[test]
    fn test_home_directory_default() {
        let path = output_path(&OutputSettings::default(), None, None);
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("output.ngc"));
        }
    }

    #[test]
    fn test_group_names_are_sanitized() {
        let settings = OutputSettings {
            directory: Some(PathBuf::from("jobs")),
            ..OutputSettings::default()
        };
        assert_eq!(
            output_path(&settings, None, Some("Layer 1/top")),
            PathBuf::from("jobs/output_Layer_1_top.ngc")
        );
    }

    #[test]
    fn test_auto_suffix_counts_up() {
        let dir = TempDir::new().unwrap();
        let settings = OutputSettings {
            directory: Some(dir.path().to_path_buf()),
            auto_suffix: true,
            ..OutputSettings::default()
        };
        assert_eq!(output_path(&settings, None, None), dir.path().join("output_0001.ngc"));

        fs::write(dir.path().join("output_0001.ngc"), "").unwrap();
        fs::write(dir.path().join("output_0007.ngc"), "").unwrap();
        fs::write(dir.path().join("output_12.ngc"), "").unwrap();
        fs::write(dir.path().join("other_0009.ngc"), "").unwrap();
        assert_eq!(output_path(&settings, None, None), dir.path().join("output_0008.ngc"));
    }

    #[test]
    fn test_dash_is_stdout() {
        let target = OutputTarget::resolve(&OutputSettings::default(), Some(Path::new("-")), None);
        assert_eq!(target, OutputTarget::Stdout);
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("job.ngc");
        OutputTarget::File(path.clone()).write("G0 X0\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "G0 X0\n");
    }
}
