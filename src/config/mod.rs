mod schema;
mod validation;

pub use schema::{Config, FieldConfig, JudgeTypeConfig};
pub use validation::validate_config;

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/ropescore/)
pub fn get_config_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("ropescore")
}

/// Get the default config file path (~/.config/ropescore/judges.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("judges.yaml")
}

/// Ensure the directory holding `path` exists
pub fn ensure_config_dir(path: &Path) -> Result<()> {
    let Some(config_dir) = path.parent() else {
        return Ok(());
    };
    if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory at {}", config_dir.display()))?;
    }
    Ok(())
}

/// Load judge definitions from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/ropescore/judges.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run `ropescore init` to create one",
            config_path.display()
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Load the config file if present, otherwise fall back to the built-in judges
pub fn load_config_or_default(path: Option<PathBuf>) -> Result<Config> {
    let config_path = path.unwrap_or_else(get_config_path);
    if config_path.exists() {
        load_config(Some(config_path))
    } else {
        tracing::debug!(path = %config_path.display(), "no config file, using built-in judges");
        Ok(Config::default())
    }
}

/// Write the starter config to `path`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite",
            path.display()
        );
    }
    ensure_config_dir(path)?;

    let yaml = serde_saphyr::to_string(&Config::default())
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open config file for writing: {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to commit config file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("ropescore-config-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_config_path_is_yaml() {
        let path = get_config_path();
        assert!(path.ends_with("ropescore/judges.yaml"));
    }

    #[test]
    fn test_load_missing_config_fails() {
        let result = load_config(Some(temp_path("missing.yaml")));
        assert!(result.unwrap_err().to_string().contains("Config file not found"));
    }

    #[test]
    fn test_missing_config_falls_back_to_default() {
        let config = load_config_or_default(Some(temp_path("absent.yaml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_write_then_load_default_config() {
        let path = temp_path("written/judges.yaml");
        let _ = fs::remove_file(&path);

        write_default_config(&path, false).unwrap();
        assert_eq!(load_config(Some(path.clone())).unwrap(), Config::default());

        let again = write_default_config(&path, false);
        assert!(again.unwrap_err().to_string().contains("--force"));
        write_default_config(&path, true).unwrap();

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let path = temp_path("invalid.yaml");
        ensure_config_dir(&path).unwrap();
        fs::write(&path, "judges: [unclosed").unwrap();

        let err = load_config(Some(path.clone())).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));

        let _ = fs::remove_file(&path);
    }
}
