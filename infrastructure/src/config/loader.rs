//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["veil.toml", ".veil.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `VEIL_`-prefixed environment variables, `__` separating sections
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./veil.toml` or `./.veil.toml`
    /// 4. User config: `$XDG_CONFIG_HOME/veil-council/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, Self::project_config_path())
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(config_path: Option<&Path>, project_path: Option<PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = project_path {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("VEIL_").split("__"))
    }

    /// Get the user config file path
    ///
    /// Returns XDG_CONFIG_HOME/veil-council/config.toml if set, otherwise the
    /// platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("veil-council").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for debugging)
    pub fn describe_sources(config_path: Option<&Path>) -> Vec<String> {
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];
        lines.push("  [  env] VEIL_* environment variables".to_string());

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            lines.push(format!("  [{}] Explicit: {}", mark, path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push("  [     ] Project: ./veil.toml or ./.veil.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            lines.push(format!("  [{}] User:    {}", mark, path.display()));
        }

        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.participants.is_empty());
        assert_eq!(config.experiment.max_rounds, 10);
        assert_eq!(config.experiment.consensus, "exact");
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("veil-council"));
    }

    #[test]
    fn test_explicit_file_overrides_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("veil.toml");
        let explicit = dir.path().join("custom.toml");

        let mut f = std::fs::File::create(&project).unwrap();
        writeln!(f, "[experiment]\nmax_rounds = 3\nindividual_rounds = 1").unwrap();
        let mut f = std::fs::File::create(&explicit).unwrap();
        writeln!(
            f,
            "[experiment]\nmax_rounds = 7\n\n[[participants]]\nname = \"Ann\"\nmodel = \"m\""
        )
        .unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&explicit), Some(project))
            .extract()
            .unwrap();

        assert_eq!(config.experiment.max_rounds, 7);
        assert_eq!(config.experiment.individual_rounds, 1);
        assert_eq!(config.participants.len(), 1);
        assert_eq!(config.experiment.consensus, "exact");
    }

    #[test]
    fn test_missing_explicit_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let figment = ConfigLoader::figment(Some(&missing), None);
        let config: FileConfig = figment.extract().unwrap();
        assert_eq!(config.experiment.max_rounds, 10);
    }

    #[test]
    fn test_describe_sources_lists_defaults_last() {
        let lines = ConfigLoader::describe_sources(None);
        assert!(lines.first().unwrap().contains("priority order"));
        assert!(lines.last().unwrap().contains("Default"));
    }
}
