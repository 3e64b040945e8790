use anyhow::{Context, Result};
use cuvee_game::ProcessConfig;
use std::{fs, path::Path};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Load a JSON process tuning override, or the built-in tuning when no path
/// is given.
pub fn load_process_config(path: Option<&Path>) -> Result<ProcessConfig> {
    let Some(path) = path else {
        return Ok(ProcessConfig::default_config());
    };
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    ProcessConfig::from_json(&json)
        .with_context(|| format!("invalid process config in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(label: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "cuvee-util-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn config_override_round_trips_through_a_file() {
        let mut config = ProcessConfig::default_config();
        config.actions.wash_ms = 1;
        let path = temp_path("config");
        fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(load_process_config(Some(&path)).unwrap(), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_or_broken_config_is_an_error() {
        assert!(load_process_config(Some(Path::new("/nonexistent/cuvee.json"))).is_err());
        let path = temp_path("broken");
        fs::write(&path, "{ not json").unwrap();
        let err = load_process_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("invalid process config"));
        let _ = fs::remove_file(&path);
        assert_eq!(
            load_process_config(None).unwrap(),
            ProcessConfig::default_config()
        );
    }
}
