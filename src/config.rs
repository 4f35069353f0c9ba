use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_PUSHOVER_BASE_URL: &str = "https://api.pushover.net";

const CONFIG_DIR_NAME: &str = "personachat";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub config_is_explicit: bool,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub pushover_token: Option<String>,
    pub pushover_user: Option<String>,
    pub pushover_base_url: String,
    pub persona_name: Option<String>,
    pub biography_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    openai_api_key: Option<String>,
    openai_model: Option<String>,
    openai_base_url: Option<String>,
    pushover_token: Option<String>,
    pushover_user: Option<String>,
    pushover_base_url: Option<String>,
    persona_name: Option<String>,
    biography_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Load configuration, preferring OS environment variables over file
    /// values. An explicit path must exist; the discovered default path is
    /// optional.
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let (config_path, config_is_explicit) = match explicit_path {
            Some(path) => (path.to_path_buf(), true),
            None => (discover_config_path()?, false),
        };

        if config_is_explicit && !config_path.is_file() {
            bail!(
                "Failed to load config {}: file does not exist",
                config_path.display()
            );
        }

        let file_config = load_file_config(&config_path)?;

        dotenvy::dotenv().ok();

        let file = |get: fn(&RawFileConfig) -> Option<&String>| {
            file_config
                .as_ref()
                .and_then(get)
                .and_then(|value| non_empty(value).map(ToOwned::to_owned))
        };

        Ok(Self {
            openai_api_key: env_non_empty("OPENAI_API_KEY")
                .or_else(|| file(|cfg| cfg.openai_api_key.as_ref())),
            openai_model: env_non_empty("OPENAI_MODEL")
                .or_else(|| file(|cfg| cfg.openai_model.as_ref()))
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: env_non_empty("OPENAI_BASE_URL")
                .or_else(|| file(|cfg| cfg.openai_base_url.as_ref()))
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            pushover_token: env_non_empty("PUSHOVER_TOKEN")
                .or_else(|| file(|cfg| cfg.pushover_token.as_ref())),
            pushover_user: env_non_empty("PUSHOVER_USER")
                .or_else(|| file(|cfg| cfg.pushover_user.as_ref())),
            pushover_base_url: env_non_empty("PUSHOVER_BASE_URL")
                .or_else(|| file(|cfg| cfg.pushover_base_url.as_ref()))
                .unwrap_or_else(|| DEFAULT_PUSHOVER_BASE_URL.to_string()),
            persona_name: file(|cfg| cfg.persona_name.as_ref()),
            biography_file: file_config
                .as_ref()
                .and_then(|cfg| cfg.biography_file.clone()),
            config_path,
            config_is_explicit,
        })
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        anyhow!("Failed to resolve config path: HOME directory is unavailable")
    })?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
    use serial_test::serial;
    use std::env;
    use std::fs;
    use std::path::Path;

    fn reset_vars() {
        unsafe {
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_MODEL");
            env::remove_var("OPENAI_BASE_URL");
            env::remove_var("PUSHOVER_TOKEN");
            env::remove_var("PUSHOVER_USER");
            env::remove_var("PUSHOVER_BASE_URL");
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    fn with_cwd<T>(path: &Path, f: impl FnOnce() -> T) -> T {
        let cwd = env::current_dir().expect("current dir");
        env::set_current_dir(path).expect("set current dir");
        let result = f();
        env::set_current_dir(cwd).expect("restore current dir");
        result
    }

    #[test]
    #[serial]
    fn load_uses_defaults_when_unset() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        assert_eq!(cfg.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(cfg.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(cfg.openai_api_key, None);
        assert_eq!(cfg.pushover_token, None);
        assert_eq!(cfg.persona_name, None);
        assert!(!cfg.config_is_explicit);
    }

    #[test]
    #[serial]
    fn load_env_overrides_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_dir = tmp.path().join("personachat");
        fs::create_dir_all(&config_dir).expect("create config dir");
        fs::write(
            config_dir.join("config.toml"),
            r#"
openai_api_key = "file_key"
openai_model = "file_model"
openai_base_url = "https://example.com"
pushover_token = "file_token"
"#,
        )
        .expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("OPENAI_API_KEY", "os_key");
            env::set_var("OPENAI_MODEL", "os_model");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        assert_eq!(cfg.openai_api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.openai_model, "os_model");
        assert_eq!(cfg.openai_base_url, "https://example.com");
        assert_eq!(cfg.pushover_token.as_deref(), Some("file_token"));
    }

    #[test]
    #[serial]
    fn load_does_not_override_existing_os_env_with_dotenv() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(".env"),
            "OPENAI_API_KEY=file_key\nOPENAI_MODEL=file_model\n",
        )
        .expect("write env file");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("OPENAI_API_KEY", "os_key");
            env::set_var("OPENAI_MODEL", "os_model");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));

        assert_eq!(cfg.openai_api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.openai_model, "os_model");
    }

    #[test]
    #[serial]
    fn load_with_explicit_path_reads_that_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cfg_path = tmp.path().join("custom.toml");
        fs::write(
            &cfg_path,
            r#"
persona_name = "Ada Lovelace"
biography_file = "/tmp/bio.md"
"#,
        )
        .expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || {
            AppConfig::load_with_path(Some(&cfg_path)).expect("load config")
        });
        assert!(cfg.config_is_explicit);
        assert_eq!(cfg.persona_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            cfg.biography_file.as_deref(),
            Some(Path::new("/tmp/bio.md"))
        );
    }

    #[test]
    #[serial]
    fn load_with_missing_explicit_path_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let missing = tmp.path().join("nope.toml");
        let err = with_cwd(tmp.path(), || {
            AppConfig::load_with_path(Some(&missing)).expect_err("load should fail")
        });
        assert!(err.to_string().contains("file does not exist"));
    }

    #[test]
    #[serial]
    fn load_fails_when_xdg_config_home_is_empty() {
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "   ");
        }

        let err = AppConfig::load().expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("Failed to resolve config path: XDG_CONFIG_HOME is set but empty")
        );
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_root_key() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_dir = tmp.path().join("personachat");
        fs::create_dir_all(&config_dir).expect("create config dir");
        fs::write(config_dir.join("config.toml"), "unknown_key = 1").expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("load should fail"));
        assert!(err.to_string().contains("Failed to load config"));
        assert!(err.to_string().contains("unknown field"));
    }
}
