//! Process configuration
//!
//! Everything here is resolved once at start-up from the environment
//! (after `.env` files have been loaded) and then handed to the pieces
//! that need it. A missing credential is not an error at this point; it
//! only surfaces when the first generation is attempted.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-image-1";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Environment variables checked for the API credential, in order.
const API_KEY_VARS: [&str; 2] = ["OPENAI_API", "OPENAI_API_KEY"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub images_dir: PathBuf,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let api_key = API_KEY_VARS.iter().find_map(|name| non_empty_var(name));
        let model = non_empty_var("IMAGE_GEN_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = non_empty_var("IMAGE_GEN_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let images_dir = non_empty_var("IMAGE_GEN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_images_dir);
        let timeout = non_empty_var("IMAGE_GEN_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Self {
            api_key,
            model,
            api_base,
            images_dir,
            timeout,
        }
    }
}

/// Load `.env` files from the working directory and its parent.
/// Missing files are fine; real environment variables win.
pub fn load_env_files() {
    let _ = dotenvy::from_filename(".env");
    let _ = dotenvy::from_filename("../.env");
}

/// Where generated images live when `IMAGE_GEN_DIR` is not set:
/// - Linux: ~/.local/share/image-gen/images
/// - macOS: ~/Library/Application Support/image-gen/images
/// - Windows: %APPDATA%\image-gen\images
fn default_images_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push("image-gen");
            path.push("images");
            path
        }
        None => PathBuf::from("images"),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_images_dir_ends_with_app_folder() {
        let dir = default_images_dir();
        assert!(dir.ends_with("images"));
    }

    #[test]
    fn blank_variables_are_treated_as_missing() {
        std::env::set_var("IMAGE_GEN_TEST_BLANK", "   ");
        assert_eq!(non_empty_var("IMAGE_GEN_TEST_BLANK"), None);
        std::env::set_var("IMAGE_GEN_TEST_BLANK", "value");
        assert_eq!(non_empty_var("IMAGE_GEN_TEST_BLANK").as_deref(), Some("value"));
        std::env::remove_var("IMAGE_GEN_TEST_BLANK");
    }
}
