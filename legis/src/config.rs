use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) if !val.trim().is_empty() => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        _ => None,
    }
}

/// Public demo credential accepted by OCR.space for low-volume use.
pub const DEMO_API_KEY: &str = "helloworld";

pub const DEFAULT_OCR_SPACE_ENDPOINT: &str = "https://api.ocr.space/parse/image";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ocr: OcrConfig,
    pub logging: LoggingConfig,
}

/// Which engines a call may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrDriver {
    /// Local engine first, remote API as fallback.
    #[default]
    Auto,
    /// Remote API only; the local engine is never invoked.
    Api,
}

impl OcrDriver {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrDriver::Auto => "auto",
            OcrDriver::Api => "api",
        }
    }
}

impl fmt::Display for OcrDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OcrDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(OcrDriver::Auto),
            "api" => Ok(OcrDriver::Api),
            other => Err(format!("unknown OCR driver '{other}' (expected 'auto' or 'api')")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub driver: OcrDriver,
    pub api_key: String,
    pub endpoint: String,
    pub engine_mode: String,
    pub timeout_secs: u64,
    pub tesseract_binary: String,
    pub languages: String,
    pub local_timeout_secs: u64,
    /// Directory for staged uploads and compressed derivatives; system temp dir when unset.
    pub work_dir: Option<PathBuf>,
    pub max_upload_bytes: u64,
}

impl OcrConfig {
    pub fn uses_demo_key(&self) -> bool {
        self.api_key == DEMO_API_KEY
    }

    /// API key safe for display: first four characters followed by a mask.
    pub fn masked_api_key(&self) -> String {
        if self.uses_demo_key() {
            return format!("{DEMO_API_KEY} (demo)");
        }
        let visible: String = self.api_key.chars().take(4).collect();
        format!("{visible}****")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrConfig {
                driver: parse_env_or("OCR_DRIVER", OcrDriver::Auto),
                api_key: env::var("OCR_SPACE_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .unwrap_or_else(|| DEMO_API_KEY.to_string()),
                endpoint: env::var("OCR_SPACE_ENDPOINT")
                    .unwrap_or_else(|_| DEFAULT_OCR_SPACE_ENDPOINT.to_string()),
                engine_mode: env::var("OCR_SPACE_ENGINE").unwrap_or_else(|_| "1".to_string()),
                timeout_secs: parse_env_or("OCR_SPACE_TIMEOUT", 30),
                tesseract_binary: env::var("TESSERACT_BINARY")
                    .unwrap_or_else(|_| "tesseract".to_string()),
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "eng".to_string()),
                local_timeout_secs: parse_env_or("OCR_LOCAL_TIMEOUT", 60),
                work_dir: parse_env_opt("OCR_TEMP_DIR"),
                max_upload_bytes: parse_env_or("OCR_MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            },
            logging: LoggingConfig {
                json: env::var("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const OCR_VARS: &[&str] = &[
        "OCR_DRIVER",
        "OCR_SPACE_KEY",
        "OCR_SPACE_ENDPOINT",
        "OCR_SPACE_ENGINE",
        "OCR_SPACE_TIMEOUT",
        "TESSERACT_BINARY",
        "OCR_LANGUAGES",
        "OCR_LOCAL_TIMEOUT",
        "OCR_TEMP_DIR",
        "OCR_MAX_UPLOAD_BYTES",
    ];

    fn clear_ocr_env() {
        for var in OCR_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_ocr_config_defaults() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_ocr_env();

        let config = Config::default();
        assert_eq!(config.ocr.driver, OcrDriver::Auto);
        assert_eq!(config.ocr.api_key, DEMO_API_KEY);
        assert!(config.ocr.uses_demo_key());
        assert_eq!(config.ocr.endpoint, DEFAULT_OCR_SPACE_ENDPOINT);
        assert_eq!(config.ocr.engine_mode, "1");
        assert_eq!(config.ocr.timeout_secs, 30);
        assert_eq!(config.ocr.tesseract_binary, "tesseract");
        assert_eq!(config.ocr.languages, "eng");
        assert!(config.ocr.work_dir.is_none());
        assert_eq!(config.ocr.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_ocr_driver_api_from_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_ocr_env();
        std::env::set_var("OCR_DRIVER", "API");

        let config = Config::default();
        assert_eq!(config.ocr.driver, OcrDriver::Api);

        std::env::remove_var("OCR_DRIVER");
    }

    #[test]
    fn test_invalid_driver_falls_back_to_auto() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_ocr_env();
        std::env::set_var("OCR_DRIVER", "cloud");

        let config = Config::default();
        assert_eq!(config.ocr.driver, OcrDriver::Auto);

        std::env::remove_var("OCR_DRIVER");
    }

    #[test]
    fn test_blank_api_key_uses_demo_key() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_ocr_env();
        std::env::set_var("OCR_SPACE_KEY", "   ");

        let config = Config::default();
        assert!(config.ocr.uses_demo_key());

        std::env::remove_var("OCR_SPACE_KEY");
    }

    #[test]
    fn test_masked_api_key() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_ocr_env();
        std::env::set_var("OCR_SPACE_KEY", "K81234567890");

        let config = Config::default();
        assert_eq!(config.ocr.masked_api_key(), "K812****");

        std::env::remove_var("OCR_SPACE_KEY");
    }

    #[test]
    fn test_parse_env_or_invalid_uses_default() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        std::env::set_var("__TEST_OCR_TIMEOUT", "soon");
        let result: u64 = parse_env_or("__TEST_OCR_TIMEOUT", 30);
        assert_eq!(result, 30);
        std::env::remove_var("__TEST_OCR_TIMEOUT");
    }

    #[test]
    fn test_driver_from_str() {
        assert_eq!("auto".parse::<OcrDriver>().unwrap(), OcrDriver::Auto);
        assert_eq!(" Api ".parse::<OcrDriver>().unwrap(), OcrDriver::Api);
        assert!("tesseract".parse::<OcrDriver>().is_err());
    }
}
