use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_MODEL;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or inconsistent.
#[derive(Debug, Clone)]
pub struct Config {
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_output_prefix: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub ai: AiConfig,
    pub ocr: OcrConfig,
    pub worker_count: usize,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Resolved switch: true only when a credential is available.
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub dpi: u32,
    pub lang: String,
    /// Pages with fewer non-whitespace characters are re-read by OCR.
    pub min_chars: usize,
    /// Pages whose non-alphanumeric share exceeds this are re-read by OCR.
    pub max_symbol_ratio: f64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            lang: "fra+eng".to_string(),
            min_chars: 50,
            max_symbol_ratio: 0.40,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let ai = resolve_ai(
            std::env::var("ENABLE_AI_EXTRACTION").ok().as_deref(),
            optional_env("ANTHROPIC_API_KEY"),
            optional_env("AI_MODEL"),
            parse_env("AI_MAX_RETRIES", 3u32)?,
        )?;

        let defaults = OcrConfig::default();
        let ocr = OcrConfig {
            dpi: parse_env("OCR_DPI", defaults.dpi)?,
            lang: optional_env("OCR_LANG").unwrap_or(defaults.lang),
            min_chars: parse_env("OCR_MIN_CHARS", defaults.min_chars)?,
            max_symbol_ratio: parse_env("OCR_MAX_SYMBOL_RATIO", defaults.max_symbol_ratio)?,
        };

        let config = Config {
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_output_prefix: optional_env("S3_OUTPUT_PREFIX")
                .unwrap_or_else(|| "extracted/".to_string()),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            ai,
            ocr,
            worker_count: parse_env("WORKER_COUNT", 4usize)?,
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            bail!("WORKER_COUNT must be at least 1");
        }
        if self.ai.max_retries == 0 {
            bail!("AI_MAX_RETRIES must be at least 1");
        }
        if self.ocr.dpi == 0 {
            bail!("OCR_DPI must be positive");
        }
        if !(0.0..=1.0).contains(&self.ocr.max_symbol_ratio) {
            bail!("OCR_MAX_SYMBOL_RATIO must be within [0, 1]");
        }
        Ok(())
    }
}

/// `ENABLE_AI_EXTRACTION` is tri-state: explicit `true` demands a credential,
/// explicit `false` disables the model, unset follows credential presence.
fn resolve_ai(
    toggle: Option<&str>,
    api_key: Option<String>,
    model: Option<String>,
    max_retries: u32,
) -> Result<AiConfig> {
    let requested = match toggle.map(|v| v.trim().to_lowercase()) {
        None => None,
        Some(v) if v.is_empty() => None,
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => Some(true),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => Some(false),
        Some(v) => bail!("ENABLE_AI_EXTRACTION must be true or false, got '{v}'"),
    };

    let enabled = match requested {
        Some(true) if api_key.is_none() => {
            bail!("ENABLE_AI_EXTRACTION=true requires ANTHROPIC_API_KEY to be set")
        }
        Some(flag) => flag,
        None => api_key.is_some(),
    };

    Ok(AiConfig {
        enabled,
        api_key,
        model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        max_retries,
    })
}

#[cfg(test)]
impl Config {
    /// Local MinIO defaults with the model disabled.
    pub fn for_tests() -> Self {
        Config {
            s3_bucket: "cvs".into(),
            s3_endpoint: "http://localhost:9000".into(),
            s3_output_prefix: "extracted/".into(),
            aws_access_key_id: "minio".into(),
            aws_secret_access_key: "minio123".into(),
            ai: AiConfig {
                enabled: false,
                api_key: None,
                model: DEFAULT_MODEL.to_string(),
                max_retries: 3,
            },
            ocr: OcrConfig::default(),
            worker_count: 4,
            port: 8080,
            rust_log: "info".into(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
