use crate::error::{AppError, Result};
use dotenvy::dotenv;
use image::Rgba;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MASK_WIDTH: u32 = 1024;
pub const DEFAULT_MASK_HEIGHT: u32 = 576;
pub const DEFAULT_PREVIEW_MAX_SIZE: u32 = 200;
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ACCENT_COLOR: &str = "#3B82F6";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub mask_width: u32,
    pub mask_height: u32,
    pub preview_max_size: u32,
    pub load_timeout: Duration,
    pub accent_color: Rgba<u8>,
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first.
    ///
    /// This is the only place the `.env` file is loaded.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup, falling back
    /// to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mask_width = var_or(&lookup, "STAGECANVAS_MASK_WIDTH", defaults.mask_width)?;
        let mask_height = var_or(&lookup, "STAGECANVAS_MASK_HEIGHT", defaults.mask_height)?;
        let preview_max_size =
            var_or(&lookup, "STAGECANVAS_PREVIEW_MAX_SIZE", defaults.preview_max_size)?;
        let timeout_ms = var_or(
            &lookup,
            "STAGECANVAS_LOAD_TIMEOUT_MS",
            defaults.load_timeout.as_millis() as u64,
        )?;

        let accent_color = match lookup("STAGECANVAS_ACCENT_COLOR") {
            Some(value) => parse_hex_color(&value)?,
            None => defaults.accent_color,
        };

        let config = Self {
            mask_width,
            mask_height,
            preview_max_size,
            load_timeout: Duration::from_millis(timeout_ms),
            accent_color,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects sizes no surface could be allocated for.
    pub fn validate(&self) -> Result<()> {
        if self.mask_width == 0 || self.mask_height == 0 {
            return Err(AppError::config("mask dimensions must be non-zero"));
        }
        if self.preview_max_size == 0 {
            return Err(AppError::config("preview max size must be non-zero"));
        }
        if self.load_timeout.is_zero() {
            return Err(AppError::config("load timeout must be non-zero"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mask_width: DEFAULT_MASK_WIDTH,
            mask_height: DEFAULT_MASK_HEIGHT,
            preview_max_size: DEFAULT_PREVIEW_MAX_SIZE,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            accent_color: Rgba([0x3B, 0x82, 0xF6, 0xFF]),
        }
    }
}

fn var_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{} has an invalid value: {:?}", key, raw))),
        None => Ok(default),
    }
}

/// Parses `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(AppError::config(format!("Invalid color: {:?}", value)));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| AppError::config(format!("Invalid color: {:?}", value)))
    };

    let alpha = if hex.len() == 8 { channel(6)? } else { 0xFF };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}
