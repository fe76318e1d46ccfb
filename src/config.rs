//! Configuration: optional config file merged under CLI flags.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use site_downloader_core::SuffixSet;

use crate::cli::Args;

const CONFIG_DIR_NAME: &str = "site-downloader";
const CONFIG_FILE_NAME: &str = "config.toml";

/// `key = value` file configuration for CLI defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default folder to save files into.
    pub output_dir: Option<PathBuf>,
    /// Default formats, in the order they are tested.
    pub formats: Option<Vec<String>>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against the CLI's constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(formats) = &self.formats
            && formats.iter().all(|format| format.trim().is_empty())
        {
            bail!("Invalid config value for `formats`: at least one format is required");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Default tracing filter for this setting.
    #[must_use]
    pub fn log_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Everything `main` needs, after merging CLI flags over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: String,
    /// Empty when neither `-o` nor `output_dir` was given; rejected later by run validation.
    pub output_dir: PathBuf,
    pub suffixes: SuffixSet,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub log_level: &'static str,
    pub quiet: bool,
    pub json: bool,
}

impl Settings {
    /// Merges `args` over `file`: CLI first, then config, then built-in defaults.
    #[must_use]
    pub fn resolve(args: Args, file: Option<&FileConfig>) -> Self {
        let file_verbosity = file.and_then(|cfg| cfg.verbosity);
        let quiet = args.quiet || (args.verbose == 0 && file_verbosity == Some(VerbositySetting::Quiet));
        let log_level = if args.quiet {
            "error"
        } else {
            match args.verbose {
                0 => file_verbosity.map_or("info", VerbositySetting::log_level),
                1 => "debug",
                _ => "trace",
            }
        };

        let suffixes = if !args.formats.is_empty() {
            args.formats.iter().collect()
        } else if let Some(formats) = file.and_then(|cfg| cfg.formats.as_ref()) {
            formats.iter().collect()
        } else {
            SuffixSet::default_formats()
        };

        let output_dir = args
            .output_dir
            .or_else(|| file.and_then(|cfg| cfg.output_dir.clone()))
            .unwrap_or_default();

        let connect_timeout = args
            .connect_timeout
            .or_else(|| file.and_then(|cfg| cfg.connect_timeout_secs))
            .map(Duration::from_secs);
        let read_timeout = args
            .timeout
            .or_else(|| file.and_then(|cfg| cfg.read_timeout_secs))
            .map(Duration::from_secs);

        Self {
            url: args.url,
            output_dir,
            suffixes,
            connect_timeout,
            read_timeout,
            log_level,
            quiet,
            json: args.json,
        }
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/site-downloader/config.toml`
/// 2. `$HOME/.config/site-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }
    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config from the default path, if a file is there.
pub fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "output_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `output_dir` value on line {line_number}"))?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "formats" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `formats` value on line {line_number}"))?;
                cfg.formats = Some(
                    parsed
                        .split(',')
                        .map(str::trim)
                        .filter(|format| !format.is_empty())
                        .map(str::to_string)
                        .collect(),
                );
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_number}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_number}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_number}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    Ok(token.parse::<u64>()?)
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["site-downloader", "https://site.test/"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
# defaults for the music archive
output_dir = "/srv/music"
formats = ".mp3, flac"
connect_timeout_secs = 10
read_timeout_secs = 600
verbosity = "verbose"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/srv/music")));
        assert_eq!(
            cfg.formats,
            Some(vec![".mp3".to_string(), "flac".to_string()])
        );
        assert_eq!(cfg.connect_timeout_secs, Some(10));
        assert_eq!(cfg.read_timeout_secs, Some(600));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(r#"output_dir = "/tmp/#hash" # where files go"#)
            .expect("config with comments should parse");
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/tmp/#hash")));
    }

    #[test]
    fn test_parse_config_rejects_unknown_key() {
        let err = parse_config_str("concurrency = 4").expect_err("unknown key expected");
        assert!(err.to_string().contains("concurrency"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("\n\noutput_dir").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_timeout() {
        let err = parse_config_str("read_timeout_secs = 0").expect_err("range error expected");
        assert!(err.to_string().contains("read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_blank_formats() {
        let err = parse_config_str(r#"formats = " , ""#).expect_err("blank formats expected");
        assert!(err.to_string().contains("formats"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = parse_config_str("output_dir = /tmp").expect_err("quote error expected");
        assert!(err.to_string().contains("output_dir"));
    }

    #[test]
    fn test_config_path_prefers_xdg_then_home() {
        assert_eq!(
            config_path_from(Some("/xdg".into()), Some("/home/u".into())),
            Some(PathBuf::from("/xdg/site-downloader/config.toml"))
        );
        assert_eq!(
            config_path_from(None, Some("/home/u".into())),
            Some(PathBuf::from("/home/u/.config/site-downloader/config.toml"))
        );
        assert_eq!(config_path_from(None, None), None);
    }

    #[test]
    fn test_settings_defaults_without_config() {
        let settings = Settings::resolve(args(&[]), None);
        assert_eq!(settings.suffixes, SuffixSet::default_formats());
        assert_eq!(settings.output_dir, PathBuf::new());
        assert_eq!(settings.log_level, "info");
        assert!(settings.connect_timeout.is_none());
        assert!(settings.read_timeout.is_none());
        assert!(!settings.quiet);
    }

    #[test]
    fn test_settings_cli_overrides_config() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("/from/config")),
            formats: Some(vec!["flac".to_string()]),
            connect_timeout_secs: Some(5),
            read_timeout_secs: Some(50),
            verbosity: Some(VerbositySetting::Debug),
        };
        let settings = Settings::resolve(
            args(&["-o", "/from/cli", "-f", "PDF", "--timeout", "9", "-v"]),
            Some(&file),
        );
        assert_eq!(settings.output_dir, PathBuf::from("/from/cli"));
        assert_eq!(settings.suffixes.iter().collect::<Vec<_>>(), vec![".pdf"]);
        assert_eq!(settings.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(settings.read_timeout, Some(Duration::from_secs(9)));
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_settings_config_fills_gaps() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("/from/config")),
            formats: Some(vec!["flac".to_string(), ".ogg".to_string()]),
            verbosity: Some(VerbositySetting::Quiet),
            ..FileConfig::default()
        };
        let settings = Settings::resolve(args(&[]), Some(&file));
        assert_eq!(settings.output_dir, PathBuf::from("/from/config"));
        assert_eq!(
            settings.suffixes.iter().collect::<Vec<_>>(),
            vec![".flac", ".ogg"]
        );
        assert_eq!(settings.log_level, "error");
        assert!(settings.quiet);
    }

    #[test]
    fn test_settings_quiet_flag_wins_over_verbose() {
        let settings = Settings::resolve(args(&["-q", "-vv"]), None);
        assert_eq!(settings.log_level, "error");
        assert!(settings.quiet);
    }
}
