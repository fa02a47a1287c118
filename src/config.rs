//! Startup configuration.
//!
//! The original shipped as a link with query parameters; here the same
//! knobs arrive as command-line flags with environment-variable
//! fallbacks. Every value has a default, so `surprise-quest` with no
//! arguments is a complete invitation. Pack ids are not validated here:
//! an unknown pack falls back to the default at catalog-resolution time
//! instead of failing startup.

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_PACK: &str = "cute";
const DEFAULT_TO: &str = "you";
const DEFAULT_FROM: &str = "your secret admirer";
const DEFAULT_PACKS_DIR: &str = "packs";

pub const USAGE: &str = "\
surprise-quest [options]

  --to <name>      who the surprise is for
  --from <name>    who it is from
  --pack <id>      pack to play (cute, fun, emotional, full)
  --photo <ref>    photo reference shown on the final screen
  --packs <dir>    content directory (default: packs)
";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown option '{0}'")]
    UnknownFlag(String),
    #[error("option '{0}' needs a value")]
    MissingValue(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub to: String,
    pub from: String,
    pub pack: String,
    pub photo: Option<String>,
    pub packs_dir: PathBuf,
}

impl Config {
    /// Resolve from the process arguments and environment.
    pub fn resolve() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::parse(&args, |key| std::env::var(key).ok())
    }

    /// Flags beat environment variables beat defaults.
    pub fn parse(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut to = None;
        let mut from = None;
        let mut pack = None;
        let mut photo = None;
        let mut packs_dir = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let slot = match arg.as_str() {
                "--to" => &mut to,
                "--from" => &mut from,
                "--pack" => &mut pack,
                "--photo" => &mut photo,
                "--packs" => &mut packs_dir,
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            };
            let value = iter
                .next()
                .ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
            *slot = Some(value.clone());
        }

        Ok(Self {
            to: to
                .or_else(|| env("SURPRISE_TO"))
                .unwrap_or_else(|| DEFAULT_TO.to_string()),
            from: from
                .or_else(|| env("SURPRISE_FROM"))
                .unwrap_or_else(|| DEFAULT_FROM.to_string()),
            pack: pack
                .or_else(|| env("SURPRISE_PACK"))
                .unwrap_or_else(|| DEFAULT_PACK.to_string()),
            photo: photo.or_else(|| env("SURPRISE_PHOTO")),
            packs_dir: packs_dir
                .or_else(|| env("SURPRISE_PACKS_DIR"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PACKS_DIR)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_apply_with_no_input() {
        let config = Config::parse(&[], no_env).unwrap();
        assert_eq!(config.to, "you");
        assert_eq!(config.pack, DEFAULT_PACK);
        assert_eq!(config.photo, None);
        assert_eq!(config.packs_dir, PathBuf::from("packs"));
    }

    #[test]
    fn flags_override_everything() {
        let config = Config::parse(
            &args(&["--to", "Sam", "--pack", "full", "--photo", "us.png"]),
            |key| (key == "SURPRISE_TO").then(|| "Ignored".to_string()),
        )
        .unwrap();
        assert_eq!(config.to, "Sam");
        assert_eq!(config.pack, "full");
        assert_eq!(config.photo.as_deref(), Some("us.png"));
    }

    #[test]
    fn environment_fills_missing_flags() {
        let config = Config::parse(&[], |key| match key {
            "SURPRISE_FROM" => Some("Alex".to_string()),
            "SURPRISE_PACK" => Some("emotional".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.from, "Alex");
        assert_eq!(config.pack, "emotional");
    }

    #[test]
    fn bad_flags_are_reported() {
        assert_eq!(
            Config::parse(&args(&["--nope"]), no_env),
            Err(ConfigError::UnknownFlag("--nope".to_string()))
        );
        assert_eq!(
            Config::parse(&args(&["--to"]), no_env),
            Err(ConfigError::MissingValue("--to".to_string()))
        );
    }
}
