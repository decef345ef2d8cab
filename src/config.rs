use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};

use crate::debugger::DebugLevel;

pub const DEBUG_ENV: &str = "ARGON_DEBUG";
pub const DEFAULT_HISTORY_FILE: &str = ".argon_history";
pub const DEFAULT_PAGE_CAPACITY: usize = crate::storage::table::DEFAULT_PAGE_CAPACITY;

/// Runtime settings of the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub debug_level: DebugLevel,
    /// `None` disables persistent line history.
    pub history_file: Option<PathBuf>,
    /// Slots per heap page for tables created in this session.
    pub page_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_level: DebugLevel::Off,
            history_file: Some(PathBuf::from(DEFAULT_HISTORY_FILE)),
            page_capacity: DEFAULT_PAGE_CAPACITY,
        }
    }
}

impl Config {
    /// Flags win over the environment, the environment over defaults.
    pub fn load(args: impl IntoIterator<Item = String>, env_debug: Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(level) = env_debug {
            config.debug_level = DebugLevel::parse(&level)
                .ok_or_else(|| anyhow!("invalid {} value '{}'", DEBUG_ENV, level))?;
        }

        for arg in args {
            if let Some(level) = arg.strip_prefix("--debug=") {
                config.debug_level =
                    DebugLevel::parse(level).ok_or_else(|| anyhow!("invalid debug level '{}'", level))?;
            } else if let Some(path) = arg.strip_prefix("--history=") {
                config.history_file = Some(PathBuf::from(path));
            } else if arg == "--no-history" {
                config.history_file = None;
            } else if let Some(n) = arg.strip_prefix("--page-capacity=") {
                config.page_capacity = match n.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => bail!("invalid page capacity '{}'", n),
                };
            } else {
                bail!("unknown argument '{}'", arg);
            }
        }

        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::load(std::env::args().skip(1), std::env::var(DEBUG_ENV).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let c = Config::load(Vec::new(), None).unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn flags_override_env() {
        let c = Config::load(args(&["--debug=trace"]), Some("warn".into())).unwrap();
        assert_eq!(c.debug_level, DebugLevel::Trace);

        let c = Config::load(Vec::new(), Some("2".into())).unwrap();
        assert_eq!(c.debug_level, DebugLevel::Warn);
    }

    #[test]
    fn history_and_capacity() {
        let c = Config::load(args(&["--no-history", "--page-capacity=8"]), None).unwrap();
        assert_eq!(c.history_file, None);
        assert_eq!(c.page_capacity, 8);

        let c = Config::load(args(&["--history=/tmp/h"]), None).unwrap();
        assert_eq!(c.history_file, Some(PathBuf::from("/tmp/h")));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Config::load(args(&["--verbose"]), None).is_err());
        assert!(Config::load(args(&["--debug=loud"]), None).is_err());
        assert!(Config::load(args(&["--page-capacity=0"]), None).is_err());
        assert!(Config::load(Vec::new(), Some("loud".into())).is_err());
    }
}
