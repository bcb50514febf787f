use std::path::PathBuf;

use clap::Parser;

use crate::host::document::DOCUMENTS_FILE;
use crate::store::file::STORE_FILE;

/// Translation memory core speaking JSON lines on stdin/stdout
#[derive(Parser, Debug, Clone)]
#[command(name = "localize-core", version)]
pub struct Args {
    /// Directory holding the store and document files
    #[arg(long, env = "LOCALIZE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Log filter, e.g. `info` or `localize_core=debug`
    #[arg(long, env = "LOCALIZE_LOG", default_value = "info")]
    pub log: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Keep all state in memory; nothing is read or written
    #[arg(long)]
    pub in_memory: bool,
}

impl Args {
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(default_state_dir)
    }

    pub fn store_path(&self) -> PathBuf {
        self.state_dir().join(STORE_FILE)
    }

    pub fn documents_path(&self) -> PathBuf {
        self.state_dir().join(DOCUMENTS_FILE)
    }
}

fn default_state_dir() -> PathBuf {
    if let Ok(local) = std::env::var("LOCALAPPDATA") {
        return PathBuf::from(local).join("Localize");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".localize")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_state_dir_places_both_files() {
        let args = Args::try_parse_from(["localize-core", "--state-dir", "/tmp/l10n"]).unwrap();
        assert_eq!(args.store_path(), PathBuf::from("/tmp/l10n").join(STORE_FILE));
        assert_eq!(args.documents_path(), PathBuf::from("/tmp/l10n").join(DOCUMENTS_FILE));
        assert!(!args.in_memory);
    }

    #[test]
    fn flags_parse() {
        let args = Args::try_parse_from([
            "localize-core",
            "--log",
            "debug",
            "--log-json",
            "--in-memory",
        ])
        .unwrap();
        assert_eq!(args.log, "debug");
        assert!(args.log_json);
        assert!(args.in_memory);
    }
}
