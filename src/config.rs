//! Command line arguments, the optional `config.toml`, and resolved paths

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

pub const DEFAULT_SOCKET: &str = "/tmp/shellbeats_mpv.sock";
pub const DEFAULT_PLAYER: &str = "mpv";
pub const DEFAULT_SEARCH_TOOL: &str = "yt-dlp";
pub const DEFAULT_MAX_RESULTS: usize = 50;

const CONFIG_DIR_NAME: &str = ".shellbeats";
const CONFIG_FILE: &str = "config.toml";
const INDEX_FILE: &str = "playlists.json";
const PLAYLISTS_DIR: &str = "playlists";
const LOGS_DIR: &str = "logs";
const EMPTY_INDEX: &str = "{\"playlists\":[]}\n";

/// shellbeats - search, play and collect YouTube audio from the terminal
#[derive(Parser, Debug, Default)]
#[command(name = "shellbeats", version, about)]
pub struct Args {
    /// Configuration directory (default: ~/.shellbeats)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Control socket for the player (default: /tmp/shellbeats_mpv.sock)
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Player executable (default: mpv)
    #[arg(long)]
    pub player: Option<String>,

    /// Search executable (default: yt-dlp)
    #[arg(long)]
    pub search_tool: Option<String>,

    /// Maximum number of search results (default: 50)
    #[arg(long)]
    pub max_results: Option<usize>,
}

/// Keys accepted in `config.toml`; all optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub socket: Option<PathBuf>,
    pub player: Option<String>,
    pub search_tool: Option<String>,
    pub max_results: Option<usize>,
}

impl FileConfig {
    /// Reads `config.toml`. A missing or malformed file gives the defaults.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        toml::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed config file");
            Self::default()
        })
    }
}

/// Resolved settings, CLI over file over defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub socket: PathBuf,
    pub player: String,
    pub search_tool: String,
    pub max_results: usize,
}

impl Settings {
    pub fn resolve(mut args: Args) -> Self {
        let config_dir = args.config_dir.take().unwrap_or_else(default_config_dir);
        let file = FileConfig::load(&config_dir.join(CONFIG_FILE));
        Self::merge(config_dir, args, file)
    }

    fn merge(config_dir: PathBuf, args: Args, file: FileConfig) -> Self {
        Self {
            config_dir,
            socket: args
                .socket
                .or(file.socket)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET)),
            player: args
                .player
                .or(file.player)
                .unwrap_or_else(|| DEFAULT_PLAYER.to_string()),
            search_tool: args
                .search_tool
                .or(file.search_tool)
                .unwrap_or_else(|| DEFAULT_SEARCH_TOOL.to_string()),
            max_results: args
                .max_results
                .or(file.max_results)
                .unwrap_or(DEFAULT_MAX_RESULTS)
                .max(1),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.config_dir.join(INDEX_FILE)
    }

    pub fn playlists_dir(&self) -> PathBuf {
        self.config_dir.join(PLAYLISTS_DIR)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config_dir.join(LOGS_DIR)
    }

    /// Names of configured external tools that cannot be found
    pub fn missing_tools(&self) -> Vec<&str> {
        [self.search_tool.as_str(), self.player.as_str()]
            .into_iter()
            .filter(|tool| find_executable(tool).is_none())
            .collect()
    }

    /// Creates the config directory, the playlists directory and an empty
    /// index if they are missing
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(self.playlists_dir())?;
        let index = self.index_path();
        if !index.exists() {
            fs::write(&index, EMPTY_INDEX)?;
        }
        Ok(())
    }
}

/// Looks `program` up on `PATH`, or checks it directly if it contains a slash
pub fn find_executable(program: &str) -> Option<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let is_executable = |path: &Path| {
        fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    };

    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(CONFIG_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_file_overrides_defaults() {
        let args = Args {
            player: Some("mpv-git".to_string()),
            ..Args::default()
        };
        let file: FileConfig = toml::from_str("player = \"other\"\nmax_results = 10\n").unwrap();
        let settings = Settings::merge(PathBuf::from("/cfg"), args, file);

        assert_eq!(settings.player, "mpv-git");
        assert_eq!(settings.max_results, 10);
        assert_eq!(settings.search_tool, DEFAULT_SEARCH_TOOL);
        assert_eq!(settings.socket, PathBuf::from(DEFAULT_SOCKET));
        assert_eq!(settings.index_path(), PathBuf::from("/cfg/playlists.json"));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "max_results = \"lots\"").unwrap();
        assert!(FileConfig::load(&path).max_results.is_none());
    }

    #[test]
    fn ensure_dirs_bootstraps_an_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::resolve(Args {
            config_dir: Some(dir.path().join("nested").join(".shellbeats")),
            ..Args::default()
        });
        settings.ensure_dirs().unwrap();
        assert!(settings.playlists_dir().is_dir());
        assert_eq!(fs::read_to_string(settings.index_path()).unwrap(), EMPTY_INDEX);

        fs::write(settings.index_path(), "{\"playlists\":[{\"name\":\"x\",\"filename\":\"x.json\"}]}").unwrap();
        settings.ensure_dirs().unwrap();
        assert!(fs::read_to_string(settings.index_path()).unwrap().contains("x.json"));
    }

    #[test]
    fn resolve_reads_the_file_in_the_chosen_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "socket = \"/tmp/from-file.sock\"\nmax_results = 0\n").unwrap();

        let settings = Settings::resolve(Args {
            config_dir: Some(dir.path().to_path_buf()),
            player: Some("mpv-git".to_string()),
            ..Args::default()
        });
        assert_eq!(settings.config_dir, dir.path());
        assert_eq!(settings.socket, PathBuf::from("/tmp/from-file.sock"));
        assert_eq!(settings.player, "mpv-git");
        assert_eq!(settings.max_results, 1);
    }

    #[test]
    fn missing_tools_are_reported() {
        let settings = Settings::merge(
            PathBuf::from("/cfg"),
            Args {
                player: Some("/nonexistent/mpv".to_string()),
                search_tool: Some("sh".to_string()),
                ..Args::default()
            },
            FileConfig::default(),
        );
        assert_eq!(settings.missing_tools(), ["/nonexistent/mpv"]);
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from(["shellbeats", "--max-results", "5", "--socket", "/tmp/s.sock"]).unwrap();
        assert_eq!(args.max_results, Some(5));
        assert_eq!(args.socket, Some(PathBuf::from("/tmp/s.sock")));
    }
}
