use std::path::{Path, PathBuf};

use crate::config::GameConfig;
use crate::error::GameResult;

pub const DEFAULT_PORT: u16 = 8080;

const STATIC_CANDIDATES: [&str; 3] = ["static", "dist/client", "../../dist/client"];

pub fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|port| *port > 0)
        .unwrap_or(DEFAULT_PORT)
}

pub fn parse_seed(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
}

/// An explicit directory wins when it holds an `index.html`; otherwise the
/// first matching candidate relative to the working directory.
pub fn resolve_static_dir(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(raw) = explicit {
        let path = PathBuf::from(raw);
        if has_index(&path) {
            return Some(path);
        }
    }
    STATIC_CANDIDATES
        .into_iter()
        .map(PathBuf::from)
        .find(|path| has_index(path))
}

fn has_index(path: &Path) -> bool {
    path.join("index.html").is_file()
}

/// Reads the optional config file, then applies a seed override.
pub fn load_game_config(path: Option<&Path>, seed: Option<u32>) -> GameResult<GameConfig> {
    let mut config = match path {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_parsing_falls_back_to_default() {
        assert_eq!(parse_port(Some("9000")), 9000);
        assert_eq!(parse_port(Some(" 3000 ")), 3000);
        assert_eq!(parse_port(Some("0")), DEFAULT_PORT);
        assert_eq!(parse_port(Some("70000")), DEFAULT_PORT);
        assert_eq!(parse_port(Some("abc")), DEFAULT_PORT);
        assert_eq!(parse_port(None), DEFAULT_PORT);
    }

    #[test]
    fn seed_parsing_is_lenient_for_invalid_values() {
        assert_eq!(parse_seed(Some("42")), Some(42));
        assert_eq!(parse_seed(Some("-1")), None);
        assert_eq!(parse_seed(Some("")), None);
        assert_eq!(parse_seed(None), None);
    }

    #[test]
    fn missing_static_dir_is_skipped() {
        let bogus = std::env::temp_dir().join("maze-chase-no-such-static-dir");
        let resolved = resolve_static_dir(bogus.to_str());
        assert_ne!(resolved, Some(bogus));
    }

    #[test]
    fn static_dir_with_index_is_used() {
        let dir = std::env::temp_dir().join(format!("maze-chase-static-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        std::fs::write(dir.join("index.html"), "<html></html>").expect("write index");
        assert_eq!(resolve_static_dir(dir.to_str()), Some(dir.clone()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn config_loading_applies_seed_override() {
        let config = load_game_config(None, Some(7)).expect("default config");
        assert_eq!(config.seed, 7);
        assert_eq!(config.start_lives, 3);

        let path = std::env::temp_dir().join(format!("maze-chase-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"startLives":2,"seed":5}"#).expect("write config");
        let config = load_game_config(Some(path.as_path()), None).expect("file config");
        assert_eq!(config.start_lives, 2);
        assert_eq!(config.seed, 5);
        let _ = std::fs::remove_file(&path);

        assert!(load_game_config(Some(Path::new("/definitely/not/here.json")), None).is_err());
    }
}
