use std::path::PathBuf;

/// Environment variable that overrides the data directory.
pub const HOME_ENV: &str = "NOTESEEK_HOME";

pub struct DataPaths {
    pub root: PathBuf,
    pub db: PathBuf,
    pub models: PathBuf,
    pub config: PathBuf,
}

impl DataPaths {
    pub fn new() -> Self {
        let root = match std::env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".noteseek"),
        };
        Self::from_root(root)
    }

    pub fn from_root(root: PathBuf) -> Self {
        Self {
            db: root.join("notes.db"),
            models: root.join("models"),
            config: root.join("config.yaml"),
            root,
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.models)
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_root() {
        let paths = DataPaths::from_root(PathBuf::from("/tmp/ns"));
        assert_eq!(paths.db, PathBuf::from("/tmp/ns/notes.db"));
        assert_eq!(paths.models, PathBuf::from("/tmp/ns/models"));
        assert_eq!(paths.config, PathBuf::from("/tmp/ns/config.yaml"));
    }
}
