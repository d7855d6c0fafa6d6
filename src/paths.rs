use std::env;
use std::path::PathBuf;

/// Root under which the automated sheets live. Shared across the country
/// scripts so they all publish to the same tree.
pub const SHEETS_SUBDIR: &str = "testing/automated_sheets";

/// Resolve the output directory: `$SCRIPTS_DIR/testing/automated_sheets`,
/// falling back to the current directory when the variable is unset.
pub fn automated_sheets_dir() -> PathBuf {
    let root = env::var_os("SCRIPTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    root.join(SHEETS_SUBDIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_is_current_directory() {
        // Env-var handling is covered implicitly; mutating the process
        // environment in tests races with parallel test threads.
        let dir = automated_sheets_dir();
        assert!(dir.ends_with(SHEETS_SUBDIR));
    }
}
