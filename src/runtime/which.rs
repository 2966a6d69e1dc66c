//! Executable lookup honoring the platform's search semantics.

use std::env;
use std::path::{Path, PathBuf};

/// Locate `program` the way the operating system's shell would.
///
/// A name containing a path separator is checked directly; a bare name is
/// searched across the `PATH` entries. On Windows the `PATHEXT`
/// extensions are tried for names without one.
pub fn which(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return check_candidate(candidate);
    }

    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        if let Some(found) = check_candidate(&dir.join(program)) {
            return Some(found);
        }
    }
    None
}

fn check_candidate(candidate: &Path) -> Option<PathBuf> {
    if cfg!(windows) {
        if candidate.extension().is_some() && is_executable(candidate) {
            return Some(candidate.to_path_buf());
        }
        let pathext =
            env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
        for ext in pathext.split(';').filter(|e| !e.is_empty()) {
            let mut with_ext = candidate.as_os_str().to_os_string();
            with_ext.push(ext);
            let with_ext = PathBuf::from(with_ext);
            if is_executable(&with_ext) {
                return Some(with_ext);
            }
        }
        None
    } else if is_executable(candidate) {
        Some(candidate.to_path_buf())
    } else {
        None
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
