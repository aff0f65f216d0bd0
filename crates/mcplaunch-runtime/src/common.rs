//! Shared helpers: executable lookup and exit status mapping.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use mcplaunch_core::error::{ExecutableProblem, LaunchError, Result};
use mcplaunch_core::paths::resolve_against;

/// Exit code used when a status carries neither a code nor a signal.
pub const FALLBACK_EXIT_CODE: i32 = 1;

/// Convert a child's status into the code the launcher should exit with.
/// On Unix a signal N becomes `128 + N`, as shells report it.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    FALLBACK_EXIT_CODE
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn has_separator(program: &str) -> bool {
    program.contains('/') || program.contains(std::path::MAIN_SEPARATOR)
}

/// Locate `program` the way `exec` would.
///
/// Names with a path separator are taken relative to `working_dir`; bare
/// names are searched on `search_path`. A match that exists but cannot be
/// executed is reported as `NotExecutable`, anything else as `Missing`.
pub fn find_executable(program: &str, search_path: Option<&OsStr>, working_dir: &Path) -> Result<PathBuf> {
    if has_separator(program) {
        let path = resolve_against(working_dir, Path::new(program));
        if is_executable(&path) {
            return Ok(path);
        }
        let problem = if path.exists() {
            ExecutableProblem::NotExecutable
        } else {
            ExecutableProblem::Missing
        };
        return Err(LaunchError::ExecutableNotFound {
            program: path.display().to_string(),
            problem,
            searched: None,
        });
    }

    let search = search_path.map(OsStr::to_os_string).unwrap_or_default();
    if search.is_empty() {
        return Err(LaunchError::ExecutableNotFound {
            program: program.to_string(),
            problem: ExecutableProblem::Missing,
            searched: None,
        });
    }
    if let Ok(found) = which::which_in(program, Some(&search), working_dir) {
        return Ok(found);
    }

    let dirs: Vec<PathBuf> = std::env::split_paths(&search).collect();
    let shadowed = dirs.iter().map(|d| d.join(program)).any(|p| p.is_file());
    Err(LaunchError::ExecutableNotFound {
        program: program.to_string(),
        problem: if shadowed {
            ExecutableProblem::NotExecutable
        } else {
            ExecutableProblem::Missing
        },
        searched: Some(search.to_string_lossy().to_string()),
    })
}

/// Map an `exec`/`spawn` failure onto the launcher error for step 3.
pub fn map_exec_error(program: &Path, err: std::io::Error) -> LaunchError {
    let problem = match err.kind() {
        std::io::ErrorKind::NotFound => ExecutableProblem::Missing,
        std::io::ErrorKind::PermissionDenied => ExecutableProblem::NotExecutable,
        _ => return LaunchError::io(format!("cannot execute {}", program.display()), err),
    };
    LaunchError::ExecutableNotFound {
        program: program.display().to_string(),
        problem,
        searched: None,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn touch(path: &Path, mode: u32) {
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_bare_name_searches_path_in_order() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        touch(&a.path().join("python"), 0o755);
        touch(&b.path().join("python"), 0o755);
        let search = std::env::join_paths([a.path(), b.path()]).unwrap();
        let found = find_executable("python", Some(search.as_os_str()), Path::new("/")).unwrap();
        assert_eq!(found, a.path().join("python"));
    }

    #[test]
    fn test_bare_name_missing() {
        let a = tempfile::tempdir().unwrap();
        let search = a.path().as_os_str().to_os_string();
        let err = find_executable("python", Some(search.as_os_str()), Path::new("/")).unwrap_err();
        assert!(matches!(
            err,
            LaunchError::ExecutableNotFound {
                problem: ExecutableProblem::Missing,
                ..
            }
        ));
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn test_bare_name_not_executable() {
        let a = tempfile::tempdir().unwrap();
        touch(&a.path().join("python"), 0o644);
        let search = a.path().as_os_str().to_os_string();
        let err = find_executable("python", Some(search.as_os_str()), Path::new("/")).unwrap_err();
        assert_eq!(err.exit_code(), 126);
    }

    #[test]
    fn test_relative_program_uses_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("run.sh"), 0o755);
        let found = find_executable("./run.sh", None, dir.path()).unwrap();
        assert_eq!(found, dir.path().join("./run.sh"));

        touch(&dir.path().join("plain.sh"), 0o600);
        let err = find_executable("./plain.sh", None, dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 126);

        let err = find_executable("./absent.sh", None, dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn test_exit_code_of_signal() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code_of(ExitStatus::from_raw(42 << 8)), 42);
        assert_eq!(exit_code_of(ExitStatus::from_raw(0)), 0);
        // SIGTERM, no core dump
        assert_eq!(exit_code_of(ExitStatus::from_raw(15)), 143);
    }

    #[test]
    fn test_map_exec_error_kinds() {
        let p = Path::new("/x/python");
        let e = map_exec_error(p, std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(e.exit_code(), 127);
        let e = map_exec_error(p, std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(e.exit_code(), 126);
        let e = map_exec_error(p, std::io::Error::other("boom"));
        assert_eq!(e.step(), "exec");
        assert_eq!(e.exit_code(), 71);
    }
}
