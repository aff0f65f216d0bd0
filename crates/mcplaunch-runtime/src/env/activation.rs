//! Build the child environment for a conda env or a Python venv.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use mcplaunch_core::config::env_keys::activation as keys;
use mcplaunch_core::config::RuntimeConfig;
use mcplaunch_core::error::{LaunchError, Result};
use mcplaunch_core::paths::expand_home;

/// One change to the target's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvEdit {
    Set(String, OsString),
    Remove(String),
}

impl EnvEdit {
    pub fn key(&self) -> &str {
        match self {
            Self::Set(k, _) | Self::Remove(k) => k,
        }
    }
}

/// Outcome of activating a runtime environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedEnvironment {
    /// e.g. `conda:mcp`, `venv:/srv/app/.venv`, `inherit`
    pub label: String,
    /// Environment prefix; `None` when nothing was activated.
    pub prefix: Option<PathBuf>,
    /// Directories prepended to PATH, highest priority first.
    pub bin_dirs: Vec<PathBuf>,
    /// Ordered edits; later edits to the same key win.
    pub edits: Vec<EnvEdit>,
}

impl ActivatedEnvironment {
    pub fn inherit() -> Self {
        Self {
            label: "inherit".to_string(),
            prefix: None,
            bin_dirs: Vec::new(),
            edits: Vec::new(),
        }
    }

    /// The PATH the target will see, if activation changed it.
    pub fn path_override(&self) -> Option<&OsStr> {
        self.edits.iter().rev().find_map(|e| match e {
            EnvEdit::Set(k, v) if k == keys::PATH => Some(v.as_os_str()),
            EnvEdit::Remove(k) if k == keys::PATH => Some(OsStr::new("")),
            _ => None,
        })
    }
}

// ============================================================
// Conda root discovery
// ============================================================

/// A directory is a conda installation (or env) when it has `conda-meta/`.
pub fn is_conda_install(dir: &Path) -> bool {
    dir.join("conda-meta").is_dir()
}

/// Default install locations, in probe order.
pub fn conda_root_candidates(home: Option<&Path>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(home) = home {
        for name in ["miniconda3", "anaconda3", "miniforge3", "mambaforge"] {
            out.push(home.join(name));
        }
    }
    out.push(PathBuf::from("/opt/conda"));
    out
}

/// Resolve the conda installation root.
///
/// Priority: profile `root` > MCPLAUNCH_CONDA_ROOT > CONDA_EXE > default
/// locations. An explicitly configured root that is not a conda install is an
/// error rather than a reason to keep probing.
pub fn resolve_conda_root(env: &str, explicit: Option<&Path>, runtime: &RuntimeConfig) -> Result<PathBuf> {
    let configured = explicit
        .map(|p| (p.to_path_buf(), "profile root"))
        .or_else(|| runtime.conda_root.clone().map(|p| (p, "MCPLAUNCH_CONDA_ROOT")));
    if let Some((root, origin)) = configured {
        let root = expand_home(&root);
        if is_conda_install(&root) {
            return Ok(root);
        }
        return Err(LaunchError::activation(
            env,
            format!(
                "{} {} is not a conda installation (missing conda-meta)",
                origin,
                root.display()
            ),
        ));
    }

    // CONDA_EXE is <root>/bin/conda or <root>/condabin/conda
    if let Some(root) = runtime
        .conda_exe
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
    {
        if is_conda_install(root) {
            return Ok(root.to_path_buf());
        }
    }

    let home = dirs::home_dir();
    let candidates = conda_root_candidates(home.as_deref());
    candidates
        .iter()
        .find(|c| is_conda_install(c))
        .cloned()
        .ok_or_else(|| {
            LaunchError::activation(
                env,
                format!(
                    "no conda installation found (tried {})",
                    candidates
                        .iter()
                        .map(|c| c.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        })
}

/// Names containing a separator, or starting with `~`, are prefix paths.
fn is_path_like(name: &str) -> bool {
    name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) || name.starts_with('~')
}

#[cfg(windows)]
fn executable_dirs(prefix: &Path) -> Vec<PathBuf> {
    vec![
        prefix.to_path_buf(),
        prefix.join("Library").join("bin"),
        prefix.join("Scripts"),
    ]
}

#[cfg(not(windows))]
fn executable_dirs(prefix: &Path) -> Vec<PathBuf> {
    vec![prefix.join("bin")]
}

#[cfg(windows)]
fn venv_bin_dir(venv: &Path) -> PathBuf {
    venv.join("Scripts")
}

#[cfg(not(windows))]
fn venv_bin_dir(venv: &Path) -> PathBuf {
    venv.join("bin")
}

fn prepend_path(env: &str, dirs: &[PathBuf], inherited: Option<&OsStr>) -> Result<OsString> {
    let rest: Vec<PathBuf> = inherited.map(|p| std::env::split_paths(p).collect()).unwrap_or_default();
    std::env::join_paths(dirs.iter().cloned().chain(rest))
        .map_err(|e| LaunchError::activation(env, format!("cannot build PATH: {}", e)))
}

// ============================================================
// Activation
// ============================================================

/// Activate a conda environment by name (`base`, `<root>/envs/<name>`) or prefix path.
pub fn activate_conda(
    name: &str,
    root: Option<&Path>,
    runtime: &RuntimeConfig,
    inherited_path: Option<&OsStr>,
) -> Result<ActivatedEnvironment> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LaunchError::activation(name, "empty conda environment name"));
    }

    let (prefix, default_env) = if is_path_like(name) {
        let prefix = expand_home(Path::new(name));
        let label = prefix.display().to_string();
        (prefix, label)
    } else {
        let root = resolve_conda_root(name, root, runtime)?;
        if name == "base" {
            (root, name.to_string())
        } else {
            (root.join("envs").join(name), name.to_string())
        }
    };

    if !prefix.is_dir() {
        return Err(LaunchError::activation(
            name,
            format!("environment prefix {} does not exist", prefix.display()),
        ));
    }
    if !is_conda_install(&prefix) {
        return Err(LaunchError::activation(
            name,
            format!("{} is not a conda environment (missing conda-meta)", prefix.display()),
        ));
    }
    let bin_dirs = executable_dirs(&prefix);
    let primary_bin = bin_dirs.last().cloned().unwrap_or_else(|| prefix.clone());
    if !primary_bin.is_dir() {
        return Err(LaunchError::activation(
            name,
            format!("missing executables directory {}", primary_bin.display()),
        ));
    }

    tracing::debug!(env = %name, prefix = %prefix.display(), "Activating conda environment");

    let path = prepend_path(name, &bin_dirs, inherited_path)?;
    let edits = vec![
        EnvEdit::Set(keys::PATH.to_string(), path),
        EnvEdit::Set(keys::CONDA_PREFIX.to_string(), prefix.clone().into_os_string()),
        EnvEdit::Set(keys::CONDA_DEFAULT_ENV.to_string(), OsString::from(&default_env)),
        EnvEdit::Set(keys::CONDA_SHLVL.to_string(), OsString::from("1")),
        EnvEdit::Set(
            keys::CONDA_PROMPT_MODIFIER.to_string(),
            OsString::from(format!("({}) ", default_env)),
        ),
        EnvEdit::Remove(keys::PYTHONHOME.to_string()),
    ];

    Ok(ActivatedEnvironment {
        label: format!("conda:{}", default_env),
        prefix: Some(prefix),
        bin_dirs,
        edits,
    })
}

/// Activate a Python virtualenv directory.
pub fn activate_venv(path: &Path, inherited_path: Option<&OsStr>) -> Result<ActivatedEnvironment> {
    let venv = expand_home(path);
    let label = venv.display().to_string();
    if !venv.is_dir() {
        return Err(LaunchError::activation(
            &label,
            format!("virtualenv {} does not exist", venv.display()),
        ));
    }
    if !venv.join("pyvenv.cfg").is_file() {
        return Err(LaunchError::activation(
            &label,
            format!("{} is not a virtualenv (missing pyvenv.cfg)", venv.display()),
        ));
    }
    let bin = venv_bin_dir(&venv);
    if !bin.is_dir() {
        return Err(LaunchError::activation(
            &label,
            format!("missing executables directory {}", bin.display()),
        ));
    }

    tracing::debug!(venv = %venv.display(), "Activating virtualenv");

    let path = prepend_path(&label, std::slice::from_ref(&bin), inherited_path)?;
    Ok(ActivatedEnvironment {
        label: format!("venv:{}", label),
        prefix: Some(venv.clone()),
        bin_dirs: vec![bin],
        edits: vec![
            EnvEdit::Set(keys::PATH.to_string(), path),
            EnvEdit::Set(keys::VIRTUAL_ENV.to_string(), venv.into_os_string()),
            EnvEdit::Remove(keys::PYTHONHOME.to_string()),
        ],
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn fake_conda_root() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("conda-meta")).unwrap();
        fs::create_dir_all(root.path().join("bin")).unwrap();
        fs::create_dir_all(root.path().join("envs/mcp/conda-meta")).unwrap();
        fs::create_dir_all(root.path().join("envs/mcp/bin")).unwrap();
        root
    }

    fn runtime_with_root(root: &Path) -> RuntimeConfig {
        RuntimeConfig {
            conda_root: Some(root.to_path_buf()),
            ..Default::default()
        }
    }

    fn get<'a>(env: &'a ActivatedEnvironment, key: &str) -> Option<&'a OsString> {
        env.edits.iter().rev().find_map(|e| match e {
            EnvEdit::Set(k, v) if k == key => Some(v),
            _ => None,
        })
    }

    #[test]
    fn test_activate_named_conda_env() {
        let root = fake_conda_root();
        let rt = runtime_with_root(root.path());
        let env = activate_conda("mcp", None, &rt, Some(OsStr::new("/usr/bin:/bin"))).unwrap();

        let prefix = root.path().join("envs/mcp");
        assert_eq!(env.label, "conda:mcp");
        assert_eq!(env.prefix.as_deref(), Some(prefix.as_path()));
        assert_eq!(
            get(&env, "PATH").unwrap(),
            &OsString::from(format!("{}:/usr/bin:/bin", prefix.join("bin").display()))
        );
        assert_eq!(get(&env, "CONDA_PREFIX").unwrap(), prefix.as_os_str());
        assert_eq!(get(&env, "CONDA_DEFAULT_ENV").unwrap(), "mcp");
        assert_eq!(get(&env, "CONDA_SHLVL").unwrap(), "1");
        assert_eq!(get(&env, "CONDA_PROMPT_MODIFIER").unwrap(), "(mcp) ");
        assert!(env.edits.contains(&EnvEdit::Remove("PYTHONHOME".into())));
        assert_eq!(env.path_override(), get(&env, "PATH").map(|v| v.as_os_str()));
    }

    #[test]
    fn test_activate_base_uses_root() {
        let root = fake_conda_root();
        let rt = runtime_with_root(root.path());
        let env = activate_conda("base", None, &rt, None).unwrap();
        assert_eq!(env.prefix.as_deref(), Some(root.path()));
        assert_eq!(get(&env, "PATH").unwrap(), root.path().join("bin").as_os_str());
    }

    #[test]
    fn test_profile_root_beats_runtime_root() {
        let root = fake_conda_root();
        let rt = RuntimeConfig {
            conda_root: Some(PathBuf::from("/definitely/not/conda")),
            ..Default::default()
        };
        let env = activate_conda("mcp", Some(root.path()), &rt, None).unwrap();
        assert_eq!(env.prefix, Some(root.path().join("envs/mcp")));
    }

    #[test]
    fn test_conda_exe_locates_root() {
        let root = fake_conda_root();
        let rt = RuntimeConfig {
            conda_exe: Some(root.path().join("bin/conda")),
            ..Default::default()
        };
        assert_eq!(resolve_conda_root("mcp", None, &rt).unwrap(), root.path());
    }

    #[test]
    fn test_prefix_path_env() {
        let root = fake_conda_root();
        let prefix = root.path().join("envs/mcp");
        let env = activate_conda(prefix.to_str().unwrap(), None, &RuntimeConfig::default(), None).unwrap();
        assert_eq!(env.prefix.as_deref(), Some(prefix.as_path()));
        assert_eq!(get(&env, "CONDA_DEFAULT_ENV").unwrap(), prefix.as_os_str());
    }

    #[test]
    fn test_missing_env_fails_activation() {
        let root = fake_conda_root();
        let rt = runtime_with_root(root.path());
        let err = activate_conda("ghost", None, &rt, None).unwrap_err();
        assert_eq!(err.step(), "activate");
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_env_without_conda_meta_fails() {
        let root = fake_conda_root();
        fs::create_dir_all(root.path().join("envs/plain/bin")).unwrap();
        let rt = runtime_with_root(root.path());
        let err = activate_conda("plain", None, &rt, None).unwrap_err();
        assert!(err.to_string().contains("conda-meta"));
    }

    #[test]
    fn test_configured_root_must_be_conda() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime_with_root(dir.path());
        let err = activate_conda("mcp", None, &rt, None).unwrap_err();
        assert!(matches!(err, LaunchError::EnvironmentActivation { .. }));
        assert!(err.to_string().contains("MCPLAUNCH_CONDA_ROOT"));
    }

    #[test]
    fn test_activate_venv() {
        let dir = tempfile::tempdir().unwrap();
        let venv = dir.path().join(".venv");
        fs::create_dir_all(venv.join("bin")).unwrap();
        fs::write(venv.join("pyvenv.cfg"), "home = /usr/bin\n").unwrap();

        let env = activate_venv(&venv, Some(OsStr::new("/usr/bin"))).unwrap();
        assert_eq!(env.label, format!("venv:{}", venv.display()));
        assert_eq!(get(&env, "VIRTUAL_ENV").unwrap(), venv.as_os_str());
        assert_eq!(
            get(&env, "PATH").unwrap(),
            &OsString::from(format!("{}:/usr/bin", venv.join("bin").display()))
        );
    }

    #[test]
    fn test_venv_without_marker_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        let err = activate_venv(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("pyvenv.cfg"));
    }

    #[test]
    fn test_path_like_names() {
        assert!(is_path_like("/opt/conda/envs/mcp"));
        assert!(is_path_like("./envs/mcp"));
        assert!(is_path_like("~/envs/mcp"));
        assert!(!is_path_like("mcp"));
        assert!(!is_path_like(".hidden-env"));
    }

    #[test]
    fn test_dot_name_is_env_under_root() {
        let root = fake_conda_root();
        fs::create_dir_all(root.path().join("envs/.hidden/conda-meta")).unwrap();
        fs::create_dir_all(root.path().join("envs/.hidden/bin")).unwrap();
        let rt = runtime_with_root(root.path());
        let env = activate_conda(".hidden", None, &rt, None).unwrap();
        assert_eq!(env.prefix, Some(root.path().join("envs/.hidden")));
        assert_eq!(env.bin_dirs, vec![root.path().join("envs/.hidden/bin")]);
    }

    #[test]
    fn test_root_candidates_order() {
        let c = conda_root_candidates(Some(Path::new("/home/u")));
        assert_eq!(c.first(), Some(&PathBuf::from("/home/u/miniconda3")));
        assert_eq!(c.last(), Some(&PathBuf::from("/opt/conda")));
    }
}
