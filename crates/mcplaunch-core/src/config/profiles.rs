//! Launch profiles: built-in defaults plus an optional YAML profiles file.
//!
//! A profile is the explicit form of what a launcher script hard-codes: the
//! project directory, the runtime environment and the entry point. File
//! profiles replace built-ins with the same name.
//!
//! ```yaml
//! profiles:
//!   crm-server:
//!     project_dir: ~/mcp-servers/crm-mcp-server
//!     environment: { kind: conda, name: mcp }
//!     program: python
//!     args: [crm_server.py]
//!     env:
//!       PYTHONUNBUFFERED: "1"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::env_keys::config as cfg_keys;
use super::schema::RuntimeConfig;
use crate::error::{LaunchError, Result};
use crate::paths::{absolutize, expand_home, resolve_against};

/// Which isolated runtime to activate before exec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EnvironmentSpec {
    /// A conda environment: `base`, a name under `<root>/envs/`, or a prefix path.
    Conda {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root: Option<PathBuf>,
    },
    /// A Python virtualenv directory (contains `pyvenv.cfg`).
    Venv { path: PathBuf },
    /// No activation; the target inherits the launcher's environment.
    #[default]
    #[serde(alias = "none")]
    Inherit,
}

impl fmt::Display for EnvironmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conda { name, .. } => write!(f, "conda:{}", name),
            Self::Venv { path } => write!(f, "venv:{}", path.display()),
            Self::Inherit => f.write_str("inherit"),
        }
    }
}

/// Fully specified launch configuration for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchConfig {
    pub name: String,
    /// Working directory of the target; must exist at launch time.
    pub project_dir: PathBuf,
    pub environment: EnvironmentSpec,
    /// Bare name (searched on the activated PATH), or a path relative to
    /// `project_dir`, or an absolute path.
    pub program: String,
    /// Fixed leading arguments, placed before the caller's arguments.
    pub args: Vec<String>,
    /// Extra variables for the target, applied after activation.
    pub env: BTreeMap<String, String>,
}

impl LaunchConfig {
    pub fn new(name: impl Into<String>, project_dir: impl Into<PathBuf>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_dir: project_dir.into(),
            environment: EnvironmentSpec::Inherit,
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_environment(mut self, environment: EnvironmentSpec) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Where a profile definition came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "path", rename_all = "lowercase")]
pub enum ProfileSource {
    Builtin,
    File(PathBuf),
}

impl fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("built-in"),
            Self::File(p) => write!(f, "{}", p.display()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfilesFile {
    #[serde(default)]
    profiles: BTreeMap<String, ProfileDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileDef {
    project_dir: PathBuf,
    #[serde(default)]
    environment: EnvironmentSpec,
    program: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

impl ProfileDef {
    /// Expand `~` and anchor relative paths at the profiles file's directory.
    fn into_config(self, name: String, base: &Path) -> LaunchConfig {
        let environment = match self.environment {
            EnvironmentSpec::Conda { name, root } => EnvironmentSpec::Conda {
                name,
                root: root.map(|r| resolve_against(base, &r)),
            },
            EnvironmentSpec::Venv { path } => EnvironmentSpec::Venv {
                path: resolve_against(base, &path),
            },
            EnvironmentSpec::Inherit => EnvironmentSpec::Inherit,
        };
        LaunchConfig {
            name,
            project_dir: resolve_against(base, &self.project_dir),
            environment,
            program: self.program,
            args: self.args,
            env: self.env,
        }
    }
}

/// Built-in profiles matching the two bundled MCP server launchers.
pub fn builtin_profiles() -> Vec<LaunchConfig> {
    let conda_mcp = EnvironmentSpec::Conda {
        name: "mcp".to_string(),
        root: None,
    };
    vec![
        LaunchConfig::new(
            "crm-server",
            expand_home(Path::new("~/mcp-servers/crm-mcp-server")),
            "python",
        )
        .with_environment(conda_mcp.clone())
        .with_args(["crm_server.py"]),
        LaunchConfig::new(
            "file-reader",
            expand_home(Path::new("~/mcp-servers/simple-file-reader")),
            "python",
        )
        .with_environment(conda_mcp)
        .with_args(["file_reader.py"]),
    ]
}

/// Ordered candidate locations for the profiles file.
///
/// An explicit path (from `MCPLAUNCH_CONFIG`) is the only candidate when set.
pub fn config_file_candidates(
    explicit: Option<&Path>,
    cwd: Option<&Path>,
    config_dir: Option<&Path>,
) -> Vec<PathBuf> {
    if let Some(p) = explicit {
        return vec![p.to_path_buf()];
    }
    let mut out = Vec::new();
    if let Some(cwd) = cwd {
        out.push(cwd.join(cfg_keys::CONFIG_FILE_NAME));
    }
    if let Some(dir) = config_dir {
        out.push(dir.join(cfg_keys::CONFIG_DIR_NAME).join(cfg_keys::CONFIG_FILE_NAME));
    }
    out
}

/// Named launch profiles.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, (LaunchConfig, ProfileSource)>,
}

impl ProfileRegistry {
    pub fn builtin() -> Self {
        let mut reg = Self::default();
        for cfg in builtin_profiles() {
            reg.insert(cfg, ProfileSource::Builtin);
        }
        reg
    }

    /// Built-ins overlaid with the first profiles file found.
    pub fn discover(runtime: &RuntimeConfig) -> Result<Self> {
        let mut reg = Self::builtin();
        let cwd = std::env::current_dir().ok();
        let config_dir = dirs::config_dir();
        let candidates =
            config_file_candidates(runtime.config_path.as_deref(), cwd.as_deref(), config_dir.as_deref());

        if let Some(explicit) = runtime.config_path.as_deref() {
            if !explicit.is_file() {
                return Err(LaunchError::Config(format!(
                    "{} points at a missing file: {}",
                    cfg_keys::MCPLAUNCH_CONFIG,
                    explicit.display()
                )));
            }
        }

        if let Some(path) = candidates.into_iter().find(|p| p.is_file()) {
            tracing::debug!(path = %path.display(), "Loading profiles file");
            reg.merge_file(&path)?;
        }
        Ok(reg)
    }

    pub fn insert(&mut self, cfg: LaunchConfig, source: ProfileSource) {
        self.profiles.insert(cfg.name.clone(), (cfg, source));
    }

    /// Read a profiles file and let its entries replace existing ones.
    ///
    /// Relative entries resolve against the file's directory, which is made
    /// absolute first so a relative `MCPLAUNCH_CONFIG` still yields absolute
    /// project directories.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let path = absolutize(path)
            .map_err(|e| LaunchError::Config(format!("cannot resolve {}: {}", path.display(), e)))?;
        let path = path.as_path();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LaunchError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        self.merge_yaml(&content, &base, ProfileSource::File(path.to_path_buf()))
            .map_err(|e| match e {
                LaunchError::Config(msg) => {
                    LaunchError::Config(format!("{}: {}", path.display(), msg))
                }
                other => other,
            })
    }

    /// Parse profiles YAML; relative paths are anchored at `base`.
    pub fn merge_yaml(&mut self, content: &str, base: &Path, source: ProfileSource) -> Result<()> {
        let file: ProfilesFile = serde_yaml::from_str(content)
            .map_err(|e| LaunchError::Config(format!("invalid profiles file: {}", e)))?;
        for (name, def) in file.profiles {
            if def.program.trim().is_empty() {
                return Err(LaunchError::Config(format!(
                    "profile '{}' has an empty program",
                    name
                )));
            }
            let cfg = def.into_config(name, base);
            self.insert(cfg, source.clone());
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&LaunchConfig> {
        self.profiles.get(name).map(|(cfg, _)| cfg).ok_or_else(|| {
            LaunchError::Config(format!(
                "unknown profile '{}' (known: {})",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LaunchConfig, &ProfileSource)> {
        self.profiles.values().map(|(cfg, src)| (cfg, src))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_present() {
        let reg = ProfileRegistry::builtin();
        let crm = reg.get("crm-server").unwrap();
        assert_eq!(crm.program, "python");
        assert_eq!(crm.args, vec!["crm_server.py"]);
        assert_eq!(
            crm.environment,
            EnvironmentSpec::Conda {
                name: "mcp".into(),
                root: None
            }
        );
        let fr = reg.get("file-reader").unwrap();
        assert_eq!(fr.args, vec!["file_reader.py"]);
        assert!(fr.project_dir.ends_with("mcp-servers/simple-file-reader"));
    }

    #[test]
    fn test_file_profile_overrides_builtin() {
        let mut reg = ProfileRegistry::builtin();
        let yaml = r#"
profiles:
  crm-server:
    project_dir: /srv/crm
    environment: { kind: venv, path: .venv }
    program: ./run.sh
    args: ["--stdio"]
    env:
      PYTHONUNBUFFERED: "1"
  extra:
    project_dir: servers/extra
    program: node
"#;
        reg.merge_yaml(yaml, Path::new("/etc/mcplaunch"), ProfileSource::File("/etc/mcplaunch/mcplaunch.yaml".into()))
            .unwrap();

        let crm = reg.get("crm-server").unwrap();
        assert_eq!(crm.project_dir, PathBuf::from("/srv/crm"));
        assert_eq!(
            crm.environment,
            EnvironmentSpec::Venv {
                path: PathBuf::from("/etc/mcplaunch/.venv")
            }
        );
        assert_eq!(crm.args, vec!["--stdio"]);
        assert_eq!(crm.env.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));

        let extra = reg.get("extra").unwrap();
        assert_eq!(extra.project_dir, PathBuf::from("/etc/mcplaunch/servers/extra"));
        assert_eq!(extra.environment, EnvironmentSpec::Inherit);

        // untouched built-in survives
        assert!(reg.contains("file-reader"));
        let sources: Vec<_> = reg.iter().map(|(c, s)| (c.name.clone(), s.clone())).collect();
        assert!(sources.contains(&("file-reader".to_string(), ProfileSource::Builtin)));
    }

    #[test]
    fn test_environment_kinds_parse() {
        let mut reg = ProfileRegistry::default();
        let yaml = r#"
profiles:
  a: { project_dir: /a, program: x, environment: { kind: none } }
  b: { project_dir: /b, program: x, environment: { kind: conda, name: base, root: /opt/conda } }
"#;
        reg.merge_yaml(yaml, Path::new("/"), ProfileSource::Builtin).unwrap();
        assert_eq!(reg.get("a").unwrap().environment, EnvironmentSpec::Inherit);
        assert_eq!(
            reg.get("b").unwrap().environment,
            EnvironmentSpec::Conda {
                name: "base".into(),
                root: Some(PathBuf::from("/opt/conda"))
            }
        );
    }

    #[test]
    fn test_home_relative_paths_expand() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let mut reg = ProfileRegistry::default();
        let yaml = r#"
profiles:
  crm:
    project_dir: ~/mcp-servers/crm
    environment: { kind: venv, path: ~/.venv }
    program: python
  fr:
    project_dir: ~/mcp-servers/fr
    environment: { kind: conda, name: mcp, root: ~/miniconda3 }
    program: python
"#;
        reg.merge_yaml(yaml, Path::new("/etc/mcplaunch"), ProfileSource::Builtin)
            .unwrap();

        let crm = reg.get("crm").unwrap();
        assert_eq!(crm.project_dir, home.join("mcp-servers/crm"));
        assert_eq!(crm.environment, EnvironmentSpec::Venv { path: home.join(".venv") });

        let fr = reg.get("fr").unwrap();
        assert_eq!(fr.project_dir, home.join("mcp-servers/fr"));
        assert_eq!(
            fr.environment,
            EnvironmentSpec::Conda {
                name: "mcp".into(),
                root: Some(home.join("miniconda3"))
            }
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let mut reg = ProfileRegistry::default();
        let yaml = "profiles:\n  a: { project_dir: /a, program: x, workdir: /b }\n";
        let err = reg
            .merge_yaml(yaml, Path::new("/"), ProfileSource::Builtin)
            .unwrap_err();
        assert!(matches!(err, LaunchError::Config(_)));
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn test_empty_program_rejected() {
        let mut reg = ProfileRegistry::default();
        let yaml = "profiles:\n  a: { project_dir: /a, program: '  ' }\n";
        assert!(reg.merge_yaml(yaml, Path::new("/"), ProfileSource::Builtin).is_err());
    }

    #[test]
    fn test_unknown_profile_lists_known() {
        let reg = ProfileRegistry::builtin();
        let err = reg.get("nope").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown profile 'nope'"));
        assert!(msg.contains("crm-server"));
        assert!(msg.contains("file-reader"));
    }

    #[test]
    fn test_merge_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcplaunch.yaml");
        std::fs::write(&path, "profiles: [not, a, map]\n").unwrap();
        let mut reg = ProfileRegistry::default();
        let err = reg.merge_file(&path).unwrap_err();
        assert!(err.to_string().contains("mcplaunch.yaml"));
    }

    #[test]
    fn test_discover_missing_explicit_file_is_error() {
        let runtime = RuntimeConfig {
            config_path: Some(PathBuf::from("/definitely/not/here/mcplaunch.yaml")),
            ..Default::default()
        };
        let err = ProfileRegistry::discover(&runtime).unwrap_err();
        assert!(matches!(err, LaunchError::Config(_)));
    }

    #[test]
    fn test_discover_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "profiles:\n  local: { project_dir: srv, program: python }\n").unwrap();
        let runtime = RuntimeConfig {
            config_path: Some(path.clone()),
            ..Default::default()
        };
        let reg = ProfileRegistry::discover(&runtime).unwrap();
        let local = reg.get("local").unwrap();
        assert_eq!(local.project_dir, dir.path().join("srv"));
        assert!(reg.contains("crm-server"));
    }

    #[test]
    fn test_config_file_candidates_order() {
        let c = config_file_candidates(None, Some(Path::new("/work")), Some(Path::new("/home/u/.config")));
        assert_eq!(
            c,
            vec![
                PathBuf::from("/work/mcplaunch.yaml"),
                PathBuf::from("/home/u/.config/mcplaunch/mcplaunch.yaml"),
            ]
        );
        let c = config_file_candidates(Some(Path::new("/x.yaml")), Some(Path::new("/work")), None);
        assert_eq!(c, vec![PathBuf::from("/x.yaml")]);
    }
}
