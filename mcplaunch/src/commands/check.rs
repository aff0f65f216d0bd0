//! `mcplaunch check`: dry-run resolution of a profile.

use std::ffi::OsString;

use anyhow::Result;
use mcplaunch_core::config::{ProfileRegistry, RuntimeConfig};
use mcplaunch_runtime::env::EnvEdit;
use mcplaunch_runtime::launcher::{LaunchPlan, Launcher};

pub fn cmd_check(profile: &str, args: Vec<OsString>, json: bool) -> Result<i32> {
    let runtime = RuntimeConfig::from_env();
    let registry = ProfileRegistry::discover(&runtime)?;
    let config = registry.get(profile)?;
    let plan = Launcher::new(runtime).plan(config, args)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan.to_json())?);
    } else {
        print!("{}", render(&plan));
    }
    Ok(0)
}

fn render(plan: &LaunchPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("profile:     {}\n", plan.profile));
    out.push_str(&format!("directory:   {}\n", plan.working_dir.display()));
    out.push_str(&format!("environment: {}\n", plan.environment));
    if let Some(ref prefix) = plan.prefix {
        out.push_str(&format!("prefix:      {}\n", prefix.display()));
    }
    for dir in &plan.bin_dirs {
        out.push_str(&format!("bin:         {}\n", dir.display()));
    }
    out.push_str(&format!("executable:  {}\n", plan.executable.display()));
    let argv: Vec<String> = plan
        .argv
        .iter()
        .map(|a| format!("{:?}", a.to_string_lossy()))
        .collect();
    out.push_str(&format!("arguments:   [{}]\n", argv.join(", ")));
    for edit in &plan.env {
        match edit {
            EnvEdit::Set(k, v) => out.push_str(&format!("  set   {}={}\n", k, v.to_string_lossy())),
            EnvEdit::Remove(k) => out.push_str(&format!("  unset {}\n", k)),
        }
    }
    out
}
