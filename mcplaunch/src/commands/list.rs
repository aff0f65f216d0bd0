//! `mcplaunch list`

use anyhow::Result;
use mcplaunch_core::config::{ProfileRegistry, RuntimeConfig};
use serde_json::json;

pub fn cmd_list(json: bool) -> Result<()> {
    let runtime = RuntimeConfig::from_env();
    let registry = ProfileRegistry::discover(&runtime)?;

    if json {
        let items: Vec<_> = registry
            .iter()
            .map(|(cfg, source)| {
                json!({
                    "name": cfg.name,
                    "source": source,
                    "config": cfg,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for (cfg, source) in registry.iter() {
        let cmdline = std::iter::once(cfg.program.as_str())
            .chain(cfg.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:<16} {:<20} {}", cfg.name, cfg.environment.to_string(), cmdline);
        println!("{:<16} dir: {}  ({})", "", cfg.project_dir.display(), source);
    }
    Ok(())
}
