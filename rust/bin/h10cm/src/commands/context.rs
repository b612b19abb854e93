//! Context management commands.

use std::path::Path;

use anyhow::Result;

use crate::config::{ClientConfig, Context};

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Create (or replace) a context and make it current if none is.
pub fn create(ctx: Context, client_config_path: &Path) -> Result<()> {
    if ctx.name.trim().is_empty() {
        anyhow::bail!("Context name cannot be empty.");
    }
    let name = ctx.name.clone();
    let data_dir = ctx.tracker_config().data_dir;

    let mut config = ClientConfig::load(client_config_path)?;
    config.upsert_context(ctx);
    if config.current_context.is_empty() {
        config.current_context = name.clone();
    }
    config.save(client_config_path)?;

    println!("Context \"{}\" created.", name);
    if let Some(dir) = data_dir {
        println!("  Data: {}", dir.display());
    }
    Ok(())
}

/// List all contexts.
pub fn list(client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: h10cm context create <name> --server <url>");
        return Ok(());
    }

    println!("{:2} {:20} {:40} {:12}", "", "NAME", "SERVER", "USER");
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context { "*" } else { " " };
        println!("{:2} {:20} {:40} {:12}", marker, ctx.name, or_dash(&ctx.server), or_dash(&ctx.user));
    }

    Ok(())
}

/// Switch current context.
pub fn use_context(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if config.context(name).is_none() {
        anyhow::bail!("Context \"{}\" not found. Run `h10cm context list` to see available contexts.", name);
    }

    config.current_context = name.to_string();
    config.save(client_config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

/// Delete a context. Its local cart database is left in place.
pub fn delete(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let removed = config
        .remove_context(name)
        .ok_or_else(|| anyhow::anyhow!("Context \"{}\" not found.", name))?;

    config.save(client_config_path)?;
    println!("Context \"{}\" deleted ({}).", removed.name, or_dash(&removed.server));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_use_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let ctx = |name: &str| Context {
            name: name.into(),
            server: "http://localhost:3000/api".into(),
            data_dir: dir.path().join(name).display().to_string(),
            ..Context::default()
        };

        create(ctx("a"), &path).unwrap();
        create(ctx("b"), &path).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap().current_context, "a");

        use_context("b", &path).unwrap();
        assert!(use_context("zzz", &path).is_err());
        assert_eq!(ClientConfig::load(&path).unwrap().current_context, "b");

        delete("b", &path).unwrap();
        let config = ClientConfig::load(&path).unwrap();
        assert!(config.current().is_none());
        assert_eq!(config.contexts.len(), 1);
        assert!(delete("b", &path).is_err());
    }

    #[test]
    fn rejects_blank_name() {
        let dir = tempfile::tempdir().unwrap();
        assert!(create(Context::default(), &dir.path().join("config.toml")).is_err());
    }
}
