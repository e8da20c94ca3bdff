use crate::cli::NewArgs;
use crate::config::ProjectConfig;
use anyhow::Context;
use chrono::Utc;
use heck::ToSnakeCase;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub fn run(args: NewArgs) -> anyhow::Result<()> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => ProjectConfig::load(&args.config)?.migrations_dir(),
    };
    let path = create_plan(&dir, &args.name)?;
    println!("created {}", path.display());
    Ok(())
}

fn create_plan(dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let name = normalize_name(name)?;
    let used_versions = existing_versions(dir);

    let mut version = current_version()?;
    while used_versions.contains(&version) {
        version += 1;
    }

    let base = format!("V{version}__{name}");
    let path = dir.join(format!("{base}.toml"));
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    std::fs::write(&path, plan_template(&base))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn plan_template(base: &str) -> String {
    format!(
        r#"# Migration: {base}
# Created at: {} UTC

description = "{base}"

# [[steps]]
# kind = "insert"            # sql | insert | insert_ignore | update | delete
#                            # drop_table | truncate_table | option
#                            # dynamic_table | iblock_table
# table = "b_option"
# fields = {{ MODULE_ID = "main", NAME = "example", VALUE = "Y" }}
#
# [[steps]]
# kind = "iblock_table"
# template = "b_iblock_element_prop_s?"
# condition = "CODE = 'catalog'"
# definition = "(IBLOCK_ELEMENT_ID INT NOT NULL)"
"#,
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    )
}

fn normalize_name(name: &str) -> anyhow::Result<String> {
    let mut s: String = name
        .to_snake_case()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    while s.contains("__") {
        s = s.replace("__", "_");
    }
    let s = s.trim_matches('_').to_string();
    if s.is_empty() {
        anyhow::bail!("migration name becomes empty after normalization");
    }
    Ok(s)
}

fn current_version() -> anyhow::Result<i64> {
    Utc::now()
        .format("%Y%m%d%H%M%S")
        .to_string()
        .parse::<i64>()
        .context("failed to create migration version")
}

/// Versions of `V<version>__<name>.toml` files already in `dir`.
fn existing_versions(dir: &Path) -> HashSet<i64> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return HashSet::new();
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|e| parse_version(&e.file_name().to_string_lossy()))
        .collect()
}

fn parse_version(file_name: &str) -> Option<i64> {
    let stem = file_name.strip_suffix(".toml")?;
    let (version, name) = stem.strip_prefix('V')?.split_once("__")?;
    if name.is_empty() {
        return None;
    }
    version.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_name("Add Catalog Props").unwrap(), "add_catalog_props");
        assert_eq!(normalize_name("addIblockTable").unwrap(), "add_iblock_table");
        assert_eq!(normalize_name("drop--old  table").unwrap(), "drop_old_table");
        assert!(normalize_name("--").is_err());
    }

    #[test]
    fn parses_versions_from_file_names() {
        assert_eq!(parse_version("V20260101090000__create.toml"), Some(20260101090000));
        assert_eq!(parse_version("V20260101090000__.toml"), None);
        assert_eq!(parse_version("V1__create.sql"), None);
        assert_eq!(parse_version("README.md"), None);
    }

    #[test]
    fn template_is_a_valid_plan() {
        let plan: crate::plan::Plan = toml::from_str(&plan_template("V1__x")).unwrap();
        assert_eq!(plan.description.as_deref(), Some("V1__x"));
        assert!(plan.steps.is_empty());
    }
}
