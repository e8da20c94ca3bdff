use migsql::DdlVariables;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!("failed to read config file {}: {e}", config_path.display())
        })?;
        Self::parse(config_path, &raw)
    }

    fn parse(config_path: &Path, raw: &str) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let mut file: ConfigFile = toml::from_str(raw).map_err(|e| {
            anyhow::anyhow!("failed to parse config file {}: {e}", config_path.display())
        })?;

        file.expand_env()?;
        file.validate()?;

        Ok(Self { config_dir, file })
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.resolve_path(&self.file.migrations.dir)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub engine: Option<String>,

    #[serde(default)]
    pub migrations: MigrationsConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub ddl: DdlVariables,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationsConfig {
    #[serde(default = "default_migrations_dir")]
    pub dir: String,
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_migrations_dir(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Sql,
    Json,
}

impl OutputFormat {
    pub fn parse(v: &str) -> anyhow::Result<Self> {
        match v {
            "sql" => Ok(Self::Sql),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unsupported output format: {other} (expected sql or json)"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        self.migrations.dir = expand_env_vars(&self.migrations.dir)?;
        self.ddl.substitution = expand_env_vars(&self.ddl.substitution)?;
        self.ddl.statement = expand_env_vars(&self.ddl.statement)?;
        self.ddl.prepared = expand_env_vars(&self.ddl.prepared)?;
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        if let Some(engine) = &self.engine {
            if engine != "mysql" {
                anyhow::bail!("unsupported engine: {engine}");
            }
        }
        if self.migrations.dir.trim().is_empty() {
            anyhow::bail!("migrations.dir must not be empty");
        }
        self.ddl
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid [ddl] section: {e}"))?;
        Ok(())
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(raw: &str) -> anyhow::Result<ProjectConfig> {
        ProjectConfig::parse(Path::new("db/migsql.toml"), raw)
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = load("version = \"1\"\n").unwrap();
        assert_eq!(cfg.file.migrations.dir, "migrations");
        assert_eq!(cfg.file.output.format, OutputFormat::Sql);
        assert_eq!(cfg.file.ddl, DdlVariables::default());
        assert_eq!(cfg.migrations_dir(), PathBuf::from("db/migrations"));
    }

    #[test]
    fn bare_file_name_resolves_against_cwd() {
        let cfg = ProjectConfig::parse(Path::new("migsql.toml"), "version = \"1\"\n").unwrap();
        assert_eq!(cfg.migrations_dir(), PathBuf::from("./migrations"));
    }

    #[test]
    fn reads_sections() {
        let cfg = load(
            r#"
version = "1"
engine = "mysql"

[migrations]
dir = "plans"

[output]
format = "json"

[ddl]
prepared = "mkTable"
"#,
        )
        .unwrap();
        assert_eq!(cfg.file.migrations.dir, "plans");
        assert_eq!(cfg.file.output.format, OutputFormat::Json);
        assert_eq!(cfg.file.ddl.prepared, "mkTable");
        assert_eq!(cfg.file.ddl.substitution, "@SUBSTITUTION");
    }

    #[test]
    fn rejects_other_engines_and_versions() {
        assert!(load("version = \"2\"\n").is_err());
        assert!(load("version = \"1\"\nengine = \"postgres\"\n").is_err());
    }

    #[test]
    fn rejects_malformed_ddl_variables() {
        let err = load("version = \"1\"\n[ddl]\nsubstitution = \"SUBST\"\n").unwrap_err();
        assert!(err.to_string().contains("[ddl]"));
    }

    #[test]
    fn expands_env_vars() {
        // SAFETY: test-only, unique variable name.
        unsafe { std::env::set_var("MIGSQL_TEST_PLAN_DIR", "db/plans") };
        assert_eq!(
            expand_env_vars("${MIGSQL_TEST_PLAN_DIR}/v1").unwrap(),
            "db/plans/v1"
        );
        assert_eq!(expand_env_vars("no vars").unwrap(), "no vars");
        assert!(expand_env_vars("${MIGSQL_TEST_SURELY_MISSING}").is_err());
        assert!(expand_env_vars("${UNTERMINATED").is_err());
        assert!(expand_env_vars("${}").is_err());
    }
}
