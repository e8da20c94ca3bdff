use crate::cli::RenderArgs;
use crate::config::{OutputFormat, ProjectConfig};
use crate::plan::{Plan, plan_paths};
use anyhow::Context;
use migsql::{GeneratedSql, Migration};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct RenderedPlan {
    plan: String,
    description: Option<String>,
    statements: Vec<GeneratedSql>,
}

impl RenderedPlan {
    fn new(path: &Path, m: Migration) -> Self {
        Self {
            plan: path.display().to_string(),
            description: m.description().map(str::to_string),
            statements: m.into_statements(),
        }
    }
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(&args.config)?;
    let format = args.format.unwrap_or(project.file.output.format);
    let paths = plan_paths(args.plans, &project.migrations_dir())?;

    let mut rendered = Vec::with_capacity(paths.len());
    for path in &paths {
        let m = Plan::load(path)?
            .into_migration(project.file.ddl.clone())
            .with_context(|| format!("failed to build {}", path.display()))?;
        rendered.push(RenderedPlan::new(path, m));
    }

    match format {
        OutputFormat::Sql => print!("{}", to_sql_script(&rendered)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rendered).context("failed to encode json")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn to_sql_script(plans: &[RenderedPlan]) -> String {
    let mut out = String::new();
    for plan in plans {
        out.push_str(&format!("-- plan: {}\n", plan.plan));
        if let Some(description) = &plan.description {
            out.push_str(&format!("-- {description}\n"));
        }
        for unit in &plan.statements {
            out.push_str(&unit.sql);
            out.push_str(";\n");
            if !unit.params.is_empty() {
                out.push_str(&format!("-- params: {}\n", unit.inline_params()));
            }
        }
        out.push('\n');
    }
    out
}
