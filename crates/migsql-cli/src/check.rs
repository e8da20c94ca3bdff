use crate::cli::CheckArgs;
use crate::config::ProjectConfig;
use crate::plan::{Plan, plan_paths};
use colored::Colorize;

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(&args.config)?;
    let paths = plan_paths(args.plans, &project.migrations_dir())?;

    let mut failed = 0usize;
    for path in &paths {
        let result = Plan::load(path).and_then(|plan| plan.into_migration(project.file.ddl.clone()));
        match result {
            Ok(m) => println!(
                "{} {} ({} statement{})",
                "✓".green().bold(),
                path.display(),
                m.len(),
                if m.len() == 1 { "" } else { "s" }
            ),
            Err(e) => {
                failed += 1;
                println!("{} {}", "✗".red().bold(), path.display());
                println!("  {}: {e:#}", "error".red());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} plan(s) failed", paths.len());
    }
    println!("{} {} plan(s) ok", "✓".green().bold(), paths.len());
    Ok(())
}
