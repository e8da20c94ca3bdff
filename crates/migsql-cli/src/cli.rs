use crate::config::OutputFormat;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Init,
    New,
    Render,
    Check,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Init(InitArgs),
    New(NewArgs),
    Render(RenderArgs),
    Check(CheckArgs),
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
}

#[derive(Debug, Clone)]
pub struct NewArgs {
    pub config: PathBuf,
    pub dir: Option<PathBuf>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub config: PathBuf,
    pub format: Option<OutputFormat>,
    pub plans: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub config: PathBuf,
    pub plans: Vec<PathBuf>,
}

pub const DEFAULT_CONFIG: &str = "migsql.toml";

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    let rest = it.map(|s| s.as_str());
    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "init" => parse_init(rest),
        "new" => parse_new(rest),
        "render" => parse_render(rest),
        "check" => parse_check(rest),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Consume `--flag value` / `--flag=value`; `Ok(None)` if `token` is not `flag`.
fn flag_value<'a>(
    flag: &str,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<&'a str>> {
    if token == flag {
        let Some(v) = it.next() else {
            anyhow::bail!("{flag} requires a value");
        };
        return Ok(Some(v));
    }
    match token.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
        Some(v) => Ok(Some(v)),
        None => Ok(None),
    }
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Init));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
            continue;
        }
        anyhow::bail!("unknown argument: {token}");
    }

    Ok(Command::Init(InitArgs { config }))
}

fn parse_new<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut dir: Option<PathBuf> = None;
    let mut name: Option<String> = None;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::New));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
            continue;
        }
        if let Some(v) = flag_value("--dir", token, &mut it)? {
            dir = Some(PathBuf::from(v));
            continue;
        }
        if token.starts_with('-') {
            anyhow::bail!("unknown argument: {token}");
        }
        if name.is_some() {
            anyhow::bail!("unexpected argument: {token}");
        }
        name = Some(token.to_string());
    }

    let Some(name) = name else {
        anyhow::bail!("migration name is required: migsql new <NAME>");
    };

    Ok(Command::New(NewArgs { config, dir, name }))
}

fn parse_render<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut format: Option<OutputFormat> = None;
    let mut plans = Vec::new();

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Render));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
            continue;
        }
        if let Some(v) = flag_value("--format", token, &mut it)? {
            format = Some(OutputFormat::parse(v)?);
            continue;
        }
        if token.starts_with('-') {
            anyhow::bail!("unknown argument: {token}");
        }
        plans.push(PathBuf::from(token));
    }

    Ok(Command::Render(RenderArgs {
        config,
        format,
        plans,
    }))
}

fn parse_check<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut plans = Vec::new();

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            return Ok(Command::Help(HelpTopic::Check));
        }
        if let Some(v) = flag_value("--config", token, &mut it)? {
            config = PathBuf::from(v);
            continue;
        }
        if token.starts_with('-') {
            anyhow::bail!("unknown argument: {token}");
        }
        plans.push(PathBuf::from(token));
    }

    Ok(Command::Check(CheckArgs { config, plans }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
migsql - render migration plans into parameterized MySQL

USAGE:
  migsql <COMMAND> [OPTIONS]

COMMANDS:
  init          Write a default migsql.toml
  new           Create a migration plan file
  render        Print the SQL generated from migration plans
  check         Build migration plans and report errors

Run `migsql <command> --help` for more."
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  migsql init [OPTIONS]

OPTIONS:
  --config <FILE>       Config file to write (default: migsql.toml)
  -h, --help            Print help"
            );
        }
        HelpTopic::New => {
            println!(
                "\
USAGE:
  migsql new <NAME> [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: migsql.toml)
  --dir <DIR>           Override migrations.dir from config
  -h, --help            Print help"
            );
        }
        HelpTopic::Render => {
            println!(
                "\
USAGE:
  migsql render [PLAN...] [OPTIONS]

Renders every plan in migrations.dir when no PLAN is given.

OPTIONS:
  --config <FILE>       Config file path (default: migsql.toml)
  --format <FORMAT>     sql | json (default: output.format from config)
  -h, --help            Print help"
            );
        }
        HelpTopic::Check => {
            println!(
                "\
USAGE:
  migsql check [PLAN...] [OPTIONS]

Checks every plan in migrations.dir when no PLAN is given.

OPTIONS:
  --config <FILE>       Config file path (default: migsql.toml)
  -h, --help            Print help"
            );
        }
    }
}
