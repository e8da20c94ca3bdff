mod check;
mod cli;
mod config;
mod init;
mod new;
mod plan;
mod render;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Init(args) => init::run(args),
        cli::Command::New(args) => new::run(args),
        cli::Command::Render(args) => render::run(args),
        cli::Command::Check(args) => check::run(args),
    }
}
