//! CVT console binary entrypoint.
//!
//! This is the main entry point for the `cvt` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cvt_cli::cli::{AuthCommands, Cli, Commands};
use cvt_cli::commands::{
    AuthCommand, ContainerCommand, Context, DashboardCommand, GuideCommand, MemberCommand,
    SoftwareCommand, SystemCommand, TeamCommand, UserCommand,
};
use cvt_cli::output::OutputFormat;
use cvt_core::i18n;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), cvt_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let ctx = Context::connect(&cli)?;
    let mut stdout = io::stdout().lock();

    let signing_in = matches!(
        cli.command,
        Commands::Auth {
            command: AuthCommands::Login { .. } | AuthCommands::Register { .. }
        }
    );
    if !signing_in {
        ctx.session().refresh().await;
    }

    let requested = cli.command.route();
    if ctx.session().guard(requested) != requested {
        warn!(route = %requested, "page needs a staff role");
        eprintln!(
            "{}: {}",
            i18n::nav_label(cli.lang, requested),
            i18n::locked_hint(cli.lang)
        );
        let cmd = DashboardCommand::new(&ctx);
        return cmd.execute(&mut stdout, &format).await;
    }

    match cli.command {
        Commands::Auth { command } => {
            let cmd = AuthCommand::new(&ctx);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Dashboard => {
            let cmd = DashboardCommand::new(&ctx);
            cmd.execute(&mut stdout, &format).await?;
        }
        Commands::Member { command } => {
            let cmd = MemberCommand::new(&ctx);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Team { command } => {
            let cmd = TeamCommand::new(&ctx);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Software { command } => {
            let cmd = SoftwareCommand::new(&ctx);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::System { command } => {
            let cmd = SystemCommand::new(&ctx);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::User { command } => {
            let cmd = UserCommand::new(&ctx);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Guide { command } => {
            let cmd = GuideCommand::new(&ctx);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Container { command } => {
            let cmd = ContainerCommand::new(&ctx);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvt_cli::cli::{ContainerCommands, Format, MemberCommands};

    fn offline(args: &[&str]) -> Cli {
        let dir = std::env::temp_dir().join(format!("cvt-main-test-{}", std::process::id()));
        let session = dir.join("session.json");
        let mut full = vec!["cvt", "--api-url", "http://127.0.0.1:1", "--session-file"];
        let session = session.to_string_lossy().into_owned();
        full.push(&session);
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn cli_parses_dashboard() {
        let cli = Cli::parse_from(["cvt", "dashboard"]);
        assert!(matches!(cli.command, Commands::Dashboard));
    }

    #[test]
    fn cli_parses_member_list_alias() {
        let cli = Cli::parse_from(["cvt", "member", "ls"]);
        assert!(matches!(
            cli.command,
            Commands::Member {
                command: MemberCommands::List
            }
        ));
    }

    #[test]
    fn cli_parses_container_logs_follow() {
        let cli = Cli::parse_from(["cvt", "-f", "json", "container", "logs", "api", "-F"]);
        assert_eq!(cli.format, Format::Json);
        match cli.command {
            Commands::Container {
                command: ContainerCommands::Logs(args),
            } => {
                assert_eq!(args.id, "api");
                assert!(args.follow);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn whoami_without_server_fails() {
        let result = run(offline(&["auth", "whoami"])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn staff_page_without_session_falls_back_to_dashboard() {
        let result = run(offline(&["container", "ls"])).await;
        assert!(result.is_ok());
    }
}
