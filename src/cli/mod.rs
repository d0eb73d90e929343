pub mod admin;
pub mod output;
pub mod records;
pub mod watch;
pub mod workday;

use std::{path::PathBuf, sync::Arc};

use admin::{process_admin_command, AdminCommand};
use anyhow::{bail, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use output::{paint_status, render_status};
use records::{export_workdays, records_report, RecordsCommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use watch::{detect_shutdown, LiveClock};
use workday::{apply_action, load_day};

use crate::{
    api::{http::HttpApi, WorkdayApi},
    config::{session::Session, Settings},
    tracker::{reminder::ReminderSchedule, Action, Tracker},
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "workclock", version, long_about = None)]
#[command(about = "Clock in and out of your workday from the terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default $XDG_STATE_HOME/workclock or $HOME/.local/state/workclock"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "WORKCLOCK_SERVER",
        help = "Base url of the workday server"
    )]
    server: Option<String>,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Log in and remember the user for later commands")]
    Login {
        dni: String,
        #[arg(
            long,
            env = "WORKCLOCK_PASSWORD",
            hide_env_values = true,
            help = "Read from standard input when missing"
        )]
        password: Option<String>,
    },
    #[command(about = "Forget the logged in user")]
    Logout,
    #[command(about = "Show the logged in user")]
    Whoami,
    #[command(about = "Show today's workday")]
    Status,
    #[command(about = "Start the workday")]
    Start,
    #[command(about = "Start a break")]
    Break,
    #[command(about = "End the current break")]
    Resume,
    #[command(about = "End the workday")]
    End,
    #[command(about = "Discard today's workday and start over")]
    Reset {
        #[arg(long, help = "Don't ask for confirmation")]
        yes: bool,
    },
    #[command(about = "Live view of today's workday with break reminders")]
    Watch,
    #[command(about = "Show recorded workdays")]
    Records {
        #[command(subcommand)]
        command: RecordsCommand,
    },
    #[command(about = "Export every recorded workday to a CSV file")]
    Export {
        #[arg(long, short, help = "Target file. Defaults to workdays_<dni>.csv")]
        output: Option<PathBuf>,
    },
    #[command(about = "Administration of users and workdays")]
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

/// Server of a command. An explicit flag wins over the server the session was created with,
/// which wins over settings.
fn resolve_server(flag: Option<&str>, session: Option<&Session>, settings: &Settings) -> String {
    let url = flag
        .or(session.map(|v| v.server_url.as_str()))
        .unwrap_or(&settings.server_url);
    url.trim_end_matches('/').to_string()
}

async fn read_line(prompt: &str) -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

fn print_status(tracker: &Tracker, clock: &dyn Clock) {
    let text = render_status(tracker, clock.time(), &Local);
    match text.split_once('\n') {
        Some((headline, rest)) => print!("{}\n{rest}", paint_status(tracker.status(), headline)),
        None => print!("{text}"),
    }
}

struct CliContext {
    app_dir: PathBuf,
    settings: Settings,
    server: Option<String>,
}

impl CliContext {
    fn api(&self, session: Option<&Session>) -> Result<HttpApi> {
        let url = resolve_server(self.server.as_deref(), session, &self.settings);
        Ok(HttpApi::new(&url, self.settings.request_timeout())?)
    }

    fn session(&self) -> Result<(Session, HttpApi)> {
        let session = Session::require(&self.app_dir)?;
        let api = self.api(Some(&session))?;
        Ok((session, api))
    }
}

async fn clock_action(context: &CliContext, action: Action) -> Result<()> {
    let (session, api) = context.session()?;
    let clock = DefaultClock;
    let tracker = apply_action(&api, &session.dni, &clock, action).await?;
    print_status(&tracker, &clock);
    Ok(())
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let context = CliContext {
        settings: Settings::load(&app_dir)?,
        app_dir,
        server: args.server,
    };

    match args.commands {
        Commands::Login { dni, password } => {
            let password = match password {
                Some(v) => v,
                None => read_line("Password: ").await?,
            };
            let dni = dni.trim();
            if dni.is_empty() || password.trim().is_empty() {
                bail!("DNI and password are required");
            }
            let server = resolve_server(context.server.as_deref(), None, &context.settings);
            let api = HttpApi::new(&server, context.settings.request_timeout())?;
            let user = api.login(dni, &password).await?;
            let session = Session::new(&server, user);
            session.save(&context.app_dir)?;
            println!("{}", session.welcome_message());
            Ok(())
        }
        Commands::Logout => {
            if Session::clear(&context.app_dir)? {
                println!("Logged out.");
            } else {
                println!("Not logged in.");
            }
            Ok(())
        }
        Commands::Whoami => {
            let session = Session::require(&context.app_dir)?;
            println!("{} ({}) at {}", session.dni, session.role, session.server_url);
            Ok(())
        }
        Commands::Status => {
            let (session, api) = context.session()?;
            let clock = DefaultClock;
            let tracker = load_day(&api, &session.dni, clock.today()).await?;
            print_status(&tracker, &clock);
            Ok(())
        }
        Commands::Start => clock_action(&context, Action::Start).await,
        Commands::Break => clock_action(&context, Action::StartBreak).await,
        Commands::Resume => clock_action(&context, Action::EndBreak).await,
        Commands::End => clock_action(&context, Action::End).await,
        Commands::Reset { yes } => {
            if !yes {
                let answer = read_line(
                    "Today's record will be deleted and can't be recovered. Continue? [y/N] ",
                )
                .await?;
                if !answer.eq_ignore_ascii_case("y") && !answer.eq_ignore_ascii_case("yes") {
                    println!("Reset cancelled.");
                    return Ok(());
                }
            }
            clock_action(&context, Action::Reset).await
        }
        Commands::Watch => {
            let (session, api) = context.session()?;
            let shutdown = CancellationToken::new();
            tokio::spawn(detect_shutdown(shutdown.clone()));

            let reminders = ReminderSchedule::new(
                context.settings.break_after(),
                context.settings.break_limit(),
            );
            info!("Watching with reminders enabled: {}", reminders.is_enabled());
            LiveClock::new(
                Arc::new(api),
                session.dni,
                Box::new(DefaultClock),
                reminders,
                context.settings.refresh_interval(),
                shutdown,
                std::io::stdout(),
            )
            .run()
            .await?;
            Ok(())
        }
        Commands::Records { command } => {
            let (session, api) = context.session()?;
            let report =
                records_report(&api, &session.dni, &DefaultClock, &command, &Local).await?;
            print!("{report}");
            Ok(())
        }
        Commands::Export { output } => {
            let (session, api) = context.session()?;
            let path = export_workdays(&api, &session.dni, output, &Local).await?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        Commands::Admin { command } => {
            let (session, api) = context.session()?;
            session.require_admin()?;
            let out = process_admin_command(&api, command, &Local).await?;
            print!("{out}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use crate::{
        config::{session::Session, Settings},
        tracker::entities::Role,
    };

    use super::{
        admin::{AdminCommand, RoleArg},
        resolve_server, Args, Commands,
    };

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "workclock",
            "records",
            "week",
            "--date",
            "yesterday",
            "--server",
            "http://example:5000",
        ])
        .unwrap();
        assert_eq!(args.server.as_deref(), Some("http://example:5000"));
        assert!(matches!(args.commands, Commands::Records { .. }));
    }

    #[test]
    fn register_accepts_only_known_roles() {
        let parse = |role: &str| {
            Args::try_parse_from([
                "workclock",
                "admin",
                "register",
                "--dni",
                "87654321B",
                "--password",
                "secret",
                "--role",
                role,
            ])
        };

        assert!(parse("auditor").is_err());
        let args = parse("admin").unwrap();
        assert!(matches!(
            args.commands,
            Commands::Admin {
                command: AdminCommand::Register {
                    role: RoleArg::Admin,
                    ..
                }
            }
        ));
    }

    #[test]
    fn server_precedence() {
        let settings = Settings {
            server_url: "http://settings:5000/".into(),
            ..Default::default()
        };
        let session = Session {
            server_url: "http://session:5000".into(),
            dni: "12345678A".into(),
            role: Role::User,
        };

        assert_eq!(
            resolve_server(Some("http://flag:5000"), Some(&session), &settings),
            "http://flag:5000"
        );
        assert_eq!(
            resolve_server(None, Some(&session), &settings),
            "http://session:5000"
        );
        assert_eq!(resolve_server(None, None, &settings), "http://settings:5000");
    }
}
