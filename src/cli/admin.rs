use anyhow::{bail, Result};
use chrono::TimeZone;
use clap::{Subcommand, ValueEnum};
use tracing::info;

use crate::{api::WorkdayApi, tracker::entities::Role};

use super::output::{render_all_workdays, render_users};

/// Roles an administrator can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    User,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::User => Role::User,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    #[command(about = "Register a new user")]
    Register {
        #[arg(long)]
        dni: String,
        #[arg(long, env = "WORKCLOCK_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
    },
    #[command(about = "List registered users")]
    Users,
    #[command(about = "Show workdays of every user")]
    Workdays {
        #[arg(long, help = "Only show workdays of this DNI")]
        dni: Option<String>,
    },
}

/// Runs an administration command and returns what should be printed.
pub async fn process_admin_command<Tz: TimeZone>(
    api: &dyn WorkdayApi,
    command: AdminCommand,
    tz: &Tz,
) -> Result<String>
where
    Tz::Offset: std::fmt::Display,
{
    match command {
        AdminCommand::Register {
            dni,
            password,
            role,
        } => {
            let dni = dni.trim();
            let password = password.trim();
            if dni.is_empty() || password.is_empty() {
                bail!("DNI and password are required");
            }
            let role = Role::from(role);
            let message = api.register_user(dni, password, &role).await?;
            info!("Registered {dni} as {role}");
            Ok(format!("{message}\n"))
        }
        AdminCommand::Users => Ok(render_users(&api.list_users().await?)),
        AdminCommand::Workdays { dni } => {
            let mut workdays = api.all_workdays().await?;
            let filter = dni.as_deref().map(str::trim).filter(|v| !v.is_empty());
            if let Some(filter) = filter {
                workdays.retain(|v| v.user_dni.as_deref() == Some(filter));
                if workdays.is_empty() {
                    return Ok(format!("No workdays for DNI: {filter}\n"));
                }
            }
            if workdays.is_empty() {
                return Ok("No workdays recorded.\n".into());
            }
            Ok(render_all_workdays(&workdays, tz))
        }
    }
}
