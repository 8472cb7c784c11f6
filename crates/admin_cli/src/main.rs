use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use migration::MigratorTrait;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use ledger::{Caller, Ledger, ReconcileMode, Role, hash_password, users};

#[derive(Parser, Debug)]
#[command(name = "savingant_admin")]
#[command(about = "Admin utilities for Savingant (bootstrap accounts, repair balances)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./savingant.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    /// Recompute every owner's running balances from their history.
    Reconcile(ReconcileArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    /// Grant the admin role instead of member.
    #[arg(long)]
    admin: bool,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    /// Also rewrite over-withdrawals down to the balance that was available.
    /// Without this flag anomalies are only counted and clamped.
    #[arg(long)]
    truncate: bool,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if users::Entity::find()
                .filter(users::Column::Username.eq(args.username.as_str()))
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }

            let password = prompt_password_twice()?;
            let role = if args.admin { Role::Admin } else { Role::Member };

            let user = users::ActiveModel {
                username: Set(args.username.clone()),
                password: Set(hash_password(&password)),
                role: Set(role.as_str().to_string()),
                is_active: Set(true),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            };
            users::Entity::insert(user).exec(&db).await?;

            println!("created {} user: {}", role.as_str(), args.username);
        }
        Command::User(User {
            command: UserCommand::List,
        }) => {
            let accounts = users::Entity::find()
                .order_by_asc(users::Column::Id)
                .all(&db)
                .await?;
            for account in accounts {
                let state = if account.is_active { "active" } else { "disabled" };
                println!(
                    "{:>6}  {:<24}  {:<6}  {state}",
                    account.id, account.username, account.role
                );
            }
        }
        Command::Reconcile(args) => {
            let mode = if args.truncate {
                ReconcileMode::TruncateAnomalies
            } else {
                ReconcileMode::ClampOnly
            };

            let ledger = Ledger::builder().database(db.clone()).build();
            let report = ledger
                .reconcile(&Caller::new(0, Role::Admin), mode)
                .await?;
            println!(
                "reconciled {} owners: {} anomalies, {} amounts truncated",
                report.owners_processed, report.anomalies_found, report.amounts_truncated
            );
        }
    }

    Ok(())
}
