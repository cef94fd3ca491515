use std::{fs::File, io, sync::Arc, time::Duration};

use clap::Parser;
use engine::{
    CancelCaseCmd, Case, CaseCanceled, CreateCaseCmd, Engine, EngineError, HttpNotifier,
    LedgerQuery, NewUnit, NewUser, Page, SortOrder, StatusUpdate, UpdateCaseStatusCmd,
};
use migration::{Migrator, MigratorTrait};

use crate::{
    cli::{CaseCommand, Cli, Command, HistoryArgs, UnitCommand, UserCommand},
    error::{AppError, Result},
    settings::{Database, Settings},
};

mod cli;
mod error;
mod export;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(path) = &cli.database {
        settings.database = Database::Sqlite(path.clone());
    }
    if let Some(level) = &cli.level {
        settings.app.level = level.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "credit_ledger={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(io::stderr)
        .init();

    let database = sea_orm::Database::connect(settings.database.url()).await?;
    Migrator::up(&database, None).await?;

    let mut builder = Engine::builder()
        .database(database)
        .low_credit_threshold(settings.engine.low_credit_threshold);
    match &settings.downstream {
        Some(downstream) => {
            tracing::info!(base_url = %downstream.base_url, "downstream notifier configured");
            builder = builder.notifier(Arc::new(HttpNotifier::new(
                downstream.base_url.clone(),
                downstream.auth_token.clone(),
                Duration::from_secs(downstream.timeout_secs),
            )?));
        }
        None => tracing::info!("no downstream configured; remote calls are skipped"),
    }
    let engine = builder.build().await?;

    run(&engine, cli.command).await
}

async fn run(engine: &Engine, command: Command) -> Result<()> {
    match command {
        Command::Balance => println!("{}", engine.balance().await?),
        Command::Allocate { quantity } => {
            let change = engine.allocate(quantity).await?;
            println!("entry {} balance {}", change.entry_id, change.balance);
        }
        Command::Revoke { quantity } => {
            let change = engine.revoke(quantity).await?;
            println!("entry {} balance {}", change.entry_id, change.balance);
        }
        Command::History(args) => history(engine, args).await?,
        Command::Case(case) => match case.command {
            CaseCommand::Create { unit, owner } => {
                let owner = user_id(engine, &owner).await?;
                let created = engine.create_case(CreateCaseCmd::new(unit, owner)).await?;
                print_case(&created.case);
                println!("balance {}", created.balance);
                if !created.completed() {
                    println!("downstream registration failed: {:?}", created.remote);
                }
            }
            CaseCommand::Cancel { id, requestor } => {
                let cmd = match requestor {
                    Some(employee_id) => {
                        CancelCaseCmd::by_user(id, user_id(engine, &employee_id).await?)
                    }
                    None => CancelCaseCmd::by_system(id),
                };
                print_canceled(&engine.cancel_case(cmd).await?);
            }
            CaseCommand::Status {
                unit,
                status,
                requestor,
            } => {
                let mut cmd = UpdateCaseStatusCmd::new(unit, status);
                if let Some(employee_id) = requestor {
                    cmd = cmd.requestor(user_id(engine, &employee_id).await?);
                }
                match engine.update_case_status(cmd).await? {
                    StatusUpdate::Updated(case) => print_case(&case),
                    StatusUpdate::Canceled(canceled) => print_canceled(&canceled),
                }
            }
            CaseCommand::Show { unit } => match engine.case_by_unit_key(&unit).await? {
                Some(case) => print_case(&case),
                None => return Err(EngineError::NotFound(format!("case for unit {unit}")).into()),
            },
        },
        Command::User(user) => match user.command {
            UserCommand::Add {
                employee_id,
                name,
                email,
                house,
            } => {
                let mut new_user = NewUser::new(employee_id, name);
                if let Some(email) = email {
                    new_user = new_user.email(email);
                }
                if house {
                    new_user = new_user.house();
                }
                let user = engine.register_user(new_user).await?;
                println!("user {} ({})", user.id, user.employee_id);
            }
        },
        Command::Unit(unit) => match unit.command {
            UnitCommand::Add { key, payload, file } => {
                let payload: serde_json::Value = serde_json::from_str(&payload)?;
                let mut new_unit = NewUnit::new(key, payload);
                if let Some(file) = file {
                    new_unit = new_unit.file_path(file);
                }
                let unit = engine.register_unit(new_unit).await?;
                println!("unit {}", unit.key);
            }
        },
        Command::Notifications(args) => {
            let user = user_id(engine, &args.employee_id).await?;
            let (notifications, total) = engine
                .notifications(user, Page::new(args.page, args.limit))
                .await?;
            for n in &notifications {
                println!(
                    "{}\t{}\t{}\t{}",
                    n.created_at.format("%Y-%m-%d %H:%M:%S"),
                    n.category.as_str(),
                    if n.read { "read" } else { "new" },
                    n.message
                );
            }
            println!("{} of {total}", notifications.len());
        }
    }
    Ok(())
}

async fn history(engine: &Engine, args: HistoryArgs) -> Result<()> {
    let mut query = LedgerQuery::new().order(if args.asc {
        SortOrder::Asc
    } else {
        SortOrder::Desc
    });
    for category in args.category {
        query = query.category(category);
    }
    if let Some(employee_id) = args.employee_id {
        query = query.employee_id(employee_id);
    }
    if let Some(name) = args.name {
        query = query.display_name(name);
    }
    if let Some(page) = args.page {
        query = query.page(Page::new(page, args.limit));
    }

    let (rows, total) = engine.credit_history(&query).await?;
    if args.csv {
        match &args.output {
            Some(path) => export::write_csv(&rows, File::create(path)?)?,
            None => export::write_csv(&rows, io::stdout().lock())?,
        }
        tracing::info!(rows = rows.len(), total, "history exported");
        return Ok(());
    }

    for row in &rows {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{:+}\t{}",
            row.entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            row.entry.category.label(),
            row.entry.related_case_key.as_deref().unwrap_or("-"),
            row.entry.employee_id,
            row.entry.display_name,
            row.entry.quantity,
            row.balance_after
        );
    }
    println!("{} of {total}", rows.len());
    Ok(())
}

async fn user_id(engine: &Engine, employee_id: &str) -> Result<i32> {
    engine
        .user_by_employee_id(employee_id)
        .await?
        .map(|user| user.id)
        .ok_or_else(|| AppError::from(EngineError::NotFound(format!("user {employee_id}"))))
}

fn print_case(case: &Case) {
    println!("case {} unit {} status {}", case.id, case.unit_key, case.status);
}

fn print_canceled(canceled: &CaseCanceled) {
    print_case(&canceled.case);
    println!(
        "balance {} file {:?} downstream {:?}",
        canceled.balance, canceled.file_cleanup, canceled.remote
    );
}
