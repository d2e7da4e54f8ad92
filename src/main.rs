use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use statement_mailer::config::{Config, MailCredentials};
use statement_mailer::delivery::{DeliveryOptions, DeliveryPipeline, SmtpMailer};
use statement_mailer::ledger::{SqlStatusLedger, StatusLedger, import_customers};
use statement_mailer::model::{DeliveryStatus, ReportingPeriod};
use statement_mailer::settings::{Authentication, ConnectionProfile, DatabaseDriver, SettingsStore};
use statement_mailer::source::{SqlCustomerSource, SqlRowSource, load_statement};
use statement_mailer::statement::{RendererConfig, StatementRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Renders bank statements and mails them to customers.
#[derive(Parser)]
#[command(name = "statement-mailer", version, about)]
struct Cli {
    /// Configuration file (extension optional). Defaults to config/default.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one statement to a PDF file.
    Render {
        #[arg(long)]
        account: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        logo: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Mail statements to every pending customer.
    Send,
    /// Manage database connection profiles.
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Show or change mailing-job settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Inspect and re-queue customers in the status ledger.
    Customers {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Print delivery counts per status.
    Stats,
}

impl Command {
    fn writes_settings(&self) -> bool {
        match self {
            Command::Profiles { action } => !matches!(action, ProfileAction::List),
            Command::Settings { action } => !matches!(action, SettingsAction::Show),
            _ => false,
        }
    }
}

#[derive(Subcommand)]
enum ProfileAction {
    List,
    Add(ProfileArgs),
    Remove { name: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum DriverArg {
    Postgres,
    Sqlite,
}

#[derive(Args)]
struct ProfileArgs {
    name: String,
    #[arg(long, value_enum)]
    driver: DriverArg,
    /// host[:port], or the database file for sqlite.
    #[arg(long)]
    instance: String,
    #[arg(long, default_value = "")]
    database: String,
    /// SQL login; omit for integrated authentication.
    #[arg(long, requires = "password")]
    username: Option<String>,
    #[arg(long, env = "PROFILE_PASSWORD", requires = "username")]
    password: Option<String>,
    /// Customer table read by `customers fetch`. Defaults to `customers`.
    #[arg(long)]
    table: Option<String>,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Pause,
    Resume,
    BatchSize { size: usize },
}

#[derive(Subcommand)]
enum CustomerAction {
    List {
        #[arg(long)]
        status: Option<DeliveryStatus>,
        /// Substring of the short name or customer id, any case.
        #[arg(long)]
        search: Option<String>,
    },
    /// Import customers from a profile's customer table and queue them all.
    Fetch {
        #[arg(long)]
        profile: String,
    },
    /// Change a customer's contact details or status.
    #[command(group = clap::ArgGroup::new("change").required(true).multiple(true))]
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long, group = "change")]
        email: Option<String>,
        #[arg(long, group = "change")]
        phone: Option<String>,
        #[arg(long, group = "change")]
        status: Option<DeliveryStatus>,
    },
    #[command(group = clap::ArgGroup::new("target").required(true))]
    Requeue {
        #[arg(long, group = "target")]
        id: Option<i64>,
        #[arg(long, group = "target")]
        all_failed: bool,
    },
}

fn connection_url(
    url: &Option<String>,
    profile: &Option<String>,
    settings: &SettingsStore,
) -> statement_mailer::Result<Option<String>> {
    match profile {
        Some(name) => Ok(Some(settings.profile(name)?.connection_url()?)),
        None => Ok(url.clone()),
    }
}

async fn open_ledger(config: &Config, settings: &SettingsStore) -> anyhow::Result<SqlStatusLedger> {
    let Some(url) = connection_url(&config.ledger.url, &config.ledger.profile, settings)? else {
        bail!("no ledger database configured (ledger.url or ledger.profile)");
    };
    let timeout = Duration::from_secs(config.ledger.acquire_timeout_secs);
    let ledger = SqlStatusLedger::connect(&url, timeout)
        .await
        .context("connecting to the status ledger")?;
    ledger.run_migrations().await?;
    Ok(ledger)
}

async fn open_source(config: &Config, settings: &SettingsStore) -> anyhow::Result<SqlRowSource> {
    let Some(url) = connection_url(&config.source.url, &config.source.profile, settings)? else {
        bail!("no row source configured (source.url or source.profile)");
    };
    let timeout = Duration::from_secs(config.source.acquire_timeout_secs);
    SqlRowSource::connect(&url, config.source.query.clone(), timeout)
        .await
        .context("connecting to the row source")
}

fn print_settings(settings: &SettingsStore) {
    let email = settings.email_settings();
    println!("Settings file: {}", settings.path().display());
    println!("Paused:        {}", email.paused);
    println!("Batch size:    {}", email.batch_size);
    println!("Profiles:      {}", settings.profiles().len());
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;
    let mut settings = if cli.command.writes_settings() {
        SettingsStore::load(&config.settings.path)?
    } else {
        SettingsStore::open(&config.settings.path)?
    };

    match cli.command {
        Command::Render {
            account,
            start,
            end,
            logo,
            out_dir,
        } => {
            if end < start {
                bail!("--end {} is before --start {}", end, start);
            }
            let period = ReportingPeriod::new(start, end);
            let source = open_source(&config, &settings).await?;
            let dataset = load_statement(&source, &account, &period).await?;
            if dataset.is_empty() {
                bail!("no data retrieved for account {}; no statement generated", account);
            }
            let logo = logo.or_else(|| config.statement.logo_path.clone());
            let renderer = StatementRenderer::new(RendererConfig::default().with_logo(logo));
            let dir = out_dir.unwrap_or_else(|| config.statement.work_dir.clone());
            let path = renderer.write_statement(&dataset, &account, &period, &dir)?;
            println!("Bank statement has been saved as {}", path.display());
        }
        Command::Send => {
            if settings.email_settings().paused {
                println!("Email delivery is paused.");
                return Ok(());
            }
            let credentials = MailCredentials::from_env()?;
            let ledger = open_ledger(&config, &settings).await?;
            let source = open_source(&config, &settings).await?;
            let mailer = SmtpMailer::new(&config.smtp, &credentials)?;
            let renderer = StatementRenderer::new(
                RendererConfig::default().with_logo(config.statement.logo_path.clone()),
            );
            let options = DeliveryOptions {
                period: ReportingPeriod::new(
                    config.statement.period_start,
                    config.statement.period_end,
                ),
                work_dir: config.statement.work_dir.clone(),
                subject: config.statement.subject.clone(),
                body_template: config.statement.body_template.clone(),
            };
            let pipeline = DeliveryPipeline::new(
                Arc::new(source),
                Arc::new(ledger),
                Arc::new(mailer),
                Arc::new(renderer),
                options,
            )?;
            let summary = pipeline.run(settings.email_settings()).await?;
            if summary.paused {
                println!("Email delivery is paused.");
            } else {
                println!(
                    "Processed {} customers: {} sent, {} failed",
                    summary.processed, summary.sent, summary.failed
                );
            }
        }
        Command::Profiles { action } => match action {
            ProfileAction::List => {
                for profile in settings.profiles() {
                    let method = match profile.authentication {
                        Authentication::Sql { .. } => "sql",
                        Authentication::Integrated => "integrated",
                    };
                    println!(
                        "{:<16} {:<9} {:<28} {:<16} {}",
                        profile.name,
                        format!("{:?}", profile.driver).to_lowercase(),
                        profile.instance,
                        profile.database_name,
                        method
                    );
                }
            }
            ProfileAction::Add(args) => {
                let authentication = match (args.username, args.password) {
                    (Some(username), Some(password)) => Authentication::Sql { username, password },
                    _ => Authentication::Integrated,
                };
                let driver = match args.driver {
                    DriverArg::Postgres => DatabaseDriver::Postgres,
                    DriverArg::Sqlite => DatabaseDriver::Sqlite,
                };
                settings.add_profile(ConnectionProfile {
                    name: args.name.clone(),
                    driver,
                    instance: args.instance,
                    database_name: args.database,
                    authentication,
                    table_name: args.table,
                })?;
                println!("Added profile {}", args.name);
            }
            ProfileAction::Remove { name } => {
                settings.remove_profile(&name)?;
                println!("Removed profile {}", name);
            }
        },
        Command::Settings { action } => {
            match action {
                SettingsAction::Show => {}
                SettingsAction::Pause => settings.set_paused(true)?,
                SettingsAction::Resume => settings.set_paused(false)?,
                SettingsAction::BatchSize { size } => settings.set_batch_size(size)?,
            }
            print_settings(&settings);
        }
        Command::Customers { action } => {
            let ledger = open_ledger(&config, &settings).await?;
            match action {
                CustomerAction::List { status, search } => {
                    let customers = match &search {
                        Some(term) => ledger
                            .search(term)
                            .await?
                            .into_iter()
                            .filter(|c| status.is_none_or(|s| c.status == s))
                            .collect(),
                        None => {
                            let statuses = match status {
                                Some(status) => vec![status],
                                None => vec![
                                    DeliveryStatus::NotYet,
                                    DeliveryStatus::Sent,
                                    DeliveryStatus::Failed,
                                ],
                            };
                            let mut customers = Vec::new();
                            for status in statuses {
                                customers.extend(ledger.customers_with_status(status, None).await?);
                            }
                            customers
                        }
                    };
                    for customer in customers {
                        println!(
                            "{:>8} {:<12} {:<28} {:<32} {:<16} {}",
                            customer.recid,
                            customer.customer_id,
                            customer.short_name,
                            customer.email.as_deref().unwrap_or("-"),
                            customer.account,
                            customer.status
                        );
                    }
                }
                CustomerAction::Fetch { profile } => {
                    let profile = settings.profile(&profile)?;
                    let timeout = Duration::from_secs(config.source.acquire_timeout_secs);
                    let source = SqlCustomerSource::connect(
                        &profile.connection_url()?,
                        profile.customer_table(),
                        timeout,
                    )
                    .await
                    .with_context(|| format!("connecting to profile {}", profile.name))?;
                    let customers = source.fetch_customers().await?;
                    let imported = import_customers(&ledger, &customers).await?;
                    println!(
                        "Imported {} customers from {}; all queued for delivery",
                        imported,
                        profile.customer_table()
                    );
                }
                CustomerAction::Edit {
                    id,
                    email,
                    phone,
                    status,
                } => {
                    if email.is_some() || phone.is_some() {
                        ledger
                            .update_contact(id, email.as_deref(), phone.as_deref())
                            .await?;
                    }
                    if let Some(status) = status {
                        ledger.set_status(id, status).await?;
                    }
                    println!("Customer {} updated", id);
                }
                CustomerAction::Requeue { id, all_failed } => {
                    if all_failed {
                        let moved = ledger.requeue_failed().await?;
                        println!("Re-queued {} failed customers", moved);
                    } else if let Some(id) = id {
                        if ledger.requeue(id).await? {
                            println!("Customer {} re-queued", id);
                        } else {
                            println!("Customer {} is not in the failed state", id);
                        }
                    }
                }
            }
        }
        Command::Stats => {
            let ledger = open_ledger(&config, &settings).await?;
            let stats = ledger.counts().await?;
            println!("Remaining: {}", stats.remaining);
            println!("Sent:      {}", stats.sent);
            println!("Failed:    {}", stats.failed);
            println!("Total:     {}", stats.total());
        }
    }

    Ok(())
}
