use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::info;

use crate::admin::AdminConsole;
use crate::availability::TimeRange;
use crate::booked::{BookedView, SortKey, SortOrder};
use crate::booking::{CancelOutcome, CancellationFlow, ReservationSubmitter};
use crate::client::HttpDashboardApi;
use crate::config::Config;
use crate::constants::Constants;
use crate::history;
use crate::jobs::RefreshWorker;
use crate::models::{DeviceIpUpdate, NewUser, UserRole, UserUpdate};
use crate::render::DashboardRenderer;
use crate::store::DashboardStore;
use crate::traits::{Clock, Confirm, DashboardApi, SystemClock};

/// Device reservation dashboard
#[derive(Debug, Parser)]
#[command(name = "rackdesk", version, about, long_about = None)]
pub struct Cli {
    /// Role of the logged-in user (gates admin actions locally)
    #[arg(long, default_value = "user")]
    pub role: String,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show device availability for a time range
    Availability {
        #[command(flatten)]
        range: RangeArgs,
        /// Only show devices whose id contains this text
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// Book a device for a time range
    Book {
        device_id: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// List booked devices
    Booked(BookedArgs),
    /// Cancel a reservation (admin)
    Cancel { reservation_id: i64 },
    /// Keep the booked-devices list up to date
    Watch(BookedArgs),
    /// Device management
    Device {
        #[command(subcommand)]
        command: DeviceCommand,
    },
    /// User management
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Usage history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// Time range, either explicit or relative to now
#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Start, `YYYY-MM-DD HH:MM` in the display timezone or RFC 3339
    #[arg(long)]
    pub start: Option<String>,
    /// End, same formats as --start
    #[arg(long)]
    pub end: Option<String>,
    /// Start this many minutes from now instead of --start/--end
    #[arg(long = "in", value_name = "MINUTES")]
    pub in_minutes: Option<i64>,
    /// Length of a relative booking in minutes
    #[arg(long, default_value_t = Constants::DEFAULT_BOOKING_MINUTES)]
    pub minutes: i64,
}

impl RangeArgs {
    fn resolve(&self, config: &Config, clock: &dyn Clock) -> Result<TimeRange> {
        let now = clock.now_utc();
        let range = match (self.in_minutes, &self.start, &self.end) {
            (Some(offset), None, None) => {
                TimeRange::starting_in(now, offset, self.minutes)?
            }
            (None, start, end) => TimeRange::validate(
                start.as_deref().unwrap_or_default(),
                end.as_deref().unwrap_or_default(),
                now,
                config.display_timezone,
            )?,
            _ => return Err(anyhow!("Use either --in or --start/--end, not both")),
        };
        Ok(range)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortColumn {
    Device,
    User,
    Start,
    End,
    Status,
    Duration,
}

impl From<SortColumn> for SortKey {
    fn from(column: SortColumn) -> Self {
        match column {
            SortColumn::Device => SortKey::Device,
            SortColumn::User => SortKey::User,
            SortColumn::Start => SortKey::Start,
            SortColumn::End => SortKey::End,
            SortColumn::Status => SortKey::Status,
            SortColumn::Duration => SortKey::Duration,
        }
    }
}

#[derive(Debug, Args)]
pub struct BookedArgs {
    /// Only show devices whose id contains this text
    #[arg(short, long, default_value = "")]
    pub filter: String,
    /// Free-text search across all columns
    #[arg(short, long, default_value = "")]
    pub search: String,
    #[arg(long, value_enum)]
    pub sort: Option<SortColumn>,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page
    #[arg(long, default_value_t = Constants::BOOKED_ROWS_PER_PAGE)]
    pub per_page: usize,
}

impl BookedArgs {
    pub fn apply(&self, view: &mut BookedView) {
        view.set_per_page(self.per_page);
        view.set_filter(&self.filter);
        view.set_search(&self.search);
        match self.sort {
            Some(column) => {
                let order = if self.desc {
                    SortOrder::Descending
                } else {
                    SortOrder::Ascending
                };
                view.sort_by(column.into(), order);
            }
            None => view.clear_sort(),
        }
        view.go_to(self.page);
    }
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Show a device's IP settings
    Show { device_id: String },
    /// Update IP settings; omitted fields are left unchanged
    Edit {
        device_id: String,
        #[arg(long)]
        pc_ip: Option<String>,
        #[arg(long)]
        rutomatrix_ip: Option<String>,
        #[arg(long)]
        pulse1_ip: Option<String>,
        #[arg(long)]
        ct1_ip: Option<String>,
    },
    /// Delete a device
    Delete { device_id: String },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Add a user
    Add {
        user_name: String,
        #[arg(long, default_value = "")]
        ip: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        #[arg(long, default_value = "user")]
        role: String,
    },
    /// Show a user
    Show { user_id: i64 },
    /// Update a user
    Update {
        user_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        role: Option<String>,
        /// Leave out to keep the current password
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a user
    Delete { user_id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// Show a usage record
    Show { record_id: i64 },
    /// Delete a usage record
    Delete { record_id: i64 },
    /// Delete records older than the retention window
    ClearOld,
    /// Show several records, optionally limited to a date range
    List {
        record_ids: Vec<i64>,
        /// First day (YYYY-MM-DD), inclusive
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

/// Terminal yes/no prompt
pub struct TerminalConfirm {
    assume_yes: bool,
}

impl TerminalConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

impl Cli {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        let api: Arc<dyn DashboardApi> = Arc::new(HttpDashboardApi::from_config(config)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let confirm = TerminalConfirm::new(self.yes);
        // Retry prompts ignore --yes
        let retry = TerminalConfirm::new(false);
        let renderer = DashboardRenderer::new(config.display_timezone);
        let role = UserRole::from(self.role.clone());

        match &self.command {
            Commands::Availability { range, filter } => {
                let range = range.resolve(config, clock.as_ref())?;
                let mut store = DashboardStore::new();
                store.load_with_retry(api.as_ref(), &retry, range).await?;
                store.set_filter(filter);

                println!("{}", renderer.range_header(&range));
                print!("{}", renderer.catalog(store.catalog(), None));
            }
            Commands::Book { device_id, range } => {
                let range = range.resolve(config, clock.as_ref())?;
                let mut store = DashboardStore::new();
                store.load_with_retry(api.as_ref(), &retry, range).await?;
                store.select_device(device_id)?;

                let mut submitter = ReservationSubmitter::new();
                submitter.submit(api.as_ref(), &mut store).await?;
                println!(
                    "{} {}",
                    Constants::AVAILABLE_EMOJI,
                    submitter.last_message().unwrap_or(Constants::MSG_BOOKED)
                );

                let view = load_booked(api.as_ref(), clock.as_ref()).await?;
                print!("{}", renderer.booked_view(&view));
            }
            Commands::Booked(args) => {
                let mut view = load_booked(api.as_ref(), clock.as_ref()).await?;
                args.apply(&mut view);
                print!("{}", renderer.booked_view(&view));
            }
            Commands::Cancel { reservation_id } => {
                let mut view = load_booked(api.as_ref(), clock.as_ref()).await?;
                let flow = CancellationFlow::new(api.as_ref(), clock.as_ref(), &confirm);
                match flow.cancel(&mut view, *reservation_id).await? {
                    CancelOutcome::Cancelled => {
                        println!("{} {}", Constants::AVAILABLE_EMOJI, Constants::MSG_CANCELLED)
                    }
                    CancelOutcome::Declined => println!("Cancelled."),
                }
            }
            Commands::Watch(args) => {
                let mut view = load_booked(api.as_ref(), clock.as_ref()).await?;
                args.apply(&mut view);
                print!("{}", renderer.booked_view(&view));

                let worker = RefreshWorker::new(api.clone(), clock.clone());
                tokio::select! {
                    result = worker.run(&mut view, |view| print!("{}", renderer.booked_view(view))) => result?,
                    _ = tokio::signal::ctrl_c() => info!("Received shutdown signal"),
                }
            }
            Commands::Device { command } => {
                let console = AdminConsole::new(api.as_ref(), role);
                execute_device(&console, &renderer, &confirm, command).await?;
            }
            Commands::User { command } => {
                let console = AdminConsole::new(api.as_ref(), role);
                execute_user(&console, &confirm, command).await?;
            }
            Commands::History { command } => {
                execute_history(api.as_ref(), &renderer, &confirm, config, command).await?;
            }
        }

        Ok(())
    }
}

async fn load_booked(api: &dyn DashboardApi, clock: &dyn Clock) -> Result<BookedView> {
    let bookings = api.fetch_booked_devices().await?;
    Ok(BookedView::from_bookings(&bookings, clock.now_utc()))
}

async fn execute_device(
    console: &AdminConsole<'_>,
    renderer: &DashboardRenderer,
    confirm: &dyn Confirm,
    command: &DeviceCommand,
) -> Result<()> {
    match command {
        DeviceCommand::Show { device_id } => {
            let details = console.get_device(device_id).await?;
            print!("{}", renderer.device_details(&details));
        }
        DeviceCommand::Edit {
            device_id,
            pc_ip,
            rutomatrix_ip,
            pulse1_ip,
            ct1_ip,
        } => {
            let update = DeviceIpUpdate {
                pc_ip: pc_ip.clone(),
                rutomatrix_ip: rutomatrix_ip.clone(),
                pulse1_ip: pulse1_ip.clone(),
                ct1_ip: ct1_ip.clone(),
            };
            let response = console.update_device(device_id, &update).await?;
            println!("{}", response.message_or("Device updated successfully!"));
        }
        DeviceCommand::Delete { device_id } => {
            if !confirm.confirm(&format!("Delete device {}?", device_id)) {
                println!("Cancelled.");
                return Ok(());
            }
            let response = console.delete_device(device_id).await?;
            println!("{}", response.message_or("Device deleted successfully!"));
        }
    }
    Ok(())
}

async fn execute_user(console: &AdminConsole<'_>, confirm: &dyn Confirm, command: &UserCommand) -> Result<()> {
    match command {
        UserCommand::Add {
            user_name,
            ip,
            password,
            role,
        } => {
            let password = match password {
                Some(password) => password.clone(),
                None => dialoguer::Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()
                    .map_err(|e| anyhow!("Input error: {}", e))?,
            };
            let user = NewUser {
                user_name: user_name.clone(),
                user_ip: ip.clone(),
                password,
                role: UserRole::from(role.clone()),
            };
            let response = console.add_user(&user).await?;
            println!("{}", response.message_or("User added successfully!"));
        }
        UserCommand::Show { user_id } => {
            let user = console.user_for_edit(*user_id).await?;
            println!(
                "User #{} {} (ip {}, role {})",
                user.id.unwrap_or(*user_id),
                user.user_name,
                user.user_ip.as_deref().unwrap_or(Constants::NOT_AVAILABLE),
                String::from(user.role)
            );
        }
        UserCommand::Update {
            user_id,
            name,
            ip,
            role,
            password,
        } => {
            let update = UserUpdate {
                user_name: name.clone(),
                user_ip: ip.clone(),
                role: role.clone().map(UserRole::from),
                password: password.clone(),
            };
            let response = console.update_user(*user_id, &update).await?;
            println!("{}", response.message_or("User updated successfully!"));
        }
        UserCommand::Delete { user_id } => {
            if !confirm.confirm(&format!("Delete user #{}?", user_id)) {
                println!("Cancelled.");
                return Ok(());
            }
            let response = console.delete_user(*user_id).await?;
            println!("{}", response.message_or("User deleted successfully!"));
        }
    }
    Ok(())
}

async fn execute_history(
    api: &dyn DashboardApi,
    renderer: &DashboardRenderer,
    confirm: &dyn Confirm,
    config: &Config,
    command: &HistoryCommand,
) -> Result<()> {
    match command {
        HistoryCommand::Show { record_id } => {
            let record = history::get_usage_record(api, *record_id).await?;
            print!("{}", renderer.usage_record(&record));
        }
        HistoryCommand::Delete { record_id } => {
            if history::delete_usage_record(api, confirm, *record_id).await? {
                println!("Record deleted successfully");
            } else {
                println!("Cancelled.");
            }
        }
        HistoryCommand::ClearOld => match history::clear_old_records(api, confirm).await? {
            Some(deleted) => println!("Deleted {} old records", deleted),
            None => println!("Cancelled."),
        },
        HistoryCommand::List {
            record_ids,
            from,
            to,
        } => {
            let mut records = Vec::with_capacity(record_ids.len());
            for record_id in record_ids {
                records.push(history::get_usage_record(api, *record_id).await?);
            }
            let shown = history::filter_by_date(&records, *from, *to, config.display_timezone);
            if shown.is_empty() {
                println!("No records in the selected date range.");
            }
            for record in shown {
                print!("{}", renderer.usage_record(record));
            }
        }
    }
    Ok(())
}
