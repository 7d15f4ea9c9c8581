use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use medtrack_core::catalog::{import_catalog, load_catalog, search_catalog};
use medtrack_core::profile::{
    clear_all, load_dark_mode, load_user_info, save_dark_mode, save_user_info,
};
use medtrack_core::stock::format_date;
use medtrack_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medtrack")]
#[command(about = "Personal medication schedule and stock tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show medicines due today and tomorrow (default)
    Today {
        /// Show every entry instead of the first few
        #[arg(long)]
        all: bool,
    },

    /// Add a medicine
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        brand: String,

        /// Comma-separated days, e.g. "Monday,Friday" or "Daily"
        #[arg(long, value_delimiter = ',', required = true)]
        days: Vec<String>,

        /// Time of day, HH:MM
        #[arg(long)]
        time: String,

        /// Units taken per intake
        #[arg(long, default_value = "1")]
        amount: String,

        /// Dose per unit
        #[arg(long)]
        weight: String,

        /// mg or mcg
        #[arg(long, default_value = "mg")]
        unit: String,

        /// Units in stock; omit to leave stock untracked
        #[arg(long)]
        stock: Option<String>,

        /// Add with reminders switched off
        #[arg(long)]
        no_notify: bool,
    },

    /// Delete a medicine, keeping a copy in the deletion log
    Remove { id: String },

    /// Adjust stock for a medicine
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },

    /// Show remaining supply per medicine
    Supply {
        #[arg(long, value_enum, default_value_t = SortArg::NameAz)]
        sort: SortArg,

        /// Show the deletion log instead
        #[arg(long)]
        deleted: bool,
    },

    /// Switch reminders for a medicine on or off
    Notify { id: String, state: Toggle },

    /// Change the time of day a medicine is taken
    Time { id: String, time: String },

    /// Schedule and list today's reminders
    Alerts,

    /// Show or edit the user profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show or set dark mode
    DarkMode { state: Option<Toggle> },

    /// Replace the medicine list with sample data
    Sample,

    /// Delete all stored data
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Import or search the medicine catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum StockAction {
    /// Set an absolute stock count
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// Add one unit
    Add { id: String },
    /// Remove one unit
    Take { id: String },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Set {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        photo: Option<String>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Import a pipe-delimited metadata export
    Import { path: PathBuf },
    /// Search imported entries
    Search {
        term: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    NameAz,
    NameZa,
    MostStock,
    LeastStock,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::NameAz => SortOrder::NameAZ,
            SortArg::NameZa => SortOrder::NameZA,
            SortArg::MostStock => SortOrder::MostStock,
            SortArg::LeastStock => SortOrder::LeastStock,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}

type Repository = MedicineRepository<FileStore, TracingScheduler>;

fn main() -> Result<()> {
    // Initialize logging
    medtrack_core::logging::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    let today = cli.date.unwrap_or_else(|| Local::now().date_naive());

    let store = FileStore::new(config.store_dir());
    tracing::debug!("Using store at {:?}, reference date {}", store.dir(), today);
    let command = cli.command.unwrap_or(Commands::Today { all: false });

    match command {
        Commands::Today { all } => {
            let repo = open_repo(store, &config);
            cmd_today(&repo, today, all, config.roster.preview_limit);
        }
        Commands::Add {
            name,
            brand,
            days,
            time,
            amount,
            weight,
            unit,
            stock,
            no_notify,
        } => {
            let form = MedicineForm {
                name,
                brand,
                days,
                time,
                amount,
                weight,
                weight_unit: unit,
                stock,
                notification_enabled: !no_notify && config.notifications.enabled_by_default,
            };
            let mut repo = open_repo(store, &config);
            let medicine = repo.add(&form, today)?;
            println!("Added {} ({})", medicine.name, medicine.id);
        }
        Commands::Remove { id } => {
            let mut repo = open_repo(store, &config);
            let deleted = repo.delete(&id, today)?;
            println!(
                "Deleted {}, kept in deletion log ({})",
                deleted.medicine.name, deleted.deletion_date
            );
        }
        Commands::Stock { action } => {
            let mut repo = open_repo(store, &config);
            let medicine = match action {
                StockAction::Set { id, count } => repo.set_stock(&id, count)?,
                StockAction::Add { id } => repo.increment_stock(&id)?,
                StockAction::Take { id } => repo.decrement_stock(&id)?,
            };
            println!("Stock updated");
            print_supply_line(&medicine, today);
        }
        Commands::Supply { sort, deleted } => {
            let repo = open_repo(store, &config);
            cmd_supply(&repo, today, sort.into(), deleted);
        }
        Commands::Notify { id, state } => {
            let mut repo = open_repo(store, &config);
            let medicine = repo.set_notifications(&id, state.enabled(), today)?;
            let label = if medicine.notification_enabled { "on" } else { "off" };
            println!("Reminders for {} are {}", medicine.name, label);
        }
        Commands::Time { id, time } => {
            let time: TimeOfDay = time.parse()?;
            let mut repo = open_repo(store, &config);
            let medicine = repo.set_time(&id, time, today)?;
            println!("{} is now taken at {}", medicine.name, medicine.time);
        }
        Commands::Alerts => {
            let mut repo = open_repo(store, &config);
            let alerts = repo.reschedule(today)?;
            if alerts.is_empty() {
                println!("No reminders for {}", today);
            }
            for alert in alerts {
                println!("{}  {}", alert.time, alert.message);
            }
        }
        Commands::Profile { action } => cmd_profile(store, action)?,
        Commands::DarkMode { state } => {
            let mut store = store;
            if let Some(state) = state {
                save_dark_mode(&mut store, state.enabled())?;
            }
            let label = if load_dark_mode(&store) { "on" } else { "off" };
            println!("Dark mode: {}", label);
        }
        Commands::Sample => {
            let mut repo = open_repo(store, &config);
            repo.replace_all(sample_medicines().to_vec())?;
            println!("Inserted {} sample medicines", repo.medicines().len());
        }
        Commands::Reset { yes } => {
            if !yes {
                println!("This deletes every medicine, the deletion log and all settings.");
                println!("Run again with --yes to confirm.");
                return Ok(());
            }
            let mut store = store;
            clear_all(&mut store)?;
            println!("All data deleted");
        }
        Commands::Catalog { action } => cmd_catalog(store, action)?,
    }

    Ok(())
}

fn open_repo(store: FileStore, config: &Config) -> Repository {
    MedicineRepository::open(store, TracingScheduler, config.retention)
}

fn cmd_today(repo: &Repository, today: NaiveDate, all: bool, preview_limit: usize) {
    let rosters = repo.rosters(today);
    print_roster("Today", rosters.today, &rosters.today_items, all, preview_limit);
    println!();
    print_roster(
        "Tomorrow",
        rosters.tomorrow,
        &rosters.tomorrow_items,
        all,
        preview_limit,
    );
}

fn print_roster(label: &str, date: NaiveDate, items: &[&Medicine], all: bool, limit: usize) {
    println!("{} ({}, {})", label, weekday_name(date), date.format("%-d %B"));

    if items.is_empty() {
        println!("  Nothing due");
        return;
    }

    let shown = if all { items.len() } else { limit.min(items.len()) };
    for medicine in &items[..shown] {
        println!(
            "  {}  {}x  {}, {}",
            medicine.time, medicine.amount, medicine.name, medicine.brand
        );
    }
    if shown < items.len() {
        println!("  ... and {} more (use --all)", items.len() - shown);
    }
}

fn cmd_supply(repo: &Repository, today: NaiveDate, order: SortOrder, deleted: bool) {
    if deleted {
        if repo.deleted().is_empty() {
            println!("Deletion log is empty");
        }
        for entry in repo.deleted() {
            let m = &entry.medicine;
            println!(
                "{}, {}  {}{}  deleted on {}",
                m.name,
                m.brand,
                m.weight,
                m.weight_unit,
                format_date(entry.deletion_date)
            );
        }
        return;
    }

    let medicines = repo.supply(order);
    if medicines.is_empty() {
        println!("No medicines yet");
    }
    for medicine in &medicines {
        print_supply_line(medicine, today);
    }
}

fn print_supply_line(medicine: &Medicine, today: NaiveDate) {
    let supply = match (days_remaining(medicine), depletion_date(medicine, today)) {
        (Some(days), Some(until)) => {
            format!("{} days left, until {}", days, format_date(until))
        }
        _ => "stock not tracked".to_string(),
    };
    println!(
        "{}  {}, {}  {}{}  {}",
        medicine.id, medicine.name, medicine.brand, medicine.weight, medicine.weight_unit, supply
    );
}

fn cmd_profile(mut store: FileStore, action: ProfileAction) -> Result<()> {
    let mut info = load_user_info(&store);

    if let ProfileAction::Set {
        first_name,
        last_name,
        age,
        photo,
    } = action
    {
        if let Some(first_name) = first_name {
            info.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            info.last_name = last_name;
        }
        if age.is_some() {
            info.age = age;
        }
        if photo.is_some() {
            info.profile_photo_ref = photo;
        }
        save_user_info(&mut store, &info)?;
    }

    println!("Name: {} {}", info.first_name, info.last_name);
    if let Some(age) = info.age {
        println!("Age: {}", age);
    }
    if let Some(photo) = &info.profile_photo_ref {
        println!("Photo: {}", photo);
    }
    Ok(())
}

fn cmd_catalog(mut store: FileStore, action: CatalogAction) -> Result<()> {
    match action {
        CatalogAction::Import { path } => {
            let count = import_catalog(&path, &mut store)?;
            println!("Imported {} catalog entries", count);
        }
        CatalogAction::Search { term, limit } => {
            let entries = load_catalog(&store);
            if entries.is_empty() {
                println!("Catalog is empty; import one with `medtrack catalog import <file>`");
                return Ok(());
            }
            let hits = search_catalog(&entries, &term);
            if hits.is_empty() {
                println!("No matches for {:?}", term);
            }
            for entry in hits.iter().take(limit) {
                println!("{}", entry.name());
            }
            if hits.len() > limit {
                println!("... and {} more", hits.len() - limit);
            }
        }
    }
    Ok(())
}
