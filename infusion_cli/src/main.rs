use clap::{Parser, Subcommand};
use infusion_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "infuse")]
#[command(about = "Infusion dose-rate and flow-rate converter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert between dose and flow rate (default: startup drug at its initial dose)
    Convert {
        /// Drug identifier (defaults to the startup drug)
        #[arg(long)]
        drug: Option<String>,

        /// Patient weight in kg
        #[arg(long)]
        weight: Option<f64>,

        /// Dose in the drug's dose unit
        #[arg(long, conflicts_with = "rate")]
        dose: Option<f64>,

        /// Flow rate in ml/hr
        #[arg(long)]
        rate: Option<f64>,

        /// Solute amount of a custom recipe
        #[arg(long, requires_all = ["unit", "volume"])]
        amount: Option<f64>,

        /// Solute unit of a custom recipe (mg or µg)
        #[arg(long, requires = "amount")]
        unit: Option<String>,

        /// Solution volume of a custom recipe in ml
        #[arg(long, requires = "amount")]
        volume: Option<f64>,
    },

    /// List drugs in display order
    List,

    /// Show one drug's configuration
    Show { drug: String },

    /// Show a drug in the display order
    Enable { drug: String },

    /// Hide a drug (moved behind the enabled drugs)
    Disable { drug: String },

    /// Move a drug to a position in the display order (0 = startup drug)
    Move { drug: String, index: usize },

    /// Replace the whole display order
    Order {
        #[arg(required = true)]
        drugs: Vec<String>,
    },

    /// Edit a drug's configuration
    Set {
        drug: String,

        #[arg(long)]
        initial_dose: Option<f64>,

        #[arg(long)]
        dose_min: Option<f64>,

        #[arg(long)]
        dose_max: Option<f64>,

        /// Danger threshold; pass 0 to remove it
        #[arg(long)]
        danger_dose: Option<f64>,

        #[arg(long)]
        dose_step: Option<f64>,

        #[arg(long)]
        rate_step: Option<f64>,

        #[arg(long)]
        amount: Option<f64>,

        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        volume: Option<f64>,
    },

    /// Restore defaults for one drug, or for everything
    Reset { drug: Option<String> },
}

/// Field edits accepted by `infuse set`
struct DrugEdits {
    initial_dose: Option<f64>,
    dose_min: Option<f64>,
    dose_max: Option<f64>,
    danger_dose: Option<f64>,
    dose_step: Option<f64>,
    rate_step: Option<f64>,
    amount: Option<f64>,
    unit: Option<String>,
    volume: Option<f64>,
}

fn main() -> Result<()> {
    // Initialize logging
    infusion_core::logging::init();

    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    get_default_catalog().ensure_valid()?;

    let mut store = ConfigStore::new(FileStore::new(data_dir.join("settings")));
    store.load();

    let result = match cli.command {
        Some(Commands::Convert {
            drug,
            weight,
            dose,
            rate,
            amount,
            unit,
            volume,
        }) => {
            let recipe = match (amount, unit, volume) {
                (Some(a), Some(u), Some(v)) => Some((a, u.parse::<SoluteUnit>()?, v)),
                _ => None,
            };
            cmd_convert(&store, &config, drug, weight, dose, rate, recipe)
        }
        Some(Commands::List) => {
            cmd_list(&store);
            Ok(())
        }
        Some(Commands::Show { drug }) => cmd_show(&store, &drug),
        Some(Commands::Enable { drug }) => store.set_enabled(&drug, true),
        Some(Commands::Disable { drug }) => store.set_enabled(&drug, false),
        Some(Commands::Move { drug, index }) => store.move_drug(&drug, index),
        Some(Commands::Order { drugs }) => store.set_drug_order(drugs),
        Some(Commands::Set {
            drug,
            initial_dose,
            dose_min,
            dose_max,
            danger_dose,
            dose_step,
            rate_step,
            amount,
            unit,
            volume,
        }) => cmd_set(
            &mut store,
            &drug,
            DrugEdits {
                initial_dose,
                dose_min,
                dose_max,
                danger_dose,
                dose_step,
                rate_step,
                amount,
                unit,
                volume,
            },
        ),
        Some(Commands::Reset { drug }) => match drug {
            Some(drug) => store.reset_drug_to_default(&drug),
            None => {
                store.reset_to_default();
                println!("All drug settings restored to defaults");
                Ok(())
            }
        },
        None => cmd_convert(&store, &config, None, None, None, None, None),
    };

    print_notices(store.take_notices());
    result
}

fn cmd_convert(
    store: &ConfigStore<FileStore>,
    config: &AppConfig,
    drug: Option<String>,
    weight: Option<f64>,
    dose: Option<f64>,
    rate: Option<f64>,
    recipe: Option<(f64, SoluteUnit, f64)>,
) -> Result<()> {
    let drug = drug.unwrap_or_else(|| store.initial_drug().to_string());
    let drug_config = store
        .config(&drug)
        .cloned()
        .ok_or_else(|| Error::UnknownDrug(drug.clone()))?;

    let mut session = InfusionSession::new(drug.as_str(), drug_config, config);
    let mut notices = Vec::new();

    if let Some(w) = weight {
        notices.extend(session.set_weight(w));
    }
    if let Some((amount, unit, volume)) = recipe {
        notices.extend(session.set_recipe(amount, unit, volume));
    }
    if let Some(d) = dose {
        notices.extend(session.set_dose(d));
    }
    if let Some(r) = rate {
        notices.extend(session.set_rate(r));
    }

    display_session(&session);
    print_notices(notices);
    Ok(())
}

fn display_session(session: &InfusionSession) {
    let config = session.config();
    let (rate_min, rate_max) = session.rate_range();

    println!("\n  {} ({})", config.label, session.drug_id());
    println!("  Recipe: {}", session.composition());
    println!("  Concentration: {:.1} µg/ml", session.concentration());
    println!("  Weight: {} kg", session.weight());
    println!("  Dose: {} {}", format_value(session.dose()), session.dose_unit());
    println!("  Rate: {} ml/hr", format_value(session.rate()));
    println!(
        "  Dose range: {}\u{2013}{} {}",
        config.dose_min, config.dose_max, config.dose_unit
    );
    println!(
        "  Rate range: {}\u{2013}{} ml/hr",
        format_value(rate_min),
        format_value(rate_max)
    );

    if session.is_dangerous() {
        if let Some(danger) = config.danger_dose {
            println!(
                "\n  \u{26a0} HIGH DOSE: at or above {} {}",
                danger, config.dose_unit
            );
        }
    }
    println!();
}

fn cmd_list(store: &ConfigStore<FileStore>) {
    for (index, id) in store.order().iter().enumerate() {
        let Some(config) = store.config(id) else {
            continue;
        };
        let mark = if config.enabled { "x" } else { " " };
        let startup = if id == store.initial_drug() { " *" } else { "" };
        println!(
            "{:>2}. [{}] {:<16} {:<18} {}{}",
            index,
            mark,
            id,
            config.label,
            config.dose_unit,
            startup
        );
    }
}

fn cmd_show(store: &ConfigStore<FileStore>, drug: &str) -> Result<()> {
    let config = store
        .config(drug)
        .ok_or_else(|| Error::UnknownDrug(drug.to_string()))?;

    println!("{} ({})", config.label, drug);
    println!("  Enabled: {}", if config.enabled { "yes" } else { "no" });
    println!(
        "  Recipe: {} ({:.1} µg/ml)",
        format_composition(config.solute_amount, config.solute_unit, config.solution_volume),
        config.concentration()
    );
    println!("  Initial dose: {} {}", config.initial_dose, config.dose_unit);
    println!(
        "  Dose range: {}\u{2013}{} {}",
        config.dose_min, config.dose_max, config.dose_unit
    );
    match config.danger_dose {
        Some(danger) => println!("  Danger threshold: {} {}", danger, config.dose_unit),
        None => println!("  Danger threshold: none"),
    }
    println!("  Steps: dose {}, rate {} ml/hr", config.dose_step, config.rate_step);
    println!("  {}", config.description);
    Ok(())
}

fn cmd_set(store: &mut ConfigStore<FileStore>, drug: &str, edits: DrugEdits) -> Result<()> {
    let mut config = store
        .config(drug)
        .cloned()
        .ok_or_else(|| Error::UnknownDrug(drug.to_string()))?;

    if let Some(v) = edits.initial_dose {
        config.initial_dose = v;
    }
    if let Some(v) = edits.dose_min {
        config.dose_min = v;
    }
    if let Some(v) = edits.dose_max {
        config.dose_max = v;
    }
    if let Some(v) = edits.danger_dose {
        config.danger_dose = if v > 0.0 { Some(v) } else { None };
    }
    if let Some(v) = edits.dose_step {
        config.dose_step = v;
    }
    if let Some(v) = edits.rate_step {
        config.rate_step = v;
    }
    if let Some(v) = edits.amount {
        config.solute_amount = v;
    }
    if let Some(v) = edits.unit {
        config.solute_unit = v.parse()?;
    }
    if let Some(v) = edits.volume {
        config.solution_volume = v;
    }

    store.update_drug(drug, config)?;
    println!("Updated {}", drug);
    Ok(())
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        println!("! {}", notice);
    }
}

/// Trim float noise for display without hiding real precision
fn format_value(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    format!("{}", rounded)
}
