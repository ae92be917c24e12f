use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{check, project, reading, GlobalArgs};

#[derive(Parser)]
#[command(name = "lvl")]
#[command(about = "LevelLog: Rise & Fall leveling field book", long_about = None)]
struct Cli {
    /// Layered YAML config paths in merge order (later files override)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Database URL; overrides LVL_DATABASE_URL and db.url
    #[arg(long, global = true)]
    db_url: Option<String>,

    /// Print JSON instead of key=value lines
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Treat config keys nothing reads as an error
    #[arg(long, global = true, default_value_t = false)]
    strict_config: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Survey projects (one field book each)
    Project {
        #[command(subcommand)]
        cmd: ProjectCmd,
    },

    /// Book, list, import and export readings
    Reading {
        #[command(subcommand)]
        cmd: ReadingCmd,
    },

    /// Arithmetic closure check over a project's readings
    Check {
        #[arg(long)]
        project_id: String,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    /// Apply SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum ProjectCmd {
    /// Create a project. At least one field must be non-blank.
    Create {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Area of study
        #[arg(long, default_value = "")]
        area: String,
        #[arg(long, default_value = "")]
        carried_by: String,
        /// Date of study (free text, as written in the field book)
        #[arg(long, default_value = "")]
        date: String,
    },

    List,

    Show {
        #[arg(long)]
        project_id: String,
    },

    /// Reset: delete every reading of the project.
    Clear {
        #[arg(long)]
        project_id: String,

        /// Acknowledge that the history cannot be recovered.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ReadingCmd {
    /// Reduce one reading against the project's history and record it.
    Add {
        #[arg(long)]
        project_id: String,
        /// Back sight
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        bs: String,
        /// Intermediate sight
        #[arg(long = "is", default_value = "", allow_hyphen_values = true)]
        is_: String,
        /// Fore sight
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        fs: String,
        /// Reduced level (benchmark; only read for the first reading)
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        rl: String,
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        distance: String,
        #[arg(long, default_value = "")]
        remarks: String,
    },

    List {
        #[arg(long)]
        project_id: String,
        /// Include readings with no sight booked
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Record every row of a field-book CSV, in file order.
    Import {
        #[arg(long)]
        project_id: String,
        #[arg(long)]
        csv: String,
    },

    /// Write the reduced field book as CSV.
    Export {
        #[arg(long)]
        project_id: String,
        #[arg(long)]
        csv: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // dev-time convenience: pick up LVL_DATABASE_URL etc. from .env.local
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    let globals = GlobalArgs {
        config_paths: cli.config_paths,
        db_url: cli.db_url,
        json: cli.json,
        strict_config: cli.strict_config,
    };

    match cli.cmd {
        Commands::Db { cmd } => {
            let ctx = commands::load_context(&globals)?;
            let pool = lvl_db::connect(&ctx.db_url).await?;
            match cmd {
                DbCmd::Status => {
                    let s = lvl_db::status(&pool).await?;
                    println!("db_ok={} has_readings_table={}", s.ok, s.has_readings_table);
                }
                DbCmd::Migrate => {
                    lvl_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = lvl_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Project { cmd } => {
            let ctx = commands::load_context(&globals)?;
            match cmd {
                ProjectCmd::Create {
                    title,
                    description,
                    area,
                    carried_by,
                    date,
                } => {
                    let p = lvl_db::NewProject {
                        title,
                        description,
                        area_of_study: area,
                        carried_by,
                        date_of_study: date,
                        config_hash: ctx.config_hash.clone(),
                    };
                    project::create(&ctx, p).await?;
                }
                ProjectCmd::List => project::list(&ctx).await?,
                ProjectCmd::Show { project_id } => project::show(&ctx, &project_id).await?,
                ProjectCmd::Clear { project_id, yes } => {
                    project::clear(&ctx, &project_id, yes).await?
                }
            }
        }

        Commands::Reading { cmd } => {
            let ctx = commands::load_context(&globals)?;
            match cmd {
                ReadingCmd::Add {
                    project_id,
                    bs,
                    is_,
                    fs,
                    rl,
                    distance,
                    remarks,
                } => {
                    let input = lvl_core::FieldInput {
                        back_sight: &bs,
                        intermediate_sight: &is_,
                        fore_sight: &fs,
                        reduced_level: &rl,
                        distance: &distance,
                        remarks: &remarks,
                    };
                    reading::add(&ctx, &project_id, input).await?;
                }
                ReadingCmd::List { project_id, all } => {
                    reading::list(&ctx, &project_id, all).await?
                }
                ReadingCmd::Import { project_id, csv } => {
                    reading::import(&ctx, &project_id, &csv).await?
                }
                ReadingCmd::Export { project_id, csv } => {
                    reading::export(&ctx, &project_id, &csv).await?
                }
            }
        }

        Commands::Check { project_id } => {
            let ctx = commands::load_context(&globals)?;
            check::run(&ctx, &project_id).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
