use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use repertoire::OutputFormat;
use repertoire::commands;
use repertoire::commands::items::ItemFields;
use repertoire::config;
use repertoire::http::types::ItemPayload;
use repertoire::repertoire::models::{Kind, ListFilter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "repertoire")]
#[command(about = "Personal log of watched movies, series and other media")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web interface and REST API
    Serve {
        #[arg(long, help = "Bind host (overrides server.host)")]
        host: Option<String>,
        #[arg(long, help = "Bind port (overrides server.port)")]
        port: Option<u16>,
    },

    /// List items
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show item details
    Show {
        #[arg(help = "Item ID")]
        id: u64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Log a new item
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, help = "Date watched (YYYY-MM-DD)")]
        date: String,
        #[arg(long, help = "Stars, 1 to 5")]
        rating: String,
        #[arg(long)]
        review: String,
        #[arg(long, help = "MOVIE, SERIES or OTHER")]
        kind: Option<String>,
        #[arg(long, help = "H:MM or HH:MM:SS")]
        duration: Option<String>,
        #[arg(long)]
        season: Option<String>,
        #[arg(long, help = "Image file to attach")]
        photo: Option<PathBuf>,
    },

    /// Change fields of an item
    Edit {
        #[arg(help = "Item ID")]
        id: u64,
        #[command(flatten)]
        fields: EditArgs,
        #[arg(long, help = "Attach a new image file")]
        photo: Option<PathBuf>,
    },

    /// Delete an item and its photo
    Delete {
        #[arg(help = "Item ID")]
        id: u64,
        #[arg(long, help = "Preview without deleting")]
        dry_run: bool,
    },

    /// Show configuration
    Config(ConfigArgs),

    /// Work with the REST API of a running instance
    Remote(RemoteArgs),
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long, help = "Case-insensitive match on name or review")]
    search: Option<String>,
    #[arg(long, help = "MOVIE, SERIES or OTHER")]
    kind: Option<Kind>,
}

impl From<&FilterArgs> for ListFilter {
    fn from(args: &FilterArgs) -> Self {
        ListFilter {
            search: args.search.clone(),
            kind: args.kind,
        }
    }
}

#[derive(Args)]
struct EditArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long, help = "Date watched (YYYY-MM-DD)")]
    date: Option<String>,
    #[arg(long, help = "Stars, 1 to 5")]
    rating: Option<String>,
    #[arg(long)]
    review: Option<String>,
    #[arg(long, help = "MOVIE, SERIES or OTHER")]
    kind: Option<String>,
    #[arg(long, help = "H:MM or HH:MM:SS", conflicts_with = "clear_duration")]
    duration: Option<String>,
    #[arg(long)]
    season: Option<String>,
    #[arg(long, help = "Remove the stored duration")]
    clear_duration: bool,
}

#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    List,
    Get { key: String },
}

#[derive(Args)]
struct RemoteArgs {
    #[command(subcommand)]
    action: RemoteAction,
}

#[derive(Subcommand)]
enum RemoteAction {
    /// List items on the remote instance
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show one remote item
    Show {
        id: u64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Partially update a remote item
    Edit {
        id: u64,
        #[command(flatten)]
        fields: RemoteEditArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long, help = "Preview the request body without sending")]
        dry_run: bool,
    },
    /// Delete a remote item
    Delete {
        id: u64,
        #[arg(long, help = "Preview without deleting")]
        dry_run: bool,
    },
    /// Store the API token in the system keyring
    Login {
        #[arg(long)]
        token: String,
    },
    /// Remove the stored API token
    Logout,
}

#[derive(Args)]
struct RemoteEditArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long, help = "Date watched (YYYY-MM-DD)")]
    date: Option<chrono::NaiveDate>,
    #[arg(long, help = "Stars, 1 to 5")]
    rating: Option<u8>,
    #[arg(long)]
    review: Option<String>,
    #[arg(long, help = "MOVIE, SERIES or OTHER")]
    kind: Option<Kind>,
    #[arg(long, help = "H:MM or HH:MM:SS", conflicts_with = "clear_duration")]
    duration: Option<String>,
    #[arg(long, conflicts_with = "clear_season")]
    season: Option<u16>,
    #[arg(long, help = "Remove the stored duration")]
    clear_duration: bool,
    #[arg(long, help = "Remove the stored season")]
    clear_season: bool,
}

impl From<RemoteEditArgs> for ItemPayload {
    fn from(args: RemoteEditArgs) -> Self {
        let duration = if args.clear_duration {
            Some(serde_json::Value::Null)
        } else {
            args.duration.map(serde_json::Value::String)
        };
        let season = if args.clear_season {
            Some(None)
        } else {
            args.season.map(Some)
        };

        ItemPayload {
            name: args.name,
            date: args.date,
            rating: args.rating,
            review: args.review,
            kind: args.kind,
            duration,
            season,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Request logs for the server; the other commands print their own output
    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::load()?;

    match cli.command {
        Commands::Serve { host, port } => {
            commands::serve::serve(&config, host, port)?;
        }
        Commands::List { filter, format } => {
            commands::items::list(&config, &ListFilter::from(&filter), format)?;
        }
        Commands::Show { id, format } => {
            commands::items::show(&config, id, format)?;
        }
        Commands::Add {
            name,
            date,
            rating,
            review,
            kind,
            duration,
            season,
            photo,
        } => {
            let fields = ItemFields {
                name: Some(name),
                date: Some(date),
                rating: Some(rating),
                review: Some(review),
                kind,
                duration,
                season,
                photo,
            };
            commands::items::add(&config, &fields)?;
        }
        Commands::Edit { id, fields, photo } => {
            let clear_duration = fields.clear_duration;
            let fields = ItemFields {
                name: fields.name,
                date: fields.date,
                rating: fields.rating,
                review: fields.review,
                kind: fields.kind,
                duration: fields.duration,
                season: fields.season,
                photo,
            };
            commands::items::edit(&config, id, &fields, clear_duration)?;
        }
        Commands::Delete { id, dry_run } => {
            commands::items::delete(&config, id, dry_run)?;
        }
        Commands::Config(args) => match args.action {
            ConfigAction::List => commands::config::list(&config)?,
            ConfigAction::Get { key } => commands::config::get(&key, &config)?,
        },
        Commands::Remote(args) => match args.action {
            RemoteAction::List { filter, format } => {
                commands::remote::list(&config, &ListFilter::from(&filter), format)?;
            }
            RemoteAction::Show { id, format } => {
                commands::remote::show(&config, id, format)?;
            }
            RemoteAction::Edit {
                id,
                fields,
                format,
                dry_run,
            } => {
                commands::remote::edit(&config, id, &fields.into(), format, dry_run)?;
            }
            RemoteAction::Delete { id, dry_run } => {
                commands::remote::delete(&config, id, dry_run)?;
            }
            RemoteAction::Login { token } => {
                commands::remote::login(&config, &token)?;
            }
            RemoteAction::Logout => {
                commands::remote::logout(&config)?;
            }
        },
    }

    Ok(())
}
