//! climblog CLI entry point

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use climblog::{
    commands::{
        cmd_add, cmd_delete, cmd_import, cmd_init, cmd_list, cmd_mark_failed, cmd_mark_ready,
        cmd_set_status, cmd_show, cmd_status, cmd_tag, cmd_tags, cmd_update, print_import_stats,
        print_init_summary, print_status, print_tags, print_video, print_videos, InitOptions,
        ListFilter,
    },
    config::Config,
    error::{Error, Result},
    models::{ListOrder, NewVideo, Video, VideoPatch, VideoStatus},
    progress::LogWriterFactory,
    store::VideoStore,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "climblog")]
#[command(version, about = "Personal climbing video journal", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize climblog configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,

        /// Owner recorded on videos added from the CLI
        #[arg(long, env = "CLIMBLOG_DEFAULT_OWNER")]
        owner: Option<String>,
    },

    /// Log a new video
    Add {
        /// Video title
        title: String,

        /// Date of the climb (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Grade on the V scale
        #[arg(short, long)]
        grade: Option<i32>,

        /// Climb type (e.g. boulder, sport)
        #[arg(long)]
        climb_type: Option<String>,

        /// Board name (e.g. kilter, moonboard)
        #[arg(long)]
        board: Option<String>,

        /// Thumbnail URL
        #[arg(long)]
        thumbnail: Option<String>,

        /// Playable video URL
        #[arg(long)]
        video_url: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Owner (defaults to the configured owner)
        #[arg(long)]
        owner: Option<String>,

        /// Initial status (defaults to processing)
        #[arg(long)]
        status: Option<VideoStatus>,
    },

    /// Show one video
    Show {
        /// Video ID
        id: i64,
    },

    /// Change fields of a video
    Update {
        /// Video ID
        id: i64,

        #[arg(long)]
        title: Option<String>,

        /// Date of the climb (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(short, long)]
        grade: Option<i32>,

        #[arg(long)]
        climb_type: Option<String>,

        #[arg(long)]
        board: Option<String>,

        #[arg(long)]
        thumbnail: Option<String>,

        #[arg(long)]
        video_url: Option<String>,

        /// Replace all tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        #[arg(long)]
        owner: Option<String>,

        /// Clear a field (repeatable)
        #[arg(long, value_enum)]
        clear: Vec<ClearField>,
    },

    /// Set the processing status of a video
    SetStatus {
        /// Video ID
        id: i64,

        /// processing, ready or failed
        status: String,
    },

    /// Mark a video ready with its playable URL
    Ready {
        /// Video ID
        id: i64,

        /// Playable video URL
        video_url: String,

        /// Thumbnail URL
        #[arg(long)]
        thumbnail: Option<String>,
    },

    /// Mark a video as failed to process
    Fail {
        /// Video ID
        id: i64,
    },

    /// Add or remove tags on a video
    Tag {
        /// Video ID
        id: i64,

        /// Tags to add
        #[arg(short, long, num_args = 1..)]
        add: Vec<String>,

        /// Tags to remove
        #[arg(short, long, num_args = 1..)]
        remove: Vec<String>,
    },

    /// List videos, newest first
    List {
        /// Only videos of this owner
        #[arg(long, conflicts_with = "tag")]
        owner: Option<String>,

        /// Only videos carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Oldest first
        #[arg(long)]
        oldest_first: bool,
    },

    /// List tags with video counts
    Tags,

    /// Permanently delete a video
    Delete {
        /// Video ID
        id: i64,
    },

    /// Import a legacy videos.json dump ('-' for stdin)
    Import {
        /// Path to the JSON array
        path: PathBuf,
    },

    /// Show journal status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Fields `update --clear` can reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClearField {
    Date,
    ClimbType,
    Board,
    Thumbnail,
    VideoUrl,
    Tags,
    Owner,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory))
        .with(filter)
        .init();

    // Init creates the config, so it runs before loading one
    if matches!(cli.command, Commands::Init { .. }) {
        return handle_init(cli).await;
    }

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "climblog", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let store = VideoStore::connect(&config).await?;
    if !store.is_initialized().await? {
        return Err(Error::NotInitialized);
    }

    let json = cli.json;
    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Add {
            title,
            date,
            grade,
            climb_type,
            board,
            thumbnail,
            video_url,
            tags,
            owner,
            status,
        } => {
            let input = NewVideo {
                title,
                climbed_date: date,
                grade,
                climb_type,
                board_type: board,
                thumbnail,
                video_url,
                tags,
                user_id: owner,
                status,
            };
            let video = cmd_add(&config, &store, input).await?;
            if json {
                output_video(&video, json)?;
            } else {
                println!("✓ Added video #{}", video.id);
            }
        }

        Commands::Show { id } => {
            let video = cmd_show(&store, id).await?;
            output_video(&video, json)?;
        }

        Commands::Update {
            id,
            title,
            date,
            grade,
            climb_type,
            board,
            thumbnail,
            video_url,
            tags,
            owner,
            clear,
        } => {
            let mut patch = VideoPatch {
                title,
                climbed_date: date.map(Some),
                grade,
                climb_type: climb_type.map(Some),
                board_type: board.map(Some),
                thumbnail: thumbnail.map(Some),
                video_url: video_url.map(Some),
                tags,
                user_id: owner.map(Some),
                status: None,
            };
            for field in clear {
                match field {
                    ClearField::Date => patch.climbed_date = Some(None),
                    ClearField::ClimbType => patch.climb_type = Some(None),
                    ClearField::Board => patch.board_type = Some(None),
                    ClearField::Thumbnail => patch.thumbnail = Some(None),
                    ClearField::VideoUrl => patch.video_url = Some(None),
                    ClearField::Tags => patch.tags = Some(Vec::new()),
                    ClearField::Owner => patch.user_id = Some(None),
                }
            }

            let video = cmd_update(&store, id, patch).await?;
            output_video(&video, json)?;
        }

        Commands::SetStatus { id, status } => {
            let video = cmd_set_status(&store, id, &status).await?;
            output_status_change(&video, json)?;
        }

        Commands::Ready {
            id,
            video_url,
            thumbnail,
        } => {
            let video = cmd_mark_ready(&store, id, video_url, thumbnail).await?;
            output_status_change(&video, json)?;
        }

        Commands::Fail { id } => {
            let video = cmd_mark_failed(&store, id).await?;
            output_status_change(&video, json)?;
        }

        Commands::Tag { id, add, remove } => {
            let video = cmd_tag(&store, id, &add, &remove).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&video)?);
            } else if video.tags.is_empty() {
                println!("✓ Video #{} has no tags", video.id);
            } else {
                println!("✓ Video #{} tags: {}", video.id, video.tags);
            }
        }

        Commands::List {
            owner,
            tag,
            oldest_first,
        } => {
            let filter = match (owner, tag) {
                (Some(owner), _) => ListFilter::Owner(owner),
                (None, Some(tag)) => ListFilter::Tag(tag),
                (None, None) => ListFilter::All,
            };
            let order = if oldest_first {
                ListOrder::OldestFirst
            } else {
                ListOrder::NewestFirst
            };

            let videos = cmd_list(&store, &filter, order).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&videos)?);
            } else {
                print_videos(&videos);
            }
        }

        Commands::Tags => {
            let tags = cmd_tags(&store).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else {
                print_tags(&tags);
            }
        }

        Commands::Delete { id } => {
            cmd_delete(&store, id).await?;
            if json {
                println!(r#"{{"status": "ok", "deleted": {}}}"#, id);
            } else {
                println!("✓ Video #{} deleted", id);
            }
        }

        Commands::Import { path } => {
            let stats = cmd_import(&config, &store, &path).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_import_stats(&stats);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &store).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}

fn output_video(video: &Video, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(video)?);
    } else {
        print_video(video);
    }
    Ok(())
}

fn output_status_change(video: &Video, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(video)?);
    } else {
        println!("✓ Video #{} is now {}", video.id, video.status);
    }
    Ok(())
}

async fn handle_init(cli: Cli) -> Result<()> {
    let Commands::Init { force, owner } = cli.command else {
        unreachable!()
    };

    // A --config path names either the config file or its directory
    let (base_dir, config_path) = if let Some(path) = cli.config {
        if path.extension().is_some_and(|e| e == "toml") {
            let base = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_base_dir);
            (base, path)
        } else {
            (path.clone(), path.join("config.toml"))
        }
    } else {
        let base = Config::default_base_dir();
        (base.clone(), base.join("config.toml"))
    };

    let config = cmd_init(InitOptions {
        base_dir,
        config_path,
        force,
        owner,
    })
    .await?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "config_path": config.paths.config_file,
                "db_path": config.paths.db_file,
            })
        );
    } else {
        print_init_summary(&config);
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_config_path);

    if !config_path.exists() {
        return Err(Error::NotInitialized);
    }

    Config::load(&config_path)
}
