use anyhow::{Context, bail};
use cgkit::cache::ConditionalCache;
use cgkit::config::Config;
use cgkit::events::EventsGenerator;
use cgkit::installer::ReleaseInstaller;
use cgkit::server::GameServer;
use cgkit::sessions::SessionStore;
use cgkit::{CgError, Paths, TagResolver, ui};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cgkit")]
#[command(author, version, about = "Resolve, cache and install CodeGame tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the latest version of a project (owner/project)
    Latest {
        /// GitHub project, e.g. code-game-project/cg-gen-events
        project: String,
    },

    /// Install cg-gen-events for a CGE version
    Install {
        /// CGE version (x.y); defaults to the latest
        version: Option<String>,
    },

    /// Print the version declared in a .cge schema file
    SchemaVersion {
        /// Schema file
        file: PathBuf,
    },

    /// Find the client library version compatible with a CG version
    LibraryVersion {
        /// GitHub project of the library (owner/project)
        project: String,
        /// CodeGame version (x.y)
        cg_version: String,
    },

    /// Show or change the configuration
    Config {
        /// codegame-share instance
        #[arg(long)]
        share_url: Option<String>,

        /// Port for local development servers
        #[arg(long)]
        dev_port: Option<u16>,
    },

    /// List or remove stored sessions
    Sessions {
        /// Only list usernames for this game URL
        game_url: Option<String>,

        /// Remove the session of this username
        #[arg(long, requires = "game_url")]
        remove: Option<String>,
    },

    /// Show information about a game server
    Info {
        /// Game server URL
        url: String,
    },

    /// Manage the request cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete all cached responses
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    ui::init_colors();

    if let Err(e) = run(cli.command, &Paths::from_env()).await {
        report(&e);
        std::process::exit(1);
    }
}

fn report(error: &anyhow::Error) {
    if let Some(CgError::TagNotFound { version, available }) = error.downcast_ref::<CgError>() {
        ui::error(&format!("No release matches version {}.", version.bold()));
        if let Some(suggestion) = ui::did_you_mean(version, available) {
            eprintln!("  Did you mean {}?", suggestion.cyan());
        }
        return;
    }
    ui::error(&format!("{:#}", error));
}

fn split_project(project: &str) -> anyhow::Result<(&str, &str)> {
    match project.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => bail!("Invalid project '{}'. Expected 'owner/project'", project),
    }
}

async fn run(command: Commands, paths: &Paths) -> anyhow::Result<()> {
    match command {
        Commands::Latest { project } => {
            let (owner, name) = split_project(&project)?;
            let tag = TagResolver::new(paths)?.latest_tag(owner, name).await?;
            println!("{}", cgkit::resolved_version(&tag));
        }
        Commands::Install { version } => {
            let generator = EventsGenerator::with_installer(
                TagResolver::new(paths)?,
                ReleaseInstaller::new()?.with_progress(true),
                paths.bin_dir.join(cgkit::events::TOOL),
            );
            let version = match version {
                Some(version) => version,
                None => generator.latest_version().await?,
            };
            let exe = generator.ensure_installed(&version).await?;
            ui::success(&format!(
                "{} is ready at {}",
                format!("cg-gen-events {}", version).bold(),
                generator.bin_dir().join(exe).display()
            ));
        }
        Commands::SchemaVersion { file } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("{}", cgkit::extract_version(&source)?);
        }
        Commands::LibraryVersion {
            project,
            cg_version,
        } => {
            let (owner, name) = split_project(&project)?;
            let version = TagResolver::new(paths)?
                .library_version_for(owner, name, &cg_version)
                .await;
            println!("{}", version);
        }
        Commands::Config {
            share_url,
            dev_port,
        } => {
            let mut config = Config::load(paths);
            let changed = share_url.is_some() || dev_port.is_some();
            if let Some(share_url) = share_url {
                config.share_url = share_url;
            }
            if let Some(dev_port) = dev_port {
                config.dev_port = dev_port;
            }
            if changed {
                config.save(paths)?;
            }
            println!("{}: {}", "share_url".dimmed(), config.share_url.cyan());
            println!("{}: {}", "dev_port".dimmed(), config.dev_port.to_string().cyan());
        }
        Commands::Sessions { game_url, remove } => {
            let store = SessionStore::new(paths);
            match (game_url, remove) {
                (Some(game_url), Some(username)) => {
                    let session = store.load(&game_url, &username).with_context(|| {
                        format!("No session for {} on {}", username, game_url)
                    })?;
                    store.remove(&session)?;
                    ui::success(&format!("Removed {} from {}", username.bold(), game_url));
                }
                (Some(game_url), None) => {
                    for username in store.list_usernames(&game_url)? {
                        println!("{}", username);
                    }
                }
                (None, _) => {
                    let sessions = store.list_sessions()?;
                    if sessions.is_empty() {
                        println!("No sessions stored.");
                    }
                    for (game_url, usernames) in sessions {
                        println!("{}", game_url.bold());
                        for username in usernames {
                            println!("  {}", username);
                        }
                    }
                }
            }
        }
        Commands::Info { url } => {
            let server = GameServer::connect(&url).await?;
            let info = server.info().await?;
            let title = if info.display_name.is_empty() {
                &info.name
            } else {
                &info.display_name
            };
            println!("{} {}", title.bold(), info.version.dimmed());
            if !info.description.is_empty() {
                println!("{}", info.description);
            }
            println!("{}: {}", "CG version".dimmed(), info.cg_version.cyan());
            if !info.repository_url.is_empty() {
                println!("{}: {}", "Repository".dimmed(), info.repository_url);
            }
        }
        Commands::Cache {
            action: CacheAction::Clear,
        } => {
            let removed = ConditionalCache::new(paths)?.clear()?;
            ui::success(&format!("Removed {} cached responses", removed));
        }
    }

    Ok(())
}
