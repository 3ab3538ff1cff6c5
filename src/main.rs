use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pocket_zoo::config::Config;
use pocket_zoo::db::{Database, KeyValueStore};
use pocket_zoo::models::{packs_without_commons, Priority, TaskType};
use pocket_zoo::notify::LogNotifier;
use pocket_zoo::api;
use pocket_zoo::store::{App, AppState, SaveQueue};

#[derive(Parser)]
#[command(name = "pzoo")]
#[command(about = "Tasks, focus sessions and a zoo to spend the coins on")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API with the decay tick and Pomodoro clock running
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Print the task list
    Tasks {
        /// Only tasks of this priority (low, medium, high)
        #[arg(long)]
        priority: Option<String>,
        /// Only tasks of this type (daily, weekly, one_time)
        #[arg(long = "type")]
        task_type: Option<String>,
    },
    /// Print the zoo roster and coin balance
    Zoo,
    /// Run one decay tick now and save the result
    Decay,
    /// Show how the stores loaded and the headline numbers
    Status,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "pocket_zoo=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(config: &Config) -> anyhow::Result<Database> {
    let db = match &config.db_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env();
    let db = open_database(&config)?;
    let kv: Arc<dyn KeyValueStore> = Arc::new(db.clone());
    let (queue, _writer) = SaveQueue::spawn(kv, config.save_retry);

    let state = AppState::load(&db, queue, &config, Arc::new(LogNotifier));
    let app = App::new(state);

    match cli.command.unwrap_or(Commands::Serve { port: 3000 }) {
        Commands::Serve { port } => {
            for pack in packs_without_commons() {
                tracing::warn!(pack, "Pack has no common animals; most pulls from it will fail");
            }

            let decay = app.spawn_decay_loop(config.decay_interval);
            let clock = app.spawn_pomodoro_clock();
            let router = api::create_router(app.clone());

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("Pocket Zoo listening on http://127.0.0.1:{}", port);

            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("Shutting down");
                })
                .await?;

            decay.abort();
            clock.abort();
        }
        Commands::Tasks {
            priority,
            task_type,
        } => {
            let priority = priority
                .map(|p| {
                    Priority::from_str(&p).ok_or_else(|| anyhow::anyhow!("Unknown priority: {}", p))
                })
                .transpose()?;
            let task_type = task_type
                .map(|t| {
                    TaskType::from_str(&t).ok_or_else(|| anyhow::anyhow!("Unknown task type: {}", t))
                })
                .transpose()?;

            let state = app.lock();
            let tasks = state.tasks().tasks().iter().filter(|task| {
                priority.map_or(true, |p| task.priority == p)
                    && task_type.map_or(true, |t| task.task_type == t)
            });
            for task in tasks {
                println!(
                    "{} [{}] {} ({}, {} sessions)",
                    task.id,
                    if task.completed { "x" } else { " " },
                    task.title,
                    task.priority.as_str(),
                    task.pomodoro_sessions
                );
            }
        }
        Commands::Zoo => {
            let state = app.lock();
            println!("Coins: {}", state.zoo().coins());
            for animal in state.zoo().animals() {
                if animal.unlocked {
                    println!(
                        "{:<10} lvl {:<3} {:<9} hunger {:>3} energy {:>3} happy {:>3} hygiene {:>3} health {:>3}",
                        animal.name,
                        animal.level,
                        animal.mood.as_str(),
                        animal.stats.hunger,
                        animal.stats.energy,
                        animal.stats.happiness,
                        animal.stats.hygiene,
                        animal.stats.health
                    );
                } else {
                    println!("{:<10} locked ({} coins)", animal.name, animal.cost);
                }
            }
        }
        Commands::Decay => {
            let ticked = app.lock().zoo_mut().decay_tick();
            println!("Decayed {} animal(s)", ticked);
        }
        Commands::Status => {
            let state = app.lock();
            println!("{}", serde_json::to_string_pretty(&state.load_report())?);
            println!("{}", serde_json::to_string_pretty(&state.summary())?);
            println!("Stored keys: {}", db.keys()?.join(", "));
        }
    }

    // Startup income sync and any command may have queued writes.
    if let Err(e) = app.flush().await {
        tracing::error!("Some changes were not saved: {}", e);
    }

    Ok(())
}
