use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use quest_helper::config::EngineConfig;
use quest_helper::quest::QuestRegistry;
use quest_helper::replay::{self, SessionScript};
use quest_helper::session::{ScriptedSession, SessionEventRouter, StepContext, UiQueue};

const CONFIG_ENV: &str = "QUEST_HELPER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "quest-helper.toml";

fn usage() -> String {
    "usage: quest-helper <replay-script.toml>".to_string()
}

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let loaded = EngineConfig::load(&config_path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => EngineConfig::default(),
    };

    // Initialize logging on stderr, stdout carries the rendered frames
    let mut filter = EnvFilter::from_default_env();
    match config.log_filter.parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring log filter '{}': {}", config.log_filter, e),
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match loaded {
        Ok(Some(_)) => info!("Loaded config from {:?}", config_path),
        Ok(None) => warn!("Config file {:?} not found, using defaults", config_path),
        Err(e) => warn!("Failed to load config, using defaults: {}", e),
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: EngineConfig) -> Result<(), String> {
    let script_path = std::env::args().nth(1).map(PathBuf::from).ok_or_else(usage)?;
    let script = SessionScript::load(&script_path)?;

    // Load quest registry from TOML files
    let registry = QuestRegistry::new(&config.data_dir);
    registry.load_all().await?;

    let session = Arc::new(ScriptedSession::new());
    let router = Arc::new(SessionEventRouter::new());
    let (queue, context) = UiQueue::new();
    let ui_task = tokio::spawn(context.run());

    let ctx = StepContext {
        session: session.clone(),
        ui: Arc::new(queue.clone()),
        icons: session.clone(),
        router: router.clone(),
        cutscene_variable: config.cutscene_variable,
    };

    let mut helper = registry.build(&script.quest, &ctx).await?;
    script.seed(&session);
    helper.start_up();

    info!(
        "Replaying {} events from {:?} against '{}'",
        script.events.len(),
        script_path,
        helper.name()
    );
    let frames = replay::run_script(&script, &helper, &session, &router, &queue).await;
    helper.shut_down();

    for frame in frames? {
        let line = serde_json::to_string(&frame)
            .map_err(|e| format!("Failed to serialize frame {}: {}", frame.event, e))?;
        println!("{}", line);
    }

    if let Some(duration) = helper.duration_secs() {
        info!("Replay finished after {}s", duration);
    }
    ui_task.abort();
    Ok(())
}
