pub mod agent;
pub mod cli;
pub mod config;
pub mod http;
pub mod llm;
pub mod notify;
pub mod trace;

use agent::{EngineConfig, Persona, ToolRegistry};
use anyhow::Result;
use cli::{AppState, CliArgs, run_repl};
use config::AppConfig;
use http::client::HttpClient;
use http::debug::HttpDebugConfig;
use llm::openai::OpenAiProvider;
use notify::PushoverNotifier;
use std::time::{SystemTime, UNIX_EPOCH};
use trace::SessionTrace;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = if let Some(path) = args.config.as_deref() {
        AppConfig::load_with_path(Some(path))?
    } else {
        AppConfig::load()?
    };

    let persona = Persona::from_overrides(
        config.persona_name.as_deref(),
        config.biography_file.as_deref(),
    )?;

    let session_id = generate_session_id();
    let trace = SessionTrace::create(&session_id)?;
    let http = HttpClient::new(
        reqwest::Client::new(),
        HttpDebugConfig::from_verbose(args.verbose),
    )
    .with_trace(trace.clone());

    // A missing API key leaves the REPL usable; it reports the problem on
    // the first prompt instead of refusing to start.
    let provider = OpenAiProvider::new(
        http.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
    )
    .ok();

    let notifier = PushoverNotifier::new(
        http,
        config.pushover_token.clone(),
        config.pushover_user.clone(),
        config.pushover_base_url.clone(),
    );

    let mut app_state = AppState {
        persona,
        provider,
        registry: ToolRegistry::new(notifier),
        engine_config: EngineConfig::default(),
        trace,
        transcript: Vec::new(),
    };

    run_repl(&mut app_state).await
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
