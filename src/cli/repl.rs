use anyhow::Result;
use rustyline::Editor;
use rustyline::error::ReadlineError;

use crate::agent::{EngineConfig, Persona, ToolRegistry, respond};
use crate::llm::openai::OpenAiProvider;
use crate::llm::provider::Turn;
use crate::notify::PushoverNotifier;
use crate::trace::SessionTrace;

pub struct AppState {
    pub persona: Persona,
    pub provider: Option<OpenAiProvider>,
    pub registry: ToolRegistry<PushoverNotifier>,
    pub engine_config: EngineConfig,
    pub trace: SessionTrace,
    /// Transcript across turns within this session. Owned here, passed by
    /// reference into the engine; the engine itself is stateless.
    pub transcript: Vec<Turn>,
}

const MISSING_KEY_NOTICE: &str = "Assistant unavailable: missing OPENAI_API_KEY. \
Configure it in your shell or .env file (example: OPENAI_API_KEY=your_key).";

pub async fn run_repl(state: &mut AppState) -> Result<()> {
    println!(
        "Chat with {} — ask about career, skills, or projects. Type 'exit' to quit.",
        state.persona.display_name
    );

    let mut rl = Editor::<(), rustyline::history::DefaultHistory>::new()?;

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let line = line.trim();
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                handle_line(state, line).await;
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

async fn handle_line(state: &mut AppState, line: &str) {
    let Some(provider) = &state.provider else {
        println!("{MISSING_KEY_NOTICE}");
        return;
    };

    state.trace.log_user_input(line);

    match respond(
        provider,
        &state.registry,
        &state.persona,
        &state.transcript,
        line,
        &state.engine_config,
    )
    .await
    {
        Ok(reply) => {
            println!("{}", reply.text);
            state.trace.log_assistant_output(&reply.text);
            // Only plain user/assistant turns survive across turns; tool
            // traffic stays inside the single engine invocation.
            state.transcript.push(Turn::user(line));
            state.transcript.push(Turn::assistant(reply.text));
        }
        Err(err) => {
            // Fatal to this turn only; the transcript stays unchanged so
            // the visitor can simply try again.
            println!("Assistant request failed: {err}");
            state.trace.log_assistant_error(&err.to_string());
        }
    }
}
