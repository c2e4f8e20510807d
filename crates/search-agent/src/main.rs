//! A terminal shell around `search-agent`.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::pin::pin;
use std::process::ExitCode;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use search_agent::core::AgentEvent;
use search_agent::core::conversation::{Message, Role};
use search_agent::tools::build_http_client;
use search_agent::{Config, SessionBuilder};
use search_agent_openai_model::OpenAIProvider;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";

/// Renders the progress of a turn between the prompt and the reply.
struct TurnView {
    style: ProgressStyle,
    progress_bar: Option<ProgressBar>,
    streaming: bool,
}

impl TurnView {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner} {wide_msg}")
            .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        Self {
            style,
            progress_bar: None,
            streaming: false,
        }
    }

    fn tick(&mut self) {
        if self.streaming {
            return;
        }
        self.progress_bar
            .get_or_insert_with(|| {
                let progress_bar = ProgressBar::new_spinner();
                progress_bar.set_style(self.style.clone());
                progress_bar.set_message("🤔 Thinking...");
                progress_bar
            })
            .inc(1);
    }

    fn handle(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Thinking { .. } => {
                self.end_stream();
                self.tick();
            }
            AgentEvent::Delta(delta) => {
                // Finish the progress bar before printing anything else.
                self.clear();
                self.streaming = true;
                print!("{}", delta.dimmed());
                std::io::stdout().flush().ok();
            }
            AgentEvent::ToolStarted { tool, query } => {
                self.end_stream();
                self.clear();
                println!(
                    "{}🔍 {} {}",
                    BAR_CHAR.bright_yellow(),
                    tool.bright_white().bold(),
                    query.bright_white()
                );
            }
            AgentEvent::ToolFinished { tool, ok } => {
                if !ok {
                    debug!("`{tool}` failed");
                }
            }
        }
    }

    fn end_stream(&mut self) {
        if self.streaming {
            println!();
            self.streaming = false;
        }
    }

    fn clear(&mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }

    fn finish(&mut self) {
        self.end_stream();
        self.clear();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    debug!("loaded {config:?}");
    let http_client = match build_http_client() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("failed to set up the HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let model_provider = OpenAIProvider::new(config.model_config());
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut session = SessionBuilder::with_model_provider(model_provider)
        .with_search_tools(http_client, &config)
        .on_event(move |event| {
            event_tx.send(event).ok();
        })
        .build();

    for message in session.transcript().messages() {
        print_message(message);
    }

    let mut stdin = io::BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = match stdin.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("error reading input: {err}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut view = TurnView::new();
        let report = {
            let mut turn = pin!(session.send_message(line));
            loop {
                view.tick();
                select! {
                    report = &mut turn => break report,
                    Some(event) = event_rx.recv() => view.handle(event),
                    _ = sleep(Duration::from_millis(100)) => {}
                }
            }
        };
        // Events sent right before the turn ended.
        while let Ok(event) = event_rx.try_recv() {
            view.handle(event);
        }
        view.finish();
        debug!(
            "turn took {:?}: {} iteration(s), {} tool call(s)",
            report.elapsed, report.iterations, report.tool_calls
        );

        if let Some(reply) = session.transcript().last() {
            print_message(reply);
        }
    }

    ExitCode::SUCCESS
}

fn print_message(message: &Message) {
    if message.role() == Role::Assistant {
        println!(
            "{}🤖 {}",
            BAR_CHAR.bright_cyan(),
            message.content().bright_white()
        );
    }
}
