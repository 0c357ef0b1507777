use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use quiz_conductor::backend::{ClaudeBackend, ClientKind, LlmBackend, MockBackend, MockHandle};
use quiz_conductor::config::SessionConfig;
use quiz_conductor::driver::SessionDriver;
use quiz_conductor::events::SessionEvent;
use quiz_conductor::session::Phase;
use quiz_conductor::store::MemoryStore;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone, Debug, ValueEnum)]
enum Client {
    Claude,
    Mock,
}

#[derive(Parser)]
#[command(author, version, about = "🎻 Music trivia session against an LLM conductor", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    ANTHROPIC_API_KEY  API key for the Claude backend
    RUST_LOG           Tracing filter, e.g. quiz_conductor=debug

EXAMPLES:
    play                         # Auto-detect backend (claude if a key is set)
    play --client mock           # Offline scripted demo game
    play --session-id maestro    # Keep score across restarts in this run")]
struct Args {
    /// Backend: claude or mock [default: auto-detect]
    #[arg(short, long, value_enum)]
    client: Option<Client>,

    /// Persist score/difficulty under this id (in-memory store)
    #[arg(long)]
    session_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let kind = match args.client {
        Some(Client::Claude) => ClientKind::Claude,
        Some(Client::Mock) => ClientKind::Mock,
        None => ClientKind::default(),
    };
    println!("Backend: {kind}");

    let backend: Box<dyn LlmBackend> = match kind {
        ClientKind::Claude => Box::new(
            ClaudeBackend::new().context("ANTHROPIC_API_KEY not found (env or .env)")?,
        ),
        ClientKind::Mock => {
            let (mock, handle) = MockBackend::new();
            script_demo_game(&handle);
            Box::new(mock)
        }
    };

    let mut driver = SessionDriver::new(backend, SessionConfig::default());
    if let Some(id) = &args.session_id {
        driver = driver.with_store(MemoryStore::new(), id);
    }
    let mut events = driver.subscribe();

    driver.start().await?;
    let mut options: Vec<String> = render_events(&mut events).unwrap_or_default();
    loop {
        match driver.session().state().phase {
            Phase::TopicSelect => {
                let choice = read_line("Pick a topic (number): ")?;
                let Some(topic) = pick(&options, &choice) else {
                    println!("Enter a number between 1 and {}.", options.len());
                    continue;
                };
                driver.choose_topic(&topic).await?;
            }
            Phase::Quiz => {
                let choice = read_line("Your answer (number): ")?;
                let Some(guess) = pick(&options, &choice) else {
                    println!("Enter a number between 1 and {}.", options.len());
                    continue;
                };
                driver.submit_answer(&guess).await?;
            }
            Phase::QuizResult => {
                read_line("Press Enter for the next round... ")?;
                driver.continue_round().await?;
            }
            Phase::Won => break,
            Phase::Loading => bail!("session stuck in loading"),
        }
        if let Some(o) = render_events(&mut events) {
            options = o;
        }
    }

    Ok(())
}

/// Drain and print pending events; returns the latest selectable list
/// (topics or answer options) if one was presented.
fn render_events(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Option<Vec<String>> {
    let mut selectable = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            SessionEvent::TopicsReady { topics } => {
                println!("\nTonight's programme:");
                print_numbered(&topics);
                selectable = Some(topics);
            }
            SessionEvent::QuestionReady { topic, text, options } => {
                println!("\n[{topic}] {text}");
                print_numbered(&options);
                selectable = Some(options);
            }
            SessionEvent::GuessResult { correct, correct_answer } => {
                if correct {
                    println!("Correct!");
                } else {
                    println!("Not quite - it was {correct_answer}.");
                }
            }
            SessionEvent::RoundResult { score, delta, tone, comment } => {
                println!("{comment}");
                println!("Score: {score} ({delta:+}), mood: {tone}");
            }
            SessionEvent::SessionWon { final_score, comment } => {
                println!("\n{comment}");
                println!("Final score: {final_score}");
            }
            SessionEvent::Notice { message } => println!("({message})"),
        }
    }
    selectable
}

fn print_numbered(items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        println!("  {}. {item}", i + 1);
    }
}

fn pick(items: &[String], input: &str) -> Option<String> {
    let index: usize = input.trim().parse().ok()?;
    items.get(index.checked_sub(1)?).cloned()
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}

/// Script a short offline game so `--client mock` is playable end to end.
fn script_demo_game(handle: &Arc<MockHandle>) {
    handle.push_text(r#"{"topics": ["Classic Rock", "Film Scores", "One-Hit Wonders"]}"#);
    let questions = [
        r#"{"text": "Which band recorded 'The Dark Side of the Moon'?",
            "options": ["Pink Floyd", "Led Zeppelin", "Genesis", "Yes"],
            "correctAnswer": "Pink Floyd",
            "comment": "1973, and it never really left the charts."}"#,
        r#"{"text": "Who scored 'The Good, the Bad and the Ugly'?",
            "options": ["Ennio Morricone", "John Williams", "Hans Zimmer", "Nino Rota"],
            "correctAnswer": "Ennio Morricone",
            "comment": "That coyote howl is an ocarina."}"#,
    ];
    for question in questions {
        handle.push_text(question);
        handle.push_text(
            r#"{"tone": "excited", "conductor_comment": "The strings are on their feet!"}"#,
        );
    }
}
