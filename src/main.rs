use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use mailpilot::agent::{Agent, AgentDeps};
use mailpilot::config::AgentConfig;
use mailpilot::ingest::ingest;
use mailpilot::llm::{Embedder, LlmBackend, LlmConfig, LlmProvider, create_embedder, create_provider};
use mailpilot::mail::{GmailClient, Mailbox};
use mailpilot::store::{DocumentIndex, DraftStore, LibSqlStore};
use mailpilot::tools::builtin_registry;

fn require_env(key: &str, hint: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        eprintln!("Error: {key} not set");
        eprintln!("  {hint}");
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ── Configuration from environment ──────────────────────────────
    let backend = LlmBackend::from_name(
        &std::env::var("MAILPILOT_LLM_BACKEND").unwrap_or_else(|_| "anthropic".to_string()),
    );
    let (key_var, default_model) = match backend {
        LlmBackend::Anthropic => ("ANTHROPIC_API_KEY", "claude-sonnet-4-20250514"),
        LlmBackend::OpenAi => ("OPENAI_API_KEY", "gpt-4o"),
    };
    let api_key = require_env(key_var, &format!("export {key_var}=..."));
    let model = std::env::var("MAILPILOT_MODEL").unwrap_or_else(|_| default_model.to_string());

    // Embeddings are always OpenAI-backed.
    let openai_key = require_env(
        "OPENAI_API_KEY",
        "export OPENAI_API_KEY=sk-...  (used for embeddings)",
    );
    let embed_model = std::env::var("MAILPILOT_EMBED_MODEL")
        .unwrap_or_else(|_| "text-embedding-3-small".to_string());

    let gmail_token = require_env(
        "GMAIL_ACCESS_TOKEN",
        "export GMAIL_ACCESS_TOKEN=ya29...  (OAuth access token from your auth flow)",
    );

    let db_path =
        std::env::var("MAILPILOT_DB_PATH").unwrap_or_else(|_| "./data/mailpilot.db".to_string());

    let mut config = AgentConfig::default();
    if let Ok(prompt) = std::env::var("MAILPILOT_SYSTEM_PROMPT") {
        config.system_prompt = Some(prompt);
    }
    if let Some(rounds) = std::env::var("MAILPILOT_MAX_TOOL_ROUNDS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.max_tool_rounds = rounds;
    }

    // ── Collaborators ───────────────────────────────────────────────
    let llm: Arc<dyn LlmProvider> = create_provider(&LlmConfig {
        backend,
        api_key: secrecy::SecretString::from(api_key),
        model: model.clone(),
    })?;
    let embedder: Arc<dyn Embedder> =
        create_embedder(&secrecy::SecretString::from(openai_key), &embed_model)?;
    let mailbox: Arc<dyn Mailbox> = Arc::new(GmailClient::new(secrecy::SecretString::from(
        gmail_token,
    )));

    let store = Arc::new(LibSqlStore::open(std::path::Path::new(&db_path)).await?);
    let drafts: Arc<dyn DraftStore> = store.clone();
    let index: Arc<dyn DocumentIndex> = store.clone();

    let tools = Arc::new(builtin_registry(
        &config,
        mailbox.clone(),
        llm.clone(),
        embedder.clone(),
        index.clone(),
        drafts,
    ));

    eprintln!("📬 MailPilot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", model);
    eprintln!("   Embeddings: {}", embed_model);
    eprintln!("   Database: {}", db_path);
    eprintln!("   Tools: {} registered", tools.count());
    eprintln!("   Indexed emails: {}", index.count().await?);
    eprintln!("   Type a message and press Enter. /ingest to index mail, /quit to exit.\n");

    let ingest_default = config.ingest_batch;
    let agent_name = config.name.clone();
    let agent = Agent::new(
        config,
        AgentDeps {
            llm,
            tools,
        },
    );
    tracing::info!("Agent {} ready and listening", agent_name);

    // ── REPL ────────────────────────────────────────────────────────
    // One turn runs to completion before the next line is read.
    let mut history = Vec::new();
    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["/quit"] | ["/exit"] => break,
            ["/ingest", rest @ ..] => {
                let max = rest
                    .first()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(ingest_default);
                match ingest(mailbox.as_ref(), embedder.as_ref(), index.as_ref(), max).await {
                    Ok(report) => println!(
                        "\nIndexed {} new emails ({} already indexed). Total: {}\n",
                        report.indexed,
                        report.skipped,
                        index.count().await.unwrap_or(0),
                    ),
                    Err(e) => println!("\nIngest failed: {e}\n"),
                }
            }
            _ => match agent.respond(&mut history, line).await {
                Ok(answer) => println!("\n{answer}\n"),
                Err(e) => {
                    tracing::error!("Turn failed: {e}");
                    println!("\nError: {e}\n");
                }
            },
        }
        eprint!("> ");
    }

    eprintln!("Goodbye!");
    Ok(())
}
