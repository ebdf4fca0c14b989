use clap::Parser;
use gameshelf::{
    api::{CollectionApi, TokenSession},
    chat::{ChatSession, TurnOutcome},
    documents::{Author, ConversationMessage, QuickReply},
    library::CollectionCache,
    util::config::Config,
    Status, Tracing,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Chat with your game collection from the terminal.
#[derive(Parser)]
struct Opts {
    /// JSON file with client settings.
    #[clap(long)]
    config: Option<String>,

    /// Overrides the collection service URL from the config.
    #[clap(long)]
    api_url: Option<String>,

    /// Overrides the access token from the config.
    #[clap(long)]
    token: Option<String>,

    /// Log level for stderr output.
    #[clap(long, default_value = "info")]
    log_level: String,
}

impl Opts {
    fn config(&self) -> Result<Config, Status> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.access_token = Some(token.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let opts: Opts = Opts::parse();
    Tracing::setup_with_level("chat_client", Tracing::parse_level(&opts.log_level)?)?;

    let config = opts.config()?;
    let session = Arc::new(TokenSession::new(config.access_token.clone()));
    let api = Arc::new(CollectionApi::new(
        &config.api_url,
        session.clone(),
        config.request_timeout(),
    )?);
    let cache = Arc::new(CollectionCache::new(api.clone(), session.clone()));
    let chat = ChatSession::new(api, cache, session.clone(), &config);

    let mut printed = print_new(&chat.messages(), 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "/quit" {
            break;
        }

        let reply = match chat.pending_confirmation().await {
            Some(_) => QuickReply::from_answer(line),
            None => None,
        };
        let outcome = match reply {
            Some(reply) => chat.on_quick_reply(reply).await,
            None => chat.on_send(line).await,
        };

        printed = print_new(&chat.messages(), printed);

        if outcome == TurnOutcome::SessionExpired {
            println!("Your session has expired. Please sign in again.");
            break;
        }
    }

    info!("Chat ended, expired session: {}", session.is_expired());
    Ok(())
}

/// Prints bot messages appended since `from` and returns the new log length.
fn print_new(messages: &[ConversationMessage], from: usize) -> usize {
    for message in messages.iter().skip(from) {
        if message.author != Author::Bot {
            continue;
        }
        println!("> {}", message.text);
        if let Some(image) = &message.image {
            println!("  {image}");
        }
        if !message.quick_replies.is_empty() {
            println!(
                "  [{}]",
                message
                    .quick_replies
                    .iter()
                    .map(|reply| reply.title.as_str())
                    .collect::<Vec<_>>()
                    .join(" / ")
            );
        }
    }
    messages.len()
}
