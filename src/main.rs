use clap::{Args, Parser, Subcommand};
use reply_helper::config::{
    DEFAULT_MODEL, DEFAULT_SESSIONS_PATH, DEFAULT_SYSTEM_PROMPT, Settings,
};
use reply_helper::logging::{self, LogLevel};
use reply_helper::openai::DEFAULT_BASE_URL;
use reply_helper::{HistoryPolicy, OpenAiResponses, ReplyHelper, SessionStore, SystemClipboard};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "reply-helper",
    about = "Clipboard chat replies with per-contact memory"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the control socket
    #[arg(
        long,
        env = "REPLY_HELPER_SOCKET",
        default_value = "/tmp/reply-helper.sock",
        global = true
    )]
    socket: PathBuf,

    /// Logging verbosity level
    #[arg(long, default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a command (generate, list, cycle, reset, slot N, use NAME) to a running helper
    Send {
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Model identifier for the completion API
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Instruction placed before every conversation
    #[arg(long, env = "SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    system_prompt: String,

    /// Exchanges kept per contact
    #[arg(long, env = "MAX_TURNS", default_value = "6")]
    max_turns: usize,

    /// API key for the completion API
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the completion API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Session state file
    #[arg(long, env = "REPLY_HELPER_SESSIONS", default_value = DEFAULT_SESSIONS_PATH)]
    sessions: PathBuf,

    /// Milliseconds between accepted reply requests
    #[arg(long, default_value = "1200")]
    cooldown_ms: u64,
}

impl From<&RunArgs> for Settings {
    fn from(args: &RunArgs) -> Self {
        Settings {
            model: args.model.clone(),
            system_prompt: args.system_prompt.clone(),
            max_turns: args.max_turns,
            cooldown: Duration::from_millis(args.cooldown_ms),
            sessions_path: args.sessions.clone(),
            base_url: args.base_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    match cli.command {
        Some(Command::Send { command }) => {
            let status = reply_helper::runtime::send_command(&cli.socket, &command.join(" ")).await?;
            println!("{status}");
            Ok(())
        }
        None => {
            let settings = Settings::from(&cli.run);
            let api_key = cli
                .run
                .api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
            let store = SessionStore::load(
                &settings.sessions_path,
                HistoryPolicy::new(settings.max_turns),
            );
            store.save()?;
            let helper = ReplyHelper::new(
                store,
                Arc::new(OpenAiResponses::new(&settings.base_url, api_key)),
                Arc::new(SystemClipboard),
                &settings,
            );
            reply_helper::runtime::run(helper, cli.socket).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["reply-helper"]).unwrap();
        assert!(cli.command.is_none());
        assert!(matches!(cli.log_level, LogLevel::Info));
        assert_eq!(cli.socket, PathBuf::from("/tmp/reply-helper.sock"));
        let settings = Settings::from(&cli.run);
        assert_eq!(settings.cooldown, Duration::from_millis(1200));
        assert_eq!(settings.sessions_path, PathBuf::from("sessions.json"));
    }

    #[test]
    fn parses_send_command() {
        let cli = Cli::try_parse_from(["reply-helper", "send", "use", "Mary"]).unwrap();
        match cli.command {
            Some(Command::Send { command }) => assert_eq!(command, vec!["use", "Mary"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_run_options() {
        let cli = Cli::try_parse_from([
            "reply-helper",
            "--model",
            "gpt-4o",
            "--max-turns",
            "2",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(matches!(cli.log_level, LogLevel::Debug));
        assert_eq!(cli.run.model, "gpt-4o");
        assert_eq!(cli.run.max_turns, 2);
    }
}
