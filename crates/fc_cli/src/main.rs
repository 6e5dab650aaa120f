use clap::Parser;
use fc_core::{AnalysisInput, Result, DEFAULT_RELIABILITY_SCORE};
use fc_service::{init_logging, Services};
use fc_web::AppState;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_millis = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                let factor = match c {
                    'm' if chars.peek() == Some(&'s') => {
                        chars.next();
                        1
                    }
                    's' => 1_000,
                    'm' => 60_000,
                    'h' => 3_600_000,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_millis = num
                    .checked_mul(factor)
                    .and_then(|millis| total_millis.checked_add(millis))
                    .ok_or_else(|| "Duration too large".to_string())?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number means seconds
        if !current_number.is_empty() {
            let num = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_millis = num
                .checked_mul(1_000)
                .and_then(|millis| total_millis.checked_add(millis))
                .ok_or_else(|| "Duration too large".to_string())?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_millis == 0 {
            return Err("Duration must be greater than zero".to_string());
        }

        Ok(HumanDuration(Duration::from_millis(total_millis)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "FakeCheck news verification service", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "FAKECHECK_STORAGE", default_value = "memory", global = true)]
    storage: String,
    /// Database location for persistent backends (a file path for sqlite)
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,
    #[arg(
        long,
        env = "FAKECHECK_MODEL",
        default_value = "openai",
        global = true,
        help = "Model used for analysis. Available models: openai (default), ollama, dummy, heuristic"
    )]
    model: String,
    /// Model identifier passed to the backend (e.g. gpt-4o-mini)
    #[arg(long, env = "FAKECHECK_MODEL_ID", global = true)]
    model_id: Option<String>,
    /// Base URL of the model endpoint
    #[arg(long, env = "FAKECHECK_MODEL_URL", global = true)]
    model_url: Option<String>,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,
    /// Give up on the language model after this long (e.g. 10s, 1m30s, 500ms)
    #[arg(long, default_value = "10s", global = true)]
    analysis_timeout: HumanDuration,
    #[arg(long, env = "FAKECHECK_LOG_LEVEL", default_value = "info", global = true)]
    log_level: Level,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "FAKECHECK_HOST", default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
    },
    /// Analyse one article and print the verdict as JSON
    Analyze {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        domain: Option<String>,
        #[arg(long, default_value_t = DEFAULT_RELIABILITY_SCORE)]
        reliability: f64,
    },
}

impl Cli {
    fn inference_config(&self) -> fc_inference::Config {
        fc_inference::Config {
            model_name: Some(self.model.clone()),
            model_id: self.model_id.clone(),
            model_url: self.model_url.clone(),
            api_key: self.api_key.clone(),
            analysis_timeout: self.analysis_timeout.0,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let analyzer = fc_inference::create_analyzer(&cli.inference_config())?;

    match cli.command {
        Commands::Serve { host, port } => {
            info!("💾 Opening storage ({})", cli.storage);
            let storage = fc_storage::create_storage(&cli.storage, cli.database_url.as_deref()).await?;
            let services = Services::new(storage, analyzer);
            fc_web::serve(SocketAddr::new(host, port), AppState::new(services)).await?;
        }
        Commands::Analyze { title, content, url, domain, reliability } => {
            let input = AnalysisInput {
                title,
                content,
                url,
                domain,
                reliability_score: reliability,
            };
            let verdict = analyzer.analyze(&input).await;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> std::result::Result<Duration, String> {
        s.parse::<HumanDuration>().map(|d| d.0)
    }

    #[test]
    fn test_human_duration() {
        assert_eq!(parse("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse("2m 5s").unwrap(), Duration::from_secs(125));
        assert_eq!(parse("7").unwrap(), Duration::from_secs(7));
        assert!(parse("").is_err());
        assert!(parse("5d").is_err());
        assert!(parse("abc").is_err());
        assert!(parse("0s").is_err());
    }

    #[test]
    fn test_human_duration_overflow() {
        assert_eq!(parse("18446744073709551615h"), Err("Duration too large".to_string()));
        assert_eq!(parse("18446744073709551615"), Err("Duration too large".to_string()));
        assert_eq!(
            parse("18446744073709551s 18446744073709551s"),
            Err("Duration too large".to_string())
        );
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "fakecheck",
            "--model",
            "heuristic",
            "--analysis-timeout",
            "3s",
            "serve",
            "--port",
            "8080",
        ])
        .unwrap();
        assert_eq!(cli.model, "heuristic");
        assert_eq!(cli.analysis_timeout.0, Duration::from_secs(3));
        assert!(matches!(cli.command, Commands::Serve { port: 8080, .. }));

        let config = cli.inference_config();
        assert_eq!(config.model_name.as_deref(), Some("heuristic"));
        assert_eq!(config.analysis_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_analyze_command_parsing() {
        let cli = Cli::try_parse_from([
            "fakecheck",
            "analyze",
            "--content",
            "Doctors hate this trick",
            "--reliability",
            "0.2",
            "--storage",
            "memory",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { content, reliability, title, .. } => {
                assert_eq!(content, "Doctors hate this trick");
                assert_eq!(reliability, 0.2);
                assert!(title.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
