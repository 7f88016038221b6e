use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "rewrite-cli")]
#[command(about = "Management CLI for the http-rewrite admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "REWRITE_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status
    Status,
    /// Inspect or change rewrite rules
    Rules {
        #[command(subcommand)]
        action: RuleAction,
    },
}

#[derive(Subcommand)]
enum RuleAction {
    /// List rules in evaluation order
    List,
    /// Append a rule
    Add {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Answer with this redirect status instead of rewriting
        #[arg(long)]
        redirect: Option<u16>,
        /// Condition such as `%{REQUEST_METHOD} ^GET$`
        #[arg(long)]
        condition: Option<String>,
    },
    /// Remove every rule
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let rules_url = format!("{}/admin/rules", cli.url);

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Rules { action } => match action {
            RuleAction::List => {
                let res = client.get(&rules_url).headers(headers).send().await?;
                print_response(res).await?;
            }
            RuleAction::Add {
                from,
                to,
                redirect,
                condition,
            } => {
                let mut body = json!({ "from": from, "to": to });
                if let Some(status) = redirect {
                    body["redirect"] = json!(status);
                }
                if let Some(condition) = condition {
                    body["condition"] = json!(condition);
                }
                let res = client
                    .post(&rules_url)
                    .headers(headers)
                    .json(&body)
                    .send()
                    .await?;
                print_response(res).await?;
            }
            RuleAction::Reset => {
                let res = client.delete(&rules_url).headers(headers).send().await?;
                let status = res.status();
                if status.is_success() {
                    println!("All rules removed");
                } else {
                    eprintln!("Error: Admin API returned status {}", status);
                }
            }
        },
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
