mod crawler;
mod fetcher;

use crawler::{Crawler, LinkPolicy};
use fetcher::HtmlFetcher;

use clap::{CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// The URL from which to start the crawl
    #[arg(short, long, default_value = "https://www.google.com")]
    url: String,
    /// How many layers deep each traversal is allowed to crawl
    #[arg(short, long, default_value_t = 3, allow_negative_numbers = true)]
    depth: i32,
    /// Include per-URL detail in the final report
    #[arg(short, long)]
    verbose: bool,
    /// Also follow links containing the current page's URL
    #[arg(long)]
    follow_self_links: bool,
    #[arg(long)]
    user_agent: Option<String>,
    #[arg(short, long)]
    log_level: Option<String>,
}

fn http_client(user_agent: Option<&str>) -> reqwest::Result<reqwest::Client> {
    let builder = reqwest::Client::builder();
    match user_agent {
        Some(agent) => builder.user_agent(agent),
        None => builder,
    }
    .build()
}

fn invalid_depth_message() -> String {
    format!(
        "Please provide a positive depth arg\n{}",
        Cli::command().render_help()
    )
}

#[tokio::main]
async fn main() {
    let args = Cli::try_parse();
    match args {
        Ok(args) => {
            if let Some(log_level) = &args.log_level {
                tracing_subscriber::fmt()
                    .with_env_filter(format!("web_crawler={}", log_level))
                    .compact()
                    .init();
            }

            if args.depth < 1 {
                println!("{}", invalid_depth_message());
                return;
            }

            let client = match http_client(args.user_agent.as_deref()) {
                Ok(client) => client,
                Err(e) => {
                    println!("Unable to build HTTP client: {}", e);
                    return;
                }
            };

            let crawler = Crawler::new(
                HtmlFetcher::new(client),
                LinkPolicy {
                    follow_self_links: args.follow_self_links,
                },
            );

            println!("Beginning web crawl at {}", args.url);
            let report = match crawler.crawl(&args.url, args.depth).await {
                Ok(_) => crawler.report(args.verbose),
                Err(e) => Err(e),
            };
            match report {
                Ok(text) => println!("\n{}", text),
                Err(e) => println!("{}", e),
            }
        }
        Err(e) => println!("{}", e.to_string()),
    }
}
