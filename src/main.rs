//! OSINT-Ripple main entry point
//!
//! Command-line driver: runs one tool against one subject and prints the
//! report as JSON.

use clap::{Parser, Subcommand};
use osint_ripple::config::{load_config_with_hash, Config};
use osint_ripple::registry::{DARK_WEB_PROVIDERS, USERNAME_PLATFORMS};
use osint_ripple::resolve::RecordType;
use osint_ripple::tools::{Analysis, DnsRequest, Platform};
use osint_ripple::{AggregatedReport, Engine, QueryRequest};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// OSINT-Ripple: open-source intelligence aggregation
///
/// Fans a subject out to public providers (profile pages, DNS, WHOIS,
/// geolocation, search indexes) and prints one normalized report.
#[derive(Parser, Debug)]
#[command(name = "osint-ripple")]
#[command(version = "1.0.0")]
#[command(about = "Multi-provider OSINT aggregation", long_about = None)]
struct Cli {
    /// Path to TOML configuration file; built-in defaults when omitted
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check which platforms have a profile for a username
    Username {
        username: String,

        /// Platforms to check (default: all)
        #[arg(short, long, value_delimiter = ',')]
        platforms: Vec<String>,
    },

    /// Validate an email address and its mail domain
    Email { email: String },

    /// Enumerate DNS records and common subdomains
    Dns {
        domain: String,

        /// Record types to query (default: A,AAAA,MX,NS,TXT,CNAME,SOA)
        #[arg(short = 't', long = "types", value_delimiter = ',')]
        record_types: Vec<String>,

        /// Skip the subdomain sweep and address annotations
        #[arg(long)]
        records_only: bool,
    },

    /// Search dark-web indexes and breach databases
    Darkweb {
        query: String,

        /// general, data-breaches, forums, marketplaces or comprehensive
        #[arg(short = 't', long = "type", default_value = "general")]
        search_type: String,

        /// Providers to query (default: all serving the search type)
        #[arg(short, long, value_delimiter = ',')]
        providers: Vec<String>,

        /// Maximum results per provider
        #[arg(short, long, default_value_t = osint_ripple::model::DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Analyze a user, hashtag, subreddit or search on a social platform
    Social {
        /// twitter, reddit, instagram, tiktok or youtube
        platform: String,

        /// user, hashtag, search or subreddit
        analysis: String,

        query: String,

        /// Maximum items per listing
        #[arg(short, long, default_value_t = osint_ripple::model::DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Geolocate a public IP address or hostname
    Geo { target: String },

    /// Look up WHOIS registration data for a domain
    Whois { target: String },

    /// List the built-in providers
    Providers,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Command::Providers = cli.command {
        print_providers();
        return Ok(());
    }

    let engine = Engine::new(config)?;
    let report = run(&engine, cli.command).await?;
    print_report(&report)?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("osint_ripple=info,warn"),
            1 => EnvFilter::new("osint_ripple=debug,info"),
            2 => EnvFilter::new("osint_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs the selected tool
async fn run(engine: &Engine, command: Command) -> osint_ripple::Result<AggregatedReport> {
    match command {
        Command::Username {
            username,
            platforms,
        } => {
            engine
                .check_username(&QueryRequest::new(username).with_providers(platforms))
                .await
        }
        Command::Email { email } => engine.check_email(&QueryRequest::new(email)).await,
        Command::Dns {
            domain,
            record_types,
            records_only,
        } => {
            let record_types = record_types
                .iter()
                .map(|t| t.parse::<RecordType>())
                .collect::<osint_ripple::Result<Vec<_>>>()?;
            let mut request = DnsRequest::new(domain).with_record_types(record_types);
            if records_only {
                request = request.records_only();
            }
            engine.enumerate_dns(&request).await
        }
        Command::Darkweb {
            query,
            search_type,
            providers,
            limit,
        } => {
            let request = QueryRequest::new(query)
                .with_providers(providers)
                .with_limit(limit);
            engine
                .search_dark_web(&request, search_type.parse()?)
                .await
        }
        Command::Social {
            platform,
            analysis,
            query,
            limit,
        } => {
            let platform: Platform = platform.parse()?;
            let analysis: Analysis = analysis.parse()?;
            engine
                .analyze_social(platform, analysis, &QueryRequest::new(query).with_limit(limit))
                .await
        }
        Command::Geo { target } => engine.geolocate(&QueryRequest::new(target)).await,
        Command::Whois { target } => engine.whois(&QueryRequest::new(target)).await,
        Command::Providers => Ok(AggregatedReport::default()),
    }
}

fn print_report(report: &AggregatedReport) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Prints the provider tables
fn print_providers() {
    println!("Username platforms ({}):", USERNAME_PLATFORMS.len());
    for platform in USERNAME_PLATFORMS {
        println!("  - {:<12} {}", platform.id, platform.query_template);
    }

    println!("\nDark-web providers ({}):", DARK_WEB_PROVIDERS.len());
    for provider in DARK_WEB_PROVIDERS {
        let scopes: Vec<&str> = provider.scopes.iter().map(|s| s.as_str()).collect();
        let access = if provider.rule.is_live() {
            "live"
        } else {
            "manual"
        };
        println!(
            "  - {:<14} [{}] {}",
            provider.descriptor.id,
            access,
            scopes.join(", ")
        );
    }

    println!("\nSocial platforms:");
    println!("  - Twitter     user, hashtag, search (via Nitter mirrors)");
    println!("  - Reddit      user, subreddit, search");
    println!("  - Instagram   user");
    println!("  - TikTok      user (manual reference)");
    println!("  - YouTube     user");
}
