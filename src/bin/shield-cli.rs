//! Inspection CLI for the request-security library: compose policy headers,
//! validate raw policy strings, mint nonces.

use clap::{Parser, Subcommand};

use request_shield::config::{Environment, ShieldConfig};
use request_shield::gateway::headers::hardening_headers;
use request_shield::policy::PolicyComposer;

#[derive(Parser)]
#[command(name = "shield-cli")]
#[command(about = "Inspection CLI for the request security library", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the composed hardening header set
    Headers {
        #[arg(short, long, default_value = "development")]
        environment: Environment,

        /// Comma-separated feature list (payment,authentication,analytics,pwa,mobile,high-security)
        #[arg(short, long, default_value = "")]
        features: String,

        /// Emit the report-only CSP variant
        #[arg(long)]
        report_only: bool,
    },
    /// Validate a raw Content-Security-Policy header string
    Validate { header: String },
    /// Generate a fresh CSP nonce
    Nonce,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "request_shield=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Headers {
            environment,
            features,
            report_only,
        } => {
            let mut config = ShieldConfig::default();
            config.environment = environment;
            config.policy.report_only = report_only;
            for feature in features.split(',').filter(|f| !f.is_empty()) {
                match feature {
                    "payment" => config.features.payment = true,
                    "authentication" => config.features.authentication = true,
                    "analytics" => config.features.analytics = true,
                    "pwa" => config.features.pwa = true,
                    "mobile" => config.features.mobile = true,
                    "high-security" => config.features.high_security = true,
                    other => return Err(format!("unknown feature: {other}").into()),
                }
            }
            let composer = PolicyComposer::new(&config);
            for (name, value) in hardening_headers(&composer) {
                println!("{name}: {value}");
            }
        }
        Commands::Validate { header } => {
            let composer = PolicyComposer::new(&ShieldConfig::default());
            let report = composer.validate_header_string(&header);
            for error in &report.errors {
                eprintln!("error: {error}");
            }
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            if report.passed {
                println!("policy OK");
            } else {
                std::process::exit(1);
            }
        }
        Commands::Nonce => {
            let composer = PolicyComposer::new(&ShieldConfig::default());
            println!("{}", composer.refresh_nonce());
        }
    }

    Ok(())
}
