use anyhow::Context;
use clap::Parser;
use paper_analysis_service::{AppConfig, PaperAnalyzer, report::render_text};
use std::path::PathBuf;
use tracing::info;

/// Analyze a research paper PDF from the command line.
#[derive(Debug, Parser)]
#[command(name = "analyze-paper", version, about)]
struct Args {
    /// Path to the paper PDF.
    pdf_path: PathBuf,

    /// Print the result as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Only run citation verification, skipping summary and novelty.
    #[arg(long)]
    citations_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paper_analysis_service=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;
    let analyzer = PaperAnalyzer::from_config(&config)?;
    info!(pdf_path = %args.pdf_path.display(), model = %config.llm_model, "Analyzing paper");

    if args.citations_only {
        let report = analyzer
            .verifier()
            .verify(&args.pdf_path)
            .await
            .context("citation verification failed")?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", render_text(&report));
        }
        return Ok(());
    }

    let analysis = analyzer
        .analyze(&args.pdf_path)
        .await
        .context("paper analysis failed")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("Summary\n{}\n", analysis.summary);
        println!("Novelty\n{}\n", analysis.novelty);
        print!("{}", render_text(&analysis.citations));
    }
    Ok(())
}
