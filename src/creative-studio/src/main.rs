//! Creative Studio: command-line front end for the creative workflow.
//!
//! Builds a creative from a JSON file or flags, runs it through the
//! compliance backend and prints the results as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use creative_compliance::HttpComplianceClient;
use creative_core::config::AppConfig;
use creative_core::{Category, Creative, Layout};
use creative_export::{CardRasterizer, ExportPipeline};
use creative_workflow::{NoticeLevel, Workflow};
use serde_json::json;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "creative-studio")]
#[command(about = "Compliance analysis, remediation and export for retail ad creatives")]
#[command(version)]
struct Cli {
    /// Compliance backend base URL (overrides config)
    #[arg(long, global = true, env = "CREATIVE_STUDIO__SERVICE__BASE_URL")]
    base_url: Option<String>,

    /// Request timeout in milliseconds (overrides config)
    #[arg(long, global = true, env = "CREATIVE_STUDIO__SERVICE__TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the backend banner
    Health,
    /// Analyze the creative
    Analyze(CreativeArgs),
    /// Analyze, then apply the server's fixes
    Fix(CreativeArgs),
    /// Analyze, then generate retailer variants
    Variants {
        #[command(flatten)]
        creative: CreativeArgs,
        /// Retailers to generate for (defaults to every known retailer)
        #[arg(long = "retailer")]
        retailers: Vec<String>,
    },
    /// Analyze, then export the preview image
    Export {
        #[command(flatten)]
        creative: CreativeArgs,
        /// Directory to write the image into (overrides config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
struct CreativeArgs {
    /// JSON file holding the creative; flags below override its fields
    #[arg(long)]
    creative: Option<PathBuf>,
    #[arg(long)]
    headline: Option<String>,
    #[arg(long)]
    subhead: Option<String>,
    #[arg(long)]
    cta: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
    /// Default, Alcohol or LEP
    #[arg(long)]
    category: Option<Category>,
    /// "Instagram Square", "Instagram Story" or "Facebook Feed"
    #[arg(long)]
    layout: Option<Layout>,
}

impl CreativeArgs {
    fn build(&self) -> anyhow::Result<Creative> {
        let mut creative = match &self.creative {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => Creative::default(),
        };

        if let Some(headline) = &self.headline {
            creative.set_headline(headline.as_str());
        }
        if let Some(subhead) = &self.subhead {
            creative.set_subhead(subhead.as_str());
        }
        if let Some(cta) = &self.cta {
            creative.set_cta(cta.as_str());
        }
        if let Some(image_url) = &self.image_url {
            creative.set_image_url(image_url.as_str());
        }
        if let Some(category) = self.category {
            creative.set_category(category);
        }
        if let Some(layout) = self.layout {
            creative.set_layout(layout);
        }
        Ok(creative)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON results.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "creative_studio=info,creative_workflow=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.service.timeout_ms = timeout_ms;
    }

    info!(
        base_url = %config.service.base_url,
        timeout_ms = config.service.timeout_ms,
        max_kb = config.export.max_kb,
        "Configuration loaded"
    );

    let client = Arc::new(HttpComplianceClient::new(&config.service)?);

    let (creative_args, retailers, action) = match cli.command {
        Command::Health => {
            let banner = client.health().await?;
            println!("{banner}");
            return Ok(());
        }
        Command::Analyze(args) => (args, Vec::new(), Action::Analyze),
        Command::Fix(args) => (args, Vec::new(), Action::Fix),
        Command::Variants {
            creative,
            retailers,
        } => (creative, retailers, Action::Variants),
        Command::Export { creative, out_dir } => {
            let dir = out_dir.unwrap_or_else(|| PathBuf::from(&config.export.output_dir));
            (creative, Vec::new(), Action::Export(dir))
        }
    };

    let pipeline = ExportPipeline::new(
        &config.export,
        Arc::new(CardRasterizer::new(config.export.preview_width)),
        Some(client.clone()),
    );
    let mut workflow = Workflow::new(config.workflow.clone(), client, pipeline)
        .with_creative(creative_args.build()?);
    if !retailers.is_empty() {
        workflow = workflow.with_retailers(retailers);
    }

    let outcome = run(action, &workflow).await;
    report_notices(&workflow);

    let output = outcome?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// What to do once the creative is analyzed.
enum Action {
    Analyze,
    Fix,
    Variants,
    Export(PathBuf),
}

async fn run(action: Action, workflow: &Workflow) -> anyhow::Result<serde_json::Value> {
    let analysis = workflow.analyze().await?;

    match action {
        Action::Analyze => Ok(json!({
            "analysis": analysis,
            "score": analysis.score_label(),
            "prediction": workflow.prediction(),
        })),
        Action::Fix => {
            let outcome = workflow.remediate().await?;
            let snapshot = workflow.snapshot();
            Ok(json!({
                "applied": outcome.applied,
                "summary": outcome.summary,
                "changed_fields": outcome.changed_fields,
                "creative": snapshot.creative,
                "analysis": snapshot.analysis,
                "prediction": snapshot.prediction,
            }))
        }
        Action::Variants => {
            let variants = workflow.generate_variants()?;
            Ok(json!({ "variants": variants.variants }))
        }
        Action::Export(out_dir) => {
            let file = workflow.export_preview().await?;
            let path = file.write_to(&out_dir).await?;
            Ok(json!({
                "path": path.display().to_string(),
                "source": file.source,
                "size_bytes": file.payload.len(),
                "width": file.width,
                "height": file.height,
            }))
        }
    }
}

fn report_notices(workflow: &Workflow) {
    for notice in workflow.take_notices() {
        match notice.level {
            NoticeLevel::Info => info!(message = %notice.message, "notice"),
            NoticeLevel::Error => error!(message = %notice.message, "notice"),
        }
        eprintln!("{}", notice.message);
    }
}
