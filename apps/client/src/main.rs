use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ats_client::flows::batch::{HrDashboard, SortKey};
use ats_client::flows::feedback::AnalysisFeedback;
use ats_client::flows::upload::ResumeUpload;
use ats_client::models::resume::{AnalysisId, ResumeFile};
use ats_client::presentation::{
    format_file_size, render_analysis, render_candidates, AnalysisView,
};
use ats_client::templates::{download_template, find_template, TEMPLATES};
use ats_client::{ApiClient, AvailabilityMonitor, Config, FlowError, MonitorHandle, StatusSnapshot};

#[derive(Parser)]
#[command(name = "ats", version, about = "ATS resume analyzer client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the backend once
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Keep probing the backend and print every change until Ctrl-C
    Watch,
    /// Upload one PDF resume and show its analysis
    Upload {
        file: PathBuf,
        #[command(flatten)]
        jd: JobDescription,
    },
    /// Show the analysis for an uploaded resume
    Analysis { id: String },
    /// Analyze several resumes against one job description
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        jd: JobDescription,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// List or download resume templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct JobDescription {
    /// Job description text
    #[arg(long)]
    jd: Option<String>,
    /// Read the job description from a file
    #[arg(long)]
    jd_file: Option<PathBuf>,
}

impl JobDescription {
    async fn load(&self) -> Result<String> {
        match (&self.jd, &self.jd_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Could not read {}", path.display())),
            (None, None) => Ok(String::new()),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Ats,
    Skill,
}

#[derive(Subcommand)]
enum TemplateAction {
    List,
    Download {
        id: u32,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("ats_client={},ats={}", config.rust_log, config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("ATS client v{} -> {}", env!("CARGO_PKG_VERSION"), config.api_url);
    let client = ApiClient::from_config(&config)?;

    match cli.command {
        Command::Status { json } => status(&client, json).await,
        Command::Watch => watch(&client, &config).await,
        Command::Upload { file, jd } => upload(&client, &config, file, &jd).await,
        Command::Analysis { id } => analysis(&client, &AnalysisId::from(id.as_str())).await,
        Command::Batch { files, jd, sort } => batch(&client, &config, files, &jd, sort).await,
        Command::Templates { action } => templates(&config, action).await,
    }
}

fn start_monitor(client: &ApiClient, config: &Config) -> MonitorHandle {
    AvailabilityMonitor::new(Arc::new(client.clone()), config.health_interval).start()
}

fn print_snapshot(snapshot: &StatusSnapshot) {
    let when = snapshot
        .checked_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    println!("[{when}] {:?}: {}", snapshot.status, snapshot.message);
}

/// Keeps only the user-facing text; `main` prints it on exit.
fn fail(err: FlowError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

async fn status(client: &ApiClient, json: bool) -> Result<()> {
    let snapshot = StatusSnapshot::from_probe(&client.check_health().await, chrono::Utc::now());
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    if !snapshot.status.is_available() {
        anyhow::bail!("backend unavailable");
    }
    Ok(())
}

async fn watch(client: &ApiClient, config: &Config) -> Result<()> {
    let monitor = start_monitor(client, config);
    let mut rx = monitor.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                print_snapshot(&snapshot);
            }
        }
    }

    monitor.stop().await;
    Ok(())
}

async fn upload(
    client: &ApiClient,
    config: &Config,
    path: PathBuf,
    jd: &JobDescription,
) -> Result<()> {
    let file = ResumeFile::from_path(&path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))?;
    let job_description = jd.load().await?;

    let monitor = start_monitor(client, config);
    let snapshot = monitor.ready().await;
    print_snapshot(&snapshot);

    let mut flow = ResumeUpload::new(client.clone());
    flow.select_file(file).map_err(|e| fail(e.into()))?;
    flow.set_job_description(job_description);
    flow.apply_status(&snapshot);
    let outcome = flow.submit(&monitor).await;
    monitor.stop().await;

    let id = outcome.map_err(fail)?;
    if let Some(message) = flow.success() {
        println!("{message} (analysis id: {id})");
    }
    analysis(client, &id).await
}

async fn analysis(client: &ApiClient, id: &AnalysisId) -> Result<()> {
    let mut feedback = AnalysisFeedback::new(client.clone());
    let payload = feedback.load(id).await.map_err(fail)?;
    print!("{}", render_analysis(&AnalysisView::from_payload(payload)));
    Ok(())
}

async fn batch(
    client: &ApiClient,
    config: &Config,
    paths: Vec<PathBuf>,
    jd: &JobDescription,
    sort: Option<SortArg>,
) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let file = ResumeFile::from_path(path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?;
        files.push(file);
    }

    let mut dashboard = HrDashboard::new(client.clone());
    let offered = files.len();
    let accepted = dashboard.add_files(files);
    if accepted < offered {
        eprintln!("Skipped {} file(s) that are not PDF, DOC or DOCX", offered - accepted);
    }
    for file in dashboard.files() {
        println!("{} ({})", file.name, format_file_size(file.size() as u64));
    }
    dashboard.set_job_description(jd.load().await?);

    let monitor = start_monitor(client, config);
    print_snapshot(&monitor.ready().await);
    let outcome = dashboard.submit(&monitor).await.map(|r| r.len());
    monitor.stop().await;
    outcome.map_err(fail)?;

    match sort {
        Some(SortArg::Ats) => dashboard.sort_results(SortKey::AtsScore),
        Some(SortArg::Skill) => dashboard.sort_results(SortKey::SkillMatch),
        None => {}
    }
    println!("Top Candidates");
    print!("{}", render_candidates(dashboard.top_candidates()));
    Ok(())
}

async fn templates(config: &Config, action: TemplateAction) -> Result<()> {
    match action {
        TemplateAction::List => {
            for t in TEMPLATES {
                println!("{:>2}  {:<24} {}", t.id, t.name, t.description);
                println!("    tags: {}", t.tags.join(", "));
            }
            Ok(())
        }
        TemplateAction::Download { id, out } => {
            let template =
                find_template(id).with_context(|| format!("No template with id {id}"))?;
            let client = ApiClient::new(config.templates_url.clone(), config.request_timeout)?;
            let path = download_template(&client, template, &out)
                .await
                .map_err(fail)?;
            println!("Saved {}", path.display());
            Ok(())
        }
    }
}
