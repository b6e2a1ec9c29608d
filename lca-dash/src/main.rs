//! lca-dash - Terminal client for the LCA product backend
//!
//! Uploads product CSVs, tracks processing jobs, reviews material mappings
//! and shows product impacts. Notifications from the services are printed
//! as they arrive on the event bus.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use lca_common::config::{CliOverrides, ConfigResolver};
use lca_common::EventBus;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lca_dash::models::{JobStatus, UploadJob};
use lca_dash::services::upload_workflow::review_for;
use lca_dash::services::{aggregate_impacts, ReviewList, UploadState, UploadWorkflow};
use lca_dash::{DashState, WorkflowError};

mod cli;
mod render;

use cli::{Args, Command, ProductsCommand};
use render::CliFormatter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = CliOverrides {
        config_file: args.config.clone(),
        api_base_url: args.api_url.clone(),
        data_folder: args.data_folder.clone(),
        log_level: args.log_level.clone(),
    };

    let config = ConfigResolver::new(overrides)
        .resolve()
        .context("Failed to resolve configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting lca-dash v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    debug!(
        api = %config.api_base_url,
        data_folder = %config.data_folder.display(),
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Configuration resolved"
    );

    let state = DashState::open(config).context("Failed to open dashboard state")?;

    let printer_stop = CancellationToken::new();
    let printer = spawn_event_printer(&state.events, printer_stop.clone());

    let result = run(&state, args.command).await;

    printer_stop.cancel();
    if let Err(e) = printer.await {
        warn!("Event printer task failed: {}", e);
    }
    result
}

/// Print notifications until stopped, then drain what is left
fn spawn_event_printer(events: &EventBus, stop: CancellationToken) -> JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(event) => eprintln!("{}", CliFormatter::format_event(&event)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Dropped {} notifications", skipped);
                    }
                    Err(RecvError::Closed) => return,
                },
            }
        }
        while let Ok(event) = rx.try_recv() {
            eprintln!("{}", CliFormatter::format_event(&event));
        }
    })
}

async fn run(state: &DashState, command: Command) -> Result<()> {
    let sessions = state.session_service();

    match command {
        Command::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };
            let session = sessions.login(&email, &password).await?;
            println!("{}", CliFormatter::format_session(&session));
        }
        Command::Logout => sessions.logout().await?,
        Command::Whoami => match sessions.current() {
            Some(session) => println!("{}", CliFormatter::format_session(&session)),
            None => println!("Not logged in"),
        },
        Command::Impersonate { user_id } => {
            let session = sessions.impersonate(&user_id).await?;
            println!("{}", CliFormatter::format_session(&session));
        }
        Command::StopImpersonating => {
            let session = sessions.stop_impersonating()?;
            println!("{}", CliFormatter::format_session(&session));
        }
        Command::Upload { file, no_wait } => {
            sessions.require()?;
            upload(state, file, no_wait).await?;
        }
        Command::Track { job_id } => {
            sessions.require()?;
            let mut workflow = state.upload_workflow();
            workflow.resume(&job_id)?;
            track(&mut workflow).await?;
        }
        Command::History { clear } => {
            if clear {
                state.history.clear()?;
                println!("Upload history cleared");
            } else {
                println!("{}", CliFormatter::format_history(&state.history.entries()));
            }
        }
        Command::Review {
            job_id,
            filter,
            search,
        } => {
            sessions.require()?;
            let review = load_review(state, &job_id).await?;
            let materials = review.filtered(filter, &search);
            println!("{}", CliFormatter::format_review(&review, &materials));
        }
        Command::Alternatives { material_name } => {
            sessions.require()?;
            let activities = ReviewList::find_alternatives(&state.client, &material_name).await?;
            println!("{}", CliFormatter::format_alternatives(&material_name, &activities));
        }
        Command::Confirm {
            job_id,
            min_level,
            picks,
            alternatives,
        } => {
            sessions.require()?;
            let mut review = load_review(state, &job_id).await?;
            let auto = review.select_top_suggestions(min_level.into());
            for (material_id, index) in &picks {
                review.select_suggestion(material_id, *index)?;
            }
            for (material_id, activity_uuid) in &alternatives {
                review
                    .select_alternative(&state.client, material_id, activity_uuid)
                    .await?;
            }
            info!(
                job_id = %job_id,
                auto,
                explicit = picks.len(),
                alternatives = alternatives.len(),
                "Mappings selected"
            );
            println!("{}", CliFormatter::format_review_counts(&review.counts()));

            if !review.can_confirm() {
                bail!(WorkflowError::NothingSelected);
            }
            let confirmed = review.confirm(&state.client).await?;
            println!("Confirmed {} mappings", confirmed);
        }
        Command::Products { action } => {
            sessions.require()?;
            products(state, action).await?;
        }
        Command::Template { dest } => {
            sessions.require()?;
            let bytes = state.client.download_template(&dest).await?;
            println!("Saved template to {} ({} bytes)", dest.display(), bytes);
        }
    }

    Ok(())
}

async fn upload(state: &DashState, file: PathBuf, no_wait: bool) -> Result<()> {
    let mut workflow = state.upload_workflow();

    let submitted = workflow.submit(&[file]).await?.clone();
    match submitted {
        UploadState::ValidationError { file_name, failure } => {
            println!("{}", CliFormatter::format_validation_failure(&file_name, &failure));
            bail!("upload rejected");
        }
        UploadState::Polling { job } if no_wait => {
            println!("Queued as job {}; run `lca-dash track {}`", job.job_id, job.job_id);
            Ok(())
        }
        UploadState::Polling { .. } => track(&mut workflow).await,
        _ => Ok(()),
    }
}

/// Track until terminal; Ctrl-C cancels polling
async fn track(workflow: &mut UploadWorkflow) -> Result<()> {
    let cancel = workflow.cancel_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling");
            cancel.cancel();
        }
    });

    let outcome = workflow.track().await.map(Clone::clone);
    ctrl_c.abort();

    match outcome {
        Ok(UploadState::Completed { job }) => {
            println!("{}", CliFormatter::format_job(&job));
            let review = review_for(&job);
            if !review.materials().is_empty() {
                println!(
                    "{}\nRun `lca-dash review {}` to map them",
                    CliFormatter::format_review_counts(&review.counts()),
                    job.job_id
                );
            }
            Ok(())
        }
        Ok(UploadState::Failed { job }) => {
            println!("{}", CliFormatter::format_job(&job));
            bail!("upload job {} failed", job.job_id)
        }
        Ok(_) => Ok(()),
        Err(WorkflowError::Cancelled) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Review list for a finished job, from history or the backend
async fn load_review(state: &DashState, job_id: &str) -> Result<ReviewList> {
    if let Some(job) = state.history.get(job_id).filter(|j| j.result.is_some()) {
        return Ok(review_for(&job));
    }

    let response = state.client.job_status(job_id).await?;
    if response.status != JobStatus::Completed {
        bail!("job {} is {}, not completed", job_id, response.status.as_str());
    }
    let mut job = UploadJob::pending(job_id, None);
    job.apply_status(&response);
    Ok(review_for(&job))
}

async fn products(state: &DashState, action: ProductsCommand) -> Result<()> {
    match action {
        ProductsCommand::List {
            page,
            limit,
            search,
        } => {
            let page = state
                .client
                .list_products(page, limit, search.as_deref())
                .await?;
            println!("{}", CliFormatter::format_product_page(&page));
        }
        ProductsCommand::Show { id } => {
            let detail = state.client.get_product(&id).await?;
            println!("{}", CliFormatter::format_product(&detail));
        }
        ProductsCommand::Delete { id } => {
            state.client.delete_product(&id).await?;
            println!("Deleted product {}", id);
        }
        ProductsCommand::Impacts { id, bar_width } => {
            let impacts = state.client.product_impacts(&id).await?;
            let breakdowns = aggregate_impacts(&impacts.material_impacts);
            println!(
                "{}",
                CliFormatter::format_impacts(&impacts, &breakdowns, bar_width)
            );
        }
    }
    Ok(())
}

fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
