// src/lib.rs

pub mod args;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod future;
pub mod logging;
pub mod progress;
pub mod types;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::Manifest;
use crate::config::loader::load_and_validate;
use crate::errors::ModrunError;
use crate::exec::{ModuleTask, WorkerPool, fetch_schema};
use crate::future::{FutureEvent, ModuleFuture, Outcome};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading
/// - argument rendering
/// - the worker pool and one module task
/// - streaming of output / progress to the terminal
/// - Ctrl-C handling (cancels the task)
pub async fn run(args: CliArgs) -> Result<()> {
    let manifest_path = PathBuf::from(&args.manifest);
    let manifest = load_and_validate(&manifest_path)
        .with_context(|| format!("loading manifest {}", manifest_path.display()))?;
    let options = manifest.options();

    if args.dry_run {
        print_dry_run(&manifest);
        return Ok(());
    }

    if args.schema {
        let schema = fetch_schema(&manifest.path, &options.schema_flag, options.schema_timeout)
            .await
            .map_err(ModrunError::from)
            .context("fetching module schema")?;
        print!("{schema}");
        return Ok(());
    }

    let pool = WorkerPool::new(options.max_concurrent)?;
    let task = ModuleTask::new(manifest.task_descriptor(), &options);
    let mut events = task.future().subscribe();
    let future = task.start(&pool);

    // Ctrl-C → cancel the running module.
    {
        let future = future.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; canceling module");
            future.cancel();
        });
    }

    follow(&future, &mut events).await?;
    report(&future)
}

/// Mirror the future's output and progress until it finishes.
async fn follow(future: &ModuleFuture, events: &mut broadcast::Receiver<FutureEvent>) -> Result<()> {
    loop {
        tokio::select! {
            _ = future.finished() => break,
            event = events.recv() => match event {
                Ok(FutureEvent::OutputReady) => flush_output(future)?,
                Ok(FutureEvent::ErrorReady) => flush_error(future)?,
                Ok(FutureEvent::ProgressValueChanged(value)) => {
                    info!(progress = value, text = %future.progress_text(), "module progress");
                }
                Ok(FutureEvent::ResultReady(index)) => {
                    if let Some(result) = future.result_at(index) {
                        debug!(parameter = %result.parameter, value = %result.value, "result ready");
                    }
                }
                Ok(FutureEvent::ProtocolError) => {
                    warn!("module emitted malformed progress markup");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "progress listener lagged behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    flush_output(future)?;
    flush_error(future)?;
    Ok(())
}

fn flush_output(future: &ModuleFuture) -> Result<()> {
    let pending = future.read_pending_output();
    if !pending.is_empty() {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&pending)?;
        stdout.flush()?;
    }
    Ok(())
}

fn flush_error(future: &ModuleFuture) -> Result<()> {
    let pending = future.read_pending_error();
    if !pending.is_empty() {
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(&pending)?;
        stderr.flush()?;
    }
    Ok(())
}

/// Print results and turn the outcome into the process result.
fn report(future: &ModuleFuture) -> Result<()> {
    match future.outcome() {
        Some(Outcome::Succeeded {
            results,
            protocol_errors,
        }) => {
            for result in future.results() {
                println!("{} = {}", result.parameter, result.value);
            }
            if protocol_errors > 0 {
                for error in future.protocol_errors() {
                    warn!(%error, "progress protocol diagnostic");
                }
            }
            info!(results, "module finished successfully");
            Ok(())
        }
        Some(Outcome::Failed(err)) => {
            Err(anyhow::Error::new(err).context("module run failed"))
        }
        Some(Outcome::Canceled) => bail!("module run canceled"),
        None => bail!("module run ended without finishing its future"),
    }
}

/// Simple dry-run output: executable, argv and parameter table.
fn print_dry_run(manifest: &Manifest) {
    let descriptor = manifest.task_descriptor();

    println!("modrun dry-run");
    println!("  module = {}", manifest.path.display());
    println!("  runner.max_concurrent = {}", manifest.runner.max_concurrent);
    println!();

    println!("parameters ({}):", manifest.parameters.len());
    for param in &manifest.parameters {
        println!("  - {} ({})", param.name, param.kind);
        if let Some(index) = param.index {
            println!("      index: {index}");
        }
        if let Some(flag) = param.flag_token() {
            println!("      flag: {flag}");
        }
        if param.multiple {
            println!("      multiple: true");
        }
        if let Some(value) = manifest.values.get(&param.name) {
            println!("      value: {value:?}");
        }
    }
    println!();

    println!("command line:");
    println!("  {}", descriptor.command_line());

    debug!("dry-run complete (no execution)");
}
