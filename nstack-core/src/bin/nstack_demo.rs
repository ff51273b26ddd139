//! NStack demo - walk through scoped service registration
//!
//! Registers a logger service in a scope, overrides it in a child scope,
//! shows the error cases, and finally hands saved continuations to worker
//! threads that log through the scope they were captured in.
//!
//! Usage:
//!     nstack-demo
//!     nstack-demo --threads 4 --message "from worker"
//!     nstack-demo --json
//!     RUST_LOG=nstack_core=trace nstack-demo

use std::sync::Arc;
use std::thread;

use chrono::Local;
use clap::Parser;
use crossbeam::channel;
use nstack_core::{Context, Continuation, ScopeError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "nstack-demo")]
#[command(about = "Demonstrate scoped service registration and context capture")]
#[command(version)]
struct Args {
    /// Number of worker threads that receive saved continuations
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// Message logged from the worker threads
    #[arg(short, long, default_value = "from new thread")]
    message: String,

    /// Print errors and the scope chain as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output (engine debug logs)
    #[arg(short, long)]
    verbose: bool,
}

// ============================================================================
// Services
// ============================================================================

/// Logger service contract
trait Logger: Send + Sync {
    fn warning(&self, message: &str) -> Result<(), String>;
}

/// Writes warnings to stdout
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn warning(&self, message: &str) -> Result<(), String> {
        println!("[warning - {}]: {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
        Ok(())
    }
}

/// Swallows output but insists on being called with "void"
struct VoidLogger;

impl Logger for VoidLogger {
    fn warning(&self, message: &str) -> Result<(), String> {
        if message != "void" {
            return Err(format!("expectation failed: got '{}'", message));
        }
        Ok(())
    }
}

fn warn(message: &str) -> Result<(), String> {
    let logger = Context::resolve::<dyn Logger>().map_err(|e| e.to_string())?;
    logger.warning(message)
}

// ============================================================================
// Walkthrough
// ============================================================================

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "nstack_core=debug,info" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting NStack demo v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    // Nothing is ambient yet
    if let Err(e) = Context::resolve::<i32>() {
        report(&e, args.json);
    }

    let workers = Context::builder().label("first").create(|| -> Result<_, String> {
        if let Err(e) = Context::resolve::<i32>() {
            report(&e, args.json);
        }

        Context::register::<dyn Logger>(Arc::new(ConsoleLogger)).map_err(|e| e.to_string())?;
        if let Err(e) = Context::register::<dyn Logger>(Arc::new(ConsoleLogger)) {
            report(&e, args.json);
        }

        warn("from first context")?;

        // A sub-scope with its own logger
        Context::builder().label("override").create(|| -> Result<(), String> {
            warn("before override service")?;
            Context::register::<dyn Logger>(Arc::new(VoidLogger)).map_err(|e| e.to_string())?;
            warn("void")?;

            if args.json {
                let chain = Context::describe_chain().map_err(|e| e.to_string())?;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&chain).map_err(|e| e.to_string())?
                );
            }
            Ok(())
        })?;

        // Preserve this scope for the worker threads
        let mut jobs = Vec::with_capacity(args.threads);
        for _ in 0..args.threads {
            let message = args.message.clone();
            jobs.push(Context::save(move || warn(&message)).map_err(|e| e.to_string())?);
        }
        Ok(jobs)
    })?;

    // The first scope has closed on this thread; the saved jobs still hold it.
    dispatch(workers)
}

/// Hand saved continuations to worker threads over a channel
fn dispatch<F>(jobs: Vec<Continuation<F>>) -> Result<(), String>
where
    F: FnOnce() -> Result<(), String> + Send + 'static,
{
    let (tx, rx) = channel::unbounded::<Continuation<F>>();
    let handles: Vec<_> = (0..jobs.len())
        .map(|i| {
            let rx = rx.clone();
            thread::Builder::new()
                .name(format!("nstack-worker-{}", i))
                .spawn(move || rx.recv().map(|job| job.run()).unwrap_or(Ok(())))
                .map_err(|e| {
                    ScopeError::Spawn {
                        reason: e.to_string(),
                    }
                    .to_string()
                })
        })
        .collect::<Result<_, _>>()?;

    for job in jobs {
        tx.send(job).map_err(|e| e.to_string())?;
    }
    drop(tx);

    for handle in handles {
        handle
            .join()
            .map_err(|_| "worker thread panicked".to_string())??;
    }
    Ok(())
}

fn report(err: &ScopeError, json: bool) {
    if json {
        match serde_json::to_string(&err.to_error_response()) {
            Ok(line) => println!("{}", line),
            Err(_) => println!("{}", err),
        }
    } else {
        println!("{}", err);
    }
}
