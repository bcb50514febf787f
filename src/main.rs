use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use localize_core::config::Args;
use localize_core::protocol::{self, Session};

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_new(&args.log).unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the protocol; logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    let mut session = match Session::open(&args) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to open state");
            std::process::exit(1);
        }
    };
    if args.in_memory {
        info!("state kept in memory");
    } else {
        info!(state_dir = %args.state_dir().display(), "state opened");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| protocol::handle(&mut session, &line)));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => serde_json::json!({
                "status": "error",
                "message": "internal core error"
            })
            .to_string(),
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        let _ = stdout.flush();
    }
}
