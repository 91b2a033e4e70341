mod args;
mod terminal;

use std::io;
use std::sync::Arc;

use services::{Clock, QuizLoopService, QuizRequest, QuizSession};
use storage::{CsvFileSource, QuestionStore};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{Command, parse_or_usage};
use crate::terminal::Terminal;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // The quiz itself owns stdout.
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    // On an argument error only the usage is printed here; `main` reports the error.
    let Some(parsed) = parse_or_usage(std::env::args().skip(1), &mut io::stderr())? else {
        return Ok(());
    };

    let source = CsvFileSource::new(parsed.csv);
    let store = QuestionStore::from_source(&source)?;
    if store.skipped_rows() > 0 {
        tracing::warn!(
            skipped = store.skipped_rows(),
            "some rows were skipped, see the warnings above"
        );
    }

    match parsed.command {
        Command::Info => {
            println!("{}: {} questions", source.path().display(), store.len());
            for (category, count) in store.category_counts() {
                println!("  {:<14} {count}", category.as_str());
            }
            Ok(())
        }
        Command::Run => {
            let mut service = QuizLoopService::new(Clock::default(), Arc::new(store));
            if let Some(seed) = parsed.seed {
                service = service.with_seed(seed);
            }
            let request = QuizRequest::new(parsed.count)
                .with_mode(parsed.mode)
                .with_time_limit(parsed.time_limit);

            let stdin = io::stdin();
            let mut session = QuizSession::new();
            Terminal::new(&service, stdin.lock(), io::stdout()).run(&mut session, &request)
        }
    }
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
