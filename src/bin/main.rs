use anyhow::{bail, Context as _};
use dx_core::feedback::FeedbackLog;
use dx_core::{DiagnosisEngine, EngineConfig};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const USAGE: &str = "usage: symptom_dx <config.toml> [--snapshot <path>] [--feedback <path>]";

struct Args {
    config: PathBuf,
    snapshot: Option<PathBuf>,
    feedback: PathBuf,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut config: Option<PathBuf> = None;
    let mut snapshot: Option<PathBuf> = None;
    let mut feedback = PathBuf::from("feedback.log");
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--snapshot" => snapshot = Some(args.next().context("--snapshot needs a path")?.into()),
            "--feedback" => feedback = args.next().context("--feedback needs a path")?.into(),
            "-h" | "--help" => bail!(USAGE),
            _ if config.is_none() => config = Some(PathBuf::from(arg.as_str())),
            other => bail!("unexpected argument '{}'\n{}", other, USAGE),
        }
    }
    Ok(Args {
        config: config.context(USAGE)?,
        snapshot,
        feedback,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = parse_args()?;

    let config = EngineConfig::from_file(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let engine = DiagnosisEngine::new();
    match &args.snapshot {
        Some(snapshot) => engine.load_cached(&config, snapshot)?,
        None => engine.load(&config)?,
    };
    let feedback = FeedbackLog::open(&args.feedback)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let input = line?;
        log::debug!("<- {:?}", input);
        let (command, rest) = match input.trim().split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (input.trim(), ""),
        };

        match command {
            "PREDICT" => {
                let symptoms: Vec<&str> = rest.split(',').collect();
                match engine.predict(&symptoms) {
                    Ok(result) => writeln!(stdout, "{}", serde_json::to_string(&result)?)?,
                    Err(e) => writeln!(stdout, "ERROR {} {}", e.kind(), e)?,
                }
            }
            "SYMPTOMS" => match engine.list_vocabulary() {
                Ok(vocab) => writeln!(stdout, "{}", serde_json::to_string(&vocab)?)?,
                Err(e) => writeln!(stdout, "ERROR {} {}", e.kind(), e)?,
            },
            "FEEDBACK" => {
                let outcome = rest
                    .parse::<i64>()
                    .map_err(|_| format!("'{}' is not an integer rating", rest))
                    .and_then(|rating| feedback.record(rating).map_err(|e| e.to_string()));
                match outcome {
                    Ok(()) => writeln!(stdout, "OK")?,
                    Err(e) => writeln!(stdout, "ERROR feedback {}", e)?,
                }
            }
            "EXIT" => break,
            "" => continue,
            other => {
                log::warn!("Unknown command {:?}", other);
                writeln!(stdout, "ERROR command unknown command '{}'", other)?;
            }
        }
        stdout.flush()?;
    }
    log::info!("Shutting down");
    Ok(())
}
