use anyhow::Context as _;
use crossterm::{
    cursor::MoveTo,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use dx_core::feedback::FeedbackLog;
use dx_core::{DiagnosisEngine, EngineConfig, PredictionResult};
use std::io::{stdin, stdout, Stdout, Write};
use std::path::PathBuf;

const FEEDBACK_PATH: &str = "feedback.log";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config_path: PathBuf = std::env::args()
        .nth(1)
        .context("usage: dx_shell <config.toml>")?
        .into();
    let config = EngineConfig::from_file(&config_path)?;
    let engine = DiagnosisEngine::new();
    engine.load(&config)?;
    let feedback = FeedbackLog::open(FEEDBACK_PATH)?;

    let mut out = stdout();
    let mut symptoms: Vec<String> = Vec::new();
    let mut last: Option<PredictionResult> = None;
    let mut message = String::new();

    loop {
        print_ui(&mut out, &engine, &symptoms, last.as_ref(), &message)?;
        message.clear();

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let cmd = input.trim();

        match cmd {
            "exit" => break,
            "" => {
                // Enter with no text runs the diagnosis
                match engine.predict(&symptoms) {
                    Ok(result) => last = Some(result),
                    Err(e) => {
                        last = None;
                        message = format!("{} ({})", e, e.kind());
                    }
                }
            }
            ":clear" => {
                symptoms.clear();
                last = None;
            }
            s if s.starts_with(":rate ") => {
                message = match s[6..].trim().parse::<i64>() {
                    Ok(n) => match feedback.record(n) {
                        Ok(()) => "Thanks for the feedback.".to_string(),
                        Err(e) => e.to_string(),
                    },
                    Err(_) => "Rating must be a number from 1 to 5.".to_string(),
                };
            }
            s if s.starts_with(":find ") => {
                let needle = s[6..].trim();
                let hits: Vec<String> = engine
                    .list_vocabulary()?
                    .into_keys()
                    .filter(|t| t.contains(needle))
                    .take(10)
                    .collect();
                message = if hits.is_empty() {
                    format!("No symptom contains '{}'.", needle)
                } else {
                    hits.join(", ")
                };
            }
            s if s.starts_with(':') => {
                message = format!("Unknown command '{}'.", s);
            }
            s => {
                // Append to the symptom list
                symptoms.extend(
                    s.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                );
            }
        }
    }
    Ok(())
}

fn print_ui(
    out: &mut Stdout,
    engine: &DiagnosisEngine,
    symptoms: &[String],
    last: Option<&PredictionResult>,
    message: &str,
) -> anyhow::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    let strategy = engine
        .context()
        .map(|c| c.strategy().name())
        .unwrap_or("unavailable");
    writeln!(out, "Symptom Diagnosis Shell ({} strategy)", strategy)?;
    writeln!(out, "---------------------------------------------------------------")?;
    writeln!(out, "Type symptoms (comma separated) to add them, [Enter] to diagnose.")?;
    writeln!(out, "':find <text>' searches symptoms, ':rate <1-5>', ':clear', 'exit'.\n")?;

    writeln!(out, "Symptoms: [{}]", symptoms.join(", "))?;

    if let Some(result) = last {
        execute!(
            out,
            SetForegroundColor(Color::Green),
            Print(format!(
                "\nDiagnosis: {} ({:.1}%)\n",
                result.disease,
                result.probability * 100.0
            )),
            ResetColor
        )?;
        if let (Some(algorithm), Some(accuracy)) = (&result.algorithm, result.model_accuracy) {
            writeln!(out, "Model: {} (held-out accuracy {:.1}%)", algorithm, accuracy * 100.0)?;
        }
        writeln!(out, "{}", result.description)?;
        writeln!(out, "Matching: {:?}", result.matching_symptoms)?;
        writeln!(out, "Also typical: {:?}", result.missing_symptoms)?;
        for w in &result.warnings {
            execute!(
                out,
                SetForegroundColor(Color::Yellow),
                Print(format!("Ignored unknown symptom '{}'\n", w.token)),
                ResetColor
            )?;
        }
    }

    if !message.is_empty() {
        execute!(
            out,
            SetForegroundColor(Color::Red),
            Print(format!("\n{}\n", message)),
            ResetColor
        )?;
    }
    write!(out, "\n> ")?;
    out.flush()?;
    Ok(())
}
