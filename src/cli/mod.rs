use crate::api::GraphClient;
use crate::config::{AppConfig, Config};
use crate::output::{render_report, ReportTarget};
use crate::stats::TimeSeries;
use anyhow::{anyhow, bail, Context, Result};
use atty::Stream;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "the_eye")]
#[command(about = "Retrieves, parses, analyzes, and stores data about comments on Facebook posts", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Facebook user token used to connect to the Graph API. Pass '-' to
    /// read the token from standard input. When omitted entirely, OBJECT
    /// names a previously exported data file instead
    #[arg(value_name = "TOKEN")]
    token: Option<String>,

    /// The Facebook object ID to fetch comments from, or the path to an
    /// exported data file when no token is given
    #[arg(value_name = "OBJECT")]
    object: Option<String>,

    /// Write the HTML report to FILE instead of standard output
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Date the detailed analysis is centered on (default: now)
    #[arg(short = 'f', long = "focus-on", visible_alias = "find", value_name = "DATE")]
    focus_on: Option<String>,

    /// Number of days before and after the focus date covered by the
    /// daily chart
    #[arg(short, long, value_name = "N")]
    days: Option<u32>,

    /// Size, in minutes, of the slices the focus day is divided into
    #[arg(short, long, value_name = "N")]
    minutes: Option<u32>,

    /// After each report, ask for a new date to focus the analysis on;
    /// any input that is not a valid date ends the session
    #[arg(short, long)]
    interactive: bool,

    /// Write the raw fetched data to FILE for future analysis
    #[arg(short, long, value_name = "FILE")]
    export: Option<PathBuf>,
}

/// Where the comment data comes from: the Graph API, or a file written
/// by a previous run's --export.
#[derive(Debug, PartialEq, Eq)]
enum DataSource {
    Graph { token: String, object_id: String },
    Export { path: PathBuf },
}

/// Two positional values mean TOKEN OBJECT; a single one means offline
/// mode and names the exported data file.
fn resolve_source(token: Option<String>, object: Option<String>) -> Result<DataSource> {
    match (token, object) {
        (Some(token), Some(object_id)) => Ok(DataSource::Graph { token, object_id }),
        (Some(path), None) => Ok(DataSource::Export { path: path.into() }),
        (None, _) => bail!("Missing OBJECT argument. Usage: the_eye [OPTIONS] [TOKEN] OBJECT"),
    }
}

fn read_token_from_stdin() -> Result<String> {
    if atty::is(Stream::Stdin) {
        eprint!("Facebook token> ");
        io::stderr().flush().ok();
    }

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read token from standard input")?;

    let token = line.trim().to_string();
    if token.is_empty() {
        bail!("No token provided on standard input");
    }
    Ok(token)
}

fn parse_focus_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if value.eq_ignore_ascii_case("now") {
        return Some(Utc::now());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }

    // Plain dates, plus the "14 July 2016" form the report headings use
    // so interactive input can echo a heading back.
    for format in ["%Y-%m-%d", "%d %B %Y", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

async fn fetch_series(token: String, object_id: &str, config: &Config) -> Result<TimeSeries> {
    let client = GraphClient::new(token, config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .context("Invalid progress template")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Fetching comments for object {}", object_id));

    let times = client.fetch_comment_times(object_id).await?;
    spinner.finish_with_message(format!("Fetched {} comments", times.len()));

    TimeSeries::from_created_times(times)
}

fn prompt_next_focus() -> Option<DateTime<Utc>> {
    eprint!("Focus on a new date> ");
    io::stderr().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => parse_focus_date(&line),
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let app_config = AppConfig::new()?;
    let config = app_config.load()?.unwrap_or_default();

    let days = cli.days.unwrap_or(config.focus_days);
    let minutes = cli.minutes.unwrap_or(config.focus_interval);
    if minutes == 0 || minutes > 24 * 60 {
        bail!("--minutes must be between 1 and 1440, got {}", minutes);
    }

    let series = match resolve_source(cli.token, cli.object)? {
        DataSource::Graph { token, object_id } => {
            let token = if token == "-" {
                read_token_from_stdin()?
            } else {
                token
            };
            fetch_series(token, &object_id, &config).await?
        }
        DataSource::Export { path } => TimeSeries::load(&path)?,
    };

    if let Some(path) = &cli.export {
        series.save(path)?;
        eprintln!("Raw data exported to {}", path.display());
    }

    let mut focus = match cli.focus_on.as_deref() {
        None => Utc::now(),
        Some(raw) => {
            parse_focus_date(raw).ok_or_else(|| anyhow!("Unrecognized focus date: {}", raw))?
        }
    };

    let target = ReportTarget::new(cli.output);

    loop {
        let summary = series.summarize(focus, days, minutes);
        let day_name = focus.format("%d %B %Y").to_string();
        target.write(&render_report(&summary, &day_name))?;

        if !cli.interactive {
            break;
        }

        match prompt_next_focus() {
            Some(next) => focus = next,
            None => break,
        }
    }

    Ok(())
}
