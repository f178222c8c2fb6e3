//! Purpose: `vitrine-probe` CLI entry point.
//! Role: Binary crate root; parses args, fires the probe, prints the report.
//! Invariants: stdout carries only the report; diagnostics go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `error::to_exit_code`.
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::time::Duration;

use clap::{Parser, ValueEnum, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use vitrine_probe::error::{Error, ErrorKind, to_exit_code};
use vitrine_probe::report::render_report;
use vitrine_probe::request::{DEFAULT_ENDPOINT, DEFAULT_IMAGE_NAME, Probe, ProbeTarget};

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(()) => 0,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<(), (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                return Ok(());
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `vitrine-probe --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    run_probe(cli)
        .map_err(add_transport_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn run_probe(cli: Cli) -> Result<(), Error> {
    let timeout = parse_duration(&cli.timeout)?;
    let target = ProbeTarget::parse(&cli.url)?;
    tracing::debug!(
        url = target.as_str(),
        image_name = cli.image_name.as_str(),
        timeout_ms = timeout.as_millis() as u64,
        "probe configured"
    );

    let probe = Probe::new(target, timeout);
    let reply = probe.change_favicon(&cli.image_name)?;

    let use_color = cli.color.use_color(io::stdout().is_terminal());
    print!("{}", render_report(&reply, use_color));
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "vitrine-probe",
    version,
    about = "POST a changeFavicon command at the Vitrine management API and report the reply",
    long_about = None,
    after_help = r#"EXAMPLES
  $ vitrine-probe
  $ vitrine-probe http://staging.vitrine/management/changeFavicon
  $ vitrine-probe --image-name favicon-v2.png --timeout 5s
  $ vitrine-probe | tee transcript.txt    # piped output carries no ANSI colors

NOTES
  The report always prints the HTTP status, Content-Type, and raw body first,
  so a reply that is not valid JSON can be diagnosed from the transcript alone.
  A reply that fails to decode still exits 0; only failing to get a response
  at all exits non-zero. Set RUST_LOG=debug for lifecycle events on stderr."#
)]
struct Cli {
    #[arg(
        value_name = "URL",
        default_value = DEFAULT_ENDPOINT,
        help = "Management endpoint to probe"
    )]
    url: String,

    #[arg(
        long,
        value_name = "NAME",
        default_value = DEFAULT_IMAGE_NAME,
        help = "Image name sent as the JSON `imageName` field"
    )]
    image_name: String,

    #[arg(
        long,
        value_name = "DURATION",
        default_value = "10s",
        help = "Overall request timeout as number+unit (ms|s|m|h)"
    )]
    timeout: String,

    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize the report and stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn parse_duration(input: &str) -> Result<Duration, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("invalid duration")
            .with_hint("Use a number plus ms|s|m|h (e.g. 10s)."));
    }
    let split = trimmed.char_indices().find(|(_, ch)| !ch.is_ascii_digit());
    let (num_str, unit) = match split {
        Some((idx, _)) => trimmed.split_at(idx),
        None => ("", ""),
    };
    if num_str.is_empty() || unit.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("invalid duration")
            .with_hint("Use a number plus ms|s|m|h (e.g. 10s)."));
    }
    let value: u64 = num_str.parse().map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid duration")
            .with_hint("Use a number plus ms|s|m|h (e.g. 10s).")
    })?;
    let millis = match unit {
        "ms" => value,
        "s" => value.saturating_mul(1_000),
        "m" => value.saturating_mul(60_000),
        "h" => value.saturating_mul(3_600_000),
        _ => {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("invalid duration")
                .with_hint("Use a number plus ms|s|m|h (e.g. 10s)."));
        }
    };
    Ok(Duration::from_millis(millis))
}

fn add_transport_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Transport || err.hint().is_some() {
        return err;
    }
    err.with_hint("Could not reach the endpoint. Check the host, port, and --timeout.")
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("The response could not be read in full. Retry while watching the server logs.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Unexpected internal failure. Rerun with RUST_LOG=debug and report what you see.")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Transport => "request failed".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(url) = err.url() {
        inner.insert("url".to_string(), json!(url));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(url) = err.url() {
        lines.push(format!(
            "{} {url}",
            colorize_label("url:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

#[cfg(test)]
mod tests {
    use super::{
        clap_error_summary, error_causes, error_json, error_text, parse_duration, Cli, ColorMode,
    };
    use clap::Parser;
    use std::time::Duration;
    use vitrine_probe::error::{Error, ErrorKind};
    use vitrine_probe::request::{DEFAULT_ENDPOINT, DEFAULT_IMAGE_NAME, DEFAULT_TIMEOUT};

    #[test]
    fn parse_duration_accepts_ms_s_m_h() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7_200));
    }

    #[test]
    fn parse_duration_rejects_malformed_input() {
        for input in ["", "10", "s", "ten seconds", "10 s", "-5s"] {
            let err = parse_duration(input).expect_err("should reject");
            assert_eq!(err.kind(), ErrorKind::Usage);
            assert!(err.hint().is_some());
        }
    }

    #[test]
    fn cli_defaults_match_the_documented_probe() {
        let cli = Cli::try_parse_from(["vitrine-probe"]).expect("defaults parse");
        assert_eq!(cli.url, DEFAULT_ENDPOINT);
        assert_eq!(cli.image_name, DEFAULT_IMAGE_NAME);
        assert_eq!(parse_duration(&cli.timeout).unwrap(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn cli_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "vitrine-probe",
            "http://localhost:8080/management/changeFavicon",
            "--image-name",
            "favicon-v2.png",
            "--timeout",
            "5s",
            "--color",
            "never",
        ])
        .expect("overrides parse");
        assert_eq!(cli.url, "http://localhost:8080/management/changeFavicon");
        assert_eq!(cli.image_name, "favicon-v2.png");
        assert!(!cli.color.use_color(true));
    }

    #[test]
    fn use_color_honors_mode_and_tty() {
        assert!(ColorMode::Auto.use_color(true));
        assert!(!ColorMode::Auto.use_color(false));
        assert!(ColorMode::Always.use_color(false));
        assert!(!ColorMode::Never.use_color(true));
    }

    #[test]
    fn error_json_carries_kind_message_hint_url_and_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::new(ErrorKind::Transport)
            .with_message("request failed")
            .with_hint("Check the host.")
            .with_url("http://localhost:1/x")
            .with_source(io);

        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "Transport");
        assert_eq!(value["error"]["message"], "request failed");
        assert_eq!(value["error"]["hint"], "Check the host.");
        assert_eq!(value["error"]["url"], "http://localhost:1/x");
        assert_eq!(value["error"]["causes"][0], "refused");
    }

    #[test]
    fn error_text_renders_plain_labels_without_color() {
        let err = Error::new(ErrorKind::Usage)
            .with_message("invalid duration")
            .with_hint("Use a number plus ms|s|m|h (e.g. 10s).");
        let text = error_text(&err, false);
        assert!(text.starts_with("error: invalid duration"));
        assert!(text.contains("hint: Use a number plus"));
    }

    #[test]
    fn error_causes_walks_the_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = Error::new(ErrorKind::Transport).with_source(io);
        assert_eq!(error_causes(&err), vec!["timed out".to_string()]);
    }

    #[test]
    fn clap_error_summary_strips_error_prefix() {
        let err = Cli::try_parse_from(["vitrine-probe", "--no-such-flag"])
            .err()
            .expect("rejects");
        let summary = clap_error_summary(&err);
        assert!(!summary.starts_with("error:"));
        assert!(summary.contains("--no-such-flag"));
    }
}
