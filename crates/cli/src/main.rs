#![deny(unsafe_code)]
//! CLI binary for the gradient-descent simulator.
//!
//! Subcommands:
//! - `list`: print available fields and their constants
//! - `surface`: render a field's heat map to PNG
//! - `descend`: step the agent N times headlessly, write the final frame
//! - `run`: drive the agent in real time, repainting a PNG on every redraw

mod error;

use clap::{Args, Parser, Subcommand};
use error::CliError;
use glam::DVec2;
use gradient_sim_core::{render_surface, FieldKind, SimConfig};
use gradient_sim_render::compose;
use gradient_sim_render::snapshot::{write_frame_png, write_surface_png};
use gradient_sim_runtime::{RepaintSignal, RepaintSink, RunSummary, SchedulerConfig, Simulator};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gradient-sim", about = "Gradient-descent field simulator CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available fields and their constants.
    List,
    /// Render a field's heat map and write it as a PNG.
    Surface {
        #[command(flatten)]
        sim: SimArgs,

        /// Output file path.
        #[arg(short, long, default_value = "surface.png")]
        output: PathBuf,
    },
    /// Step the agent N times and write the final frame as a PNG.
    Descend {
        #[command(flatten)]
        sim: SimArgs,

        /// Number of descent steps.
        #[arg(short = 'n', long, default_value_t = 500)]
        steps: u64,

        /// Output file path.
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,
    },
    /// Run the model and redraw tasks in real time.
    Run {
        #[command(flatten)]
        sim: SimArgs,

        /// How long to run, in milliseconds.
        #[arg(long, default_value_t = 5_000)]
        duration_ms: u64,

        /// Reposition the agent to `x,y`; repeat for several clicks spread
        /// evenly over the run.
        #[arg(long = "click", value_parser = parse_point, allow_hyphen_values = true)]
        clicks: Vec<DVec2>,

        /// Frame file, rewritten on every redraw.
        #[arg(short, long, default_value = "run.png")]
        output: PathBuf,
    },
}

/// Simulation settings: an optional config file plus per-value overrides.
#[derive(Args)]
struct SimArgs {
    /// JSON config file; the flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Field name (distance, two-center, elliptic-bowl).
    #[arg(short, long)]
    field: Option<String>,

    /// Field constants as a JSON object, e.g. '{"cx": 120, "cy": 80}'.
    #[arg(long)]
    params: Option<String>,

    /// Descent step scale.
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Starting point as `x,y`.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    start: Option<DVec2>,

    /// Surface width in pixels.
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Surface height in pixels.
    #[arg(short = 'H', long)]
    height: Option<usize>,
}

impl SimArgs {
    /// Loads the config file (or defaults), applies overrides, and validates.
    fn resolve(&self) -> Result<SimConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
                    path: path.clone(),
                    source,
                })?;
                SimConfig::from_json_str(&text)?
            }
            None => SimConfig::default(),
        };
        if let Some(field) = &self.field {
            config.field = field.clone();
        }
        if let Some(params) = &self.params {
            config.params = serde_json::from_str(params)
                .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
        }
        if let Some(rate) = self.learning_rate {
            config.learning_rate = rate;
        }
        if let Some(start) = self.start {
            config.start = start.to_array();
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_point(s: &str) -> Result<DVec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|e| format!("invalid x coordinate {x:?}: {e}"))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|e| format!("invalid y coordinate {y:?}: {e}"))?;
    Ok(DVec2::new(x, y))
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("gradient_sim=debug")
        } else {
            EnvFilter::new("gradient_sim=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Composes the simulator's current state and writes it to `path`.
fn paint(simulator: &Simulator, path: &Path) -> Result<(), CliError> {
    let state = simulator.frame_state();
    let frame = compose(&state.surface, &state.agent, &state.trace);
    write_frame_png(&frame, path).map_err(CliError::image(path))
}

/// Pretty-prints a JSON report followed by a newline.
fn write_json(mut out: impl Write, report: &serde_json::Value) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out).map_err(serde_json::Error::io)?;
    Ok(())
}

fn print_json(report: &serde_json::Value) -> Result<(), CliError> {
    write_json(std::io::stdout().lock(), report)
}

/// Instants at which the clicks fire: evenly spaced strictly inside the run.
fn click_schedule(start: Instant, duration: Duration, clicks: &[DVec2]) -> Vec<(Instant, DVec2)> {
    let slots = (clicks.len() + 1) as f64;
    clicks
        .iter()
        .enumerate()
        .map(|(i, &point)| (start + duration.mul_f64((i + 1) as f64 / slots), point))
        .collect()
}

struct RealtimeReport {
    summary: RunSummary,
    frames: u64,
    clicks: usize,
}

/// Runs the scheduler for `duration`, painting on this task whenever a
/// repaint is requested, then stops and paints the final state.
async fn run_realtime(
    config: &SimConfig,
    duration: Duration,
    clicks: &[DVec2],
    output: &Path,
) -> Result<RealtimeReport, CliError> {
    let simulator = Arc::new(Simulator::from_config(config)?);
    let signal = Arc::new(RepaintSignal::new());
    let sink: Arc<dyn RepaintSink> = signal.clone();
    let handle = gradient_sim_runtime::spawn(
        Arc::clone(&simulator),
        SchedulerConfig::from_config(config),
        sink,
    )?;

    let start = Instant::now();
    let deadline = start + duration;
    let mut pending = click_schedule(start, duration, clicks).into_iter().peekable();
    let mut frames = 0_u64;
    loop {
        let next_click = pending.peek().map_or(deadline, |&(at, _)| at);
        tokio::select! {
            biased;
            _ = sleep_until(deadline) => break,
            _ = sleep_until(next_click), if next_click < deadline => {
                if let Some((_, point)) = pending.next() {
                    let snapshot = handle.reposition(point.x, point.y);
                    info!(x = point.x, y = point.y, steps = snapshot.steps, "click");
                }
            }
            _ = signal.wait() => {
                paint(&simulator, output)?;
                frames += 1;
            }
        }
    }

    let summary = handle.stop().await;
    paint(&simulator, output)?;
    Ok(RealtimeReport {
        summary,
        frames: frames + 1,
        clicks: clicks.len() - pending.len(),
    })
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let fields = FieldKind::list_fields();
            if cli.json {
                let entries = fields
                    .iter()
                    .map(|&name| -> Result<serde_json::Value, CliError> {
                        Ok(serde_json::json!({
                            "name": name,
                            "params": FieldKind::param_schema(name)?,
                        }))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let info = serde_json::json!({ "fields": entries });
                print_json(&info)?;
            } else {
                println!("Fields:");
                for &name in fields {
                    let schema = FieldKind::param_schema(name)?;
                    let params = schema
                        .as_object()
                        .map(|obj| {
                            obj.iter()
                                .map(|(key, spec)| format!("{key}={}", spec["default"]))
                                .collect::<Vec<_>>()
                                .join(", ")
                        })
                        .unwrap_or_default();
                    println!("  {name:<14} {params}");
                }
            }
        }
        Command::Surface { sim, output } => {
            let config = sim.resolve()?;
            let field = config.build_field()?;
            let surface = render_surface(&field, config.width, config.height)?;
            write_surface_png(&surface, &output).map_err(CliError::image(&output))?;

            if cli.json {
                let info = serde_json::json!({
                    "field": field.name(),
                    "params": field.params(),
                    "width": config.width,
                    "height": config.height,
                    "output": output.display().to_string(),
                });
                print_json(&info)?;
            } else {
                eprintln!(
                    "rendered {} surface ({}x{}) -> {}",
                    field.name(),
                    config.width,
                    config.height,
                    output.display()
                );
            }
        }
        Command::Descend { sim, steps, output } => {
            let config = sim.resolve()?;
            let simulator = Simulator::from_config(&config)?;
            for _ in 0..steps {
                simulator.step();
            }
            paint(&simulator, &output)?;
            let state = simulator.frame_state();

            if cli.json {
                let info = serde_json::json!({
                    "field": config.field,
                    "learning_rate": config.learning_rate,
                    "agent": serde_json::to_value(state.agent)?,
                    "trace_points": state.trace.len(),
                    "output": output.display().to_string(),
                });
                print_json(&info)?;
            } else {
                let p = state.agent.position;
                eprintln!(
                    "descended {} for {steps} steps: position ({:.3}, {:.3}), heading {:.4} rad, {} trace points -> {}",
                    config.field,
                    p.x,
                    p.y,
                    state.agent.direction,
                    state.trace.len(),
                    output.display()
                );
            }
        }
        Command::Run {
            sim,
            duration_ms,
            clicks,
            output,
        } => {
            let config = sim.resolve()?;
            let report =
                run_realtime(&config, Duration::from_millis(duration_ms), &clicks, &output).await?;

            if cli.json {
                let info = serde_json::json!({
                    "field": config.field,
                    "duration_ms": duration_ms,
                    "model_ticks": report.summary.model_ticks,
                    "redraw_ticks": report.summary.redraw_ticks,
                    "frames": report.frames,
                    "clicks": report.clicks,
                    "output": output.display().to_string(),
                });
                print_json(&info)?;
            } else {
                eprintln!(
                    "ran {} for {duration_ms} ms: {} model ticks, {} redraws, {} frames, {} clicks -> {}",
                    config.field,
                    report.summary.model_ticks,
                    report.summary.redraw_ticks,
                    report.frames,
                    report.clicks,
                    output.display()
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli).await {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_overrides() -> SimArgs {
        SimArgs {
            config: None,
            field: None,
            params: None,
            learning_rate: None,
            start: None,
            width: None,
            height: None,
        }
    }

    #[test]
    fn parse_point_accepts_negative_and_spaced_coordinates() {
        assert_eq!(parse_point("-3.5, 12").unwrap(), DVec2::new(-3.5, 12.0));
    }

    #[test]
    fn parse_point_rejects_missing_comma() {
        assert!(parse_point("12").is_err());
        assert!(parse_point("a,1").is_err());
    }

    #[test]
    fn resolve_without_flags_is_default() {
        assert_eq!(no_overrides().resolve().ok(), Some(SimConfig::default()));
    }

    #[test]
    fn resolve_applies_overrides() {
        let args = SimArgs {
            field: Some("elliptic-bowl".into()),
            params: Some(r#"{"b": 2}"#.into()),
            start: Some(DVec2::new(5.0, 6.0)),
            width: Some(64),
            ..no_overrides()
        };
        let config = args.resolve().ok().unwrap();
        assert_eq!(config.field, "elliptic-bowl");
        assert_eq!(config.params["b"], 2);
        assert_eq!(config.start, [5.0, 6.0]);
        assert_eq!(config.width, 64);
        assert_eq!(config.height, SimConfig::default().height);
    }

    #[test]
    fn resolve_overrides_config_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"field": "two-center", "learning_rate": 2.0}"#).unwrap();

        let args = SimArgs {
            config: Some(path),
            learning_rate: Some(0.25),
            ..no_overrides()
        };
        let config = args.resolve().ok().unwrap();

        assert_eq!(config.field, "two-center");
        assert_eq!(config.learning_rate, 0.25);
    }

    #[test]
    fn resolve_rejects_bad_params_json_as_input_error() {
        let args = SimArgs {
            params: Some("{cx".into()),
            ..no_overrides()
        };
        assert_eq!(args.resolve().err().map(|e| e.exit_code()), Some(12));
    }

    #[test]
    fn resolve_rejects_missing_config_file_as_io_error() {
        let args = SimArgs {
            config: Some(PathBuf::from("/nonexistent/gradient-sim.json")),
            ..no_overrides()
        };
        assert_eq!(args.resolve().err().map(|e| e.exit_code()), Some(11));
    }

    #[test]
    fn resolve_rejects_zero_learning_rate_as_sim_error() {
        let args = SimArgs {
            learning_rate: Some(0.0),
            ..no_overrides()
        };
        assert_eq!(args.resolve().err().map(|e| e.exit_code()), Some(10));
    }

    #[test]
    fn clicks_are_spread_inside_the_run() {
        let start = Instant::now();
        let clicks = [DVec2::ZERO, DVec2::ONE, DVec2::X];
        let schedule = click_schedule(start, Duration::from_millis(4_000), &clicks);
        let offsets: Vec<u128> = schedule
            .iter()
            .map(|(at, _)| (*at - start).as_millis())
            .collect();
        assert_eq!(offsets, vec![1_000, 2_000, 3_000]);
        assert_eq!(schedule[1].1, DVec2::ONE);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn json_report_to_closed_stdout_is_output_error() {
        let err = write_json(ClosedPipe, &json!({"fields": []})).unwrap_err();
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn json_report_ends_with_newline() {
        let mut out = Vec::new();
        write_json(&mut out, &json!({"frames": 3})).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("}\n"), "{text:?}");
        assert!(text.contains("\"frames\": 3"));
    }

    fn small_config() -> SimConfig {
        SimConfig {
            params: json!({"cx": 24, "cy": 24}),
            start: [0.0, 24.0],
            width: 48,
            height: 48,
            ..SimConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_realtime_paints_and_applies_clicks() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("run.png");
        let report = run_realtime(
            &small_config(),
            Duration::from_millis(1_200),
            &[DVec2::new(40.0, 40.0)],
            &output,
        )
        .await
        .unwrap();

        assert_eq!(report.clicks, 1);
        assert!((2..=3).contains(&report.summary.redraw_ticks), "{:?}", report.summary);
        assert!(report.summary.model_ticks >= 100, "{:?}", report.summary);
        // At least one repaint during the run plus the final one.
        assert!(report.frames >= 2, "frames: {}", report.frames);
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_realtime_stops_on_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("run.png");
        let result = run_realtime(&small_config(), Duration::from_millis(1_200), &[], &output).await;
        let err = result.err().unwrap();
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("run.png"), "{err}");
    }
}
