//! Terminal shell for the double-slit simulator.

use std::{env, fs, path::PathBuf, str::FromStr, time::Instant};

use anyhow::{bail, Context as _, Result};
use slit_core::{Detector, ExperimentSettings, ScreenHistogram, XHistogram};
use tracer::init_tracing;
use tracing::info;

const DEFAULT_ELECTRONS: usize = 5000;
const BAR_WIDTH: usize = 60;
const TERMINAL_COLUMNS: usize = 80;
const TERMINAL_ROWS: usize = 24;
const SHADES: &[u8] = b" .:-=+*#%@";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Hist,
    Screen,
}

#[derive(Debug)]
struct Options {
    settings: ExperimentSettings,
    electrons: usize,
    view: View,
    parallel: bool,
}

fn main() -> Result<()> {
    init_tracing();

    let options = parse_args(env::args().skip(1))?;
    let mut detector =
        Detector::new(options.settings.clone()).context("failed to build the detector")?;
    info!(
        seed = ?detector.seed(),
        measure_slits = options.settings.measure_slits,
        "firing {} electrons",
        options.electrons
    );

    let start = Instant::now();
    if options.parallel {
        detector.electron_beam_parallel(options.electrons)
    } else {
        detector.electron_beam(options.electrons)
    }
    .context("failed to fire the electron beam")?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "beam finished");

    let output = match options.view {
        View::Hist => render_x_histogram(&detector.x_histogram()),
        View::Screen => render_screen(&detector.screen_histogram()),
    };
    print!("{output}");
    Ok(())
}

fn parse_args<I>(args: I) -> Result<Options>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();

    // The config file is the base layer; every other flag overrides it regardless of order.
    let mut settings = match args.iter().find_map(|arg| arg.strip_prefix("--config=")) {
        Some(path) => load_settings(PathBuf::from(path))?,
        None => ExperimentSettings::default(),
    };
    let mut electrons = DEFAULT_ELECTRONS;
    let mut view = View::Hist;
    let mut parallel = false;

    for arg in &args {
        if arg.starts_with("--config=") {
            continue;
        } else if let Some(value) = arg.strip_prefix("--slit-separation=") {
            settings.slit_separation = parse_flag(value, "--slit-separation")?;
        } else if let Some(value) = arg.strip_prefix("--screen-distance=") {
            settings.screen_distance = parse_flag(value, "--screen-distance")?;
        } else if let Some(value) = arg.strip_prefix("--screen-width=") {
            settings.screen_width = parse_flag(value, "--screen-width")?;
        } else if let Some(value) = arg.strip_prefix("--screen-height=") {
            settings.screen_height = parse_flag(value, "--screen-height")?;
        } else if let Some(value) = arg.strip_prefix("--seed=") {
            settings.seed = Some(parse_flag(value, "--seed")?);
        } else if let Some(value) = arg.strip_prefix("--electrons=") {
            electrons = parse_flag(value, "--electrons")?;
        } else if let Some(value) = arg.strip_prefix("--view=") {
            view = match value {
                "hist" => View::Hist,
                "screen" => View::Screen,
                other => bail!("unknown view '{other}' (expected 'hist' or 'screen')"),
            };
        } else if arg == "--measure-slits" {
            settings.measure_slits = true;
        } else if arg == "--parallel" {
            parallel = true;
        } else {
            bail!("unrecognized argument '{arg}'");
        }
    }

    Ok(Options {
        settings,
        electrons,
        view,
        parallel,
    })
}

fn parse_flag<T>(value: &str, flag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid value '{value}' for {flag}"))
}

fn load_settings(path: PathBuf) -> Result<ExperimentSettings> {
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

/// Horizontal bar chart of the x histogram, merging bins so it fits a terminal.
fn render_x_histogram(hist: &XHistogram) -> String {
    let rows = downsample(&hist.counts, TERMINAL_ROWS * 2);
    let max = rows.iter().copied().max().unwrap_or(0).max(1);
    let step = (hist.range.1 - hist.range.0) / rows.len().max(1) as f64;

    let mut out = String::new();
    out.push_str("Distance from center | Number of Electrons Detected\n");
    for (idx, &count) in rows.iter().enumerate() {
        let center = hist.range.0 + step * (idx as f64 + 0.5);
        let len = (count as usize * BAR_WIDTH).div_ceil(max as usize);
        out.push_str(&format!(
            "{center:>8.2} | {:<width$} {count}\n",
            "#".repeat(len),
            width = BAR_WIDTH
        ));
    }
    out
}

/// Shaded rendering of the 2D screen, top row first.
fn render_screen(screen: &ScreenHistogram) -> String {
    let cols = screen.width.min(TERMINAL_COLUMNS);
    let rows = screen.height.min(TERMINAL_ROWS);
    let mut cells = vec![0u64; cols * rows];
    for row in 0..screen.height {
        let r = row * rows / screen.height;
        let Some(counts) = screen.row(row) else {
            continue;
        };
        for (col, &count) in counts.iter().enumerate() {
            let c = col * cols / screen.width;
            cells[r * cols + c] += count as u64;
        }
    }
    let max = cells.iter().copied().max().unwrap_or(0).max(1);

    let mut out = String::with_capacity((cols + 1) * rows);
    for r in (0..rows).rev() {
        for c in 0..cols {
            let level = (cells[r * cols + c] * (SHADES.len() as u64 - 1)).div_ceil(max);
            out.push(SHADES[level as usize] as char);
        }
        out.push('\n');
    }
    out
}

/// Sums adjacent bins so at most `target` buckets remain.
fn downsample(counts: &[u32], target: usize) -> Vec<u32> {
    if counts.len() <= target || target == 0 {
        return counts.to_vec();
    }
    let group = counts.len().div_ceil(target);
    counts.chunks(group).map(|chunk| chunk.iter().sum()).collect()
}

mod tracer {
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt().try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let options = parse_args(Vec::new()).unwrap();
        assert_eq!(options.settings, ExperimentSettings::default());
        assert_eq!(options.electrons, DEFAULT_ELECTRONS);
        assert_eq!(options.view, View::Hist);
        assert!(!options.parallel);
    }

    #[test]
    fn flags_override_settings() {
        let options = parse_args(args(&[
            "--slit-separation=2",
            "--screen-distance=5.5",
            "--measure-slits",
            "--electrons=42",
            "--seed=7",
            "--view=screen",
            "--parallel",
        ]))
        .unwrap();
        assert_eq!(options.settings.slit_separation, 2.0);
        assert_eq!(options.settings.screen_distance, 5.5);
        assert!(options.settings.measure_slits);
        assert_eq!(options.settings.seed, Some(7));
        assert_eq!(options.electrons, 42);
        assert_eq!(options.view, View::Screen);
        assert!(options.parallel);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(args(&["--electrons=-3"])).is_err());
        assert!(parse_args(args(&["--view=3d"])).is_err());
        assert!(parse_args(args(&["--wavelength=2"])).is_err());
        assert!(parse_args(args(&["--config=/nonexistent/double_slit.json"])).is_err());
    }

    #[test]
    fn downsample_preserves_totals() {
        let counts: Vec<u32> = (0..200).collect();
        let merged = downsample(&counts, 48);
        assert!(merged.len() <= 48);
        assert_eq!(merged.iter().sum::<u32>(), counts.iter().sum::<u32>());
    }

    #[test]
    fn renders_non_empty_views() {
        let mut detector = Detector::new(ExperimentSettings::default().with_seed(3)).unwrap();
        detector.electron_beam(500).unwrap();
        let hist = render_x_histogram(&detector.x_histogram());
        assert!(hist.lines().count() > 1);
        let screen = render_screen(&detector.screen_histogram());
        assert_eq!(screen.lines().count(), TERMINAL_ROWS);
        assert!(screen.lines().all(|line| line.len() == TERMINAL_COLUMNS));
        assert!(screen.contains('@'));
    }
}
