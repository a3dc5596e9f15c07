mod canvas;
mod credits;

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use cadence_core::predicate::{
    always, at_beat, before_n, every_n_beats, every_off_on, every_on_off,
};
use cadence_core::{Beat, BeatPredicate, HostConfig, TimelineError};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::canvas::Canvas;
use crate::credits::Credits;

fn main() -> cadence_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Credits(args) => run_credits(args),
        Commands::Pattern {
            kind,
            params,
            from,
            beats,
        } => run_pattern(kind, &params, from, beats),
    }
}

fn run_credits(args: CreditsArgs) -> cadence_core::Result<()> {
    let config = args.resolve_config()?;
    tracing::info!(?config, "starting credits");

    let mut credits = Credits::default();
    if let Some(title) = args.title {
        credits.title = title;
    }
    if !args.lines.is_empty() {
        credits.lines = args.lines;
    }

    let canvas = Rc::new(RefCell::new(Canvas::new(
        config.width,
        config.height,
        config.layers,
    )));
    let mut timeline = credits::build(&credits, &canvas)?;
    let mut out = std::io::stdout().lock();

    timeline.start_scene(credits::TITLE, 0)?;
    canvas.borrow().present(&mut out, config.realtime)?;

    let mut frames: u64 = 1;
    while !credits::finished(&timeline) {
        if config.beats.is_some_and(|limit| frames >= limit) {
            tracing::info!(frames, "frame limit reached");
            break;
        }
        if config.realtime {
            std::thread::sleep(config.frame_interval());
        }

        timeline.request_next(true)?;
        canvas.borrow().present(&mut out, config.realtime)?;
        frames += 1;
    }

    out.flush()?;
    tracing::info!(frames, beat = timeline.cur_beat(), "credits finished");
    Ok(())
}

fn run_pattern(
    kind: PatternKind,
    params: &[Beat],
    from: Beat,
    beats: Beat,
) -> cadence_core::Result<()> {
    let predicate = kind.build(params)?;
    tracing::debug!(?predicate, from, beats, "printing pattern");

    let mut out = std::io::stdout().lock();
    writeln!(out, "{predicate:?}")?;
    writeln!(out, "{from:>5} {}", pattern_marks(&predicate, from, beats))?;
    Ok(())
}

/// One `#` or `.` per beat starting at `from`, cut short at the end of the
/// beat range.
fn pattern_marks(predicate: &BeatPredicate, from: Beat, beats: Beat) -> String {
    (from..from.saturating_add(beats.max(0)))
        .map(|beat| if predicate.evaluate(beat) { '#' } else { '.' })
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Beat-driven scene timelines on a text canvas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the demo credits sequence on stdout.
    Credits(CreditsArgs),
    /// Print which beats a predicate accepts.
    Pattern {
        kind: PatternKind,
        /// Predicate parameters, e.g. `3 2` for on-off.
        #[arg(allow_negative_numbers = true)]
        params: Vec<Beat>,
        /// First beat to print.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        from: Beat,
        /// Number of beats to print.
        #[arg(long, default_value_t = 24)]
        beats: Beat,
    },
}

#[derive(clap::Args, Debug)]
struct CreditsArgs {
    /// Optional JSON host configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    fps: Option<u32>,
    #[arg(long)]
    width: Option<u16>,
    #[arg(long)]
    height: Option<u16>,
    /// Stop after this many frames.
    #[arg(long)]
    beats: Option<u64>,
    /// Print frames back to back without sleeping or ANSI clears.
    #[arg(long)]
    no_delay: bool,
    /// Title card text.
    #[arg(long)]
    title: Option<String>,
    /// Credit line; repeat for more lines.
    #[arg(long = "line")]
    lines: Vec<String>,
}

impl CreditsArgs {
    /// File settings first, flags on top.
    fn resolve_config(&self) -> cadence_core::Result<HostConfig> {
        let mut config = match &self.config {
            Some(path) => HostConfig::load(path)?,
            None => HostConfig::default(),
        };
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if self.beats.is_some() {
            config.beats = self.beats;
        }
        if self.no_delay {
            config.realtime = false;
        }
        Ok(config)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PatternKind {
    Always,
    EveryN,
    OnOff,
    OffOn,
    Before,
    At,
}

impl PatternKind {
    fn build(self, params: &[Beat]) -> cadence_core::Result<BeatPredicate> {
        match (self, params) {
            (PatternKind::Always, []) => Ok(always()),
            (PatternKind::EveryN, [n]) => every_n_beats(*n),
            (PatternKind::OnOff, [on, off]) => every_on_off(*on, *off),
            (PatternKind::OffOn, [off, on]) => every_off_on(*off, *on),
            (PatternKind::Before, [n]) => Ok(before_n(*n)),
            (PatternKind::At, [n]) => Ok(at_beat(*n)),
            (kind, params) => Err(TimelineError::InvalidPredicateParameters(format!(
                "{kind:?} does not take {} parameter(s)",
                params.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_credit_flags() {
        let cli = Cli::parse_from([
            "cadence", "credits", "--no-delay", "--fps", "30", "--line", "a", "--line", "b",
        ]);
        let Commands::Credits(args) = cli.command else {
            panic!("expected credits command");
        };
        let config = args.resolve_config().unwrap();

        assert_eq!(config.fps, 30);
        assert!(!config.realtime);
        assert_eq!(args.lines, vec!["a", "b"]);
    }

    #[test]
    fn pattern_kinds_check_their_arity() {
        let pred = PatternKind::OnOff.build(&[3, 2]).unwrap();
        assert!(pred.evaluate(0) && !pred.evaluate(3));

        assert!(PatternKind::EveryN.build(&[0]).is_err());
        assert!(matches!(
            PatternKind::At.build(&[]),
            Err(TimelineError::InvalidPredicateParameters(_))
        ));
    }

    #[test]
    fn pattern_marks_stop_at_the_last_beat() {
        let pred = PatternKind::OnOff.build(&[2, 1]).unwrap();
        assert_eq!(pattern_marks(&pred, -1, 5), ".##.#");
        assert_eq!(pattern_marks(&pred, 0, -3), "");

        let marks = pattern_marks(&always(), Beat::MAX - 2, 24);
        assert_eq!(marks, "##");
    }

    #[test]
    fn pattern_accepts_negative_parameters() {
        let cli = Cli::parse_from(["cadence", "pattern", "before", "-2", "--from", "-4"]);
        let Commands::Pattern { params, from, .. } = cli.command else {
            panic!("expected pattern command");
        };
        assert_eq!(params, vec![-2]);
        assert_eq!(from, -4);
    }
}
