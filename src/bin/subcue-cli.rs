use std::{
    fs,
    io::{self, BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

#[cfg(feature = "ffmpeg")]
use std::{sync::Arc, time::Duration};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
#[cfg(feature = "ffmpeg")]
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use subcue::{Cue, CueFormat, MarkupStripper, dialogue, markup};

#[cfg(feature = "ffmpeg")]
use subcue::{
    BackendRegistry, ExtractionConfig, FfmpegSource, ProgressCallback, ProgressInfo,
    SubtitleDecoder,
};

const CLI_AFTER_HELP: &str = "Examples:\n  subcue strip < lines.txt\n  subcue dialogue events.ass --json\n  subcue extract input.mkv --format srt --out subs.srt --progress\n  subcue completions zsh > _subcue";

#[derive(Debug, Parser)]
#[command(
    name = "subcue",
    version,
    about = "Extract plain-text cues from subtitle tracks and ASS/SSA markup",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
struct GlobalOptions {
    /// Show additional output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Strip ASS/SSA markup from each input line.
    #[command(
        about = "Strip ASS/SSA markup",
        after_help = "Examples:\n  subcue strip lines.txt\n  echo '{\\b1}Bold{\\b0}\\Nnext' | subcue strip"
    )]
    Strip {
        /// Input text file. Reads standard input when omitted.
        input: Option<PathBuf>,
        /// Output capacity per line, in bytes.
        #[arg(long, default_value_t = markup::DEFAULT_CAPACITY)]
        capacity: usize,
    },

    /// Print the dialogue text of each ASS/SSA record line.
    #[command(
        about = "Extract dialogue text from record lines",
        after_help = "Examples:\n  subcue dialogue events.txt\n  grep '^Dialogue:' movie.ass | subcue dialogue --json"
    )]
    Dialogue {
        /// Input text file. Reads standard input when omitted.
        input: Option<PathBuf>,
        /// Output capacity per line, in bytes.
        #[arg(long, default_value_t = markup::DEFAULT_CAPACITY)]
        capacity: usize,
        /// Output machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Decode the subtitle track of a media file.
    #[command(
        about = "Extract subtitle cues (requires the `ffmpeg` feature)",
        after_help = "Examples:\n  subcue extract input.mkv --format srt --out subs.srt\n  subcue extract input.mkv --format raw --start 00:00:10 --end 00:00:40\n  subcue extract input.mkv --json"
    )]
    Extract {
        /// Input media path.
        input: PathBuf,
        /// Output format: srt | vtt | raw.
        #[arg(long, default_value = "srt")]
        format: String,
        /// Output file path. Prints to standard output when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Only keep cues shown after this time.
        #[arg(long)]
        start: Option<String>,
        /// Only keep cues shown before this time.
        #[arg(long)]
        end: Option<String>,
        /// Output machine-readable JSON instead of subtitle text.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
fn parse_cue_format(value: &str) -> Option<CueFormat> {
    match value.to_ascii_lowercase().as_str() {
        "srt" => Some(CueFormat::Srt),
        "vtt" | "webvtt" => Some(CueFormat::WebVtt),
        "raw" | "txt" => Some(CueFormat::Raw),
        _ => None,
    }
}

/// Parse `SS[.fff]`, `MM:SS[.fff]` or `HH:MM:SS[.fff]` into seconds.
#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
fn parse_timecode(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return Ok(seconds.max(0.0));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [hours, minutes, seconds] => (hours.parse::<u64>()?, minutes.parse::<u64>()?, *seconds),
        [minutes, seconds] => (0, minutes.parse::<u64>()?, *seconds),
        _ => return Err(format!("invalid time format: {trimmed}").into()),
    };

    let total = hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds.parse::<f64>()?;
    Ok(total.max(0.0))
}

fn read_lines(input: Option<&Path>) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let reader: Box<dyn Read> = match input {
        Some(path) => Box::new(fs::File::open(path)?),
        None => Box::new(io::stdin()),
    };
    let lines = BufReader::new(reader).lines().collect::<Result<Vec<_>, _>>()?;
    Ok(lines)
}

#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
fn cue_json(cue: &Cue) -> serde_json::Value {
    json!({
        "start": cue.start,
        "end": cue.end,
        "text": cue.text,
        "serial": cue.serial,
    })
}

#[cfg(feature = "ffmpeg")]
struct TerminalProgress {
    bar: ProgressBar,
}

#[cfg(feature = "ffmpeg")]
impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template(
            "{spinner:.green} {pos} packets {msg}",
        )?);
        bar.enable_steady_tick(Duration::from_millis(120));
        Ok(Self { bar })
    }
}

#[cfg(feature = "ffmpeg")]
impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if let Some(timestamp) = info.current_timestamp {
            self.bar.set_message(format!("at {timestamp:.1}s"));
        }
    }
}

#[cfg(feature = "ffmpeg")]
impl Drop for TerminalProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(feature = "ffmpeg")]
fn extract_cues(
    input: &Path,
    global: &GlobalOptions,
) -> Result<Vec<Cue>, Box<dyn std::error::Error>> {
    subcue::set_ffmpeg_log_level(if global.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Error
    });

    let mut registry = BackendRegistry::with_builtin();
    let registered = subcue::register_ffmpeg_backends(&mut registry);
    if global.verbose {
        eprintln!(
            "{} {registered} FFmpeg subtitle decoders",
            "registered".cyan().bold()
        );
    }

    let progress = if global.progress {
        Some(Arc::new(TerminalProgress::new()?))
    } else {
        None
    };

    let mut config = ExtractionConfig::new().with_batch_size(16);
    if let Some(progress) = &progress {
        config = config.with_progress(Arc::clone(progress) as Arc<dyn ProgressCallback>);
    }

    let mut source = FfmpegSource::new(input);
    let mut decoder = SubtitleDecoder::new(&registry).with_config(config);
    decoder.process(&mut source)?;
    drop(progress);

    Ok(decoder.frames().iter().cloned().collect())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Strip { input, capacity } => {
            let stripper = MarkupStripper::new(capacity);
            for line in read_lines(input.as_deref())? {
                println!("{}", stripper.strip(&line));
            }
        }
        Commands::Dialogue {
            input,
            capacity,
            json,
        } => {
            let texts: Vec<String> = read_lines(input.as_deref())?
                .iter()
                .map(|line| dialogue::plain_text_from_ass(line, capacity))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&texts)?);
            } else {
                for text in &texts {
                    println!("{text}");
                }
            }
        }
        #[cfg(feature = "ffmpeg")]
        Commands::Extract {
            input,
            format,
            out,
            start,
            end,
            json,
        } => {
            let cue_format = parse_cue_format(&format).ok_or("Unsupported --format for cues")?;
            if let Some(out) = &out {
                ensure_writable_path(out, cli.global.overwrite)?;
            }

            let range_start = start.as_deref().map(parse_timecode).transpose()?;
            let range_end = end.as_deref().map(parse_timecode).transpose()?;
            if matches!((range_start, range_end), (Some(start), Some(end)) if start > end) {
                return Err("--start must be <= --end".into());
            }

            let cues: Vec<Cue> = extract_cues(&input, &cli.global)?
                .into_iter()
                .filter(|cue| range_end.is_none_or(|end| cue.start < end))
                .filter(|cue| range_start.is_none_or(|start| cue.end > start))
                .collect();

            if cli.global.verbose {
                eprintln!(
                    "{} {} cues from {}",
                    "decoded".cyan().bold(),
                    cues.len(),
                    input.display()
                );
            }

            let output = if json {
                serde_json::to_string_pretty(&cues.iter().map(cue_json).collect::<Vec<_>>())?
            } else {
                subcue::format_cues(&cues, cue_format)
            };

            match out {
                Some(out) => {
                    fs::write(&out, output)?;
                    println!("{} {}", "saved".green().bold(), out.display());
                }
                None => print!("{output}"),
            }
        }
        #[cfg(not(feature = "ffmpeg"))]
        Commands::Extract { .. } => {
            return Err("extract requires building with the `ffmpeg` feature".into());
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "subcue", &mut io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
