use std::{fs, path::PathBuf, time::Duration};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use stepframe::{
    DecoderLogLevel, FailurePolicy, FrameSampler, OFFSET_SCHEDULE, SampleRequest, SamplerOptions,
    SopDocument, VideoSource, illustrate_steps, set_decoder_log_level,
};

const CLI_AFTER_HELP: &str = "Examples:\n  stepframe metadata recording.mp4 --json\n  stepframe sample recording.mp4 --at 0:42 --out candidates\n  stepframe illustrate recording.mp4 --sop sop.json --out illustrated --pick 1\n  stepframe completions zsh > _stepframe";

#[derive(Debug, Parser)]
#[command(
    name = "stepframe",
    version,
    about = "Sample candidate still frames from screen recordings at SOP step timestamps",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show a progress bar where supported.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, error, warning, info, debug).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print metadata for a video file (alias: probe).
    #[command(
        about = "Print video metadata",
        visible_alias = "probe",
        after_help = "Examples:\n  stepframe metadata recording.mp4\n  stepframe metadata recording.mp4 --json"
    )]
    Metadata {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Sample the three candidate frames around one timestamp.
    #[command(
        about = "Sample candidate frames around a timestamp",
        after_help = "Examples:\n  stepframe sample recording.mp4 --at 12.5 --out candidates\n  stepframe sample recording.mp4 --at 0:42 --out candidates --quality 70 --partial"
    )]
    Sample {
        /// Input video path.
        input: PathBuf,
        /// Target time: seconds, M:SS, or H:MM:SS(.f).
        #[arg(long)]
        at: String,
        /// Output directory for candidate JPEGs and the manifest.
        #[arg(long)]
        out: PathBuf,
        /// JPEG quality (1-100).
        #[arg(long, default_value_t = stepframe::DEFAULT_JPEG_QUALITY)]
        quality: u8,
        /// Per-seek timeout in seconds.
        #[arg(long, default_value_t = 10.0)]
        timeout: f64,
        /// Keep going when an offset fails, producing a degraded set.
        #[arg(long)]
        partial: bool,
    },

    /// Sample candidates for every timestamped step of an SOP document.
    #[command(
        about = "Illustrate an SOP document's steps",
        after_help = "Examples:\n  stepframe illustrate recording.mp4 --sop sop.json --out illustrated\n  stepframe illustrate recording.mp4 --sop sop.json --out illustrated --pick 1"
    )]
    Illustrate {
        /// Input video path.
        input: PathBuf,
        /// SOP document (JSON).
        #[arg(long)]
        sop: PathBuf,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
        /// Export only the candidate at this index per step instead of all
        /// three (the print/export path).
        #[arg(long)]
        pick: Option<usize>,
        /// JPEG quality (1-100).
        #[arg(long, default_value_t = stepframe::DEFAULT_JPEG_QUALITY)]
        quality: u8,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn parse_log_level(value: &str) -> Option<DecoderLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(DecoderLogLevel::Quiet),
        "error" => Some(DecoderLogLevel::Error),
        "warning" | "warn" => Some(DecoderLogLevel::Warning),
        "info" => Some(DecoderLogLevel::Info),
        "debug" => Some(DecoderLogLevel::Debug),
        _ => None,
    }
}

/// Parse `SS(.f)`, `M:SS(.f)`, or `H:MM:SS(.f)` into seconds.
fn parse_timecode(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = value.split(':').collect();
    let seconds = match parts.as_slice() {
        [seconds] => seconds.parse::<f64>()?,
        [minutes, seconds] => minutes.parse::<f64>()? * 60.0 + seconds.parse::<f64>()?,
        [hours, minutes, seconds] => {
            hours.parse::<f64>()? * 3600.0
                + minutes.parse::<f64>()? * 60.0
                + seconds.parse::<f64>()?
        }
        _ => return Err(format!("unrecognised timecode: {value}").into()),
    };
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("timecode must be non-negative: {value}").into());
    }
    Ok(seconds)
}

/// Validate a `--timeout` value; `Duration::from_secs_f64` panics on
/// non-finite input, so reject it here instead.
fn sample_timeout(seconds: f64) -> Result<Duration, Box<dyn std::error::Error>> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds: {seconds}").into());
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Validate a `--pick` index against the fixed candidate count, before any
/// step directory is written.
fn validate_pick(index: usize) -> Result<(), Box<dyn std::error::Error>> {
    if index >= OFFSET_SCHEDULE.len() {
        return Err(format!(
            "--pick {index} is out of range (candidates are indexed 0-{})",
            OFFSET_SCHEDULE.len() - 1
        )
        .into());
    }
    Ok(())
}

fn ensure_output_dir(out: &PathBuf, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if out.exists() && !overwrite {
        return Err(format!(
            "output directory already exists: {} (use --overwrite)",
            out.display()
        )
        .into());
    }
    fs::create_dir_all(out)?;
    Ok(())
}

fn candidate_label(offset_seconds: f64) -> &'static str {
    if offset_seconds < 0.0 {
        "early"
    } else if offset_seconds > 0.0 {
        "late"
    } else {
        "ontime"
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(level) = &cli.global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        set_decoder_log_level(parsed);
    }

    match cli.command {
        Commands::Metadata { input, json } => {
            let source = VideoSource::from_path(&input);
            let metadata = FrameSampler::new().probe(&source)?;
            if json {
                let payload = json!({
                    "format": metadata.format,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "video": {
                        "width": metadata.video.width,
                        "height": metadata.video.height,
                        "fps": metadata.video.frames_per_second,
                        "frame_count": metadata.video.frame_count,
                        "codec": metadata.video.codec,
                    },
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.video.width,
                    metadata.video.height,
                    metadata.video.frames_per_second,
                    metadata.video.codec,
                );
            }
        }
        Commands::Sample {
            input,
            at,
            out,
            quality,
            timeout,
            partial,
        } => {
            let target_seconds = parse_timecode(&at)?;
            let timeout = sample_timeout(timeout)?;
            ensure_output_dir(&out, cli.global.overwrite)?;

            let mut options = SamplerOptions::new()
                .with_jpeg_quality(quality)
                .with_seek_timeout(timeout);
            if partial {
                options = options.with_failure_policy(FailurePolicy::Partial);
            }

            let sampler = FrameSampler::with_options(options);
            let source = VideoSource::from_path(&input);
            let request = SampleRequest::new(source, target_seconds)?;
            let set = sampler.sample(&request)?;

            let mut manifest_entries = Vec::new();
            for (index, frame) in set.frames().iter().enumerate() {
                let name = format!(
                    "candidate_{index}_{}.jpg",
                    candidate_label(frame.offset_seconds())
                );
                let path = out.join(&name);
                frame.still().save(&path)?;
                manifest_entries.push(json!({
                    "index": index,
                    "file": name,
                    "offset_seconds": frame.offset_seconds(),
                    "seek_seconds": frame.seek_seconds(),
                    "width": frame.still().width(),
                    "height": frame.still().height(),
                }));
                println!("{} {}", "saved".green().bold(), path.display());
            }

            let manifest = json!({
                "target_seconds": set.target_seconds(),
                "complete": set.is_complete(),
                "default_selection": set.default_selection(),
                "candidates": manifest_entries,
            });
            fs::write(
                out.join("manifest.json"),
                serde_json::to_string_pretty(&manifest)?,
            )?;

            if !set.is_complete() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("only {} of 3 offsets produced a frame", set.len()).yellow()
                );
            }
        }
        Commands::Illustrate {
            input,
            sop,
            out,
            pick,
            quality,
        } => {
            let document = SopDocument::from_json(&fs::read_to_string(&sop)?)?;
            if let Some(index) = pick {
                validate_pick(index)?;
            }
            ensure_output_dir(&out, cli.global.overwrite)?;

            let timestamped = document.timestamped_steps().count();
            if timestamped == 0 {
                return Err("SOP document has no timestamped steps".into());
            }

            let bar = if cli.global.progress {
                let bar = ProgressBar::new(timestamped as u64);
                bar.set_style(ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {pos}/{len} steps",
                )?);
                Some(bar)
            } else {
                None
            };

            let sampler = FrameSampler::with_options(
                SamplerOptions::new().with_jpeg_quality(quality),
            );
            let source = VideoSource::from_path(&input);

            let illustrations = illustrate_steps(&sampler, &source, &document);
            let mut exported = 0usize;
            for illustration in &illustrations {
                let step_dir = out.join(format!("step_{:02}", illustration.step_index + 1));
                fs::create_dir_all(&step_dir)?;

                match pick {
                    Some(index) => {
                        let frame = illustration.set.select(index)?;
                        let path = step_dir.join("selected.jpg");
                        frame.still().save(&path)?;
                        exported += 1;
                    }
                    None => {
                        for (index, frame) in illustration.set.frames().iter().enumerate() {
                            let name = format!(
                                "candidate_{index}_{}.jpg",
                                candidate_label(frame.offset_seconds())
                            );
                            frame.still().save(step_dir.join(name))?;
                            exported += 1;
                        }
                    }
                }

                if let Some(bar) = &bar {
                    bar.inc(1);
                }
            }
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }

            println!(
                "{} {} steps illustrated, {} images written to {}",
                "done".green().bold(),
                illustrations.len(),
                exported,
                out.display(),
            );
            if illustrations.len() < timestamped {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!(
                        "{} of {} timestamped steps failed to illustrate",
                        timestamped - illustrations.len(),
                        timestamped
                    )
                    .yellow()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stepframe", &mut std::io::stdout());
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
