// SPDX-License-Identifier: MPL-2.0
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use hazelift::config::{self, Config};
use hazelift::error::{Error, Result};
use hazelift::infrastructure::OnnxRestorationModel;
use hazelift::media::{self, DehazeParams, Dehazer, JobKind, StreamEnd};

const HELP: &str = "\
hazelift - remove haze from images and videos

USAGE:
  hazelift [OPTIONS] image <INPUT> [OUTPUT]
  hazelift [OPTIONS] video <INPUT> [OUTPUT]
  hazelift [OPTIONS] cleanup

OPTIONS:
  --config <FILE>   Read settings from FILE instead of the config directory
  --model <FILE>    Restoration model to load (overrides [model] path)
  --print-config    Print the effective configuration and exit
  -h, --help        Print this help

Inputs: png, jpg, jpeg (image) and mp4, avi (video).
Without OUTPUT, results go to the configured output directory.
";

#[derive(Debug)]
enum Command {
    Dehaze {
        kind: JobKind,
        input: PathBuf,
        output: Option<PathBuf>,
    },
    Cleanup,
    PrintConfig,
}

#[derive(Debug)]
struct Cli {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> std::result::Result<Option<Cli>, String> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let config: Option<PathBuf> = args
        .opt_value_from_str("--config")
        .map_err(|e| e.to_string())?;
    let model: Option<PathBuf> = args
        .opt_value_from_str("--model")
        .map_err(|e| e.to_string())?;
    let print_config = args.contains("--print-config");

    let command = if print_config {
        Command::PrintConfig
    } else {
        match args.subcommand().map_err(|e| e.to_string())?.as_deref() {
            Some("image") => dehaze_command(&mut args, JobKind::Image)?,
            Some("video") => dehaze_command(&mut args, JobKind::Video)?,
            Some("cleanup") => Command::Cleanup,
            Some(other) => return Err(format!("unknown command '{other}'")),
            None => return Ok(None),
        }
    };

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(format!("unexpected arguments: {rest:?}"));
    }

    Ok(Some(Cli {
        config,
        model,
        command,
    }))
}

fn dehaze_command(
    args: &mut pico_args::Arguments,
    kind: JobKind,
) -> std::result::Result<Command, String> {
    let input: PathBuf = args
        .opt_free_from_str()
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("{kind} command needs an INPUT file"))?;
    let output: Option<PathBuf> = args.opt_free_from_str().map_err(|e| e.to_string())?;
    Ok(Command::Dehaze {
        kind,
        input,
        output,
    })
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return config::load_from_path(path);
    }
    let (config, warning) = config::load();
    if let Some(warning) = warning {
        log::warn!("{warning}");
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model.path = Some(model);
    }

    match cli.command {
        Command::PrintConfig => {
            print!("{}", config::to_toml(&config)?);
            Ok(())
        }
        Command::Cleanup => {
            let report = media::cleanup_artifacts(&config.output);
            log::info!(
                "cleanup removed {} file(s), {} failure(s)",
                report.removed.len(),
                report.failed.len()
            );
            Ok(())
        }
        Command::Dehaze {
            kind,
            input,
            output,
        } => dehaze(&config, kind, &input, output.as_deref()),
    }
}

fn dehaze(config: &Config, expected: JobKind, input: &Path, output: Option<&Path>) -> Result<()> {
    let kind = JobKind::from_path(input)?;
    if kind != expected {
        return Err(Error::UnsupportedMedia(format!(
            "{} is not a {expected} file",
            input.display()
        )));
    }
    if !input.is_file() {
        return Err(Error::Decode(format!("{} does not exist", input.display())));
    }
    let output = media::resolve_output(kind, output, &config.output);

    let mut model = OnnxRestorationModel::load(&config.model)?;
    let mut dehazer = Dehazer::new(&mut model, DehazeParams::from_config(&config.dehaze));

    match kind {
        JobKind::Image => {
            dehazer.dehaze_image_file(input, &output)?;
        }
        JobKind::Video => {
            let report = media::dehaze_video_file(&mut dehazer, input, &output, &config.video)?;
            if let StreamEnd::ReadFailure {
                frame_index,
                reason,
            } = &report.termination
            {
                log::warn!("input ended early at frame {frame_index}: {reason}");
            }
        }
    }

    println!("{}", output.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match parse_args() {
        Ok(Some(cli)) => cli,
        Ok(None) => {
            print!("{HELP}");
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("error: {message}\n\n{HELP}");
            return ExitCode::from(2);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
