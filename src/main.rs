use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tangentcam::cli::{Cli, Commands, GenerateArgs};
use tangentcam::{init_logging, Config, InputDocument, OutputTarget, Pipeline};
use tracing::{debug, info};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{e:#}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate(args) => {
            let config = load_config(cli.config.as_deref())?;
            generate(config, args)
        }
        Commands::CheckConfig { file } => {
            Config::load_from_file(&file).with_context(|| format!("{} is not valid", file.display()))?;
            println!("{}: ok", file.display());
            Ok(())
        }
        Commands::PrintConfig { format, overrides } => {
            let mut config = load_config(cli.config.as_deref())?;
            overrides.apply(&mut config);
            config.validate()?;
            print!("{}", config.to_string_as(format.into())?);
            Ok(())
        }
    }
}

/// The explicit config file, else the per-user one, else defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    match Config::load_default().context("failed to load the default config file")? {
        Some(config) => {
            debug!(path = ?Config::default_path(), "Using default config file");
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

fn generate(mut config: Config, args: GenerateArgs) -> Result<()> {
    args.overrides.apply(&mut config);
    let job = config.resolve().context("invalid configuration")?;

    if let Some(path) = &args.write_config {
        config
            .save_to_file(path)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        info!(path = %path.display(), "Saved configuration");
    }

    let document = InputDocument::from_file(&args.input)?;
    info!(
        input = %args.input.display(),
        paths = document.path_count(),
        groups = document.groups.len(),
        "Loaded geometry"
    );

    let creation_date = config
        .output
        .creation_date
        .then(|| chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
    let pipeline = Pipeline::new(job).with_creation_date(creation_date);
    let programs = pipeline.run(&document, config.output.split_groups)?;

    for program in &programs {
        let group = config.output.split_groups.then_some(program.group.as_deref()).flatten();
        let target = OutputTarget::resolve(&config.output, args.output.as_deref(), group);
        target.write(&program.gcode)?;
    }
    Ok(())
}
