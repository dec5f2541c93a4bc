use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grid_backdrop::config::AppConfig;
use grid_backdrop::raster_backend::{self, RasterOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Interactive window, redrawn every display refresh
    Window,
    /// Headless CPU rendering to a PNG snapshot
    Raster,
}

/// Command-line arguments for grid-backdrop
#[derive(Parser, Debug)]
#[command(name = "grid-backdrop")]
#[command(version, about = "Interactive glowing grid backdrop", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "GRID_BACKDROP_CONFIG", default_value = "grid-backdrop.toml")]
    config: PathBuf,

    /// Rendering backend
    #[arg(short, long, env = "GRID_BACKDROP_BACKEND", value_enum, default_value = "window")]
    backend: Backend,

    /// Surface size as WIDTHxHEIGHT (overrides the config file)
    #[arg(long, value_parser = parse_size)]
    size: Option<(u32, u32)>,

    /// Snapshot path for the raster backend
    #[arg(short, long, default_value = "grid.png")]
    output: PathBuf,

    /// Frames to simulate before the raster snapshot
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Pointer position X,Y for the raster backend
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    cursor: Option<(f32, f32)>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    log_format: String,
}

fn parse_size(value: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let w = w.trim().parse::<u32>().map_err(|err| format!("bad width: {err}"))?;
    let h = h.trim().parse::<u32>().map_err(|err| format!("bad height: {err}"))?;
    if w == 0 || h == 0 {
        return Err("width and height must be non-zero".to_string());
    }
    Ok((w, h))
}

fn parse_point(value: &str) -> std::result::Result<(f32, f32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{value}`"))?;
    let x = x.trim().parse::<f32>().map_err(|err| format!("bad x: {err}"))?;
    let y = y.trim().parse::<f32>().map_err(|err| format!("bad y: {err}"))?;
    Ok((x, y))
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("grid-backdrop v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(&args.config).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {:#}, using defaults", e);
        AppConfig::default()
    });
    let config = config.with_size(args.size);
    tracing::debug!("Config: {:?}", config);

    match args.backend {
        Backend::Window => {
            info!("Starting window backend");
            grid_backdrop::backend::run(&config).context("window backend failed")?;
        }
        Backend::Raster => {
            let options = RasterOptions {
                size: (config.window.width, config.window.height),
                frames: args.frames,
                cursor: args.cursor,
                output: args.output.clone(),
            };
            info!(frames = options.frames, "Starting raster backend");
            raster_backend::run(&config, &options).context("raster backend failed")?;
        }
    }

    info!("grid-backdrop shut down");
    Ok(())
}

fn init_logging(args: &Args) {
    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("grid_backdrop={log_level},warn"))
    });

    match args.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_accepts_both_separators() {
        assert_eq!(parse_size("1280x800"), Ok((1280, 800)));
        assert_eq!(parse_size("64X48"), Ok((64, 48)));
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("1280").is_err());
    }

    #[test]
    fn parse_point_allows_negative_coordinates() {
        assert_eq!(parse_point("400,300"), Ok((400.0, 300.0)));
        assert_eq!(parse_point("-10.5, 2"), Ok((-10.5, 2.0)));
        assert!(parse_point("400").is_err());
    }

    #[test]
    fn args_parse_raster_invocation() {
        let args = Args::try_parse_from([
            "grid-backdrop",
            "--backend",
            "raster",
            "--size",
            "320x240",
            "--cursor",
            "-5,7",
            "-vv",
        ])
        .expect("parse");
        assert_eq!(args.backend, Backend::Raster);
        assert_eq!(args.size, Some((320, 240)));
        assert_eq!(args.cursor, Some((-5.0, 7.0)));
        assert_eq!(args.verbose, 2);
    }
}
