use stagecanvas_core::{
    config::{parse_hex_color, Config},
    mask::synthesize_mask,
    ImageSource, Point, RasterImage, SelectionRegion, StageCanvas,
};
use anyhow::{Context, Result};
use arboard::Clipboard;
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Copy the printed result to the clipboard
    #[arg(short, long, global = true, default_value_t = false)]
    copy: bool,

    /// Override the image load timeout (milliseconds)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Where an image lands when fitted into a container
    Bounds {
        container_width: f64,
        container_height: f64,
        image_width: f64,
        image_height: f64,
    },

    /// Map a container-local pointer position to image percent space
    Map {
        container_width: f64,
        container_height: f64,
        image_width: f64,
        image_height: f64,
        x: f64,
        y: f64,
    },

    /// Synthesize a black/white selection mask
    Mask {
        /// Selection as x,y,width,height in percent
        #[arg(short, long)]
        region: SelectionRegion,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Write the PNG here instead of printing a data URI
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a dimmed preview thumbnail of a selection
    Preview {
        /// Source image path or data URI
        source: String,

        #[arg(short, long)]
        region: SelectionRegion,

        /// Longer side of the thumbnail
        #[arg(long)]
        max_size: Option<u32>,

        /// Border color as #RRGGBB
        #[arg(long)]
        accent: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the JSON edit request for an image and selection
    Payload {
        source: String,

        #[arg(short, long)]
        region: SelectionRegion,

        /// Edit instruction for the generation service
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
    },
}

/// How long runtime shutdown waits for blocking reads abandoned by a timeout.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let args = Args::parse();

    // Reads .env, so it runs before the log filter looks at RUST_LOG
    let config = Config::load().context("Failed to load configuration")?;
    init_tracing();

    run_to_completion(run(args, config))?
}

/// Drives `future` on a fresh runtime, then shuts the runtime down without
/// waiting indefinitely on blocking-pool threads stuck in a read.
fn run_to_completion<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}

async fn run(args: Args, mut config: Config) -> Result<()> {
    if let Some(ms) = args.timeout_ms {
        config.load_timeout = Duration::from_millis(ms);
    }

    let output = match args.command {
        Command::Bounds {
            container_width,
            container_height,
            image_width,
            image_height,
        } => {
            let canvas = StageCanvas::with_config(config)?;
            let bounds = canvas.bounds(container_width, container_height, image_width, image_height);
            Some(serde_json::to_string_pretty(&bounds)?)
        }

        Command::Map {
            container_width,
            container_height,
            image_width,
            image_height,
            x,
            y,
        } => {
            let canvas = StageCanvas::with_config(config)?;
            let bounds = canvas.bounds(container_width, container_height, image_width, image_height);
            match canvas.locate(Point::new(x, y), &bounds) {
                Some(percent) => Some(serde_json::to_string_pretty(&percent)?),
                None => {
                    println!("Pointer is outside the image (letterbox padding)");
                    None
                }
            }
        }

        Command::Mask {
            region,
            width,
            height,
            output,
        } => {
            let width = width.unwrap_or(config.mask_width);
            let height = height.unwrap_or(config.mask_height);
            let mask = synthesize_mask(&region, width, height).context("Failed to synthesize mask")?;
            emit(mask, output)?
        }

        Command::Preview {
            source,
            region,
            max_size,
            accent,
            output,
        } => {
            if let Some(size) = max_size {
                config.preview_max_size = size;
            }
            if let Some(color) = accent {
                config.accent_color = parse_hex_color(&color)?;
            }

            let canvas = StageCanvas::with_config(config)?;
            let preview = canvas
                .preview(&ImageSource::from_arg(&source), &region)
                .await
                .with_context(|| format!("Failed to compose preview of {}", source))?;
            emit(preview, output)?
        }

        Command::Payload {
            source,
            region,
            prompt,
        } => {
            let canvas = StageCanvas::with_config(config)?;
            let request = canvas
                .edit_request(&ImageSource::from_arg(&source), &region, prompt.join(" "))
                .await
                .context("Failed to build edit request")?;
            Some(request.to_json()?)
        }
    };

    if let Some(text) = output {
        println!("{}", text);

        if args.copy {
            match Clipboard::new() {
                Ok(mut clipboard) => {
                    if let Err(e) = clipboard.set_text(text) {
                        warn!("Failed to copy to clipboard: {}", e);
                    } else {
                        println!("(Copied to clipboard)");
                    }
                }
                Err(e) => warn!("Could not access clipboard: {}", e),
            }
        }
    }

    Ok(())
}

/// Writes the raster to `path`, or returns its data URI for printing.
fn emit(raster: RasterImage, path: Option<PathBuf>) -> Result<Option<String>> {
    match path {
        Some(path) => {
            std::fs::write(&path, &raster.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                path = %path.display(),
                width = raster.width,
                height = raster.height,
                "wrote image"
            );
            Ok(None)
        }
        None => Ok(Some(raster.to_data_uri())),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use stagecanvas_core::preview::compose_preview;
    use stagecanvas_core::{AppError, PreviewStyle};
    use std::fs::OpenOptions;
    use std::process::Command as Process;
    use std::time::Instant;

    #[test]
    fn abandoned_blocking_read_does_not_hold_up_exit() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("stalled.png");
        assert!(Process::new("mkfifo").arg(&fifo).status().unwrap().success());

        let source = ImageSource::Path(fifo.clone());
        let started = Instant::now();
        let result = run_to_completion(async move {
            compose_preview(
                &source,
                &SelectionRegion::FULL,
                &PreviewStyle::default(),
                Duration::from_millis(200),
            )
            .await
        })
        .unwrap();
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(AppError::ImageLoadTimeout(_))));
        assert!(elapsed < Duration::from_secs(5), "exit took {:?}", elapsed);

        // Unblock the reader thread the runtime left behind
        drop(OpenOptions::new().write(true).open(&fifo).unwrap());
    }
}
