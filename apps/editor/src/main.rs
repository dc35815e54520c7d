use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use backdrop_editor::{EditorConfig, EditorError};
use backdrop_io::ProjectDocument;
use backdrop_render::{Compositor, PreviewFrame, PreviewViewport};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "backdrop", version, about = "Place text behind the subject of a photo")]
struct Cli {
    /// Editor configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Flatten background, text layers and cut-out into a PNG.
    Export {
        /// Project document with `textLayers`.
        #[arg(long)]
        project: PathBuf,
        #[arg(long)]
        background: PathBuf,
        /// Background-removed cut-out drawn above the text.
        #[arg(long)]
        foreground: Option<PathBuf>,
        /// Defaults to the configured export file name.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the layered preview as JSON.
    Preview {
        #[arg(long)]
        project: PathBuf,
        /// Preview container size in CSS pixels.
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 400.0)]
        height: f64,
        #[arg(long)]
        image_width: f64,
        #[arg(long)]
        image_height: f64,
        #[arg(long)]
        cutout: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig, EditorError> {
    match path {
        Some(path) => EditorConfig::from_json_file(path),
        None => Ok(EditorConfig::default()),
    }
}

fn run(cli: Cli) -> Result<(), EditorError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Export {
            project,
            background,
            foreground,
            output,
        } => {
            let doc = ProjectDocument::load(&project)?;
            let background = fs::read(&background)?;
            let foreground = match foreground {
                Some(path) => match fs::read(&path) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        log::warn!("Cannot read {}: {}; exporting without cut-out", path.display(), e);
                        None
                    }
                },
                None => None,
            };

            let fonts = config.font_book();
            let png = Compositor::new(&fonts)
                .with_reference_height(config.reference_preview_height)
                .export_png(&background, foreground.as_deref(), &doc.text_layers)?;

            let output = output.unwrap_or_else(|| PathBuf::from(&config.export_file_name));
            fs::write(&output, &png)?;
            log::info!("Wrote {} ({} bytes)", output.display(), png.len());
        }
        Command::Preview {
            project,
            width,
            height,
            image_width,
            image_height,
            cutout,
        } => {
            let doc = ProjectDocument::load(&project)?;
            let frame = PreviewFrame::build(
                &PreviewViewport::new(width, height),
                image_width,
                image_height,
                &doc.text_layers,
                cutout,
                config.reference_preview_height,
            );
            println!("{}", frame.to_json()?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
