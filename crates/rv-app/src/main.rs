mod config;
mod credentials;
mod error;
mod generator;
mod ui;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use rv_core::request::{GenerationRequest, SourceImage};
use rv_core::state::OrchestrationState;
use rv_core::AspectRatio;
use crate::config::AppConfig;
use crate::generator::Generator;

/// Animate a still image from a text description of the motion
#[derive(Parser, Debug)]
#[command(name = "reverie", version)]
struct Args {
    /// Image to animate
    #[arg(short, long)]
    image: PathBuf,

    /// The motion you want, e.g. "a gentle breeze moves the trees"
    #[arg(short, long)]
    prompt: String,

    /// 16:9 or 9:16
    #[arg(short, long, default_value = "16:9")]
    aspect_ratio: AspectRatio,

    /// Where to write the video
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use this key instead of GEMINI_API_KEY / API_KEY
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = AppConfig::load()?;
    let generator = Generator::new(&config, args.api_key).await?;

    let source = SourceImage::from_path(&args.image);
    generator.show_preview(&source).await?;

    let request = GenerationRequest::new(source, args.prompt, args.aspect_ratio);
    let state = generator.run(request).await?;

    // Failures and the key screen have already been rendered by the progress reporter
    let result = match state {
        OrchestrationState::Ready(_) => {
            let output = args.output.unwrap_or_else(generator::default_output_path);
            generator.save_result(&output).await.map(|()| ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    };

    generator.shutdown();
    Ok(result?)
}
