use anyhow::Context;
use bytes::Bytes;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};

use hachidori::config::Config;
use hachidori::image_optimizer::{signature, ImageFetcher, OptimizationRequest, Optimizer};
use hachidori::queue::{self, OptimizeJob, Worker};

#[derive(Parser, Debug)]
#[command(name = "hachidori")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize a local image file
    Optimize {
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        params: Params,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Fetch an image over HTTP and optimize it
    Fetch {
        #[arg(short, long)]
        url: String,
        #[command(flatten)]
        params: Params,
        #[arg(short, long)]
        output: PathBuf,
        /// Write the serialized result blob instead of the image
        #[arg(long)]
        blob: bool,
    },
    /// Run one queue job end to end and write the image
    Job {
        /// JSON job payload: {"url", "width", "quality", "allow_svg"}
        #[arg(short, long)]
        payload: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the detected image type of a file
    Detect {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the contents of a serialized result blob
    DecodeBlob {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct Params {
    /// Output width upper bound in pixels
    #[arg(short, long)]
    width: u32,
    /// 1-100; configured default when omitted
    #[arg(short, long)]
    quality: Option<u8>,
    #[arg(long)]
    allow_svg: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.validate().map_err(anyhow::Error::msg)?;

    hachidori::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!(
        config_file = ?args.config,
        redis = config.queue.redis_url.is_some(),
        "Configuration loaded"
    );

    match args.command {
        Command::Optimize {
            input,
            params,
            output,
        } => {
            config.optimizer.check_width(params.width)?;
            let buffer = read(&input)?;
            let request = OptimizationRequest::new(
                buffer,
                params.width,
                params.quality.unwrap_or(config.optimizer.default_quality),
                params.allow_svg || config.optimizer.allow_svg,
            )?;

            let optimized = Optimizer::default().optimize(&request)?;
            write(&output, &optimized)?;
            tracing::info!(
                input = %input.display(),
                before = request.buffer.len(),
                after = optimized.len(),
                "Image optimized"
            );
        }
        Command::Fetch {
            url,
            params,
            output,
            blob,
        } => {
            config.optimizer.check_width(params.width)?;
            let fetcher = ImageFetcher::new(Optimizer::default())?;
            let result = fetcher
                .fetch_and_optimize(
                    &url,
                    params.width,
                    params.quality.unwrap_or(config.optimizer.default_quality),
                    params.allow_svg || config.optimizer.allow_svg,
                )
                .await?;

            if blob {
                write(&output, &queue::serialize_result(&result))?;
            } else {
                write(&output, &result.buffer)?;
            }
            tracing::info!(
                url = %url,
                content_type = ?result.content_type,
                cache_control = ?result.cache_control,
                "Image fetched and optimized"
            );
        }
        Command::Job { payload, output } => {
            let job = OptimizeJob::from_json(&payload)?;
            let store = queue::connect_store(&config.queue).await?;
            let worker = Worker::new(ImageFetcher::new(Optimizer::default())?, store)
                .with_max_width(config.optimizer.max_width);

            let job_id = queue::new_job_id();
            worker.run_job(&job_id, &job).await?;
            let result = worker
                .take_result(&job_id)
                .await?
                .with_context(|| format!("Result for job {} disappeared", job_id))?;

            write(&output, &result.buffer)?;
            tracing::info!(job_id = %job_id, "Job completed");
        }
        Command::Detect { input } => {
            let buffer = read(&input)?;
            match signature::detect(&buffer) {
                Some(image_type) => println!("{}\t{}", image_type, image_type.content_type()),
                None => println!("none"),
            }
        }
        Command::DecodeBlob { input } => {
            let result = queue::deserialize_result(Bytes::from(read(&input)?))?;
            let summary = serde_json::json!({
                "image_bytes": result.buffer.len(),
                "detected_type": signature::detect_family(&result.buffer),
                "content_type": result.content_type,
                "cache_control": result.cache_control,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}
