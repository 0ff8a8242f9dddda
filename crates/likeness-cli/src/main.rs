use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use likeness_client::{MatchOutcome, MatcherClient};
use likeness_hw::{Camera, Frame};

#[derive(Parser)]
#[command(name = "likeness", about = "Likeness installation diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available V4L2 capture devices
    Devices,
    /// Capture one frame and save it as a PNG
    Capture {
        /// V4L2 device path
        #[arg(short, long, default_value = "/dev/video0")]
        device: String,
        /// Output file
        #[arg(short, long, default_value = "capture.png")]
        output: String,
    },
    /// Send an image file to the matcher and print the ranked lists
    Match {
        /// Image file to upload
        image: String,
        /// Grid cell count to request placement for
        #[arg(short, long, default_value_t = 231)]
        num_vids: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("no capture devices found");
            }
            for dev in devices {
                println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
            }
        }
        Commands::Capture { device, output } => {
            let camera = Camera::open(&device)?;
            let frame = camera.capture_frame()?;
            let rgb = image::RgbImage::from_raw(frame.width, frame.height, frame.to_rgb())
                .context("captured frame has inconsistent dimensions")?;
            rgb.save(&output)
                .with_context(|| format!("failed to write {output}"))?;
            println!("saved {}x{} frame to {output}", frame.width, frame.height);
        }
        Commands::Match { image, num_vids } => {
            let rgb = image::open(&image)
                .with_context(|| format!("failed to read {image}"))?
                .to_rgb8();
            let (width, height) = rgb.dimensions();
            let mut bgr = rgb.into_raw();
            for px in bgr.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            let frame = Frame {
                data: bgr,
                width,
                height,
                timestamp: std::time::Instant::now(),
                sequence: 0,
            };

            let client = MatcherClient::from_env()?;
            match client.submit(&frame, num_vids).await? {
                MatchOutcome::NoFace => println!("matcher found no face in {image}"),
                MatchOutcome::Matches(ranked) => {
                    println!("most similar:");
                    for entry in &ranked.most_similar {
                        println!("  {} ({} tiles)", entry.path, entry.num_images);
                    }
                    println!("least similar:");
                    for entry in &ranked.least_similar {
                        println!("  {} ({} tiles)", entry.path, entry.num_images);
                    }
                }
            }
        }
    }

    Ok(())
}
