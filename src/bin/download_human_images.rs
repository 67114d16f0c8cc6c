/// Download images of people who do not exist and store them in the gallery.
use anyhow::Context;
use clap::Parser;
use reqwest::StatusCode;
use sky_gallery::{config::GalleryConfig, context::AppContext, gallery::ImageType};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(about = "Download human images and save them in the gallery database")]
struct Args {
    /// The number of images to download
    #[arg(default_value_t = 1)]
    num_images: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = GalleryConfig::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(config.logging.env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let source_url = config.download.human_image_source_url.clone();
    let ctx = AppContext::new(config)
        .await
        .context("Failed to initialize gallery")?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("sky-gallery/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    tracing::info!("Downloading {} image(s) from {}", args.num_images, source_url);

    let mut downloaded = 0;
    for _ in 0..args.num_images {
        match download_image(&ctx, &client, &source_url).await {
            Ok(id) => {
                downloaded += 1;
                tracing::info!("Successfully downloaded image {}", id);
            }
            Err(e) => tracing::error!("Failed to download image: {:#}", e),
        }
    }

    tracing::info!("Downloaded {}/{} image(s)", downloaded, args.num_images);

    Ok(())
}

async fn download_image(
    ctx: &AppContext,
    client: &reqwest::Client,
    source_url: &str,
) -> anyhow::Result<i64> {
    let response = client.get(source_url).send().await?;
    if response.status() != StatusCode::OK {
        anyhow::bail!("Unexpected status {}", response.status());
    }

    let bytes = response.bytes().await?;
    let image = ctx
        .images
        .create(bytes.to_vec(), ImageType::Human, None)
        .await?;

    Ok(image.id)
}
