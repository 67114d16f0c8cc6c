/// Sky Gallery - image gallery service
///
/// Serves paginated previews and full-size images, accepts uploads and
/// id renumbering.

use sky_gallery::{config::GalleryConfig, context::AppContext, error::GalleryResult, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> GalleryResult<()> {
    // Load configuration
    let config = GalleryConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(config.logging.env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
   _____ __              ______      ____
  / ___// /____  __     / ____/___ _/ / /__  _______  __
  \__ \/ //_/ / / /    / / __/ __ `/ / / _ \/ ___/ / / /
 ___/ / ,< / /_/ /    / /_/ / /_/ / / /  __/ /  / /_/ /
/____/_/|_|\__, /     \____/\__,_/_/_/\___/_/   \__, /
          /____/                               /____/

        Sky Gallery v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
