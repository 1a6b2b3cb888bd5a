use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use futures_util::future::join_all;
use serde::Deserialize;
use tracing::{debug, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use modio_asset_cache::application::{ImageRequestManager, ImageTicket};
use modio_asset_cache::domain::entities::{ImageRequest, ModProfile, RequestPage};
use modio_asset_cache::domain::errors::AssetResult;
use modio_asset_cache::domain::ports::PersistentStorePort;
use modio_asset_cache::domain::ResolvedImage;
use modio_asset_cache::infrastructure::{
    AppConfig, CliArgs, DiskImageCache, HttpImageFetcher, StorageManager, SubscribedMods,
    is_modio_image_url, youtube_thumbnail_for_link,
};

#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileFile {
    Page(RequestPage<ModProfile>),
    List(Vec<ModProfile>),
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level.to_tracing_level()).into())
        .from_env_lossy();

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = match &args.config {
        Some(path) => Ok(StorageManager::at(path.clone())),
        None => StorageManager::new(),
    };
    let mut config = match storage {
        Ok(storage) => storage.load_config()?,
        Err(e) => {
            eprintln!("Using default configuration: {e}");
            AppConfig::default()
        }
    };
    config.merge_with_args(args);
    Ok(config)
}

fn read_profiles(path: &Path) -> Result<Vec<ModProfile>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let profiles = match serde_json::from_str::<ProfileFile>(&content)
        .wrap_err("Failed to parse mod profiles")?
    {
        ProfileFile::Page(page) => page.data,
        ProfileFile::List(list) => list,
    };
    Ok(profiles)
}

async fn build_manager(config: &AppConfig) -> Result<ImageRequestManager> {
    let disk_cache = DiskImageCache::new(
        config.cache.effective_cache_dir(),
        config.cache.disk_cache_size,
    )
    .await?;
    info!(
        dir = %disk_cache.cache_dir().display(),
        entries = disk_cache.len(),
        bytes = disk_cache.current_size(),
        "Disk cache ready"
    );

    let fetcher = HttpImageFetcher::new(&config.network.fetcher_config())?;
    let subscriptions: SubscribedMods = config.subscribed_mods.iter().copied().collect();

    Ok(ImageRequestManager::new(
        config.cache.request_config(),
        Arc::new(fetcher),
        Some(Arc::new(disk_cache) as Arc<dyn PersistentStorePort>),
        Arc::new(subscriptions),
    ))
}

async fn resolve(label: String, ticket: ImageTicket) -> (String, AssetResult<ResolvedImage>) {
    if let Some(fallback) = ticket.fallback() {
        info!(
            %label,
            width = fallback.width(),
            height = fallback.height(),
            "Showing fallback"
        );
    }
    (label, ticket.resolve().await)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = modio_asset_cache::VERSION, "Starting {}", modio_asset_cache::NAME);

    let manager = build_manager(&config).await?;

    let mut requests: Vec<(String, ImageRequest)> = args
        .urls
        .iter()
        .map(|url| {
            let target = youtube_thumbnail_for_link(url).unwrap_or_else(|| url.clone());
            if !is_modio_image_url(&target) {
                debug!(url = %target, "Fetching from a host outside the mod.io CDN");
            }
            let request = ImageRequest::url(target);
            let request = if args.persist { request.persisted() } else { request };
            (url.clone(), request)
        })
        .collect();

    if let Some(path) = &args.profiles {
        for profile in read_profiles(path)? {
            requests.push((
                format!("{} logo ({})", profile.name_id, args.size),
                profile.logo_request(args.size),
            ));
            for (index, request) in profile.youtube_requests().into_iter().enumerate() {
                requests.push((format!("{} video {}", profile.name_id, index + 1), request));
            }
        }
    }

    if requests.is_empty() {
        warn!("Nothing to fetch");
        return Ok(());
    }

    let mut pending = Vec::with_capacity(requests.len());
    for (label, request) in requests {
        let ticket = manager.request(request).await;
        pending.push(resolve(label, ticket));
    }

    let mut failures = 0usize;
    for (label, result) in join_all(pending).await {
        match result {
            Ok(resolved) => match &resolved.image {
                Some(image) => println!(
                    "{label}: {}x{} from {}",
                    image.width(),
                    image.height(),
                    resolved.source
                ),
                None => println!("{label}: no image"),
            },
            Err(e) => {
                failures += 1;
                println!("{label}: failed: {e}");
            }
        }
    }

    manager.flush().await;
    info!(stats = %manager.memory_stats(), failures, "Done");

    Ok(())
}
