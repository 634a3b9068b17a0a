use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use certshot::platform::{DirectorySaver, RecordingPlatform};
use certshot::{to_share_payload, CaptureConfig, CaptureTarget, CertificateView, PayloadNaming};
#[cfg(feature = "http")]
use certshot::SvgSnapshotProducer;

#[derive(Parser)]
#[command(name = "certshot", about = "Render a certificate fragment to a shareable PNG")]
struct Cli {
    /// JSON file overriding the default capture config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Capture an HTML fragment file and save it as the certificate PNG
    Render {
        html: PathBuf,
        #[arg(long, default_value_t = 400)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
        /// Directory the certificate is saved into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Page URL the fragment belongs to (resolves relative images)
        #[arg(long)]
        base_url: Option<String>,
        /// Pretend the platform has a native share sheet
        #[arg(long)]
        native_share: bool,
    },
    /// Show the share payload a data URL file converts to
    Inspect { data_url: PathBuf },
    /// Query the product catalog (credentials from NAVER_CLIENT_ID / NAVER_CLIENT_SECRET)
    #[cfg(feature = "http")]
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        display: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CaptureConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CaptureConfig::default(),
    };

    match cli.cmd {
        Cmd::Render { html, width, height, out_dir, base_url, native_share } => {
            let markup = std::fs::read_to_string(&html)
                .with_context(|| format!("reading {}", html.display()))?;
            let mut target = CaptureTarget::new(markup, width, height);
            if let Some(base) = base_url {
                target = target.with_base_url(base.parse::<url::Url>().context("parsing --base-url")?);
            }

            let view = CertificateView::new(target, &config);
            #[cfg(feature = "http")]
            let view = {
                let loader = certshot::platform::HttpResourceLoader::new(config.timeout() * 10)
                    .map_err(anyhow::Error::msg)?;
                view.with_producer(SvgSnapshotProducer::new(&config).with_loader(loader))
            };

            render(view, &out_dir, native_share).await?;
        }
        Cmd::Inspect { data_url } => {
            let raw = std::fs::read_to_string(&data_url)
                .with_context(|| format!("reading {}", data_url.display()))?;
            match to_share_payload(&raw, &PayloadNaming::from(&config))? {
                Some(p) => println!("{} ({}, {} bytes)", p.name, p.mime, p.len()),
                None => println!("no payload"),
            }
        }
        #[cfg(feature = "http")]
        Cmd::Search { query, display } => {
            let client = certshot::search::ProductSearchClient::new(
                certshot::search::SearchConfig::from_env(),
            )?;
            let display = display.to_string();
            let res = client
                .get_products(&[("query", query.as_str()), ("display", display.as_str())])
                .await?;
            println!("{}", serde_json::to_string_pretty(&res)?);
        }
    }
    Ok(())
}

/// Download the certificate and run every share action it offers
async fn render(
    mut view: CertificateView,
    out_dir: &Path,
    native_share: bool,
) -> certshot::Result<()> {
    let platform = RecordingPlatform::new(native_share);
    let outcome = view.download(&DirectorySaver::new(out_dir), &platform).await?;
    println!("{:?}", outcome);

    for target in view.share().actions() {
        view.share().perform(target, &platform)?;
    }
    for event in platform.events() {
        println!("share: {:?}", event);
    }
    Ok(())
}
