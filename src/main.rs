use dotenv::dotenv;
use log::{LevelFilter, info};
use result_scraper::{
    ResultFetcher,
    config::{PortalConfig, ServerConfig},
    server::{AppState, create_router},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let server_config = ServerConfig::new()?;
    let portal_config = PortalConfig::default();
    info!(
        "scraping results from {} via {}",
        portal_config.result_url, portal_config.login_url
    );

    let fetcher = ResultFetcher::new(portal_config)?;
    let app = create_router(AppState::new(fetcher));

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr).await?;
    info!("listening on http://{}", server_config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
