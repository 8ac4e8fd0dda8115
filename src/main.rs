use fight_sync::app::run;
use fight_sync::config::Config;
use fight_sync::error::Result;
use fight_sync::logging::init;

#[tokio::main]
async fn main() -> Result<()> {
    init();

    let config = Config::from_env()?;

    run(config).await
}
