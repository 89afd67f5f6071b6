use bikeshare::config::AppConfig;
use bikeshare::data::loader::LoadOptions;
use bikeshare::session;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = AppConfig::parse();
    let table = config.city_table()?;

    if config.city.is_some() {
        session::run_once(&config, &table)
    } else {
        session::run_interactive(&table, LoadOptions { strict: config.strict })
    }
}
