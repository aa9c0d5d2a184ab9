use log::error;
use readcraft::{cli::parse_args, run_cli};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args = parse_args();
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    let code = match run_cli(args).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            1
        }
    };
    std::process::exit(code);
}
