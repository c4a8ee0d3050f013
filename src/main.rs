use clap::Parser;

use luggage_match::Opts;
use luggage_match::cli::SubCommandExtend;
use luggage_match::config::SubCommand;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let opts = Opts::parse();

    match &opts.subcmd {
        SubCommand::Build(config) => config.run(&opts).await,
        SubCommand::Search(config) => config.run(&opts).await,
        SubCommand::Server(config) => config.run(&opts).await,
        SubCommand::Article(config) => config.run(&opts).await,
        SubCommand::Image(config) => config.run(&opts).await,
        SubCommand::Meta(config) => config.run(&opts).await,
        SubCommand::Settings(config) => config.run(&opts).await,
    }
}
