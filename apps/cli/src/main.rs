use aflow::Pipeline;
use aflow::domain::PipelineConfig;
use aflow::kernel::config::load_config;
use aflow_cli::args::Cli;
use aflow_logger::Logger;
use anyhow::Context;
use clap::Parser;

#[aflow_runtime::main(current_thread)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger = Logger::builder().name("aflow").level(cli.log_level());
    if let Some(file) = cli.log_file() {
        logger = logger.file(file);
    }
    let _log = logger.init()?;

    let config: PipelineConfig =
        load_config(cli.config.as_deref()).context("Critical: Configuration is malformed")?;

    let pipeline = Pipeline::builder().config(config).build().await?;

    aflow_cli::run(&pipeline, cli.command, cli.mode()).await
}
