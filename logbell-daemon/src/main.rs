use anyhow::Result;
use clap::Parser;

use logbell_daemon::app;
use logbell_daemon::cli::DaemonCli;
use logbell_daemon::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 설정 에러는 로깅 초기화 전이므로 anyhow 에러 체인으로 stderr에 출력됨
    let config = app::load_config(&cli).await?;

    if cli.validate {
        println!("{}", app::describe_config(&config));
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        config = %cli.config.display(),
        log_file = %config.log_file,
        filters = config.enabled_filter_count(),
        "logbell starting"
    );

    let summary = app::run(config).await?;

    tracing::info!(
        total_delivered = summary.total_delivered,
        undelivered = summary.undelivered,
        "logbell shut down"
    );
    Ok(())
}
