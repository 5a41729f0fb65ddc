//! 비율 수집기 CLI.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ratio_collector::{Collector, CollectorConfig, RunOptions};
use ratio_core::{init_logging, LogConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "ratio-collector")]
#[command(about = "Premium/discount ratio collector with Google Sheets ledger")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (기본값: LOG_LEVEL 또는 info)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 수집 1회 실행 후 JSON 출력
    Run {
        /// 원장 기록 생략
        #[arg(long)]
        dry: bool,

        /// 수집한 로그를 출력에 포함
        #[arg(long)]
        verbose: bool,
    },

    /// HTTP 서버 실행 (API_HOST:API_PORT)
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 설정도 .env를 읽도록 먼저 로드
    dotenvy::dotenv().ok();

    let mut log_config = LogConfig::from_env();
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let config = CollectorConfig::from_env()?;
    let server_address = config.server.address();
    let collector = Collector::new(config)?;

    match cli.command {
        Commands::Run { dry, verbose } => {
            let response = collector.invoke(RunOptions { dry, verbose }).await;
            println!("{}", response.to_pretty_json());
            if !response.is_ok() {
                std::process::exit(1);
            }
        }
        Commands::Serve => {
            let addr: SocketAddr = server_address
                .parse()
                .with_context(|| format!("잘못된 서버 주소: {}", server_address))?;
            info!(%addr, "Ratio collector 서버 시작");
            ratio_collector::serve(Arc::new(collector), addr).await?;
        }
    }

    Ok(())
}
