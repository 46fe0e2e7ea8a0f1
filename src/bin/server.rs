//! algotrace 服务器入口
//!
//! 启动 HTTP API 服务器

use algotrace::server::{start_server, ServerConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "algotrace-server")]
#[command(about = "algotrace HTTP API 服务器")]
struct Args {
    /// 监听地址
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// 监听端口
    #[arg(short, long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("algotrace=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    info!(version = algotrace::VERSION, "algotrace 图算法演示服务");

    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };

    start_server(config).await?;

    Ok(())
}
