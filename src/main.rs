use anyhow::Result;
use catalog_probe::utils::logging;
use catalog_probe::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（第一个参数可指定模式: check / analyze）
    let mode_arg = std::env::args().nth(1);
    let config = Config::load(mode_arg.as_deref())?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    app.run().await?;

    Ok(())
}
