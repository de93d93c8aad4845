use std::path::PathBuf;

use anyhow::Result;
use paper_critique::utils::logging;
use paper_critique::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(&config.log_level);

    let config = config.validate()?;

    // 第一个参数可以指定单个文件或目录
    let input = std::env::args().nth(1).map(PathBuf::from);

    // 初始化并运行应用
    App::initialize(config)?.run(input).await?;

    Ok(())
}
