// ==========================================
// 登山队审议会议排程系统 - 主入口
// ==========================================
// 用途: 薄运行器——读入 JSON 输入,执行排程,打印汇总 JSON
// 说明: 参数解析属外部协作者,此处仅取两个位置参数:
//       <输入.json> [配置.json]
// ==========================================

use std::sync::Arc;

use expedition_review_scheduler::{
    logging, AppConfig, GoodLpSolver, RawInput, ScheduleOrchestrator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", expedition_review_scheduler::APP_NAME);
    tracing::info!("系统版本: {}", expedition_review_scheduler::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next() else {
        eprintln!("用法: expedition-review-scheduler <输入.json> [配置.json]");
        std::process::exit(2);
    };

    let config = match args.next() {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };

    let raw = std::fs::read_to_string(&input_path)?;
    let input: RawInput = serde_json::from_str(&raw)?;

    let orchestrator = ScheduleOrchestrator::new(Arc::new(config), GoodLpSolver::new());
    let now = chrono::Local::now().naive_local();

    match orchestrator.run(&input, now).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(err) => {
            tracing::error!("排程失败: {err}");
            eprintln!("[ERROR] {err}");
            std::process::exit(1);
        }
    }
}
