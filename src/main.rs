// ==========================================
// 公交轮班调度系统 - 主入口
// ==========================================
// 用法:
//   transit-rotation                              守护进程: 每日定时生成，Ctrl-C 退出
//   transit-rotation generate [--force] [DATE]    一次性生成（DATE 默认今天，格式 YYYY-MM-DD）
// 环境变量:
//   TRANSIT_ROTATION_DB_PATH  数据库路径
//   RUST_LOG                  日志级别
//   TRANSIT_ROTATION_LOG_FORMAT=json  输出 JSON 日志
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use transit_rotation::app::{get_default_db_path, spawn_daily_trigger, AppState};
use transit_rotation::db::{now_local, DATE_FMT};
use transit_rotation::logging;

/// 命令行参数
#[derive(Debug, PartialEq)]
enum Command {
    Serve,
    Generate {
        date: Option<NaiveDate>,
        force: bool,
    },
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Serve);
    };

    match first.as_str() {
        "serve" => Ok(Command::Serve),
        "generate" => {
            let mut force = false;
            let mut date = None;
            for arg in &args[1..] {
                if arg == "--force" {
                    force = true;
                } else if date.is_none() {
                    date = Some(
                        NaiveDate::parse_from_str(arg, DATE_FMT)
                            .with_context(|| format!("日期格式应为 YYYY-MM-DD: {}", arg))?,
                    );
                } else {
                    bail!("多余的参数: {}", arg);
                }
            }
            Ok(Command::Generate { date, force })
        }
        other => Err(anyhow!("未知命令: {}（可用: serve, generate）", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    match std::env::var("TRANSIT_ROTATION_LOG_FORMAT").as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let db_path = get_default_db_path();
    tracing::info!("==================================================");
    tracing::info!("{} v{}", transit_rotation::APP_NAME, transit_rotation::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command {
        Command::Serve => {
            let trigger = spawn_daily_trigger(state.schedule_api.clone(), state.config_reader.clone());
            tokio::signal::ctrl_c()
                .await
                .context("无法监听 Ctrl-C 信号")?;
            tracing::info!("收到退出信号，停止定时任务");
            trigger.abort();
        }
        Command::Generate { date, force } => {
            let date = date.unwrap_or_else(|| now_local().date());
            let outcome = state
                .schedule_api
                .generate_schedule(date, force, Some("cli"))
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
