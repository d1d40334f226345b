// ==========================================
// 公交轮班调度系统 - 日志
// ==========================================
// 守护进程与一次性生成命令共用，级别由 RUST_LOG 控制
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// RUST_LOG 未设置或无法解析时的级别
const DEFAULT_LEVEL: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// 文本日志，输出到终端
///
/// 排查排班问题时常用 `RUST_LOG=transit_rotation::engine=debug`，
/// 可看到每条线路的资源分配与跳过原因。
///
/// ```no_run
/// transit_rotation::logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// JSON 日志，每行一条事件，供 `serve` 模式接入日志采集
pub fn init_json() {
    fmt()
        .json()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 测试用: 输出交给 libtest 捕获，重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
