//! imuse-probe - iMUS 音频资源探测工具
//!
//! 打开 iMUS 资源文件, 输出格式参数、区域/跳转/同步标记表,
//! 可选地按 hook 展示跳转路由或执行一次区域数据读取.

mod logging;
mod report;

use std::path::Path;
use std::process;

use clap::Parser;
use tracing::info;

use imuse_format::{
    DirectoryBundle, RawSliceDecoder, RefCountLocker, SoundManager, SoundManagerConfig,
};

use report::{ReadRequest, build_report, parse_read_request, render_text};

/// iMUS 音频资源探测工具
#[derive(Parser, Debug)]
#[command(name = "imuse-probe", version, about = "iMUS 音频资源探测工具")]
struct Cli {
    /// 输入文件路径
    input: Option<String>,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 展示指定 hook 下每个区域的跳转去向
    #[arg(long)]
    hook: Option<u32>,

    /// 读取区域数据 (REGION:OFFSET:SIZE)
    #[arg(long, value_parser = parse_read_request)]
    read: Option<ReadRequest>,

    /// 管理器配置文件 (JSON)
    #[arg(long)]
    config: Option<String>,

    /// 日志目录
    #[arg(long, default_value = "logs")]
    log_dir: String,

    /// 日志级别 (-v 详细, -vv 全部)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(&cli.log_dir, "imuse-probe", cli.verbose) {
        eprintln!("警告: 日志初始化失败: {e}");
    }

    let Some(input_path) = cli.input.as_deref() else {
        print_banner();
        return;
    };

    let config = match &cli.config {
        Some(path) => match SoundManagerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("错误: 无法加载配置 '{path}': {e}");
                process::exit(1);
            }
        },
        None => SoundManagerConfig::default(),
    };

    let path = Path::new(input_path);
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        eprintln!("错误: 无效的输入路径 '{input_path}'");
        process::exit(1);
    };
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut manager = match SoundManager::new(
        &config,
        Box::new(DirectoryBundle::new(root)),
        Box::new(RefCountLocker::new()),
        Box::new(RawSliceDecoder),
    ) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("错误: 无法创建音频管理器: {e}");
            process::exit(1);
        }
    };

    info!("探测 {} (槽位容量 {})", input_path, config.max_sounds);
    let handle = match manager.open_sound(0, file_name, 1, 0, 0) {
        Ok(Some(h)) => h,
        Ok(None) => {
            eprintln!("错误: 文件不存在 '{input_path}'");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("错误: 无法解析文件 '{input_path}': {e}");
            process::exit(1);
        }
    };

    let report = match build_report(&mut manager, handle, input_path, cli.hook, cli.read) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("错误: {e}");
            process::exit(1);
        }
    };
    manager.close_sound(handle);
    info!(
        "{}: {} 个区域, {} 个跳转",
        input_path,
        report.regions.len(),
        report.jumps.len()
    );

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("错误: JSON 序列化失败: {e}");
                process::exit(1);
            }
        }
    } else {
        print!("{}", render_text(&report));
    }
}

fn print_banner() {
    println!(
        "imuse-probe 版本 {} -- iMUS 音频资源探测工具",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("用法: imuse-probe <文件> [--json] [--hook N] [--read REGION:OFFSET:SIZE]");
}
