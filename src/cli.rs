use anyhow::Context;
use clap::Parser;
use montyhall::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// 三门问题批量模拟
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// 游戏轮数
    #[arg(value_parser = parse_amount)]
    amount: u64,

    /// 线程数
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// 随机种子，指定后结果可复现
    #[arg(short, long)]
    seed: Option<u64>,

    /// 挑战者策略
    #[arg(long, value_enum, default_value_t = Strategy::Switch)]
    strategy: Strategy,

    /// 把每一轮写进日志文件（只用一个线程）
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// 输出饼图数据
    #[arg(long)]
    chart: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // 游戏设置
    let settings = Settings {
        games: args.amount,
        workers: args.workers,
        seed: args.seed,
        strategy: args.strategy,
    };

    let tally = match &args.log {
        Some(path) => {
            if settings.workers > 1 {
                tracing::warn!(workers = settings.workers, "logging runs on one thread");
            }
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            let (tally, _) = simulate_logged(&settings, BufWriter::new(file))?;
            tracing::info!(path = %path.display(), "game log written");
            tally
        }
        None => simulate(&settings),
    };

    println!("{}", tally);

    if let Some(rate) = tally.switch_win_rate() {
        println!("win rate with choice change: {:.2}%", rate * 100.0);
    }
    if let Some(rate) = tally.stick_win_rate() {
        println!("win rate without choice change: {:.2}%", rate * 100.0);
    }

    if args.chart {
        for slice in tally.slices() {
            println!(
                "{:<22} {:>6} {:>10} {:>6.1}%",
                slice.label, slice.color, slice.count, slice.percent
            );
        }
    }

    Ok(())
}
