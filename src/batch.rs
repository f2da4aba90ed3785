use crate::{Decision, GameLog, OutcomeAggregator, OutcomeTally, Result, TrialSimulator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::thread;

/// 挑战者的策略
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Default, clap::ValueEnum)]
pub enum Strategy {
    /// 总是改变选择
    #[default]
    Switch,

    /// 总是坚持选择
    Stick,

    /// 每轮随机决定
    Random,
}

impl Strategy {
    fn decide<R: Rng + ?Sized>(&self, rng: &mut R) -> Decision {
        match self {
            Strategy::Switch => Decision::Switch,
            Strategy::Stick => Decision::Stick,
            Strategy::Random => rng.gen(),
        }
    }
}

/// 批量模拟设置
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub struct Settings {
    /// 轮数
    pub games: u64,

    /// 线程数
    pub workers: usize,

    /// 随机种子，每个线程使用 `seed + 线程序号`
    pub seed: Option<u64>,

    pub strategy: Strategy,
}

impl Settings {
    pub fn new(games: u64) -> Self {
        Self {
            games,
            workers: 1,
            seed: None,
            strategy: Strategy::default(),
        }
    }
}

fn worker_rng(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_entropy(),
    }
}

fn run(simulator: &mut TrialSimulator, games: u64, strategy: Strategy) -> OutcomeTally {
    let mut aggregator = OutcomeAggregator::new();
    for _ in 0..games {
        let decision = strategy.decide(simulator.rng_mut());
        aggregator.record(&simulator.run_trial_deciding(decision));
    }
    aggregator.snapshot()
}

/// 批量模拟，每个线程独立的随机源，最后把各线程的统计相加
pub fn simulate(settings: &Settings) -> OutcomeTally {
    let workers = settings.workers.max(1) as u64;
    let per_worker = settings.games / workers;
    let extra = settings.games % workers;

    tracing::debug!(
        games = settings.games,
        workers,
        seed = ?settings.seed,
        strategy = ?settings.strategy,
        "simulating"
    );

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|index| {
                let games = per_worker + u64::from(index < extra);
                let rng = worker_rng(settings.seed, index as usize);
                let strategy = settings.strategy;
                scope.spawn(move || run(&mut TrialSimulator::new(rng), games, strategy))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(tally) => tally,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .sum()
    })
}

/// 单线程批量模拟，每一轮都写进日志
pub fn simulate_logged<W: Write>(settings: &Settings, writer: W) -> Result<(OutcomeTally, W)> {
    let mut simulator = TrialSimulator::new(worker_rng(settings.seed, 0));
    let mut aggregator = OutcomeAggregator::new();
    let mut log = GameLog::new(writer);
    for _ in 0..settings.games {
        let decision = settings.strategy.decide(simulator.rng_mut());
        let trial = simulator.run_trial_deciding(decision);
        log.append(&trial)?;
        aggregator.record(&trial);
    }
    log.flush()?;
    Ok((aggregator.snapshot(), log.into_inner()))
}
