use crate::{
    check_door, remaining_door, Error, OutcomeAggregator, OutcomeCategory, OutcomeTally,
    RecentLog, Result, Step, Trial, TrialSimulator,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 游戏模式
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    /// 一次性自动进行多轮
    Automatic,

    /// 自动进行一轮并分步展示
    Mechanical,

    /// 玩家自己选择
    Player,
}

/// 玩家模式下一轮游戏的各个阶段
#[derive(Debug, Serialize, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    /// 没有进行中的游戏
    Idle,

    /// 奖品已放好，等待玩家选择
    Choose {
        /// 奖品所在门序号
        prize: u32,
    },

    /// 主持人已揭示，等待玩家抉择
    Decide {
        /// 奖品所在门序号
        prize: u32,

        /// 玩家已经选择的门序号
        chosen: u32,

        /// 主持人打开的门序号
        revealed: u32,
    },

    /// 本轮结束
    End { outcome: PlayerOutcome },
}

impl Default for Stage {
    fn default() -> Self {
        Self::Idle
    }
}

impl Stage {
    pub fn is_end(&self) -> bool {
        matches!(self, Stage::End { .. })
    }
}

/// 玩家模式一轮的结果
#[derive(Debug, Serialize, Copy, Clone, Eq, PartialEq)]
pub struct PlayerOutcome {
    pub trial: Trial,
    pub category: OutcomeCategory,
}

/// 演示模式一轮的结果
#[derive(Debug, Serialize, Copy, Clone, Eq, PartialEq)]
pub struct MechanicalGame {
    pub trial: Trial,
    pub category: OutcomeCategory,
    pub steps: [Step; 4],
}

/// 自动模式的报告
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub struct AutomaticReport {
    /// 本次进行的轮数
    pub played: u64,

    /// 会话累计轮数
    pub total: u64,
}

impl fmt::Display for AutomaticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished playing {} games. {} total.",
            self.played, self.total
        )
    }
}

/// 会话中一次自动模式最多进行的轮数
pub const MAX_AUTOMATIC_GAMES: u64 = 1_000_000;

/// 解析用户输入的轮数，只接受非负整数
pub fn parse_amount(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidConfiguration(
            "amount of games is empty".to_string(),
        ));
    }
    trimmed.parse::<u64>().map_err(|_| {
        Error::InvalidConfiguration(format!("can accept only numbers, got {:?}", input))
    })
}

/// 一个玩家的会话：统计、日志以及玩家模式的状态
#[derive(Debug)]
pub struct Session {
    simulator: TrialSimulator,
    aggregator: OutcomeAggregator,
    log: RecentLog,
    stage: Stage,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_simulator(TrialSimulator::from_entropy())
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// 固定种子，结果可复现
    pub fn seeded(seed: u64) -> Self {
        Self::with_simulator(TrialSimulator::seeded(seed))
    }

    fn with_simulator(simulator: TrialSimulator) -> Self {
        Self {
            simulator,
            aggregator: OutcomeAggregator::new(),
            log: RecentLog::default(),
            stage: Stage::default(),
        }
    }

    /// 玩家模式当前阶段
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// 当前统计
    pub fn summary(&self) -> OutcomeTally {
        self.aggregator.snapshot()
    }

    /// 最近若干轮的日志
    pub fn log(&self) -> String {
        self.log.text()
    }

    // 记录并写日志
    fn finish(&mut self, trial: &Trial) -> OutcomeCategory {
        self.log.append(trial);
        self.aggregator.record(trial)
    }

    /// 自动模式：输入轮数，非法或超过上限的输入不会进行任何一轮
    pub fn play_automatic(&mut self, amount: &str) -> Result<AutomaticReport> {
        if matches!(self.stage, Stage::Choose { .. } | Stage::Decide { .. }) {
            return Err(Error::InvalidOperation);
        }
        let amount = parse_amount(amount)?;
        if amount > MAX_AUTOMATIC_GAMES {
            return Err(Error::InvalidConfiguration(format!(
                "at most {} games per request, got {}",
                MAX_AUTOMATIC_GAMES, amount
            )));
        }
        for _ in 0..amount {
            let trial = self.simulator.run_trial();
            self.finish(&trial);
        }
        let report = AutomaticReport {
            played: amount,
            total: self.aggregator.snapshot().games(),
        };
        tracing::debug!(%report, "automatic games finished");
        Ok(report)
    }

    /// 演示模式：立即完成一轮并记录，返回分步展示的数据
    pub fn play_mechanical(&mut self) -> Result<MechanicalGame> {
        if matches!(self.stage, Stage::Choose { .. } | Stage::Decide { .. }) {
            return Err(Error::InvalidOperation);
        }
        let trial = self.simulator.run_trial();
        let category = self.finish(&trial);
        Ok(MechanicalGame {
            trial,
            category,
            steps: trial.steps(),
        })
    }

    /// 玩家模式：开始一轮并随机放好奖品
    pub fn start_player(&mut self) -> Result<()> {
        match self.stage {
            Stage::Idle | Stage::End { .. } => {
                let prize = self.simulator.hide_prize();
                self.stage = Stage::Choose { prize };
                Ok(())
            }
            _ => Err(Error::InvalidOperation),
        }
    }

    /// 玩家做出第一次选择，返回主持人打开的门序号
    pub fn choose(&mut self, door: u32) -> Result<u32> {
        check_door(door)?;
        match self.stage {
            Stage::Choose { prize } => {
                let revealed = self.simulator.reveal(prize, door)?;
                self.stage = Stage::Decide {
                    prize,
                    chosen: door,
                    revealed,
                };
                Ok(revealed)
            }
            _ => Err(Error::InvalidOperation),
        }
    }

    /// 玩家做出最终抉择：可以坚持原来的门，也可以换到另一扇没打开的门
    pub fn decide(&mut self, door: u32) -> Result<PlayerOutcome> {
        check_door(door)?;
        match self.stage {
            Stage::Decide {
                prize,
                chosen,
                revealed,
            } => {
                let trial = Trial::decided(prize, chosen, revealed, door)?;
                let category = self.finish(&trial);
                let outcome = PlayerOutcome { trial, category };
                self.stage = Stage::End { outcome };
                Ok(outcome)
            }
            _ => Err(Error::InvalidOperation),
        }
    }

    /// 玩家模式下还能选择的门，依次为坚持和改变
    pub fn open_doors(&self) -> Option<[u32; 2]> {
        match self.stage {
            Stage::Decide {
                chosen, revealed, ..
            } => Some([chosen, remaining_door(chosen, revealed)]),
            _ => None,
        }
    }

    /// 清空统计和日志
    pub fn reset(&mut self) {
        self.aggregator.reset();
        self.log.clear();
        self.stage = Stage::Idle;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_amount_accepts_only_non_negative_integers() {
        assert_eq!(parse_amount("10"), Ok(10));
        assert_eq!(parse_amount(" 0 "), Ok(0));
        for bad in ["", "   ", "-3", "ten", "1.5", "1e3"] {
            assert!(
                matches!(parse_amount(bad), Err(Error::InvalidConfiguration(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn automatic_counts_and_logs() {
        let mut session = Session::seeded(1);
        let report = session.play_automatic("25").unwrap();
        assert_eq!(report, AutomaticReport { played: 25, total: 25 });
        let report = session.play_automatic("5").unwrap();
        assert_eq!(report.to_string(), "Finished playing 5 games. 30 total.");

        let summary = session.summary();
        assert_eq!(summary.games(), 30);
        // 自动模式总是改变选择
        assert_eq!(summary.wins_without_change() + summary.losses_without_change(), 0);
        assert_eq!(session.log().matches("Game number: ").count(), 30);
        assert!(session.log().contains("Game number: 30\n"));
    }

    #[test]
    fn automatic_rejects_bad_amount_without_playing() {
        let mut session = Session::seeded(2);
        assert!(matches!(
            session.play_automatic("abc"),
            Err(Error::InvalidConfiguration(_))
        ));
        assert_eq!(session.summary().games(), 0);
        assert!(session.log().is_empty());
    }

    #[test]
    fn mechanical_records_immediately() {
        let mut session = Session::seeded(3);
        let game = session.play_mechanical().unwrap();
        assert_eq!(session.summary().games(), 1);
        assert_eq!(game.category, OutcomeAggregator::classify(&game.trial));
        assert_eq!(
            game.steps[1],
            Step::GoatShown {
                door: game.trial.revealed()
            }
        );
    }

    #[test]
    fn player_game_walks_through_stages() {
        let mut session = Session::seeded(4);
        assert_eq!(session.stage(), &Stage::Idle);
        assert_eq!(session.choose(0), Err(Error::InvalidOperation));
        assert_eq!(session.decide(0).unwrap_err(), Error::InvalidOperation);

        session.start_player().unwrap();
        let prize = match session.stage() {
            Stage::Choose { prize } => *prize,
            stage => panic!("unexpected stage {:?}", stage),
        };
        assert_eq!(session.start_player(), Err(Error::InvalidOperation));
        assert_eq!(session.play_automatic("3").unwrap_err(), Error::InvalidOperation);
        assert_eq!(session.choose(3), Err(Error::InvalidDoorIndex));

        let revealed = session.choose(0).unwrap();
        assert_ne!(revealed, prize);
        assert_ne!(revealed, 0);
        let [stick, switch] = session.open_doors().unwrap();
        assert_eq!(stick, 0);
        assert_ne!(switch, revealed);

        // 不能选主持人打开的门
        assert_eq!(session.decide(revealed).unwrap_err(), Error::InvalidOperation);

        let outcome = session.decide(stick).unwrap();
        assert!(!outcome.trial.changed());
        let expected = if prize == 0 {
            OutcomeCategory::WinWithoutChange
        } else {
            OutcomeCategory::LossWithoutChange
        };
        assert_eq!(outcome.category, expected);
        assert!(session.stage().is_end());
        assert_eq!(session.summary().games(), 1);
        assert_eq!(session.summary().count(expected), 1);

        // 结束后可以再来一轮
        session.start_player().unwrap();
        session.choose(1).unwrap();
        let [_, switch] = session.open_doors().unwrap();
        let outcome = session.decide(switch).unwrap();
        assert!(outcome.trial.changed());
        assert_eq!(session.summary().games(), 2);
        assert!(session.log().contains("Game number: 2\n"));
    }

    #[test]
    fn automatic_amount_is_capped() {
        let mut session = Session::seeded(6);
        let too_many = (MAX_AUTOMATIC_GAMES + 1).to_string();
        assert!(matches!(
            session.play_automatic(&too_many),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            session.play_automatic("1000000000"),
            Err(Error::InvalidConfiguration(_))
        ));
        assert_eq!(session.summary().games(), 0);
        assert!(session.log().is_empty());
    }

    #[test]
    fn log_keeps_only_recent_games() {
        let mut session = Session::seeded(7);
        session.play_automatic("5000").unwrap();
        assert_eq!(session.summary().games(), 5000);

        let log = session.log();
        assert_eq!(
            log.matches("Game number: ").count(),
            RecentLog::DEFAULT_CAPACITY
        );
        assert!(log.starts_with("Game number: 4001\n"));
        assert!(log.contains("Game number: 5000\n"));
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = Session::seeded(5);
        session.play_automatic("10").unwrap();
        session.start_player().unwrap();
        session.reset();
        assert_eq!(session.summary(), OutcomeTally::default());
        assert!(session.log().is_empty());
        assert_eq!(session.stage(), &Stage::Idle);

        session.play_mechanical().unwrap();
        assert!(session.log().starts_with("Game number: 1\n"));
    }
}
