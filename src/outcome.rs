use crate::Trial;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// 一轮游戏结果的四种分类，互斥且完备
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OutcomeCategory {
    /// 改变选择后赢得奖品
    WinWithChange,

    /// 改变选择后失去奖品
    LossWithChange,

    /// 坚持选择赢得奖品
    WinWithoutChange,

    /// 坚持选择未赢得奖品
    LossWithoutChange,
}

impl OutcomeCategory {
    pub const ALL: [OutcomeCategory; 4] = [
        OutcomeCategory::WinWithChange,
        OutcomeCategory::LossWithChange,
        OutcomeCategory::WinWithoutChange,
        OutcomeCategory::LossWithoutChange,
    ];

    /// 饼图标签
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeCategory::WinWithChange => "Wins with change",
            OutcomeCategory::LossWithChange => "Losses with change",
            OutcomeCategory::WinWithoutChange => "Wins without change",
            OutcomeCategory::LossWithoutChange => "Losses without change",
        }
    }

    /// 饼图颜色
    pub fn color(&self) -> &'static str {
        match self {
            OutcomeCategory::WinWithChange => "red",
            OutcomeCategory::LossWithChange => "yellow",
            OutcomeCategory::WinWithoutChange => "green",
            OutcomeCategory::LossWithoutChange => "blue",
        }
    }

    /// 给玩家看的结果
    pub fn message(&self) -> &'static str {
        match self {
            OutcomeCategory::WinWithChange => "You changed your choice and WON THE CAR !!!",
            OutcomeCategory::LossWithChange => "You changed your choice and LOST THE CAR !!!",
            OutcomeCategory::WinWithoutChange => "You didn't change your choice and WON THE CAR !!!",
            OutcomeCategory::LossWithoutChange => "You didn't change your choice and LOST THE CAR !!!",
        }
    }
}

/// 结果统计，`games` 始终等于四个计数之和
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Default, Eq, PartialEq)]
pub struct OutcomeTally {
    games: u64,
    wins_with_change: u64,
    losses_with_change: u64,
    wins_without_change: u64,
    losses_without_change: u64,
}

impl OutcomeTally {
    /// 游戏轮数
    pub fn games(&self) -> u64 {
        self.games
    }

    /// 改变选择后赢的轮数
    pub fn wins_with_change(&self) -> u64 {
        self.wins_with_change
    }

    /// 改变选择后输的轮数
    pub fn losses_with_change(&self) -> u64 {
        self.losses_with_change
    }

    /// 坚持选择赢的轮数
    pub fn wins_without_change(&self) -> u64 {
        self.wins_without_change
    }

    /// 坚持选择输的轮数
    pub fn losses_without_change(&self) -> u64 {
        self.losses_without_change
    }

    pub fn count(&self, category: OutcomeCategory) -> u64 {
        match category {
            OutcomeCategory::WinWithChange => self.wins_with_change,
            OutcomeCategory::LossWithChange => self.losses_with_change,
            OutcomeCategory::WinWithoutChange => self.wins_without_change,
            OutcomeCategory::LossWithoutChange => self.losses_without_change,
        }
    }

    fn count_mut(&mut self, category: OutcomeCategory) -> &mut u64 {
        match category {
            OutcomeCategory::WinWithChange => &mut self.wins_with_change,
            OutcomeCategory::LossWithChange => &mut self.losses_with_change,
            OutcomeCategory::WinWithoutChange => &mut self.wins_without_change,
            OutcomeCategory::LossWithoutChange => &mut self.losses_without_change,
        }
    }

    /// 改变选择的胜率，没有改变过选择时为 `None`
    pub fn switch_win_rate(&self) -> Option<f64> {
        ratio(
            self.wins_with_change,
            self.wins_with_change + self.losses_with_change,
        )
    }

    /// 坚持选择的胜率，没有坚持过选择时为 `None`
    pub fn stick_win_rate(&self) -> Option<f64> {
        ratio(
            self.wins_without_change,
            self.wins_without_change + self.losses_without_change,
        )
    }

    /// 饼图数据，只包含非零的分类
    pub fn slices(&self) -> Vec<Slice> {
        OutcomeCategory::ALL
            .iter()
            .filter_map(|&category| {
                let count = self.count(category);
                (count > 0).then(|| Slice {
                    category,
                    label: category.label(),
                    color: category.color(),
                    count,
                    percent: count as f64 * 100.0 / self.games as f64,
                })
            })
            .collect()
    }
}

fn ratio(part: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| part as f64 / total as f64)
}

impl AddAssign for OutcomeTally {
    fn add_assign(&mut self, rhs: Self) {
        self.games += rhs.games;
        self.wins_with_change += rhs.wins_with_change;
        self.losses_with_change += rhs.losses_with_change;
        self.wins_without_change += rhs.wins_without_change;
        self.losses_without_change += rhs.losses_without_change;
    }
}

impl Add for OutcomeTally {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sum for OutcomeTally {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |a, b| a + b)
    }
}

impl fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "number of games: {}", grouped(self.games))?;
        writeln!(
            f,
            "number of wins because of choice change: {}",
            grouped(self.wins_with_change)
        )?;
        writeln!(
            f,
            "number of losses because of choice change: {}",
            grouped(self.losses_with_change)
        )?;
        writeln!(
            f,
            "number of wins without the choice change: {}",
            grouped(self.wins_without_change)
        )?;
        write!(
            f,
            "number of losses without the choice change: {}",
            grouped(self.losses_without_change)
        )
    }
}

// 每三位加一个逗号：1234567 -> 1,234,567
fn grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// 饼图中的一块
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Slice {
    pub category: OutcomeCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub count: u64,
    pub percent: f64,
}

/// 结果统计器
#[derive(Debug, Default, Clone)]
pub struct OutcomeAggregator {
    tally: OutcomeTally,
}

impl OutcomeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 对一轮游戏分类
    pub fn classify(trial: &Trial) -> OutcomeCategory {
        let (prize, first, second) = (trial.prize(), trial.first_choice(), trial.second_choice());
        if second == prize && first != second {
            OutcomeCategory::WinWithChange
        } else if first == prize && first != second {
            OutcomeCategory::LossWithChange
        } else if second == prize && first == second {
            OutcomeCategory::WinWithoutChange
        } else {
            OutcomeCategory::LossWithoutChange
        }
    }

    /// 记录一轮游戏，不做去重
    pub fn record(&mut self, trial: &Trial) -> OutcomeCategory {
        let category = Self::classify(trial);
        *self.tally.count_mut(category) += 1;
        self.tally.games += 1;
        category
    }

    /// 合并其他统计器（比如其他线程）的结果
    pub fn merge(&mut self, tally: OutcomeTally) {
        self.tally += tally;
    }

    pub fn reset(&mut self) {
        self.tally = OutcomeTally::default();
    }

    /// 当前统计的拷贝
    pub fn snapshot(&self) -> OutcomeTally {
        self.tally
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Decision, TrialSimulator, DOORS};
    use rand::Rng;

    fn all_trials() -> Vec<Trial> {
        let mut trials = vec![];
        for prize in 0..DOORS {
            for first in 0..DOORS {
                for revealed in 0..DOORS {
                    for second in 0..DOORS {
                        if let Ok(trial) = Trial::decided(prize, first, revealed, second) {
                            trials.push(trial);
                        }
                    }
                }
            }
        }
        trials
    }

    #[test]
    fn classify_is_exclusive_and_exhaustive() {
        for trial in all_trials() {
            let matching = [
                trial.won() && trial.changed(),
                trial.first_choice() == trial.prize() && trial.changed(),
                trial.won() && !trial.changed(),
                !trial.won() && !trial.changed(),
            ];
            assert_eq!(matching.iter().filter(|&&m| m).count(), 1, "{:?}", trial);
            let category = OutcomeAggregator::classify(&trial);
            let index = OutcomeCategory::ALL.iter().position(|&c| c == category).unwrap();
            assert!(matching[index], "{:?} -> {:?}", trial, category);
        }
    }

    #[test]
    fn switching_away_from_prize_loses() {
        let trial = Trial::decided(1, 1, 0, 2).unwrap();
        assert_eq!(OutcomeAggregator::classify(&trial), OutcomeCategory::LossWithChange);

        let mut simulator = TrialSimulator::seeded(9);
        for _ in 0..100 {
            let trial = simulator.run_trial_from(1, 1).unwrap();
            assert_eq!(OutcomeAggregator::classify(&trial), OutcomeCategory::LossWithChange);
        }
    }

    #[test]
    fn switching_to_prize_wins() {
        let mut simulator = TrialSimulator::seeded(10);
        let trial = simulator.run_trial_from(2, 0).unwrap();
        assert_eq!(OutcomeAggregator::classify(&trial), OutcomeCategory::WinWithChange);
    }

    #[test]
    fn record_and_reset() {
        let mut simulator = TrialSimulator::seeded(11);
        let mut aggregator = OutcomeAggregator::new();
        for _ in 0..1234 {
            let trial = simulator.run_trial();
            aggregator.record(&trial);
        }
        let tally = aggregator.snapshot();
        assert_eq!(tally.games(), 1234);
        assert_eq!(
            OutcomeCategory::ALL.iter().map(|&c| tally.count(c)).sum::<u64>(),
            1234
        );

        // 同一轮记录两次会计两次
        let trial = simulator.run_trial();
        aggregator.record(&trial);
        aggregator.record(&trial);
        assert_eq!(aggregator.snapshot().games(), 1236);

        aggregator.reset();
        assert_eq!(aggregator.snapshot(), OutcomeTally::default());
        assert_eq!(aggregator.snapshot().games(), 0);
    }

    #[test]
    fn switch_wins_two_thirds_stick_wins_one_third() {
        let mut simulator = TrialSimulator::seeded(12);
        let mut aggregator = OutcomeAggregator::new();
        for _ in 0..100000 {
            let decision = simulator.rng_mut().gen::<Decision>();
            aggregator.record(&simulator.run_trial_deciding(decision));
        }
        let tally = aggregator.snapshot();
        let switch = tally.switch_win_rate().unwrap();
        let stick = tally.stick_win_rate().unwrap();
        assert!((switch - 2.0 / 3.0).abs() < 0.01, "switch = {}", switch);
        assert!((stick - 1.0 / 3.0).abs() < 0.01, "stick = {}", stick);
    }

    #[test]
    fn merged_partitions_equal_single_tally() {
        let mut simulator = TrialSimulator::seeded(13);
        let trials: Vec<Trial> = (0..500)
            .map(|i| simulator.run_trial_deciding(if i % 3 == 0 { Decision::Stick } else { Decision::Switch }))
            .collect();

        let mut whole = OutcomeAggregator::new();
        trials.iter().for_each(|t| {
            whole.record(t);
        });

        for split in [0, 1, 17, 250, 499, 500] {
            let mut left = OutcomeAggregator::new();
            let mut right = OutcomeAggregator::new();
            trials[..split].iter().for_each(|t| {
                left.record(t);
            });
            trials[split..].iter().for_each(|t| {
                right.record(t);
            });
            assert_eq!(left.snapshot() + right.snapshot(), whole.snapshot());
            assert_eq!(right.snapshot() + left.snapshot(), whole.snapshot());

            let mut merged = OutcomeAggregator::new();
            merged.merge(left.snapshot());
            merged.merge(right.snapshot());
            assert_eq!(merged.snapshot(), whole.snapshot());
        }
    }

    #[test]
    fn summary_text() {
        let mut aggregator = OutcomeAggregator::new();
        for _ in 0..1500 {
            aggregator.record(&Trial::decided(2, 0, 1, 2).unwrap());
        }
        aggregator.record(&Trial::decided(0, 0, 1, 0).unwrap());
        let text = aggregator.snapshot().to_string();
        assert_eq!(
            text,
            "number of games: 1,501\n\
             number of wins because of choice change: 1,500\n\
             number of losses because of choice change: 0\n\
             number of wins without the choice change: 1\n\
             number of losses without the choice change: 0"
        );
    }

    #[test]
    fn grouped_digits() {
        assert_eq!(grouped(0), "0");
        assert_eq!(grouped(999), "999");
        assert_eq!(grouped(1000), "1,000");
        assert_eq!(grouped(1234567), "1,234,567");
    }

    #[test]
    fn slices_skip_empty_categories() {
        assert!(OutcomeTally::default().slices().is_empty());

        let mut aggregator = OutcomeAggregator::new();
        aggregator.record(&Trial::decided(2, 0, 1, 2).unwrap());
        aggregator.record(&Trial::decided(2, 0, 1, 2).unwrap());
        aggregator.record(&Trial::decided(2, 0, 1, 2).unwrap());
        aggregator.record(&Trial::decided(0, 1, 2, 1).unwrap());
        let slices = aggregator.snapshot().slices();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].category, OutcomeCategory::WinWithChange);
        assert_eq!(slices[0].color, "red");
        assert_eq!(slices[0].count, 3);
        assert!((slices[0].percent - 75.0).abs() < 1e-9);
        assert_eq!(slices[1].label, "Losses without change");
        assert!((slices[1].percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn rates_without_games() {
        let tally = OutcomeTally::default();
        assert_eq!(tally.switch_win_rate(), None);
        assert_eq!(tally.stick_win_rate(), None);
    }
}
