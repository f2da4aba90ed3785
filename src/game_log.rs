use crate::{Result, Trial};
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;

/// 日志中一轮游戏的记录
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    /// 第几轮，从 1 开始
    pub game: u64,
    pub trial: &'a Trial,
}

impl fmt::Display for LogRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trial = self.trial;
        let [a, b, c] = trial.partitions();
        let [g1, g2] = trial.goats();
        writeln!(f, "Game number: {}", self.game)?;
        writeln!(f, "partitions: {} {} {}", a.name(), b.name(), c.name())?;
        writeln!(f, "the car is behind partition number: {}", trial.prize())?;
        writeln!(
            f,
            "first choice: {}   index: {}",
            trial.content(trial.first_choice()).name(),
            trial.first_choice()
        )?;
        writeln!(f, "indices of goats partition: {} {}", g1, g2)?;
        writeln!(f, "index of exposed goat partition: {}", trial.revealed())?;
        writeln!(
            f,
            "second choice: {}  index of second choice: {}",
            trial.content(trial.second_choice()).name(),
            trial.second_choice()
        )?;
        writeln!(f)
    }
}

/// 只追加的游戏日志
#[derive(Debug)]
pub struct GameLog<W> {
    writer: W,
    games: u64,
}

impl<W: Write> GameLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, games: 0 }
    }

    /// 追加一轮游戏，返回它的序号
    pub fn append(&mut self, trial: &Trial) -> Result<u64> {
        let record = LogRecord {
            game: self.games + 1,
            trial,
        };
        write!(self.writer, "{}", record)?;
        self.games = record.game;
        Ok(self.games)
    }

    /// 已经记录的轮数
    pub fn games(&self) -> u64 {
        self.games
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// 内存中的日志，只保留最近 `capacity` 轮，读取时才格式化
#[derive(Debug, Clone)]
pub struct RecentLog {
    records: VecDeque<(u64, Trial)>,
    capacity: usize,
    games: u64,
}

impl RecentLog {
    /// 会话默认保留的轮数
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity,
            games: 0,
        }
    }

    /// 追加一轮游戏，返回它的序号
    pub fn append(&mut self, trial: &Trial) -> u64 {
        self.games += 1;
        if self.capacity == 0 {
            return self.games;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back((self.games, *trial));
        self.games
    }

    /// 已经记录的轮数，包括已被丢弃的
    pub fn games(&self) -> u64 {
        self.games
    }

    /// 当前保留的轮数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn text(&self) -> String {
        self.records
            .iter()
            .map(|(game, trial)| LogRecord { game: *game, trial }.to_string())
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.games = 0;
    }
}

impl Default for RecentLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
