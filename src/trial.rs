use crate::{check_door, random_door, remaining_door, Error, Result, DOORS};
use rand::distributions::Standard;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// 挑战者最终抉择
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum Decision {
    /// 改变选择
    Switch,

    /// 坚持选择
    Stick,
}

impl Default for Decision {
    fn default() -> Self {
        Self::Switch
    }
}

impl Distribution<Decision> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Decision {
        if rng.gen::<bool>() {
            Decision::Switch
        } else {
            Decision::Stick
        }
    }
}

/// 门后的东西
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum DoorContent {
    Car,
    Goat,
}

impl DoorContent {
    pub fn name(&self) -> &'static str {
        match self {
            DoorContent::Car => "car",
            DoorContent::Goat => "goat",
        }
    }
}

/// 一轮结束后每个门上显示的标签
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum DoorLabel {
    FirstChoice,
    ShownGoat,
    SecondChoice,
    Car,
    NotChosen,
}

impl DoorLabel {
    pub fn text(&self) -> &'static str {
        match self {
            DoorLabel::FirstChoice => "First Choice",
            DoorLabel::ShownGoat => "Shown Goat",
            DoorLabel::SecondChoice => "Second Choice",
            DoorLabel::Car => "Car",
            DoorLabel::NotChosen => "Not chosen",
        }
    }
}

/// 演示模式下一轮游戏依次展示的步骤，节奏由前端决定
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
#[serde(tag = "step")]
pub enum Step {
    /// 高亮第一次选择
    FirstChoice { door: u32 },

    /// 主持人打开一扇有山羊的门
    GoatShown { door: u32 },

    /// 高亮第二次选择
    SecondChoice { door: u32 },

    /// 打开所有门
    Final {
        partitions: [DoorContent; DOORS as usize],
        labels: [DoorLabel; DOORS as usize],
    },
}

/// 一轮游戏，只能由模拟器或 [`Trial::decided`] 构造
#[derive(Debug, Serialize, Copy, Clone, Eq, PartialEq)]
pub struct Trial {
    /// 奖品所在门序号
    prize: u32,

    /// 第一次选择的门序号
    first_choice: u32,

    /// 主持人打开的门序号
    revealed: u32,

    /// 第二次选择的门序号
    second_choice: u32,
}

impl Trial {
    /// 由外部（比如玩家）完成的一轮游戏，校验四个序号
    pub fn decided(
        prize: u32,
        first_choice: u32,
        revealed: u32,
        second_choice: u32,
    ) -> Result<Self> {
        check_door(prize)?;
        check_door(first_choice)?;
        check_door(revealed)?;
        check_door(second_choice)?;

        if revealed == prize || revealed == first_choice || second_choice == revealed {
            return Err(Error::InvalidOperation);
        }

        Ok(Self {
            prize,
            first_choice,
            revealed,
            second_choice,
        })
    }

    // 主持人揭示后按照抉择得到完整的一轮
    fn play<R: Rng + ?Sized>(
        rng: &mut R,
        prize: u32,
        first_choice: u32,
        decision: Decision,
    ) -> Self {
        let revealed = reveal_door(rng, prize, first_choice);
        let second_choice = match decision {
            Decision::Switch => remaining_door(first_choice, revealed),
            Decision::Stick => first_choice,
        };
        Self {
            prize,
            first_choice,
            revealed,
            second_choice,
        }
    }

    /// 奖品所在门序号
    pub fn prize(&self) -> u32 {
        self.prize
    }

    /// 第一次选择的门序号
    pub fn first_choice(&self) -> u32 {
        self.first_choice
    }

    /// 主持人打开的门序号
    pub fn revealed(&self) -> u32 {
        self.revealed
    }

    /// 第二次选择的门序号
    pub fn second_choice(&self) -> u32 {
        self.second_choice
    }

    /// 是否改变了选择
    pub fn changed(&self) -> bool {
        self.first_choice != self.second_choice
    }

    /// 是否赢得奖品
    pub fn won(&self) -> bool {
        self.second_choice == self.prize
    }

    pub fn content(&self, door: u32) -> DoorContent {
        if door == self.prize {
            DoorContent::Car
        } else {
            DoorContent::Goat
        }
    }

    /// 每个门后的东西
    pub fn partitions(&self) -> [DoorContent; DOORS as usize] {
        [self.content(0), self.content(1), self.content(2)]
    }

    /// 有山羊的两个门，按序号升序
    pub fn goats(&self) -> [u32; 2] {
        match self.prize {
            0 => [1, 2],
            1 => [0, 2],
            _ => [0, 1],
        }
    }

    /// 一轮结束后每个门的标签，只由四个序号决定
    pub fn labels(&self) -> [DoorLabel; DOORS as usize] {
        let label = |door: u32| {
            if door == self.revealed {
                DoorLabel::ShownGoat
            } else if door == self.second_choice {
                DoorLabel::SecondChoice
            } else if door == self.first_choice {
                DoorLabel::FirstChoice
            } else if door == self.prize {
                DoorLabel::Car
            } else {
                DoorLabel::NotChosen
            }
        };
        [label(0), label(1), label(2)]
    }

    /// 演示模式的展示步骤
    pub fn steps(&self) -> [Step; 4] {
        [
            Step::FirstChoice {
                door: self.first_choice,
            },
            Step::GoatShown {
                door: self.revealed,
            },
            Step::SecondChoice {
                door: self.second_choice,
            },
            Step::Final {
                partitions: self.partitions(),
                labels: self.labels(),
            },
        ]
    }
}

impl Distribution<Trial> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Trial {
        let prize = rng.gen_range(0..DOORS);
        let first_choice = rng.gen_range(0..DOORS);
        Trial::play(rng, prize, first_choice, Decision::Switch)
    }
}

// 主持人打开一扇既不是奖品也不是挑战者所选的门；
// 挑战者选中奖品时剩下两扇山羊门，随机打开其中一扇
fn reveal_door<R: Rng + ?Sized>(rng: &mut R, prize: u32, first_choice: u32) -> u32 {
    if first_choice == prize {
        random_door(rng, prize)
    } else {
        remaining_door(prize, first_choice)
    }
}

/// 单轮模拟器，唯一的副作用是消耗随机源
#[derive(Debug, Clone)]
pub struct TrialSimulator<R = StdRng> {
    rng: R,
}

impl TrialSimulator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// 固定种子，结果可复现
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TrialSimulator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// 随机进行一轮游戏，挑战者总是改变选择
    pub fn run_trial(&mut self) -> Trial {
        self.rng.gen()
    }

    /// 随机进行一轮游戏，挑战者按照给定的抉择行动
    pub fn run_trial_deciding(&mut self, decision: Decision) -> Trial {
        let prize = self.hide_prize();
        let first_choice = self.rng.gen_range(0..DOORS);
        Trial::play(&mut self.rng, prize, first_choice, decision)
    }

    /// 指定奖品和第一次选择，从主持人揭示开始进行一轮
    pub fn run_trial_from(&mut self, prize: u32, first_choice: u32) -> Result<Trial> {
        check_door(prize)?;
        check_door(first_choice)?;
        Ok(Trial::play(&mut self.rng, prize, first_choice, Decision::Switch))
    }

    /// 随机把奖品放到一个门后
    pub fn hide_prize(&mut self) -> u32 {
        self.rng.gen_range(0..DOORS)
    }

    /// 主持人揭示，返回打开的门序号
    pub fn reveal(&mut self, prize: u32, first_choice: u32) -> Result<u32> {
        check_door(prize)?;
        check_door(first_choice)?;
        Ok(reveal_door(&mut self.rng, prize, first_choice))
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}
