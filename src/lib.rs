mod batch;
mod error;
mod game_log;
mod outcome;
mod session;
mod trial;

pub use batch::*;
pub use error::*;
pub use game_log::*;
pub use outcome::*;
pub use session::*;
pub use trial::*;
pub use uuid::Uuid;

use rand::Rng;

/// 门数，固定为 3
pub const DOORS: u32 = 3;

/// 检查门序号是否有效
pub fn check_door(door: u32) -> Result<u32> {
    if door < DOORS {
        Ok(door)
    } else {
        Err(Error::InvalidDoorIndex)
    }
}

// 在 [0, DOORS) 范围内生成 exclusive 之外的随机门序号
fn random_door<R: Rng + ?Sized>(rng: &mut R, exclusive: u32) -> u32 {
    assert!(exclusive < DOORS, "exclusive = {}", exclusive);

    let random = rng.gen_range(0..DOORS - 1);

    if random >= exclusive {
        random + 1
    } else {
        random
    }
}

// 三个门中除去 a、b 之外剩下的那一个
fn remaining_door(a: u32, b: u32) -> u32 {
    debug_assert!(a != b && a < DOORS && b < DOORS, "a = {}, b = {}", a, b);
    DOORS * (DOORS - 1) / 2 - a - b
}
