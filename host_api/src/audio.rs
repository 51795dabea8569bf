//! Sound effects the host can play.

use serde::{Deserialize, Serialize};

/// A sound effect in the host's sample bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SfxId {
    /// Silence; also what unknown codes map to.
    #[default]
    Void,
    Jump,
    HookFire,
    Ungh,
    Step,
    Stomp,
    Bomb,
    Pock,
    Tock,
}

impl SfxId {
    /// Decode the numeric code scripts use. Unknown codes become `Void`.
    pub fn from_raw(code: i32) -> Self {
        match code {
            1 => SfxId::Jump,
            2 => SfxId::HookFire,
            3 => SfxId::Ungh,
            4 => SfxId::Step,
            5 => SfxId::Stomp,
            6 => SfxId::Bomb,
            7 => SfxId::Pock,
            8 => SfxId::Tock,
            _ => SfxId::Void,
        }
    }

    /// The numeric code scripts use for this effect.
    pub fn raw(self) -> i32 {
        match self {
            SfxId::Void => 0,
            SfxId::Jump => 1,
            SfxId::HookFire => 2,
            SfxId::Ungh => 3,
            SfxId::Step => 4,
            SfxId::Stomp => 5,
            SfxId::Bomb => 6,
            SfxId::Pock => 7,
            SfxId::Tock => 8,
        }
    }
}
