//! Block identifiers understood by the host world.

use serde::{Deserialize, Serialize};

/// A block type as stored by the host.
///
/// The core never validates block ids; any raw value is forwarded verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u8);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);
    pub const DIRT: BlockId = BlockId(1);
    pub const GRASS: BlockId = BlockId(2);
    pub const STONE: BlockId = BlockId(3);
    pub const COAL: BlockId = BlockId(4);
    pub const SPRUCE_LOG: BlockId = BlockId(5);
    pub const SPRUCE_LEAVES: BlockId = BlockId(6);
    pub const DRY_GRASS: BlockId = BlockId(7);
    pub const ROOTS: BlockId = BlockId(8);
    pub const OBSIDIAN: BlockId = BlockId(9);
    pub const OAK_LOG: BlockId = BlockId(10);
    pub const OAK_LEAVES: BlockId = BlockId(11);
    pub const HEMATITE: BlockId = BlockId(12);
    pub const MARBLE_BLOCK: BlockId = BlockId(13);
    pub const MARBLE_PILLAR: BlockId = BlockId(14);
    pub const MARBLE_BLOCKS: BlockId = BlockId(15);
    pub const ACACIA_LEAVES: BlockId = BlockId(16);
    pub const BOARDS: BlockId = BlockId(17);
    pub const CRYSTALS: BlockId = BlockId(18);
    pub const SAKURA_LEAVES: BlockId = BlockId(19);
    pub const BIRCH_LOG: BlockId = BlockId(20);
    pub const FLOWER_BUSH: BlockId = BlockId(21);
    pub const DATE_BUSH: BlockId = BlockId(22);

    /// Return the raw value.
    pub fn raw(self) -> u8 {
        self.0
    }

    /// Check if this is the empty block.
    pub fn is_air(self) -> bool {
        self == Self::AIR
    }

    /// Catalogue name of a known block, `None` for ids the catalogue lacks.
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "air",
            1 => "dirt",
            2 => "grass",
            3 => "stone",
            4 => "coal",
            5 => "spruceLog",
            6 => "spruceLeaves",
            7 => "dryGrass",
            8 => "roots",
            9 => "obsidian",
            10 => "oakLog",
            11 => "oakLeaves",
            12 => "hematite",
            13 => "marbleBlock",
            14 => "marblePillar",
            15 => "marbleBlocks",
            16 => "acaciaLeaves",
            17 => "boards",
            18 => "crystals",
            19 => "sakuraLeaves",
            20 => "birchLog",
            21 => "flowerBush",
            22 => "dateBush",
            _ => return None,
        };
        Some(name)
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::AIR
    }
}

impl From<u8> for BlockId {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "block#{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_names() {
        assert_eq!(BlockId::AIR.name(), Some("air"));
        assert_eq!(BlockId::MARBLE_PILLAR.name(), Some("marblePillar"));
        assert_eq!(BlockId::DATE_BUSH.name(), Some("dateBush"));
        assert_eq!(BlockId(200).name(), None);
    }

    #[test]
    fn test_unknown_ids_pass_through() {
        let block = BlockId::from(200);
        assert_eq!(block.raw(), 200);
        assert_eq!(block.to_string(), "block#200");
    }

    #[test]
    fn test_default_is_air() {
        assert!(BlockId::default().is_air());
        assert!(!BlockId::STONE.is_air());
    }
}
