//! The host interface and a buffered implementation of it.
//!
//! The host owns the world and the audio device. Scripts reach both only
//! through [`Host`]; the core forwards coordinates and ids without checking
//! them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{BlockId, IVec3, SfxId, Vec3};

/// Primitives the host exposes to the script event core.
pub trait Host {
    /// Write one line to standard output.
    fn print_line(&mut self, text: &str);

    /// Write one line to the error channel.
    fn print_error_line(&mut self, text: &str);

    /// Append a line to the in-game log console.
    fn game_log(&mut self, _text: &str) {}

    /// Read a block. `None` when the host has no block there (e.g. the chunk
    /// is not loaded).
    fn get_block(&self, pos: IVec3) -> Option<BlockId>;

    /// Write a block.
    fn set_block(&mut self, pos: IVec3, block: BlockId);

    /// Play a sound effect at a position.
    fn play_sound(&mut self, pos: Vec3, volume: f32, sfx: SfxId);
}

/// A world or audio side effect queued for the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HostCommand {
    SetBlock { pos: IVec3, block: BlockId },
    PlaySound { pos: Vec3, volume: f32, sfx: SfxId },
}

/// A host that records everything scripts do.
///
/// Block writes land in a sparse overlay (so later reads observe them) and in
/// the outgoing command queue, which the embedding application drains once
/// per step and applies to the real world.
#[derive(Debug, Clone, Default)]
pub struct BufferedHost {
    /// Lines written with [`Host::print_line`].
    pub stdout: Vec<String>,

    /// Lines written with [`Host::print_error_line`].
    pub stderr: Vec<String>,

    /// Lines appended to the in-game log.
    pub game_log: Vec<String>,

    blocks: HashMap<IVec3, BlockId>,
    commands: Vec<HostCommand>,
}

impl BufferedHost {
    /// Create an empty host with no known blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a block without queueing a command (world state the host already has).
    pub fn with_block(mut self, pos: IVec3, block: BlockId) -> Self {
        self.blocks.insert(pos, block);
        self
    }

    /// Commands queued since the last drain.
    pub fn commands(&self) -> &[HostCommand] {
        &self.commands
    }

    /// Take every queued command, leaving the queue empty.
    pub fn drain_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Host for BufferedHost {
    fn print_line(&mut self, text: &str) {
        self.stdout.push(text.to_string());
    }

    fn print_error_line(&mut self, text: &str) {
        self.stderr.push(text.to_string());
    }

    fn game_log(&mut self, text: &str) {
        self.game_log.push(text.to_string());
    }

    fn get_block(&self, pos: IVec3) -> Option<BlockId> {
        self.blocks.get(&pos).copied()
    }

    fn set_block(&mut self, pos: IVec3, block: BlockId) {
        tracing::trace!(?pos, %block, "queued block write");
        self.blocks.insert(pos, block);
        self.commands.push(HostCommand::SetBlock { pos, block });
    }

    fn play_sound(&mut self, pos: Vec3, volume: f32, sfx: SfxId) {
        tracing::trace!(?pos, volume, ?sfx, "queued sound");
        self.commands.push(HostCommand::PlaySound { pos, volume, sfx });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_block_is_none() {
        let host = BufferedHost::new();
        assert!(host.get_block(IVec3::new(0, 0, 0)).is_none());
    }

    #[test]
    fn test_set_block_is_readable_and_queued() {
        let mut host = BufferedHost::new();
        let pos = IVec3::new(1, 2, 3);

        host.set_block(pos, BlockId::STONE);

        assert_eq!(host.get_block(pos), Some(BlockId::STONE));
        assert_eq!(
            host.commands(),
            &[HostCommand::SetBlock { pos, block: BlockId::STONE }]
        );
    }

    #[test]
    fn test_seeded_blocks_are_not_queued() {
        let pos = IVec3::new(-4, 10, 7);
        let host = BufferedHost::new().with_block(pos, BlockId::GRASS);

        assert_eq!(host.get_block(pos), Some(BlockId::GRASS));
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_drain_commands() {
        let mut host = BufferedHost::new();
        host.play_sound(Vec3::ZERO, 1.0, SfxId::Bomb);
        host.play_sound(Vec3::ONE, 0.5, SfxId::Step);

        let drained = host.drain_commands();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], HostCommand::PlaySound { sfx: SfxId::Bomb, .. }));
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_console_channels_are_separate() {
        let mut host = BufferedHost::new();
        host.print_line("hello");
        host.print_error_line("oops");
        host.game_log("hello");

        assert_eq!(host.stdout, vec!["hello"]);
        assert_eq!(host.stderr, vec!["oops"]);
        assert_eq!(host.game_log, vec!["hello"]);
    }
}
