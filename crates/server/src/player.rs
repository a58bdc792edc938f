use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::{
    domain::{SequenceCatalog, SequenceId, Speed},
    protocol::DeviceStatus,
};

pub const PIN_COUNT: u32 = 8;

pub const BUILTIN_SEQUENCES: [&str; 8] = [
    "Chase Single",
    "Chase Double",
    "Wave Single",
    "Wave Double",
    "Random",
    "Alternate",
    "OFF",
    "ON",
];

/// On/off state of the relay pins; bit `i` drives pin `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame(pub u8);

impl Frame {
    fn from_bits(bits: u32) -> Self {
        Frame((bits & 0xFF) as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    ChaseSingle { on: u32 },
    ChaseDouble { on: [u32; 2] },
    WaveSingle { counter: u32 },
    WaveDouble { counter: u32 },
    Random,
    Alternate { flag: u8 },
    Off,
    On,
}

impl Pattern {
    fn for_id(id: SequenceId) -> Self {
        match id.0 {
            0 => Pattern::ChaseSingle { on: 0 },
            1 => Pattern::ChaseDouble { on: [1, 0] },
            2 => Pattern::WaveSingle { counter: 0 },
            3 => Pattern::WaveDouble { counter: 0 },
            4 => Pattern::Random,
            5 => Pattern::Alternate { flag: 0b0101_0101 },
            6 => Pattern::Off,
            _ => Pattern::On,
        }
    }

    fn next_frame(&mut self, rng: &mut StdRng) -> Frame {
        match self {
            Pattern::ChaseSingle { on } => {
                let frame = Frame::from_bits(1 << *on);
                *on = (*on + 1) % PIN_COUNT;
                frame
            }
            Pattern::ChaseDouble { on } => {
                let frame = Frame::from_bits((1 << on[0]) | (1 << on[1]));
                on[0] = (on[0] + 1) % PIN_COUNT;
                on[1] = (on[1] + 1) % PIN_COUNT;
                frame
            }
            // Bounces a single lit pin back and forth.
            Pattern::WaveSingle { counter } => {
                let period = PIN_COUNT * 2 - 2;
                let shift = if *counter >= PIN_COUNT {
                    period - *counter
                } else {
                    *counter
                };
                *counter = (*counter + 1) % period;
                Frame::from_bits(1 << shift)
            }
            Pattern::WaveDouble { counter } => {
                let period = PIN_COUNT * 2 - 4;
                let shift = if *counter >= PIN_COUNT - 1 {
                    period - *counter
                } else {
                    *counter
                };
                *counter = (*counter + 1) % period;
                Frame::from_bits(0b11 << shift)
            }
            Pattern::Random => Frame(rng.random()),
            Pattern::Alternate { flag } => {
                *flag = !*flag;
                Frame(*flag)
            }
            Pattern::Off => Frame(0),
            Pattern::On => Frame(u8::MAX),
        }
    }
}

/// Plays one sequence at a time and remembers the default to fall back to on restart.
#[derive(Debug)]
pub struct SequencePlayer {
    catalog: SequenceCatalog,
    current: SequenceId,
    speed: Speed,
    pattern: Pattern,
    default: DeviceStatus,
    rng: StdRng,
}

impl SequencePlayer {
    pub fn new(default_sequence: SequenceId, default_speed: Speed) -> Self {
        Self::with_rng(default_sequence, default_speed, StdRng::from_os_rng())
    }

    pub fn with_rng(default_sequence: SequenceId, default_speed: Speed, rng: StdRng) -> Self {
        let catalog = SequenceCatalog::new(BUILTIN_SEQUENCES);
        let current = catalog.constrain(default_sequence);
        Self {
            catalog,
            current,
            speed: default_speed,
            pattern: Pattern::for_id(current),
            default: DeviceStatus::new(current, default_speed),
            rng,
        }
    }

    pub fn catalog(&self) -> &SequenceCatalog {
        &self.catalog
    }

    pub fn status(&self) -> DeviceStatus {
        DeviceStatus::new(self.current, self.speed)
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.speed.millis().unsigned_abs())
    }

    /// Switches to `id` (clamped into the catalog) and restarts its pattern from the top.
    pub fn set_new_sequence(&mut self, id: SequenceId, speed: Speed) -> DeviceStatus {
        self.current = self.catalog.constrain(id);
        self.speed = speed;
        self.pattern = Pattern::for_id(self.current);
        tracing::info!(
            sequence = self.catalog.name(self.current).unwrap_or_default(),
            speed = speed.label(),
            "starting sequence"
        );
        self.status()
    }

    pub fn default_status(&self) -> DeviceStatus {
        self.default
    }

    pub fn store_default(&mut self, id: SequenceId, speed: Speed) -> DeviceStatus {
        self.default = DeviceStatus::new(self.catalog.constrain(id), speed);
        tracing::info!(
            sequence_id = self.default.sequence_id.0,
            speed = self.default.speed,
            "stored default sequence"
        );
        self.default
    }

    pub fn next_frame(&mut self) -> Frame {
        self.pattern.next_frame(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: i64) -> SequencePlayer {
        SequencePlayer::with_rng(SequenceId(id), Speed::Normal, StdRng::seed_from_u64(7))
    }

    fn frames(player: &mut SequencePlayer, count: usize) -> Vec<u8> {
        (0..count).map(|_| player.next_frame().0).collect()
    }

    #[test]
    fn chase_single_walks_each_pin() {
        let mut player = player(0);
        assert_eq!(
            frames(&mut player, 9),
            vec![1, 2, 4, 8, 16, 32, 64, 128, 1]
        );
    }

    #[test]
    fn chase_double_wraps_around() {
        let mut player = player(1);
        let seen = frames(&mut player, 8);
        assert_eq!(seen[0], 0b0000_0011);
        assert_eq!(seen[1], 0b0000_0110);
        assert_eq!(seen[7], 0b1000_0001);
    }

    #[test]
    fn wave_single_bounces_between_ends() {
        let mut player = player(2);
        assert_eq!(
            frames(&mut player, 15),
            vec![1, 2, 4, 8, 16, 32, 64, 128, 64, 32, 16, 8, 4, 2, 1]
        );
    }

    #[test]
    fn wave_double_bounces_pairs() {
        let mut player = player(3);
        assert_eq!(
            frames(&mut player, 13),
            vec![
                0b0000_0011,
                0b0000_0110,
                0b0000_1100,
                0b0001_1000,
                0b0011_0000,
                0b0110_0000,
                0b1100_0000,
                0b0110_0000,
                0b0011_0000,
                0b0001_1000,
                0b0000_1100,
                0b0000_0110,
                0b0000_0011,
            ]
        );
    }

    #[test]
    fn alternate_off_and_on_patterns() {
        let mut player = player(5);
        assert_eq!(frames(&mut player, 3), vec![0b1010_1010, 0b0101_0101, 0b1010_1010]);

        let mut player = self::player(6);
        assert_eq!(frames(&mut player, 2), vec![0, 0]);

        let mut player = self::player(7);
        assert_eq!(frames(&mut player, 2), vec![0xFF, 0xFF]);
    }

    #[test]
    fn set_new_sequence_clamps_and_restarts() {
        let mut player = player(0);
        frames(&mut player, 3);

        let status = player.set_new_sequence(SequenceId(42), Speed::Fast);
        assert_eq!(status, DeviceStatus::new(SequenceId(7), Speed::Fast));

        player.set_new_sequence(SequenceId(0), Speed::Slow);
        assert_eq!(player.next_frame(), Frame(1));
        assert_eq!(player.frame_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn store_default_does_not_touch_current_sequence() {
        let mut player = player(1);
        let stored = player.store_default(SequenceId(-3), Speed::Fast);
        assert_eq!(stored, DeviceStatus::new(SequenceId(0), Speed::Fast));
        assert_eq!(player.status(), DeviceStatus::new(SequenceId(1), Speed::Normal));
    }
}
