use crate::constants::explosion::FUSE_SECONDS;
use crate::world::block::{TickAction, TickContext, TickingBlock};

/// A block that explodes a few seconds after it starts ticking.
///
/// While the fuse burns it blinks, and stays lit for the final second.
#[derive(Debug, Default)]
pub struct TntBlock {
    start_tick: Option<u64>,
    exploded: bool,
    glowing: bool,
}

impl TntBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fuse_ticks(ticks_per_second: u32) -> u64 {
        FUSE_SECONDS * ticks_per_second as u64
    }

    pub fn is_exploded(&self) -> bool {
        self.exploded
    }
}

impl TickingBlock for TntBlock {
    fn should_tick(&self) -> bool {
        !self.exploded
    }

    fn tick(&mut self, ctx: &TickContext, actions: &mut Vec<TickAction>) {
        if self.exploded {
            return;
        }
        let start = *self.start_tick.get_or_insert(ctx.tick);
        let ticked = ctx.tick.saturating_sub(start);
        let tps = ctx.ticks_per_second as u64;
        let fuse = Self::fuse_ticks(ctx.ticks_per_second);

        if ticked > fuse {
            self.exploded = true;
            actions.push(TickAction::Explode {
                origin: ctx.location,
            });
            return;
        }

        let blink_interval = (tps / 5).max(1);
        let glowing = if ticked + tps >= fuse {
            true
        } else {
            (ticked / blink_interval) % 2 == 1
        };
        if glowing != self.glowing {
            self.glowing = glowing;
            actions.push(TickAction::Redraw);
        }
    }

    fn is_glowing(&self) -> bool {
        self.glowing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Location;

    fn ctx(tick: u64) -> TickContext {
        TickContext {
            tick,
            ticks_per_second: 10,
            location: Location::new(1, 1),
        }
    }

    #[test]
    fn test_fuse_counts_from_first_tick() {
        let mut tnt = TntBlock::new();
        let mut actions = Vec::new();
        let fuse = TntBlock::fuse_ticks(10);

        for tick in 100..=100 + fuse {
            tnt.tick(&ctx(tick), &mut actions);
        }
        assert!(!tnt.is_exploded());
        assert!(!actions.contains(&TickAction::Explode { origin: Location::new(1, 1) }));

        tnt.tick(&ctx(101 + fuse), &mut actions);
        assert!(tnt.is_exploded());
        assert!(!tnt.should_tick());
        assert_eq!(
            actions.last(),
            Some(&TickAction::Explode { origin: Location::new(1, 1) })
        );
    }

    #[test]
    fn test_glows_during_last_second() {
        let mut tnt = TntBlock::new();
        let mut actions = Vec::new();
        let fuse = TntBlock::fuse_ticks(10);

        tnt.tick(&ctx(0), &mut actions);
        tnt.tick(&ctx(fuse - 10), &mut actions);
        assert!(tnt.is_glowing());
        tnt.tick(&ctx(fuse - 1), &mut actions);
        assert!(tnt.is_glowing());
    }

    #[test]
    fn test_blinks_before_last_second() {
        let mut tnt = TntBlock::new();
        let mut actions = Vec::new();

        tnt.tick(&ctx(0), &mut actions);
        assert!(!tnt.is_glowing());
        tnt.tick(&ctx(2), &mut actions);
        assert!(tnt.is_glowing());
        tnt.tick(&ctx(4), &mut actions);
        assert!(!tnt.is_glowing());
        assert_eq!(actions.iter().filter(|a| **a == TickAction::Redraw).count(), 2);
    }
}
