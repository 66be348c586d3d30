use crate::world::block::{TickAction, TickContext, TickingBlock};

/// Sand falls when the cell below it is empty.
///
/// It only checks when something around it changed, so a settled pile costs
/// nothing per tick.
#[derive(Debug)]
pub struct SandBlock {
    pending_update: bool,
}

impl SandBlock {
    pub fn new() -> Self {
        Self {
            pending_update: true,
        }
    }
}

impl Default for SandBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickingBlock for SandBlock {
    fn should_tick(&self) -> bool {
        self.pending_update
    }

    fn tick(&mut self, ctx: &TickContext, actions: &mut Vec<TickAction>) {
        self.pending_update = false;
        actions.push(TickAction::Fall {
            origin: ctx.location,
        });
    }

    fn request_update(&mut self) {
        self.pending_update = true;
    }
}
