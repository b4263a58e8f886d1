use crate::model::effect_row::EffectRow;

/// A delayed packet of effect rows.
#[derive(Debug, Clone)]
pub struct ScheduledPacket {
    pub remaining_turns: i64,
    pub actor_id: i64,
    pub target_id: i64,
    pub effect_rows: Vec<EffectRow>,
    pub tag: String,
}

/// Holds packets scheduled for delayed execution. Ticked exactly once per
/// round at TURN_START.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    packets: Vec<ScheduledPacket>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        delay_turns: i64,
        actor_id: i64,
        target_id: i64,
        effect_rows: Vec<EffectRow>,
        tag: impl Into<String>,
    ) {
        let delay_turns = delay_turns.max(0);
        self.packets.push(ScheduledPacket {
            remaining_turns: delay_turns,
            actor_id,
            target_id,
            effect_rows,
            tag: tag.into(),
        });
    }

    /// Decrements every packet's counter and returns those that reached 0 or
    /// below, in FIFO schedule order. Remaining packets stay queued.
    pub fn tick(&mut self) -> Vec<ScheduledPacket> {
        for p in &mut self.packets {
            p.remaining_turns -= 1;
        }
        let (ready, rest): (Vec<_>, Vec<_>) = self.packets.drain(..).partition(|p| p.remaining_turns <= 0);
        self.packets = rest;
        ready
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}
