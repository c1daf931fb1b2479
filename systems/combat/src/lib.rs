#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Melee engagement and frame-exact strike resolution.
//!
//! Engagement starts attack animations for characters standing next to a
//! living opponent. Damage is only rolled when the world reports that an
//! attack clip reached its impact frame, so the tick rate never changes how
//! often strikes land.

use gridsiege_core::{Command, EntityId, EntitySnapshot, Event, RandomSource, RosterView};

/// Pure system that emits attack and strike commands.
#[derive(Debug, Default)]
pub struct Combat {
    strikes: u64,
}

impl Combat {
    /// Creates a new combat system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of strike rolls made so far.
    #[must_use]
    pub const fn strikes(&self) -> u64 {
        self.strikes
    }

    /// Starts attacks for every ready character within Chebyshev distance one
    /// of a living opponent.
    ///
    /// The character's current target wins when it is still in reach;
    /// otherwise the opponent with the lowest handle is engaged.
    pub fn engage(&self, roster: &RosterView, out: &mut Vec<Command>) {
        for attacker in roster.iter() {
            if !is_ready(attacker) {
                continue;
            }
            let Some(target) = choose_opponent(attacker, roster) else {
                continue;
            };
            out.push(Command::BeginAttack {
                attacker: attacker.id,
                target,
            });
        }
    }

    /// Rolls one strike for every impact frame reported in `events`.
    pub fn resolve_impacts<R>(
        &mut self,
        events: &[Event],
        roster: &RosterView,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        R: RandomSource + ?Sized,
    {
        for event in events {
            let Event::ImpactFrameReached { attacker, target } = *event else {
                continue;
            };
            let Some(archetype) = roster.get(attacker).and_then(|snapshot| snapshot.archetype)
            else {
                continue;
            };

            let roll = rng.next_unit();
            self.strikes += 1;
            out.push(Command::ResolveStrike {
                attacker,
                target,
                outcome: archetype.stats().combat.resolve(roll),
            });
        }
    }
}

fn is_ready(snapshot: &EntitySnapshot) -> bool {
    snapshot.faction.is_some()
        && snapshot.is_alive()
        && !snapshot.state.is_engaged()
        && snapshot.attack_cooldown.is_zero()
}

fn choose_opponent(attacker: &EntitySnapshot, roster: &RosterView) -> Option<EntityId> {
    let opponent = attacker.faction?.opponent();
    let in_reach = |candidate: &EntitySnapshot| {
        candidate.faction == Some(opponent)
            && candidate.is_alive()
            && attacker.cell.chebyshev_distance(candidate.cell) <= 1
    };

    if let Some(current) = attacker.target.and_then(|id| roster.get(id)) {
        if in_reach(current) {
            return Some(current.id);
        }
    }
    roster
        .faction(opponent)
        .find(|candidate| in_reach(candidate))
        .map(|candidate| candidate.id)
}
