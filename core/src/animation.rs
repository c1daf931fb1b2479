//! Animation catalog describing how many frames each archetype plays per state.

use serde::{Deserialize, Serialize};

use crate::{AnimationState, Archetype};

/// Sprite sheet dimensions and per-state frame counts for one archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationClip {
    /// Width of a single frame in source pixels.
    pub frame_width: u32,
    /// Height of a single frame in source pixels.
    pub frame_height: u32,
    /// Frames in the idle loop.
    pub idle: u32,
    /// Frames in the run loop.
    pub run: u32,
    /// Frames in the attack clip.
    pub attack: u32,
    /// Frames in the hit reaction.
    pub hit: u32,
    /// Frames in the death clip.
    pub death: u32,
}

impl AnimationClip {
    /// Number of frames played in the provided state, never less than one.
    #[must_use]
    pub fn frames(&self, state: AnimationState) -> u32 {
        let frames = match state {
            AnimationState::Idle => self.idle,
            AnimationState::Run => self.run,
            AnimationState::Attack => self.attack,
            AnimationState::Hit => self.hit,
            AnimationState::Death => self.death,
        };
        frames.max(1)
    }
}

/// Externally supplied mapping from archetype to animation clip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationCatalog {
    /// Clip used by defender knights.
    pub knight: AnimationClip,
    /// Clip used by flying eyes.
    pub flying_eye: AnimationClip,
    /// Clip used by skeletons.
    pub skeleton: AnimationClip,
    /// Clip used by goblins.
    pub goblin: AnimationClip,
    /// Clip used by mushrooms.
    pub mushroom: AnimationClip,
}

impl AnimationCatalog {
    /// Clip registered for the archetype.
    #[must_use]
    pub const fn clip(&self, archetype: Archetype) -> &AnimationClip {
        match archetype {
            Archetype::Knight => &self.knight,
            Archetype::FlyingEye => &self.flying_eye,
            Archetype::Skeleton => &self.skeleton,
            Archetype::Goblin => &self.goblin,
            Archetype::Mushroom => &self.mushroom,
        }
    }

    /// Number of frames the archetype plays in the state.
    #[must_use]
    pub fn frame_count(&self, archetype: Archetype, state: AnimationState) -> u32 {
        self.clip(archetype).frames(state)
    }
}

impl Default for AnimationCatalog {
    fn default() -> Self {
        Self {
            knight: AnimationClip {
                frame_width: 120,
                frame_height: 80,
                idle: 10,
                run: 10,
                attack: 4,
                hit: 1,
                death: 10,
            },
            flying_eye: AnimationClip {
                frame_width: 150,
                frame_height: 110,
                idle: 8,
                run: 8,
                attack: 8,
                hit: 4,
                death: 4,
            },
            skeleton: AnimationClip {
                frame_width: 150,
                frame_height: 150,
                idle: 4,
                run: 4,
                attack: 8,
                hit: 4,
                death: 4,
            },
            goblin: AnimationClip {
                frame_width: 150,
                frame_height: 150,
                idle: 4,
                run: 8,
                attack: 8,
                hit: 4,
                death: 4,
            },
            mushroom: AnimationClip {
                frame_width: 150,
                frame_height: 150,
                idle: 4,
                run: 8,
                attack: 8,
                hit: 4,
                death: 4,
            },
        }
    }
}
