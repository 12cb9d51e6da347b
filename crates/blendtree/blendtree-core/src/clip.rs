//! Animation clips, the host-owned clip bank, and the sampling seams.
//!
//! The core does not understand keyframe data. A [`Clip`] carries only
//! per-instance playback state; turning a (clip, time) pair into joint
//! transforms is the host's job behind [`PoseSampler`], including the
//! bind-pose fallback for joints without animation data. Likewise the
//! skinned-mesh sink receives finished poses behind [`PoseSink`].

use serde::{Deserialize, Serialize};

use crate::ids::ClipId;
use crate::pose::Pose;

/// Playback state for one animation clip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    /// Clip length in seconds.
    pub duration: f32,
    /// Offset added to the timer when sampling keyframe data.
    pub start_time: f32,
    pub timer: f32,
    pub playback_speed: f32,
    pub looping: bool,
}

impl Clip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            start_time: 0.0,
            timer: 0.0,
            playback_speed: 1.0,
            looping: true,
        }
    }

    /// Advance the timer by `dt * playback_speed`, wrapping to exactly zero
    /// at the clip end. Returns `true` when a non-looping clip finished;
    /// looping clips never report finishing.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.timer += dt * self.playback_speed;
        if self.timer >= self.duration {
            self.timer = 0.0;
            if !self.looping {
                return true;
            }
        }
        false
    }

    /// Normalized progress in [0,1); zero when the clip has no length.
    #[inline]
    pub fn phase(&self) -> f32 {
        if self.duration > 0.0 {
            self.timer / self.duration
        } else {
            0.0
        }
    }

    /// Time at which keyframe data is sampled this frame.
    #[inline]
    pub fn sample_time(&self) -> f32 {
        self.timer + self.start_time
    }
}

/// The host's animation collection: flat storage indexed by [`ClipId`].
///
/// Clips are owned here, outside the tree; tree nodes hold ids into this
/// bank and the persistence format stores those ids rather than clip data.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClipBank {
    clips: Vec<Clip>,
}

impl ClipBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, clip: Clip) -> ClipId {
        debug_assert!(self.clips.len() <= u8::MAX as usize, "clip bank full");
        let id = ClipId(self.clips.len() as u8);
        self.clips.push(clip);
        id
    }

    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.get_mut(id.0 as usize)
    }

    #[inline]
    pub fn contains(&self, id: ClipId) -> bool {
        (id.0 as usize) < self.clips.len()
    }

    /// Look up a clip by name (linear scan; banks are small).
    pub fn find(&self, name: &str) -> Option<ClipId> {
        self.clips
            .iter()
            .position(|c| c.name == name)
            .map(|i| ClipId(i as u8))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClipId, &Clip)> {
        self.clips
            .iter()
            .enumerate()
            .map(|(i, c)| (ClipId(i as u8), c))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Host capability: sample a clip's keyframe data at `time` into `out`.
/// Joints without animation data fall back to the bind pose on this side.
pub trait PoseSampler {
    fn sample_pose(&self, clip: ClipId, time: f32, out: &mut Pose);
}

/// Host capability: consume a finished pose to recompute bone matrices.
pub trait PoseSink {
    fn update_bone_matrices(&mut self, pose: &Pose);
}
