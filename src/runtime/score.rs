use binary_reader::{BinaryReader, Endian};

use crate::director::chunks::score::{FrameLabelsChunk, ScoreChunk};
use crate::runtime::cast_lib::CastMemberRef;
use crate::runtime::sprite::{ColorRef, Sprite};

/// Reserved channel numbers (§3): everything below `SPRITE_CHANNEL_BASE` is
/// one of these rather than a sprite slot.
pub const SCRIPT_CHANNEL: usize = 0;
pub const PALETTE_CHANNEL: usize = 1;
pub const TRANSITION_CHANNEL: usize = 2;
pub const SOUND1_CHANNEL: usize = 3;
pub const SOUND2_CHANNEL: usize = 4;
pub const TEMPO_CHANNEL: usize = 5;
/// Internal channel index of 1-based sprite number 1.
pub const SPRITE_CHANNEL_BASE: usize = 6;

/// One score-authored sprite channel's worth of data for a single frame.
/// Deliberately a plain data record, not `Sprite`: `ScorePlayer::apply_frame`
/// copies these fields onto the persistent `Sprite` (§4.5 step 1), it
/// doesn't replace the persistent sprite wholesale (that would clobber
/// puppet-only fields like `script_instance_list`).
#[derive(Clone, Default)]
pub struct FrameChannelData {
    pub member: Option<CastMemberRef>,
    pub loc_h: i32,
    pub loc_v: i32,
    pub width: i32,
    pub height: i32,
}

/// One frame of the timeline: the reserved script channel plus a sparse map
/// of sprite-number → authored channel data.
#[derive(Clone, Default)]
pub struct Frame {
    pub script_member: Option<CastMemberRef>,
    pub sprites: std::collections::BTreeMap<usize, FrameChannelData>,
}

/// A behavior attachment (§3): active at frame F iff `start_frame <= F <=
/// end_frame`.
#[derive(Clone, Copy)]
pub struct FrameInterval {
    pub channel: usize,
    pub start_frame: i32,
    pub end_frame: i32,
    pub script: CastMemberRef,
}

impl FrameInterval {
    pub fn is_active_at(&self, frame: i32) -> bool {
        self.start_frame <= frame && frame <= self.end_frame
    }
}

#[derive(Clone)]
pub struct FrameLabel {
    pub frame_num: i32,
    pub name: String,
}

/// The frame-indexed timeline (§3). `frames[0]` is frame 1.
#[derive(Default)]
pub struct Score {
    pub frames: Vec<Frame>,
    pub frame_intervals: Vec<FrameInterval>,
    pub labels: Vec<FrameLabel>,
}

impl Score {
    pub fn last_frame(&self) -> i32 {
        self.frames.len().max(1) as i32
    }

    pub fn frame(&self, frame_num: i32) -> Option<&Frame> {
        if frame_num < 1 {
            return None;
        }
        self.frames.get(frame_num as usize - 1)
    }

    /// §4.5: behaviors whose interval contains `frame_num`, in channel order
    /// (the order the event-dispatch cascade walks them in).
    pub fn active_intervals(&self, frame_num: i32) -> Vec<&FrameInterval> {
        let mut active: Vec<&FrameInterval> =
            self.frame_intervals.iter().filter(|iv| iv.is_active_at(frame_num)).collect();
        active.sort_by_key(|iv| iv.channel);
        active
    }

    /// §4.5 `goToLabel`: unknown labels are warnings, not errors (returns
    /// `None` and the caller logs).
    pub fn resolve_label(&self, name: &str) -> Option<i32> {
        self.labels
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
            .map(|l| l.frame_num)
    }

    pub fn from_chunks(score: &ScoreChunk, labels: Option<&FrameLabelsChunk>) -> Score {
        let frames = decode_frames(score);
        let frame_intervals = decode_frame_intervals(score);
        let labels = labels
            .map(|l| l.labels.iter().map(|fl| FrameLabel { frame_num: fl.frame_num, name: fl.name.clone() }).collect())
            .unwrap_or_default();
        Score { frames, frame_intervals, labels }
    }
}

/// Re-reads the score chunk's flattened per-frame/per-channel buffer (the
/// same layout `ScoreFrameData::read` walks for logging) into structured
/// `Frame`s the player can overlay onto persistent sprites.
fn decode_frames(score: &ScoreChunk) -> Vec<Frame> {
    let header = &score.frame_data.header;
    let mut reader = BinaryReader::from_vec(&score.frame_data.uncompressed_data);
    reader.set_endian(Endian::Big);

    let mut frames = Vec::with_capacity(header.frame_count as usize);
    for _ in 0..header.frame_count {
        let mut frame = Frame::default();
        for channel in 0..header.num_channels as usize {
            let pos = reader.pos;
            if pos + 18 > reader.length {
                break;
            }
            let flags = reader.read_u16().unwrap_or(0);
            let _unk0 = reader.read_u16().unwrap_or(0);
            let cast_lib = reader.read_u16().unwrap_or(0);
            let cast_member = reader.read_u16().unwrap_or(0);
            let _unk1 = reader.read_u16().unwrap_or(0);
            let pos_y = reader.read_u16().unwrap_or(0) as i16;
            let pos_x = reader.read_u16().unwrap_or(0) as i16;
            let height = reader.read_u16().unwrap_or(0);
            let width = reader.read_u16().unwrap_or(0);
            reader.jmp(pos + header.sprite_record_size as usize);

            if channel == SCRIPT_CHANNEL {
                if cast_member != 0 {
                    frame.script_member = Some(CastMemberRef { cast_lib: cast_lib as i32, cast_member: cast_member as i32 });
                }
                continue;
            }
            if channel < SPRITE_CHANNEL_BASE {
                continue;
            }
            if flags == 0 && cast_member == 0 {
                continue;
            }
            let sprite_number = channel - SPRITE_CHANNEL_BASE + 1;
            frame.sprites.insert(
                sprite_number,
                FrameChannelData {
                    member: if cast_member != 0 {
                        Some(CastMemberRef { cast_lib: cast_lib as i32, cast_member: cast_member as i32 })
                    } else {
                        None
                    },
                    loc_h: pos_x as i32,
                    loc_v: pos_y as i32,
                    width: width as i32,
                    height: height as i32,
                },
            );
        }
        frames.push(frame);
    }
    frames
}

fn decode_frame_intervals(score: &ScoreChunk) -> Vec<FrameInterval> {
    score
        .frame_interval_primaries
        .iter()
        .zip(score.frame_interval_secondaries.iter())
        .filter(|(_, secondary)| secondary.cast_member != 0)
        .map(|(primary, secondary)| FrameInterval {
            channel: primary.sprite_number as usize,
            start_frame: primary.start_frame as i32,
            end_frame: primary.end_frame as i32,
            script: CastMemberRef { cast_lib: secondary.cast_lib as i32, cast_member: secondary.cast_member as i32 },
        })
        .collect()
}

/// Copies a frame's authored channel data onto a persistent sprite (§4.5
/// step 1). Only called for non-puppet channels; puppet sprites keep
/// whatever Lingo assigned them.
pub fn apply_channel_to_sprite(sprite: &mut Sprite, data: &FrameChannelData) {
    sprite.member = data.member;
    sprite.loc_h = data.loc_h;
    sprite.loc_v = data.loc_v;
    sprite.width = data.width;
    sprite.height = data.height;
    sprite.base_loc_h = data.loc_h;
    sprite.base_loc_v = data.loc_v;
    sprite.base_width = data.width;
    sprite.base_height = data.height;
    if sprite.color == ColorRef::PaletteIndex(255) && sprite.member.is_none() && data.member.is_none() {
        // leave defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_interval_active_range() {
        let iv = FrameInterval { channel: 1, start_frame: 5, end_frame: 10, script: CastMemberRef::default() };
        assert!(!iv.is_active_at(4));
        assert!(iv.is_active_at(5));
        assert!(iv.is_active_at(10));
        assert!(!iv.is_active_at(11));
    }

    #[test]
    fn label_resolution_is_case_insensitive() {
        let score = Score {
            frames: vec![Frame::default(); 10],
            frame_intervals: vec![],
            labels: vec![FrameLabel { frame_num: 5, name: "Intro".to_string() }],
        };
        assert_eq!(score.resolve_label("intro"), Some(5));
        assert_eq!(score.resolve_label("INTRO"), Some(5));
        assert_eq!(score.resolve_label("missing"), None);
    }

    #[test]
    fn last_frame_is_at_least_one() {
        let score = Score::default();
        assert_eq!(score.last_frame(), 1);
    }
}
