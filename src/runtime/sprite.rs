use crate::runtime::cast_lib::CastMemberRef;
use crate::runtime::script_ref::ScriptInstanceRef;

#[derive(Clone, PartialEq, Debug)]
pub enum ColorRef {
    Rgb(u8, u8, u8),
    PaletteIndex(u8),
}

impl ColorRef {
    pub fn from_hex(hex: &str) -> ColorRef {
        let hex = hex.trim_start_matches('#');
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        ColorRef::Rgb(r, g, b)
    }

    pub fn to_index(&self, palette: &[(u8, u8, u8)]) -> u8 {
        match self {
            ColorRef::PaletteIndex(i) => *i,
            ColorRef::Rgb(r, g, b) => {
                let mut best_index = 0;
                let mut best_distance = u32::MAX;
                for (i, &(pr, pg, pb)) in palette.iter().enumerate() {
                    let dr = *r as i32 - pr as i32;
                    let dg = *g as i32 - pg as i32;
                    let db = *b as i32 - pb as i32;
                    let distance = (dr * dr + dg * dg + db * db) as u32;
                    if distance < best_distance {
                        best_distance = distance;
                        best_index = i;
                    }
                }
                best_index as u8
            }
        }
    }
}

impl std::fmt::Display for ColorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorRef::Rgb(r, g, b) => write!(f, "rgb({}, {}, {})", r, g, b),
            ColorRef::PaletteIndex(i) => write!(f, "color({})", i),
        }
    }
}

/// Mouse cursor, as either a system cursor id or a cast-member-backed custom
/// cursor (the bitmap itself is out of scope; only the member numbers that
/// compose it are kept).
#[derive(Clone, PartialEq, Debug)]
pub enum CursorRef {
    System(i32),
    Member(Vec<i32>),
}

/// One channel's worth of state in the score player. Persistent across
/// frames that don't reassign the channel (§4.5): only `ScorePlayer::tick`
/// resets the base_* fields back to the frame's authored values, and score
/// overrides (`puppetSprite`) can diverge from them in between.
#[derive(Clone)]
pub struct Sprite {
    pub number: usize,
    pub name: String,
    pub puppet: bool,
    pub visible: bool,
    pub stretch: i32,
    pub loc_h: i32,
    pub loc_v: i32,
    pub loc_z: i32,
    pub width: i32,
    pub height: i32,
    pub ink: i32,
    pub blend: i32,
    pub rotation: f64,
    pub skew: f64,
    pub flip_h: bool,
    pub flip_v: bool,
    pub back_color: i32,
    pub color: ColorRef,
    pub bg_color: ColorRef,
    pub member: Option<CastMemberRef>,
    pub script_instance_list: Vec<ScriptInstanceRef>,
    pub cursor_ref: Option<CursorRef>,
    pub editable: bool,
    pub entered: bool,
    pub exited: bool,
    pub fore_color: i32,
    pub has_fore_color: bool,
    pub has_back_color: bool,
    // Base (score-defined) values, restored by `ScorePlayer::apply_frame`
    // before per-tick puppet overrides are layered on top.
    pub base_loc_h: i32,
    pub base_loc_v: i32,
    pub base_width: i32,
    pub base_height: i32,
    pub base_rotation: f64,
    pub base_blend: i32,
    pub base_skew: f64,
    pub base_color: ColorRef,
    pub base_bg_color: ColorRef,
}

impl Sprite {
    pub fn new(number: usize) -> Sprite {
        Sprite {
            number,
            name: String::new(),
            puppet: false,
            visible: true,
            stretch: 0,
            loc_h: 0,
            loc_v: 0,
            loc_z: number as i32,
            width: 0,
            height: 0,
            ink: 0,
            blend: 100,
            rotation: 0.0,
            skew: 0.0,
            flip_h: false,
            flip_v: false,
            back_color: 0,
            color: ColorRef::PaletteIndex(255),
            bg_color: ColorRef::PaletteIndex(0),
            member: None,
            script_instance_list: vec![],
            cursor_ref: None,
            editable: false,
            entered: false,
            exited: false,
            fore_color: 255,
            has_fore_color: false,
            has_back_color: false,
            base_loc_h: 0,
            base_loc_v: 0,
            base_width: 0,
            base_height: 0,
            base_rotation: 0.0,
            base_blend: 100,
            base_skew: 0.0,
            base_color: ColorRef::PaletteIndex(255),
            base_bg_color: ColorRef::PaletteIndex(0),
        }
    }

    /// Puppet sprites are not reset by frame transitions (§4.5): the score
    /// player skips `reset` for any channel flagged `puppet`.
    pub fn reset(&mut self) {
        let number = self.number;
        *self = Sprite::new(number);
    }

    pub fn rect(&self) -> (i32, i32, i32, i32) {
        (self.loc_h, self.loc_v, self.loc_h + self.width, self.loc_v + self.height)
    }
}
