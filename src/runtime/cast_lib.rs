/// Identifies a cast member by (cast library number, member number within
/// that library). Cheap, `Copy`, used everywhere a script refers to "this
/// member" without holding a live reference into the cast registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct CastMemberRef {
    pub cast_lib: i32,
    pub cast_member: i32,
}

pub const INVALID_CAST_MEMBER_REF: CastMemberRef = CastMemberRef { cast_lib: -1, cast_member: -1 };
pub const NULL_CAST_MEMBER_REF: CastMemberRef = CastMemberRef { cast_lib: 0, cast_member: 0 };

pub fn cast_member_ref(cast_lib: i32, cast_member: i32) -> CastMemberRef {
    CastMemberRef { cast_lib, cast_member }
}

impl CastMemberRef {
    pub fn is_valid(&self) -> bool {
        self.cast_lib != INVALID_CAST_MEMBER_REF.cast_lib
            && self.cast_member != INVALID_CAST_MEMBER_REF.cast_member
    }
}

/// When an external/linked cast library should be pulled in relative to the
/// frame that references it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PreloadMode {
    WhenNeeded,
    AfterFrameOne,
    BeforeFrameOne,
}

impl From<u16> for PreloadMode {
    fn from(value: u16) -> Self {
        match value {
            1 => PreloadMode::AfterFrameOne,
            2 => PreloadMode::BeforeFrameOne,
            _ => PreloadMode::WhenNeeded,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CastLoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
}

/// The two points in movie startup at which `CastRegistry::casts_pending_preload`
/// is asked "what should load now" (§4.4): once right after the movie loads
/// (pulls in `BeforeFrameOne` casts), and once as playback crosses from frame
/// 1 into frame 2 (pulls in `AfterFrameOne` casts). `WhenNeeded` casts never
/// come back from either query; a host loads them lazily on first reference.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PreloadReason {
    MovieLoaded,
    AfterFrameOne,
}
