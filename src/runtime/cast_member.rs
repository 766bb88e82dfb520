use crate::director::chunks::cast_member::CastMemberDef;
use crate::director::enums::MemberType;
use crate::runtime::handles::BitmapRef;

/// A member's kind-specific payload. Bitmap pixel data, sound samples, and
/// font glyphs are host-decoded and referenced only by opaque handle; the
/// structural metadata (dimensions, channel layout) the runtime itself
/// needs for Lingo property reads is kept directly.
#[derive(Clone)]
pub enum MemberSpecific {
    Script,
    Bitmap { bitmap: Option<BitmapRef>, width: i32, height: i32 },
    Field { text: String },
    Shape,
    FilmLoop,
    Sound,
    Font,
    Other,
}

#[derive(Clone)]
pub struct CastMember {
    pub number: u32,
    pub name: String,
    pub member_type: MemberType,
    pub specific: MemberSpecific,
}

impl CastMember {
    pub fn from_def(number: u32, def: &CastMemberDef) -> CastMember {
        let name = def
            .chunk
            .member_info
            .as_ref()
            .map(|info| info.name.clone())
            .unwrap_or_default();

        let specific = match def.chunk.member_type {
            MemberType::Script => MemberSpecific::Script,
            MemberType::Bitmap => {
                let info = def.chunk.specific_data.bitmap_info();
                MemberSpecific::Bitmap {
                    bitmap: None,
                    width: info.map(|i| i.width as i32).unwrap_or(0),
                    height: info.map(|i| i.height as i32).unwrap_or(0),
                }
            }
            MemberType::Text | MemberType::Button | MemberType::RTE => MemberSpecific::Field {
                text: def
                    .chunk
                    .member_info
                    .as_ref()
                    .map(|info| info.script_src_text.clone())
                    .unwrap_or_default(),
            },
            MemberType::Shape => MemberSpecific::Shape,
            MemberType::FilmLoop => MemberSpecific::FilmLoop,
            MemberType::Sound => MemberSpecific::Sound,
            MemberType::Font => MemberSpecific::Font,
            _ => MemberSpecific::Other,
        };

        CastMember { number, name, member_type: def.chunk.member_type, specific }
    }
}
