//! Opaque handle types for media the core never decodes itself.
//!
//! Bitmap pixels, palette tables, and sound data are host concerns (the
//! `BitmapDecoder`/rendering surface lives outside this crate). The VM and
//! Datum system only need something `Copy`/hashable to carry around and
//! compare — an actual pixel buffer would pull image-decoding code into a
//! component that's explicitly out of scope.

/// Identifies a decoded bitmap the host is holding onto. The core never
/// looks inside it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BitmapRef(pub u32);

/// Identifies a palette, either a built-in system table or a cast member's
/// custom palette.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PaletteRef {
    BuiltIn(BuiltInPalette),
    Member(crate::runtime::cast_lib::CastMemberRef),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BuiltInPalette {
    SystemMac,
    SystemWin,
    Rainbow,
    Grayscale,
}

/// An ink-mask bitmap reference (the `matte` ink type). Opaque, same
/// reasoning as `BitmapRef`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BitmapMask(pub u32);
