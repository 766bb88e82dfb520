/// Per-file decode context threaded through chunk parsing.
///
/// `lctx_capital_x` and `dir_version` together resolve the variable
/// multiplier (see `file::get_variable_multiplier`); `after_burned` and
/// `ils_body_offset` describe whether the file used Shockwave's Afterburner
/// compression and, if so, where the initial load segment body begins.
pub struct RIFXReaderContext {
    pub after_burned: bool,
    pub ils_body_offset: usize,
    pub dir_version: u16,
    pub lctx_capital_x: bool,
}
