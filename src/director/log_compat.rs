//! Stand-in for the browser console bridge the chunk parser used to log
//! through. Routes the same call sites through `log` instead.
pub mod console {
    pub fn log_1(msg: &String) {
        log::trace!("{}", msg);
    }
}
