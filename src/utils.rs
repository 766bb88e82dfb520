use chrono::Local;
use itertools::Itertools;
use url::Url;

pub fn set_panic_hook() {
    // A host embedding this crate in a long-lived process may want a custom
    // panic hook of its own; the runtime does not install one itself.
}

pub fn log_i(value: &str) {
    log::info!("{}", value);
}

#[macro_export]
macro_rules! console_warn {
    ($($arg:tt)*) => (
        log::warn!($($arg)*)
    )
}

#[macro_export]
macro_rules! console_error {
    ($($arg:tt)*) => (
        log::error!($($arg)*)
    )
}

pub fn get_basename_no_extension(path: &str) -> String {
    let segments = path.split("/");
    let file_name = segments.last().unwrap_or_default();
    let dot_segments = file_name.split(".").collect_vec();
    let basename = dot_segments[0..dot_segments.len() - 1].join(".");
    return basename;
}

pub fn get_base_url(url: &Url) -> Url {
    let mut result = url.clone();
    result.set_fragment(None);
    return result.join("./").unwrap();
}

pub const PATH_SEPARATOR: &str = "/";

pub trait ToHexString {
    fn to_hex_string(&self) -> String;
}

impl ToHexString for Vec<u8> {
    fn to_hex_string(&self) -> String {
        self.iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<String>>()
            .join(" ")
    }
}

pub fn get_ticks() -> u32 {
    let time: chrono::DateTime<Local> = Local::now();
    // 60 ticks per second
    let millis = time.timestamp_millis();
    (millis as f32 / (1000.0 / 60.0)) as u32
}

pub fn get_elapsed_ticks(tick_start: u32) -> i32 {
    return get_ticks() as i32 - tick_start as i32;
}
