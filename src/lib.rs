//! A Lingo bytecode runtime and frame-driven score player for Shockwave
//! movies: parses RIFX-derived cast/score data, runs compiled Lingo
//! bytecode through the VM in `runtime::vm`, and steps playback forward one
//! frame at a time through `runtime::player::ScorePlayer`.
//!
//! `Player` is the façade a host embeds (§6): it owns the `Runtime`, the
//! score player, and whatever collaborator implementations (chunk provider,
//! bitmap decoder, external cast fetcher, net client) the host chooses to
//! supply, then drives playback one `tick` at a time. Nothing in this crate
//! reaches through a process-wide singleton — a host can run any number of
//! `Player`s side by side.

pub mod director;
pub mod io;
pub mod runtime;
mod utils;

use runtime::builtins::{BuiltinOverride, MessageSink, NullMessageSink};
use runtime::cast_lib::{CastMemberRef, PreloadReason};
use runtime::config::RuntimeConfig;
use runtime::error::RuntimeResult;
use runtime::external::{ChunkProvider, ExternalCastFetcher};
use runtime::movie::{Breakpoint, NullTraceListener, Runtime, TraceListener};
use runtime::player::{NullStageListener, ScorePlayer, StageListener};

/// One sprite's worth of renderable state for the current frame, as handed
/// back by `Player::sprites_in_frame` (§6 "enumerate sprites for current
/// frame").
#[derive(Clone, Debug)]
pub struct SpriteSnapshot {
    pub channel: usize,
    pub loc_h: i32,
    pub loc_v: i32,
    pub width: i32,
    pub height: i32,
    pub member: Option<CastMemberRef>,
    pub ink: i32,
    pub blend: i32,
    pub visible: bool,
}

/// The embeddable façade over the runtime (§6's "Interfaces exposed to the
/// host"). A host owns one `Player` per loaded movie and threads it through
/// its own event/render loop; this crate never owns that loop itself.
pub struct Player {
    pub runtime: Runtime,
    score_player: ScorePlayer,
    message_sink: Box<dyn MessageSink>,
    stage_listener: Box<dyn StageListener>,
}

impl Player {
    pub fn new(config: RuntimeConfig) -> Player {
        Player {
            runtime: Runtime::new(config),
            score_player: ScorePlayer::new(),
            message_sink: Box::new(NullMessageSink),
            stage_listener: Box::new(NullStageListener),
        }
    }

    /// Parses `bytes` via `chunk_provider` and resets the runtime to the
    /// freshly loaded movie (§4.4's initial load). A host with no reason to
    /// supply its own parser can pass `&director::BundledChunkProvider`.
    pub async fn load_movie(
        &mut self,
        bytes: Vec<u8>,
        file_name: String,
        base_path: url::Url,
        chunk_provider: &dyn ChunkProvider,
    ) -> Result<(), String> {
        let dir = chunk_provider.load(bytes, file_name, base_path).await?;
        self.runtime.load_movie(&dir);
        self.score_player = ScorePlayer::new();
        Ok(())
    }

    /// §4.4 `preloadCasts`: walks every external cast whose preload mode
    /// matches `reason` and not yet `Loaded`/`Loading`, fetching and
    /// splicing each one in turn. A host calls this once right after
    /// `load_movie` (`PreloadReason::MovieLoaded`) and again the first time
    /// playback crosses from frame 1 into frame 2
    /// (`PreloadReason::AfterFrameOne`); `WhenNeeded` casts never show up
    /// here and must be loaded lazily by the host on first reference.
    pub async fn preload_casts(
        &mut self,
        reason: PreloadReason,
        fetcher: &dyn ExternalCastFetcher,
        chunk_provider: &dyn ChunkProvider,
    ) {
        let base_path = self.runtime.net_manager.base_path.as_ref().map(|u| u.as_str().to_string());
        let pending = self.runtime.cast_registry.casts_pending_preload(reason);
        for number in pending {
            let movie_base = self
                .runtime
                .net_manager
                .base_path
                .clone()
                .unwrap_or_else(|| url::Url::parse("about:blank").unwrap());
            if let Err(e) = runtime::external_loader::load_external_cast(
                &mut self.runtime.cast_registry,
                number,
                base_path.as_deref(),
                fetcher,
                chunk_provider,
                movie_base,
            )
            .await
            {
                log::warn!("preload of cast {} failed: {}", number, e);
            }
        }
    }

    pub fn play(&mut self) {
        self.runtime.movie.playing = true;
        self.runtime.movie.script_paused = false;
    }

    pub fn pause(&mut self) {
        self.runtime.movie.script_paused = true;
    }

    pub fn stop(&mut self) {
        self.runtime.movie.playing = false;
    }

    /// Runs one frame-transition/event-dispatch cycle (§4.5). A no-op
    /// unless the movie is playing and not script-paused.
    pub fn tick(&mut self) -> RuntimeResult<()> {
        self.score_player.tick(&mut self.runtime, self.message_sink.as_mut(), self.stage_listener.as_mut())
    }

    pub fn go_to_frame(&mut self, frame: i32) {
        self.score_player.go_to_frame(&mut self.runtime, frame);
    }

    pub fn go_to_label(&mut self, label: &str) {
        self.score_player.go_to_label(&mut self.runtime, label);
    }

    pub fn next_frame(&mut self) {
        let next = self.runtime.movie.current_frame + 1;
        self.go_to_frame(next);
    }

    pub fn prev_frame(&mut self) {
        let prev = (self.runtime.movie.current_frame - 1).max(1);
        self.go_to_frame(prev);
    }

    pub fn current_frame(&self) -> i32 {
        self.runtime.movie.current_frame
    }

    pub fn last_frame(&self) -> i32 {
        self.runtime.score.last_frame()
    }

    pub fn tempo(&self) -> u16 {
        self.runtime.movie.tempo
    }

    pub fn is_playing(&self) -> bool {
        self.runtime.movie.playing
    }

    /// §6 "enumerate sprites for current frame": every channel currently
    /// carrying a member.
    pub fn sprites_in_frame(&self) -> Vec<SpriteSnapshot> {
        (1..=self.score_player.sprite_count())
            .filter_map(|n| self.score_player.sprite(n))
            .filter(|s| s.member.is_some())
            .map(|s| SpriteSnapshot {
                channel: s.number,
                loc_h: s.loc_h,
                loc_v: s.loc_v,
                width: s.width,
                height: s.height,
                member: s.member,
                ink: s.ink,
                blend: s.blend,
                visible: s.visible,
            })
            .collect()
    }

    /// §6: routes Lingo `put` output somewhere other than the default
    /// `log::debug!` sink.
    pub fn set_message_sink(&mut self, sink: Box<dyn MessageSink>) {
        self.message_sink = sink;
    }

    /// §6: installs a debug hook fired once per executed instruction.
    pub fn set_trace_listener(&mut self, listener: Box<dyn TraceListener>) {
        self.runtime.trace_listener = listener;
    }

    pub fn clear_trace_listener(&mut self) {
        self.runtime.trace_listener = Box::new(NullTraceListener);
    }

    /// §6 `setStageCallback`: fired once per tick after frame bookkeeping
    /// settles, so a host can repaint.
    pub fn set_stage_callback(&mut self, listener: Box<dyn StageListener>) {
        self.stage_listener = listener;
    }

    /// §6 `registerBuiltin`: installs a host implementation that takes
    /// priority over this crate's default for `name`.
    pub fn register_builtin(&mut self, name: &str, f: BuiltinOverride) {
        self.runtime.builtin_overrides.insert(name.to_string(), f);
    }

    pub fn add_breakpoint(&mut self, breakpoint: Breakpoint) {
        self.runtime.breakpoints.push(breakpoint);
    }

    pub fn remove_breakpoint(&mut self, breakpoint: &Breakpoint) {
        self.runtime.breakpoints.retain(|b| b != breakpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_starts_stopped_at_frame_one() {
        let player = Player::new(RuntimeConfig::default());
        assert!(!player.is_playing());
        assert_eq!(player.current_frame(), 1);
    }

    #[test]
    fn play_then_tick_advances_frame() {
        let mut player = Player::new(RuntimeConfig::default());
        player.runtime.score = runtime::score::Score {
            frames: vec![Default::default(), Default::default()],
            frame_intervals: vec![],
            labels: vec![],
        };
        player.play();
        player.tick().unwrap();
        assert_eq!(player.current_frame(), 2);
    }

    #[test]
    fn register_builtin_overrides_default() {
        use runtime::datum_ref::DatumRef;
        let mut player = Player::new(RuntimeConfig::default());
        player.register_builtin(
            "abs",
            Box::new(|_args, runtime, _sink| Ok(runtime.allocator.alloc(crate::director::lingo::datum::Datum::Int(999)))),
        );
        let result = runtime::builtins::call_builtin(
            "abs",
            &[DatumRef::Void],
            &mut player.runtime,
            &mut NullMessageSink,
        )
        .unwrap();
        assert_eq!(player.runtime.allocator.get_datum(&result).unwrap().int_value().unwrap(), 999);
    }
}
