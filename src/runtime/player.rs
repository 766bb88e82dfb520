//! The score player (§4.5): the deterministic per-tick frame-transition
//! sequence and the event-dispatch cascade it drives. Grounded on the
//! teacher's `player/mod.rs::run_frame_loop` (tick sequencing) and
//! `player/events.rs` (instance-then-static dispatch order, `pass`
//! propagation).

use std::collections::HashMap;

use crate::director::enums::ScriptType;
use crate::director::lingo::datum::Datum;
use crate::runtime::builtins::MessageSink;
use crate::runtime::cast_lib::{CastMemberRef, PreloadReason};
use crate::runtime::datum_ref::DatumRef;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::movie::Runtime;
use crate::runtime::score::{apply_channel_to_sprite, FrameChannelData};
use crate::runtime::script_ref::ScriptInstanceRef;
use crate::runtime::sprite::Sprite;
use crate::runtime::vm::call_handler_checked;

/// Host hook fired once per tick after frame bookkeeping settles (§4.5's
/// `frameChanged` notification). A host with no stage to repaint can just
/// use `NullStageListener`.
pub trait StageListener {
    fn on_frame_changed(&mut self, frame: i32);
}

pub struct NullStageListener;
impl StageListener for NullStageListener {
    fn on_frame_changed(&mut self, _frame: i32) {}
}

/// Persistent sprite-channel state plus the bookkeeping needed to run the
/// frame-transition sequence. Distinct from `Score` (the read-only,
/// parsed-once timeline): this is the player's live, mutating view of it.
pub struct ScorePlayer {
    sprites: Vec<Sprite>,
    /// Tracks which behavior (interval) has already been instantiated onto
    /// which sprite, so a still-active interval doesn't get a fresh
    /// `ScriptInstanceRef` every tick.
    behavior_instances: HashMap<(usize, CastMemberRef), ScriptInstanceRef>,
    /// Library numbers flagged `AfterFrameOne` the instant playback first
    /// leaves frame 1 this movie (§4.4). The VM/player can't await a fetch
    /// itself (§5), so a host drains this once per tick and hands it to
    /// `Player::preload_casts(PreloadReason::AfterFrameOne, ...)`.
    pending_after_frame_one: Vec<u32>,
}

impl ScorePlayer {
    pub fn new() -> ScorePlayer {
        ScorePlayer { sprites: Vec::new(), behavior_instances: HashMap::new(), pending_after_frame_one: Vec::new() }
    }

    /// Takes and clears the set of external casts now due for
    /// `AfterFrameOne` preload (§4.4). Empty once a host has drained it.
    pub fn take_pending_after_frame_one_casts(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.pending_after_frame_one)
    }

    pub fn sprite(&self, number: usize) -> Option<&Sprite> {
        number.checked_sub(1).and_then(|i| self.sprites.get(i))
    }

    pub fn sprite_mut(&mut self, number: usize) -> &mut Sprite {
        self.ensure_sprite(number)
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    fn ensure_sprite(&mut self, number: usize) -> &mut Sprite {
        while self.sprites.len() < number {
            let n = self.sprites.len() + 1;
            self.sprites.push(Sprite::new(n));
        }
        &mut self.sprites[number - 1]
    }

    /// §4.5 step 1: overlay this frame's authored channel data onto
    /// persistent, non-puppet sprites; channels with no authored data at
    /// this frame reset to defaults. Returns the channel numbers that just
    /// transitioned from "no member" to "has a member", for `beginSprite`.
    fn apply_frame(&mut self, runtime: &Runtime) -> Vec<usize> {
        let frame_num = runtime.movie.current_frame;
        let authored: HashMap<usize, FrameChannelData> = runtime
            .score
            .frame(frame_num)
            .map(|f| f.sprites.iter().map(|(k, v)| (*k, v.clone())).collect())
            .unwrap_or_default();
        let max_channel = authored.keys().copied().max().unwrap_or(0).max(self.sprites.len());
        let mut began = Vec::new();
        for number in 1..=max_channel {
            let had_member = self.sprite(number).and_then(|s| s.member).is_some();
            let sprite = self.ensure_sprite(number);
            if !sprite.puppet {
                match authored.get(&number) {
                    Some(data) => apply_channel_to_sprite(sprite, data),
                    None => sprite.reset(),
                }
            }
            if !had_member && sprite.member.is_some() {
                began.push(number);
            }
        }
        began
    }

    /// Instantiates a behavior script onto a sprite the first time its
    /// `FrameInterval` becomes active, and attaches it to
    /// `sprite.script_instance_list` so it joins the ordinary dispatch
    /// cascade alongside any puppet-attached instances.
    fn attach_active_behaviors(&mut self, runtime: &mut Runtime, sink: &mut dyn MessageSink) -> RuntimeResult<()> {
        let intervals: Vec<(usize, CastMemberRef)> = runtime
            .score
            .active_intervals(runtime.movie.current_frame)
            .into_iter()
            .map(|iv| (iv.channel, iv.script))
            .collect();
        for (channel, script_ref) in intervals {
            if channel == 0 {
                continue;
            }
            let instance_ref = match self.behavior_instances.get(&(channel, script_ref)) {
                Some(existing) => *existing,
                None => {
                    let instance = crate::runtime::vm::new_script_instance(runtime, script_ref, Vec::new(), sink)?;
                    let Datum::ScriptInstanceRef(instance_ref) = runtime.allocator.get_datum(&instance)?.clone() else {
                        continue;
                    };
                    self.behavior_instances.insert((channel, script_ref), instance_ref);
                    instance_ref
                }
            };
            let sprite = self.ensure_sprite(channel);
            if !sprite.script_instance_list.contains(&instance_ref) {
                sprite.script_instance_list.push(instance_ref);
            }
        }
        Ok(())
    }

    pub fn begin_sprites(&mut self, runtime: &mut Runtime, sink: &mut dyn MessageSink) -> RuntimeResult<Vec<usize>> {
        let began = self.apply_frame(runtime);
        self.attach_active_behaviors(runtime, sink)?;
        for sprite in &mut self.sprites {
            sprite.entered = true;
            sprite.exited = false;
        }
        Ok(began)
    }

    pub fn end_sprites(&mut self) {
        for sprite in &mut self.sprites {
            sprite.exited = true;
        }
    }

    /// Applies `next_frame` (or falls through to `current + 1`), wrapping to
    /// frame 1 at the end of the score while playing (§9's decided open
    /// question).
    pub fn advance_frame(&self, runtime: &mut Runtime) {
        let target = runtime.movie.next_frame.take().unwrap_or(runtime.movie.current_frame + 1);
        let last = runtime.score.last_frame();
        runtime.movie.current_frame = if target > last { 1 } else { target.max(1) };
    }

    /// One full `run_frame_loop` iteration (§4.5): no-op unless the movie is
    /// `PLAYING` and not script-paused.
    pub fn tick(
        &mut self,
        runtime: &mut Runtime,
        sink: &mut dyn MessageSink,
        stage: &mut dyn StageListener,
    ) -> RuntimeResult<()> {
        if !runtime.movie.playing || runtime.movie.script_paused {
            return Ok(());
        }
        runtime.movie.redirected_this_tick = false;
        let began = self.begin_sprites(runtime, sink)?;
        for number in began {
            dispatch_sprite_event(runtime, self, number, "beginSprite", vec![], sink)?;
        }
        dispatch_event(runtime, self, "prepareFrame", vec![], sink)?;
        dispatch_event(runtime, self, "enterFrame", vec![], sink)?;

        let starting_frame = runtime.movie.current_frame;
        let actor_list = collect_actor_list(runtime);
        for actor in actor_list {
            if !runtime.movie.playing {
                break;
            }
            if !actor_is_active(runtime, self, actor) {
                continue;
            }
            invoke_handler_if_present(runtime, actor, "stepFrame", vec![], sink)?;
        }

        if starting_frame == 1 && runtime.movie.next_frame.unwrap_or(2) != 1 {
            let pending = runtime.cast_registry.casts_pending_preload(PreloadReason::AfterFrameOne);
            if !pending.is_empty() {
                log::debug!("casts pending AFTER_FRAME_ONE preload: {:?}", pending);
                self.pending_after_frame_one.extend(pending);
            }
        }

        if !runtime.movie.redirected_this_tick {
            dispatch_event(runtime, self, "exitFrame", vec![], sink)?;
        }
        self.end_sprites();
        self.advance_frame(runtime);
        stage.on_frame_changed(runtime.movie.current_frame);
        Ok(())
    }

    pub fn go_to_frame(&mut self, runtime: &mut Runtime, frame: i32) {
        runtime.movie.next_frame = Some(frame);
    }

    pub fn go_to_label(&mut self, runtime: &mut Runtime, label: &str) {
        match runtime.score.resolve_label(label) {
            Some(frame) => runtime.movie.next_frame = Some(frame),
            None => log::warn!("goToLabel: unknown label \"{}\"", label),
        }
    }
}

impl Default for ScorePlayer {
    fn default() -> Self {
        ScorePlayer::new()
    }
}

fn collect_actor_list(runtime: &Runtime) -> Vec<ScriptInstanceRef> {
    let Some(actor_list_ref) = runtime.globals.get("actorList").copied() else {
        return Vec::new();
    };
    let Ok(datum) = runtime.allocator.get_datum(&actor_list_ref) else {
        return Vec::new();
    };
    let Ok(items) = datum.to_list() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match runtime.allocator.get_datum(item) {
            Ok(Datum::ScriptInstanceRef(r)) => Some(*r),
            _ => None,
        })
        .collect()
}

fn actor_is_active(runtime: &Runtime, _player: &ScorePlayer, actor: ScriptInstanceRef) -> bool {
    runtime.script_instances.get(actor).is_ok()
}

fn invoke_handler_if_present(
    runtime: &mut Runtime,
    instance: ScriptInstanceRef,
    event: &str,
    args: Vec<DatumRef>,
    sink: &mut dyn MessageSink,
) -> RuntimeResult<()> {
    match call_handler_checked(runtime, CastMemberRef::default(), event, Some(instance), args, sink) {
        Ok(_) => Ok(()),
        Err(RuntimeError::UndefinedHandler { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Flattens every active sprite channel's attached instances, in channel
/// order, plus any global variable currently bound to a script instance
/// (§4.5 "Event dispatch order", clause (a)).
fn active_instances(runtime: &Runtime, player: &ScorePlayer) -> Vec<ScriptInstanceRef> {
    let mut result = Vec::new();
    for sprite in &player.sprites {
        if sprite.member.is_none() {
            continue;
        }
        result.extend(sprite.script_instance_list.iter().copied());
    }
    for value in runtime.globals.values() {
        if let Ok(Datum::ScriptInstanceRef(r)) = runtime.allocator.get_datum(value) {
            result.push(*r);
        }
    }
    result
}

/// One sprite channel's attached instances only — used for `beginSprite`,
/// which targets the channel that just gained a member, not every active
/// channel.
fn sprite_instances(player: &ScorePlayer, number: usize) -> Vec<ScriptInstanceRef> {
    player.sprite(number).map(|s| s.script_instance_list.clone()).unwrap_or_default()
}

/// Walks clause (a) of §4.5's event dispatch order against a fixed instance
/// list: each candidate's handler runs if present; a handler that doesn't
/// call `pass` ends the whole cascade (returns `true`). Errors other than
/// "no such handler" propagate immediately.
fn invoke_event_to_instances(
    runtime: &mut Runtime,
    instances: &[ScriptInstanceRef],
    event: &str,
    args: &[DatumRef],
    sink: &mut dyn MessageSink,
) -> RuntimeResult<bool> {
    for &instance in instances {
        match call_handler_checked(runtime, CastMemberRef::default(), event, Some(instance), args.to_vec(), sink) {
            Ok((_, passed)) => {
                if !passed {
                    return Ok(true);
                }
            }
            Err(RuntimeError::UndefinedHandler { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

/// Clause (b): the frame script, then movie scripts in cast/load order,
/// checking `has_handler` before calling so an absent handler doesn't count
/// as "handled but passed".
fn invoke_static_event(runtime: &mut Runtime, event: &str, args: &[DatumRef], sink: &mut dyn MessageSink) -> RuntimeResult<bool> {
    if let Some(script_ref) = runtime.score.frame(runtime.movie.current_frame).and_then(|f| f.script_member) {
        if try_static_handler(runtime, script_ref, event, args, sink)? {
            return Ok(true);
        }
    }
    for script_ref in movie_script_refs(runtime) {
        if try_static_handler(runtime, script_ref, event, args, sink)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn try_static_handler(
    runtime: &mut Runtime,
    script_ref: CastMemberRef,
    event: &str,
    args: &[DatumRef],
    sink: &mut dyn MessageSink,
) -> RuntimeResult<bool> {
    let has_handler = runtime
        .cast_registry
        .get_script(script_ref)
        .map(|s| s.get_own_handler(event).is_some())
        .unwrap_or(false);
    if !has_handler {
        return Ok(false);
    }
    let (_, passed) = call_handler_checked(runtime, script_ref, event, None, args.to_vec(), sink)?;
    Ok(!passed)
}

/// Movie-type scripts across every loaded cast, library order then member
/// order (the same load order `resolve_cascade` uses for `extCall`).
fn movie_script_refs(runtime: &Runtime) -> Vec<CastMemberRef> {
    let mut refs = Vec::new();
    for cast in &runtime.cast_registry.casts {
        let mut numbers: Vec<&u32> = cast.scripts.keys().collect();
        numbers.sort();
        for number in numbers {
            let script = &cast.scripts[number];
            if script.script_type == ScriptType::Movie {
                refs.push(script.member_ref);
            }
        }
    }
    refs
}

/// Dispatches one global score event (`prepareFrame`/`enterFrame`/
/// `exitFrame`) through the full cascade, retargeting at most once per tick
/// if a handler calls `go`/`play` partway through (§4.5's "retarget once per
/// tick" rule).
fn dispatch_event(runtime: &mut Runtime, player: &ScorePlayer, event: &str, args: Vec<DatumRef>, sink: &mut dyn MessageSink) -> RuntimeResult<()> {
    let before_frame = runtime.movie.next_frame;
    let instances = active_instances(runtime, player);
    if invoke_event_to_instances(runtime, &instances, event, &args, sink)? {
        maybe_mark_redirect(runtime, before_frame);
        return Ok(());
    }
    invoke_static_event(runtime, event, &args, sink)?;
    maybe_mark_redirect(runtime, before_frame);
    Ok(())
}

fn dispatch_sprite_event(
    runtime: &mut Runtime,
    player: &ScorePlayer,
    sprite_number: usize,
    event: &str,
    args: Vec<DatumRef>,
    sink: &mut dyn MessageSink,
) -> RuntimeResult<()> {
    let before_frame = runtime.movie.next_frame;
    let instances = sprite_instances(player, sprite_number);
    if invoke_event_to_instances(runtime, &instances, event, &args, sink)? {
        maybe_mark_redirect(runtime, before_frame);
        return Ok(());
    }
    invoke_static_event(runtime, event, &args, sink)?;
    maybe_mark_redirect(runtime, before_frame);
    Ok(())
}

fn maybe_mark_redirect(runtime: &mut Runtime, before_frame: Option<i32>) {
    if !runtime.movie.redirected_this_tick && runtime.movie.next_frame.is_some() && runtime.movie.next_frame != before_frame {
        runtime.movie.redirected_this_tick = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::builtins::NullMessageSink;
    use crate::runtime::config::RuntimeConfig;
    use crate::runtime::score::{Frame, Score};

    fn runtime_with_one_frame() -> Runtime {
        let mut runtime = Runtime::new(RuntimeConfig::default());
        runtime.score = Score { frames: vec![Frame::default(), Frame::default()], frame_intervals: vec![], labels: vec![] };
        runtime.movie.current_frame = 1;
        runtime.movie.playing = true;
        runtime
    }

    #[test]
    fn tick_advances_frame_when_playing() {
        let mut runtime = runtime_with_one_frame();
        let mut player = ScorePlayer::new();
        player.tick(&mut runtime, &mut NullMessageSink, &mut NullStageListener).unwrap();
        assert_eq!(runtime.movie.current_frame, 2);
    }

    #[test]
    fn tick_is_noop_when_stopped() {
        let mut runtime = runtime_with_one_frame();
        runtime.movie.playing = false;
        let mut player = ScorePlayer::new();
        player.tick(&mut runtime, &mut NullMessageSink, &mut NullStageListener).unwrap();
        assert_eq!(runtime.movie.current_frame, 1);
    }

    #[test]
    fn tick_wraps_to_frame_one_past_last_frame() {
        let mut runtime = runtime_with_one_frame();
        runtime.movie.current_frame = 2;
        let mut player = ScorePlayer::new();
        player.tick(&mut runtime, &mut NullMessageSink, &mut NullStageListener).unwrap();
        assert_eq!(runtime.movie.current_frame, 1);
    }

    #[test]
    fn go_to_label_warns_and_leaves_next_frame_unset_on_unknown_label() {
        let mut runtime = runtime_with_one_frame();
        let mut player = ScorePlayer::new();
        player.go_to_label(&mut runtime, "nowhere");
        assert_eq!(runtime.movie.next_frame, None);
    }

    #[test]
    fn ensure_sprite_grows_and_is_addressable() {
        let mut player = ScorePlayer::new();
        player.sprite_mut(3).visible = false;
        assert_eq!(player.sprite_count(), 3);
        assert!(!player.sprite(3).unwrap().visible);
        assert!(player.sprite(1).unwrap().visible);
    }
}
