//! The top-level `Runtime`: the single value a host owns and threads
//! through every call instead of reaching through a process-wide player
//! singleton (§5). Ties together the arena allocator, cast registry, score,
//! scope stack, and the collaborator traits a host supplies.

use std::collections::HashMap;

use crate::director::file::{get_variable_multiplier, DirectorFile};
use crate::runtime::allocator::DatumAllocator;
use crate::runtime::builtins::BuiltinOverride;
use crate::runtime::cast_lib::CastMemberRef;
use crate::runtime::cast_registry::CastRegistry;
use crate::runtime::config::RuntimeConfig;
use crate::runtime::datum_ref::DatumRef;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::net_manager::NetTaskManager;
use crate::runtime::score::Score;
use crate::runtime::script::ScriptInstanceTable;

/// Debug hook a host can install to watch bytecode execution (§6's debug
/// surface). Kept as a plain trait object rather than a channel so a host
/// embedding this synchronously (no executor at hand) can still use it.
pub trait TraceListener {
    fn on_instruction(&mut self, script: CastMemberRef, handler: &str, bytecode_index: usize);
}

pub struct NullTraceListener;
impl TraceListener for NullTraceListener {
    fn on_instruction(&mut self, _script: CastMemberRef, _handler: &str, _bytecode_index: usize) {}
}

/// A breakpoint registered against a handler (§6). The VM checks this set
/// before executing each instruction when `config.log_bytecode_trace` or any
/// breakpoint is armed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Breakpoint {
    pub script: CastMemberRef,
    pub handler_name: String,
    pub bytecode_index: usize,
}

/// Movie-level properties addressed by `GetMovieProp`/`SetMovieProp` and by
/// the score player (§4.5/§6). Distinct from `RuntimeConfig`: these are
/// live, mutable playback state, not startup configuration.
pub struct MovieState {
    pub current_frame: i32,
    pub next_frame: Option<i32>,
    pub playing: bool,
    /// Set by the `pause` builtin (§4.5): distinct from `playing` — a
    /// paused movie still renders the current frame but the score player
    /// stops dispatching `prepareFrame`/`enterFrame`/`stepFrame`/`exitFrame`
    /// and stops advancing `current_frame` until `play` resumes it.
    pub script_paused: bool,
    pub tempo: u16,
    pub exit_lock: bool,
    pub stage_title: String,
    /// Guards the "retarget once per tick" rule (§4.5): set the first time a
    /// handler's `go`/`play` call redirects this tick, cleared at the start
    /// of each new tick.
    pub redirected_this_tick: bool,
}

impl Default for MovieState {
    fn default() -> Self {
        MovieState {
            current_frame: 1,
            next_frame: None,
            playing: false,
            script_paused: false,
            tempo: 15,
            exit_lock: false,
            stage_title: String::new(),
            redirected_this_tick: false,
        }
    }
}

pub struct Runtime {
    pub config: RuntimeConfig,
    pub allocator: DatumAllocator,
    pub script_instances: ScriptInstanceTable,
    pub cast_registry: CastRegistry,
    pub globals: HashMap<String, DatumRef>,
    pub scopes: Vec<crate::runtime::scope::Scope>,
    pub score: Score,
    pub net_manager: NetTaskManager,
    pub dir_version: u16,
    pub capital_x: bool,
    pub movie: MovieState,
    pub last_handler_result: DatumRef,
    pub breakpoints: Vec<Breakpoint>,
    pub file_name: String,
    /// Host overrides installed via `registerBuiltin` (§6); checked before
    /// the default implementation in `call_builtin`.
    pub builtin_overrides: HashMap<String, BuiltinOverride>,
    /// The host's debug hook (§6), fired once per executed instruction.
    pub trace_listener: Box<dyn TraceListener>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Runtime {
        Runtime {
            config,
            allocator: DatumAllocator::new(),
            script_instances: ScriptInstanceTable::new(),
            cast_registry: CastRegistry::empty(),
            globals: HashMap::new(),
            scopes: Vec::new(),
            score: Score::default(),
            net_manager: NetTaskManager::new(),
            dir_version: 0,
            capital_x: false,
            movie: MovieState::default(),
            last_handler_result: DatumRef::Void,
            breakpoints: Vec::new(),
            file_name: String::new(),
            builtin_overrides: HashMap::new(),
            trace_listener: Box::new(NullTraceListener),
        }
    }

    /// Replaces the runtime's loaded state with a freshly parsed movie
    /// (§4.4 "initial load"). External casts referenced by the movie but not
    /// yet fetched stay `NotLoaded`; `ExternalCastLoader` splices them in
    /// later as the host's `ExternalCastFetcher` resolves them.
    pub fn load_movie(&mut self, dir: &DirectorFile) {
        self.dir_version = dir.version;
        self.file_name = dir.file_name.clone();
        self.cast_registry.load_from_dir(dir);
        self.capital_x = self
            .cast_registry
            .casts
            .iter()
            .find(|c| !c.is_external)
            .map(|c| c.capital_x)
            .unwrap_or(false);
        self.score = dir
            .score
            .as_ref()
            .map(|s| Score::from_chunks(s, None))
            .unwrap_or_default();
        self.movie.tempo = self.config.clamp_tempo(dir.config.frame_rate as i32);
        self.movie.current_frame = 1;
        self.net_manager.set_base_path(dir.base_path.clone());
    }

    pub fn variable_multiplier(&self) -> u32 {
        get_variable_multiplier(self.capital_x, self.dir_version)
    }

    pub fn current_scope(&self) -> RuntimeResult<&crate::runtime::scope::Scope> {
        self.scopes.last().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn current_scope_mut(&mut self) -> RuntimeResult<&mut crate::runtime::scope::Scope> {
        self.scopes.last_mut().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn get_movie_prop(&mut self, name: &str) -> RuntimeResult<DatumRef> {
        use crate::director::lingo::datum::Datum;
        let datum = match name {
            "frame" => Datum::Int(self.movie.current_frame),
            "frameLabel" => Datum::String(
                self.score
                    .labels
                    .iter()
                    .find(|l| l.frame_num == self.movie.current_frame)
                    .map(|l| l.name.clone())
                    .unwrap_or_default(),
            ),
            "lastFrame" => Datum::Int(self.score.last_frame()),
            "puppetTempo" | "tempo" => Datum::Int(self.movie.tempo as i32),
            "exitLock" => crate::director::lingo::datum::datum_bool(self.movie.exit_lock),
            "stageTitle" => Datum::String(self.movie.stage_title.clone()),
            "paramCount" => Datum::Int(self.current_scope()?.args.len() as i32),
            "result" => return Ok(self.last_handler_result),
            _ => Datum::Void,
        };
        Ok(self.allocator.alloc(datum))
    }

    pub fn set_movie_prop(&mut self, name: &str, value: DatumRef) -> RuntimeResult<()> {
        let datum = self.allocator.get_datum(&value)?.clone();
        match name {
            "frame" => self.movie.current_frame = datum.int_value()?,
            "puppetTempo" | "tempo" => self.movie.tempo = self.config.clamp_tempo(datum.int_value()?),
            "exitLock" => self.movie.exit_lock = datum.to_bool()?,
            "stageTitle" => self.movie.stage_title = datum.string_value()?,
            _ => {}
        }
        Ok(())
    }
}
