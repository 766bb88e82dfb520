use std::collections::HashMap;

use url::Url;

use crate::runtime::net_task::{HttpMethod, NetResult, NetTask, NetTaskId, NetTaskState};

/// Tracks outstanding network fetches (`preloadNetThing`, `postNetText`,
/// `getNetText`). Unlike the teacher's version there's no `Arc<Mutex<..>>`
/// or background executor here: a `Runtime` only records that a fetch was
/// requested and exposes it via `pending_tasks()`. The host is the one
/// actually driving a `NetClient` future (on whatever executor it owns) and
/// reports completion back through `fulfill_task`. Lingo scripts poll for
/// completion themselves (`netDone(id)`), so the VM never needs to block or
/// suspend waiting on a fetch the way it does for an external cast load.
#[derive(Default)]
pub struct NetTaskManager {
    pub base_path: Option<Url>,
    tasks: HashMap<NetTaskId, NetTask>,
    states: HashMap<NetTaskId, NetTaskState>,
    results: HashMap<NetTaskId, NetResult>,
    next_id: NetTaskId,
}

impl NetTaskManager {
    pub fn new() -> Self {
        NetTaskManager { base_path: None, tasks: HashMap::new(), states: HashMap::new(), results: HashMap::new(), next_id: 1 }
    }

    pub fn set_base_path(&mut self, base_path: Url) {
        self.base_path = Some(base_path);
    }

    fn resolve(&self, url: &str) -> Url {
        match &self.base_path {
            Some(base) => base.join(url).unwrap_or_else(|_| Url::parse(url).unwrap_or_else(|_| base.clone())),
            None => Url::parse(url).unwrap_or_else(|_| Url::parse("about:blank").unwrap()),
        }
    }

    fn find_task_with_url(&self, url: &str, method: HttpMethod) -> Option<NetTaskId> {
        self.tasks.iter().find_map(|(id, task)| {
            if task.url == url && task.method == method { Some(*id) } else { None }
        })
    }

    /// Duplicate calls for an already pending/complete identical URL+method
    /// are coalesced onto the existing task id (§4.6).
    pub fn preload_net_thing(&mut self, url: String) -> NetTaskId {
        if let Some(id) = self.find_task_with_url(&url, HttpMethod::Get) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        let resolved_url = self.resolve(&url);
        self.tasks.insert(id, NetTask { id, url, resolved_url, method: HttpMethod::Get, post_data: None });
        self.states.insert(id, NetTaskState::InProgress);
        id
    }

    pub fn post_net_text(&mut self, url: String, data: String) -> NetTaskId {
        let id = self.next_id;
        self.next_id += 1;
        let resolved_url = self.resolve(&url);
        self.tasks.insert(id, NetTask { id, url, resolved_url, method: HttpMethod::Post, post_data: Some(data) });
        self.states.insert(id, NetTaskState::InProgress);
        id
    }

    pub fn get_task(&self, id: NetTaskId) -> Option<&NetTask> {
        self.tasks.get(&id)
    }

    pub fn is_task_done(&self, id: NetTaskId) -> bool {
        matches!(self.states.get(&id), Some(NetTaskState::Done))
    }

    pub fn get_task_result(&self, id: NetTaskId) -> Option<&NetResult> {
        self.results.get(&id)
    }

    /// Called by the host once its `NetClient` future for `id` resolves.
    pub fn fulfill_task(&mut self, id: NetTaskId, result: NetResult) {
        self.states.insert(id, NetTaskState::Done);
        self.results.insert(id, result);
    }

    pub fn pending_tasks(&self) -> Vec<&NetTask> {
        self.tasks
            .iter()
            .filter(|(id, _)| !self.is_task_done(**id))
            .map(|(_, task)| task)
            .collect()
    }
}
