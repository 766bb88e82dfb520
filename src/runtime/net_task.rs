use url::Url;

pub type NetTaskId = u32;
pub type NetResult = Result<Vec<u8>, i32>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Clone)]
pub struct NetTask {
    pub id: NetTaskId,
    pub url: String,
    pub resolved_url: Url,
    pub method: HttpMethod,
    pub post_data: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NetTaskState {
    InProgress,
    Done,
}
