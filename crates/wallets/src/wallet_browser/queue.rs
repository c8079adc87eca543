use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

use crate::wallet_browser::types::Identified;

/// Requests waiting for the page, and the answers it posted back.
#[derive(Debug)]
pub(crate) struct RequestQueue<Req, Res> {
    requests: VecDeque<Req>,
    responses: HashMap<Uuid, Res>,
}

impl<Req: Identified, Res> RequestQueue<Req, Res> {
    pub fn new() -> Self {
        Self { requests: VecDeque::new(), responses: HashMap::new() }
    }

    pub fn add_request(&mut self, request: Req) {
        self.requests.push_back(request);
    }

    pub fn has_request(&self, id: &Uuid) -> bool {
        self.requests.iter().any(|req| req.id() == *id)
    }

    /// The oldest request the page has not answered yet.
    pub fn read_request(&self) -> Option<&Req> {
        self.requests.front()
    }

    pub fn remove_request(&mut self, id: &Uuid) {
        self.requests.retain(|req| req.id() != *id);
    }

    pub fn add_response(&mut self, id: Uuid, response: Res) {
        self.responses.insert(id, response);
    }

    pub fn get_response(&mut self, id: &Uuid) -> Option<Res> {
        self.responses.remove(id)
    }
}
