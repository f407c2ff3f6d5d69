use super::{ExecutionTarget, LOCAL_NODE_NAME};
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::scan;
use filesfound_protocol::{ScanReply, ScanRequest};

/// The controller itself. Always reachable.
#[derive(Debug, Default)]
pub struct LocalTarget;

impl LocalTarget {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionTarget for LocalTarget {
    fn name(&self) -> &str {
        LOCAL_NODE_NAME
    }

    fn is_reachable(&self) -> bool {
        true
    }

    fn scan(&self, request: &ScanRequest, cancel: &CancelToken) -> Result<ScanReply> {
        scan::scan(request, cancel)
    }
}
