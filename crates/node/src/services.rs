use cerera_chain::Chain;
use cerera_eventbus::{Service, ServiceError, ServiceValue};
use cerera_mempool::Mempool;
use std::sync::Arc;

/// Bridges the mempool's own (synchronous) API onto the `Service` seam so
/// an external RPC façade can reach it by name through the registry.
pub struct MempoolService {
    pool: Mempool,
}

impl MempoolService {
    pub fn new(pool: Mempool) -> Self {
        MempoolService { pool }
    }
}

impl Service for MempoolService {
    fn service_name(&self) -> &str {
        "mempool"
    }

    fn exec(&self, method: &str, _params: &[ServiceValue]) -> Result<ServiceValue, ServiceError> {
        match method {
            "size" => Ok(ServiceValue::Number(self.pool.info().size as i64)),
            "bytes" => Ok(ServiceValue::Number(self.pool.info().bytes as i64)),
            other => Err(ServiceError::MethodFailed(
                self.service_name().to_string(),
                other.to_string(),
            )),
        }
    }
}

/// Bridges the chain's async API onto the synchronous `Service` seam.
/// `exec` blocks the calling thread on the chain's (short-lived) lock; a
/// real RPC façade calls this from its own worker pool, never from a task
/// already driving the node's async runtime.
pub struct ChainService {
    chain: Arc<Chain>,
}

impl ChainService {
    pub fn new(chain: Arc<Chain>) -> Self {
        ChainService { chain }
    }
}

impl Service for ChainService {
    fn service_name(&self) -> &str {
        "chain"
    }

    fn exec(&self, method: &str, _params: &[ServiceValue]) -> Result<ServiceValue, ServiceError> {
        match method {
            "height" => {
                let info = futures::executor::block_on(self.chain.get_info());
                Ok(ServiceValue::Number(info.height as i64))
            }
            "head_hash" => {
                let head = futures::executor::block_on(self.chain.get_latest());
                Ok(ServiceValue::Text(head.hash.to_hex()))
            }
            other => Err(ServiceError::MethodFailed(
                self.service_name().to_string(),
                other.to_string(),
            )),
        }
    }
}
