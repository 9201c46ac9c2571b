use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service {0} not found in registry")]
    NotFound(String),
    #[error("service {0} rejected method {1}")]
    MethodFailed(String, String),
}

/// Opaque value passed to and returned from `Service::exec`. The RPC façade
/// (external) and the CLI are the only callers; core components call each
/// other's typed methods directly rather than through this seam.
#[derive(Debug, Clone)]
pub enum ServiceValue {
    Null,
    Text(String),
    Bytes(Vec<u8>),
    Number(i64),
}

/// A named component reachable through the registry by name: components
/// hold capability handles to each other through this registry rather
/// than owning one another.
pub trait Service: Send + Sync {
    fn service_name(&self) -> &str;
    fn exec(&self, method: &str, params: &[ServiceValue]) -> Result<ServiceValue, ServiceError>;
}

#[derive(Default)]
pub struct Registry {
    services: HashMap<String, Arc<dyn Service>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            services: HashMap::new(),
        }
    }

    pub fn register(&mut self, service: Arc<dyn Service>) {
        self.services
            .insert(service.service_name().to_string(), service);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.get(name).cloned()
    }

    pub fn exec(
        &self,
        service_name: &str,
        method: &str,
        params: &[ServiceValue],
    ) -> Result<ServiceValue, ServiceError> {
        let service = self
            .get(service_name)
            .ok_or_else(|| ServiceError::NotFound(service_name.to_string()))?;
        service.exec(method, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;
    impl Service for Echo {
        fn service_name(&self) -> &str {
            "echo"
        }
        fn exec(&self, method: &str, _params: &[ServiceValue]) -> Result<ServiceValue, ServiceError> {
            Ok(ServiceValue::Text(method.to_string()))
        }
    }

    #[test]
    fn registry_dispatches_by_name() {
        let mut registry = Registry::new();
        registry.register(Arc::new(Echo));
        match registry.exec("echo", "ping", &[]).unwrap() {
            ServiceValue::Text(s) => assert_eq!(s, "ping"),
            _ => panic!("unexpected value"),
        }
    }

    #[test]
    fn missing_service_is_reported() {
        let registry = Registry::new();
        assert!(matches!(
            registry.exec("missing", "x", &[]),
            Err(ServiceError::NotFound(_))
        ));
    }
}
