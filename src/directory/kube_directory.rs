use crate::directory::api::{ClusterDirectory, DirectoryError};
use crate::identity::ReplicaRecord;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::{Api, ListParams, Patch, PatchParams};
use std::collections::BTreeMap;
use std::future::Future;
use tokio::time::Duration;

/// KubeDirectory reads replicas from the pods selected by the replication group's headless service.
pub struct KubeDirectory {
    logger: slog::Logger,
    service_name: String,
    services: Api<Service>,
    pods: Api<Pod>,
    request_timeout: Duration,
}

impl KubeDirectory {
    /// Connects with the in-cluster service account (or local kubeconfig when run outside a pod).
    pub async fn connect(
        logger: slog::Logger,
        namespace: &str,
        service_name: &str,
        request_timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let client = kube::Client::try_default()
            .await
            .map_err(|e| DirectoryError::Request {
                operation: "connect",
                target: namespace.to_string(),
                source: Box::new(e),
            })?;

        Ok(Self::new(logger, client, namespace, service_name, request_timeout))
    }

    pub fn new(
        logger: slog::Logger,
        client: kube::Client,
        namespace: &str,
        service_name: &str,
        request_timeout: Duration,
    ) -> Self {
        KubeDirectory {
            logger,
            service_name: service_name.to_string(),
            services: Api::namespaced(client.clone(), namespace),
            pods: Api::namespaced(client, namespace),
            request_timeout,
        }
    }

    async fn group_selector(&self) -> Result<String, DirectoryError> {
        let service = self
            .request("get service", &self.service_name, self.services.get(&self.service_name))
            .await?;

        let selector = service.spec.and_then(|spec| spec.selector).unwrap_or_default();
        if selector.is_empty() {
            return Err(DirectoryError::MissingSelector(self.service_name.clone()));
        }

        Ok(label_selector(&selector))
    }

    async fn request<T, F>(&self, operation: &'static str, target: &str, call: F) -> Result<T, DirectoryError>
    where
        F: Future<Output = Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(DirectoryError::Request {
                operation,
                target: target.to_string(),
                source: Box::new(e),
            }),
            Err(elapsed) => Err(DirectoryError::Request {
                operation,
                target: target.to_string(),
                source: Box::new(elapsed),
            }),
        }
    }
}

#[async_trait::async_trait]
impl ClusterDirectory for KubeDirectory {
    async fn list_replicas(&self) -> Result<Vec<ReplicaRecord>, DirectoryError> {
        let selector = self.group_selector().await?;

        // TODO:2 page through `continue` tokens once groups outgrow a single list response.
        let list_params = ListParams::default().labels(&selector);
        let pods = self.request("list pods", &selector, self.pods.list(&list_params)).await?;

        slog::debug!(self.logger, "Listed {} pods for selector '{}'", pods.items.len(), selector);

        pods.items.into_iter().map(replica_record).collect()
    }

    async fn replace_labels(
        &self,
        replica_name: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<ReplicaRecord, DirectoryError> {
        let patch: json_patch::Patch = serde_json::from_value(serde_json::json!([
            { "op": "replace", "path": "/metadata/labels", "value": labels }
        ]))
        .map_err(|e| DirectoryError::MalformedRecord(format!("label patch for '{}': {}", replica_name, e)))?;

        let patch_params = PatchParams::default();
        let patch = Patch::Json::<()>(patch);
        let pod = self
            .request("patch pod labels", replica_name, self.pods.patch(replica_name, &patch_params, &patch))
            .await?;

        replica_record(pod)
    }
}

fn replica_record(pod: Pod) -> Result<ReplicaRecord, DirectoryError> {
    let name = pod
        .metadata
        .name
        .ok_or_else(|| DirectoryError::MalformedRecord("pod without a name".to_string()))?;
    let labels = pod.metadata.labels.unwrap_or_default();

    let (running, address) = match pod.status {
        Some(status) => (
            status.phase.as_deref() == Some("Running"),
            status.pod_ip.unwrap_or_default(),
        ),
        None => (false, String::new()),
    };

    Ok(ReplicaRecord::new(name, running, address, labels)?)
}

fn label_selector(selector: &BTreeMap<String, String>) -> String {
    selector
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}
