// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::{
	api::{Api, AttachParams, DeleteParams, Patch, PatchParams, PostParams},
	config::{KubeConfigOptions, Kubeconfig},
	Client, Config,
};
use serde_json::{json, Map, Value};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::client::ClusterControlClient;
use crate::error::{K8sError, K8sResult};
use crate::exec_listener::ExecCompletionListener;
use crate::types::{
	ClusterAuth, ClusterEndpoint, ExecOutcome, ExecParams, Pod, Secret, ABNORMAL_CLOSURE, COMMAND_FAILED,
	NORMAL_CLOSURE,
};

const KUBECONFIG_ENTRY: &str = "loom-ci-target";

/// Tunables for [`KubeClient`].
#[derive(Debug, Clone)]
pub struct KubeClientOptions {
	/// Field manager recorded on server-side applied secrets.
	pub field_manager: String,
	pub delete_grace_period_secs: u32,
}

impl Default for KubeClientOptions {
	fn default() -> Self {
		Self {
			field_manager: "loom-ci-delegate".to_string(),
			delete_grace_period_secs: 30,
		}
	}
}

/// Production cluster client implementation using the kube crate.
pub struct KubeClient {
	client: Client,
	options: KubeClientOptions,
}

impl KubeClient {
	pub fn from_client(client: Client, options: KubeClientOptions) -> Self {
		Self { client, options }
	}

	/// Build a client for one task from explicit connection settings.
	///
	/// The settings are rendered into an in-memory kubeconfig so that TLS,
	/// auth and proxy handling follow kube's own kubeconfig semantics.
	pub async fn connect(endpoint: &ClusterEndpoint, options: KubeClientOptions) -> K8sResult<Self> {
		let connection_error = |message: String| K8sError::Connection {
			master_url: endpoint.master_url.clone(),
			message,
		};

		let kubeconfig = render_kubeconfig(endpoint).map_err(|e| connection_error(e.to_string()))?;
		let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
			.await
			.map_err(|e| connection_error(e.to_string()))?;
		let client = Client::try_from(config).map_err(|e| connection_error(e.to_string()))?;

		debug!(
			master_url = %endpoint.master_url,
			namespace = %endpoint.namespace,
			proxied = endpoint.proxy_url.is_some(),
			"K8s client initialized"
		);
		Ok(Self::from_client(client, options))
	}
}

fn render_kubeconfig(endpoint: &ClusterEndpoint) -> Result<Kubeconfig, serde_json::Error> {
	let mut cluster = Map::new();
	cluster.insert("server".into(), json!(endpoint.master_url));
	if let Some(ca) = &endpoint.ca_cert_data {
		cluster.insert("certificate-authority-data".into(), json!(ca));
	}
	if endpoint.skip_tls_verify {
		cluster.insert("insecure-skip-tls-verify".into(), json!(true));
	}
	if let Some(proxy) = &endpoint.proxy_url {
		cluster.insert("proxy-url".into(), json!(proxy));
	}

	let user = match &endpoint.auth {
		ClusterAuth::None => json!({}),
		ClusterAuth::Token(token) => json!({ "token": token.expose() }),
		ClusterAuth::Basic { username, password } => {
			json!({ "username": username, "password": password.expose() })
		}
		ClusterAuth::ClientCertificate {
			cert_data,
			key_data,
		} => json!({
			"client-certificate-data": cert_data,
			"client-key-data": key_data.expose(),
		}),
	};

	serde_json::from_value(json!({
		"apiVersion": "v1",
		"kind": "Config",
		"clusters": [{ "name": KUBECONFIG_ENTRY, "cluster": Value::Object(cluster) }],
		"users": [{ "name": KUBECONFIG_ENTRY, "user": user }],
		"contexts": [{
			"name": KUBECONFIG_ENTRY,
			"context": {
				"cluster": KUBECONFIG_ENTRY,
				"user": KUBECONFIG_ENTRY,
				"namespace": endpoint.namespace,
			},
		}],
		"current-context": KUBECONFIG_ENTRY,
	}))
}

#[async_trait]
impl ClusterControlClient for KubeClient {
	#[instrument(skip(self, secret), fields(secret_name = tracing::field::Empty))]
	async fn apply_secret(&self, namespace: &str, secret: Option<Secret>) -> Result<(), K8sError> {
		let Some(secret) = secret else {
			return Ok(());
		};
		let name = secret
			.metadata
			.name
			.clone()
			.ok_or_else(|| K8sError::ApiError {
				message: "secret has no name".to_string(),
			})?;
		tracing::Span::current().record("secret_name", name.as_str());

		let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
		let params = PatchParams::apply(&self.options.field_manager).force();
		secrets.patch(&name, &params, &Patch::Apply(&secret)).await?;
		debug!(secret = %name, "Secret applied");
		Ok(())
	}

	async fn create_pod(&self, namespace: &str, pod: Pod) -> Result<Pod, K8sError> {
		let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
		let pod = pods.create(&PostParams::default(), &pod).await?;
		Ok(pod)
	}

	async fn delete_pod(&self, name: &str, namespace: &str) -> Result<bool, K8sError> {
		let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
		let dp = DeleteParams {
			grace_period_seconds: Some(self.options.delete_grace_period_secs),
			..Default::default()
		};
		match pods.delete(name, &dp).await {
			Ok(outcome) => Ok(outcome.either(|_| true, |status| status.is_success())),
			Err(kube::Error::Api(err)) if err.code == 404 => {
				debug!(pod = %name, namespace = %namespace, "Pod not found, nothing deleted");
				Ok(false)
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn exec_in_container(
		&self,
		params: ExecParams,
		interrupt: &CancellationToken,
	) -> Result<ExecOutcome, K8sError> {
		let listener = Arc::new(ExecCompletionListener::new());
		let pods: Api<Pod> = Api::namespaced(self.client.clone(), &params.namespace);

		info!(
			pod = %params.pod,
			container = %params.container,
			namespace = %params.namespace,
			timeout_secs = params.timeout.as_secs(),
			"Executing command in container"
		);

		tokio::spawn(drive_exec(
			pods,
			params.pod,
			params.container,
			params.command,
			listener.clone(),
		));

		if listener.wait_for_completion(params.timeout, interrupt).await? {
			Ok(ExecOutcome::succeeded())
		} else {
			Ok(ExecOutcome::failed(listener.reason().map(str::to_string)))
		}
	}
}

/// Owns the exec websocket and reports its outcome to `listener`.
async fn drive_exec(
	pods: Api<Pod>,
	pod: String,
	container: String,
	command: Vec<String>,
	listener: Arc<ExecCompletionListener>,
) {
	let closed = listener.stream_token();
	let ap = AttachParams::default()
		.container(container)
		.stdin(false)
		.stdout(true)
		.stderr(true);

	let opened = tokio::select! {
		_ = closed.cancelled() => {
			debug!(pod = %pod, "Exec stream closed before it opened");
			return;
		}
		opened = pods.exec(&pod, command, &ap) => opened,
	};

	let mut attached = match opened {
		Ok(attached) => attached,
		Err(e) => {
			listener.on_failure(&e.to_string());
			return;
		}
	};
	listener.on_open();

	let status = attached.take_status();
	let stdout = attached.stdout();
	let stderr = attached.stderr();

	tokio::select! {
		_ = closed.cancelled() => {
			attached.abort();
			debug!(pod = %pod, "Exec stream closed by waiter");
		}
		(code, reason) = observe_exec(status, stdout, stderr) => {
			listener.on_close(code, &reason);
		}
	}
}

/// Wait for the exec status frame while draining output, and map it to a
/// close code.
async fn observe_exec<S, O, E>(status: Option<S>, stdout: Option<O>, stderr: Option<E>) -> (u16, String)
where
	S: Future<Output = Option<Status>>,
	O: AsyncRead + Unpin,
	E: AsyncRead + Unpin,
{
	let Some(status) = status else {
		return (
			ABNORMAL_CLOSURE,
			"exec status channel unavailable".to_string(),
		);
	};

	let (status, _, _) = tokio::join!(status, drain(stdout), drain(stderr));
	close_code_for(status)
}

fn close_code_for(status: Option<Status>) -> (u16, String) {
	match status {
		Some(status) if status.status.as_deref() == Some("Success") => (NORMAL_CLOSURE, String::new()),
		Some(status) => (
			COMMAND_FAILED,
			status
				.message
				.or(status.reason)
				.unwrap_or_else(|| "command failed".to_string()),
		),
		None => (
			ABNORMAL_CLOSURE,
			"exec stream ended without a status".to_string(),
		),
	}
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) {
	if let Some(mut reader) = reader {
		if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
			debug!(error = %e, "Exec output stream ended with error");
		}
	}
}
