// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use loom_ci_delegate::{
	AppliedSecrets, ClusterClientFactory, ClusterConnectionConfig, ConnectionAuth, ContainerParams,
	EncryptedDataDetail, EncryptedRef, EncryptionService, PodParams, PodSpecBuilder,
	RegistryCredential, TaskError, TaskResult,
};
use loom_ci_k8s::{
	ClusterControlClient, Container, ExecOutcome, ExecParams, K8sError, ObjectMeta, Pod, PodSpec, Secret,
};
use loom_common_secret::SecretString;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub enum Call {
	ApplySecret {
		namespace: String,
		name: Option<String>,
	},
	CreatePod {
		namespace: String,
		name: Option<String>,
	},
	DeletePod {
		namespace: String,
		name: String,
	},
	Exec(ExecParams),
}

#[derive(Debug, Clone)]
pub enum DeleteOutcome {
	Deleted,
	Absent,
	Error(String),
}

#[derive(Debug, Clone)]
pub enum ExecBehavior {
	Succeeded,
	/// Completes unsuccessfully with the given stream reason.
	Failed(Option<String>),
	Timeout,
	/// Blocks until the interrupt token is cancelled.
	WaitForInterrupt,
	Error(String),
}

pub struct MockClusterClient {
	calls: Mutex<Vec<Call>>,
	create_error: Mutex<Option<String>>,
	/// 1-based index of the applied secret that fails, and its message.
	apply_failure: Mutex<Option<(usize, String)>>,
	applies: AtomicUsize,
	delete_outcome: Mutex<DeleteOutcome>,
	exec_behavior: Mutex<ExecBehavior>,
}

impl MockClusterClient {
	pub fn new() -> Self {
		Self {
			calls: Mutex::new(Vec::new()),
			create_error: Mutex::new(None),
			apply_failure: Mutex::new(None),
			applies: AtomicUsize::new(0),
			delete_outcome: Mutex::new(DeleteOutcome::Deleted),
			exec_behavior: Mutex::new(ExecBehavior::Succeeded),
		}
	}

	pub fn fail_create_pod(&self, message: &str) {
		*self.create_error.lock().unwrap() = Some(message.to_string());
	}

	/// Fail the `nth` non-empty secret application (1-based).
	pub fn fail_apply_secret_on(&self, nth: usize, message: &str) {
		*self.apply_failure.lock().unwrap() = Some((nth, message.to_string()));
	}

	pub fn set_delete_outcome(&self, outcome: DeleteOutcome) {
		*self.delete_outcome.lock().unwrap() = outcome;
	}

	pub fn set_exec_behavior(&self, behavior: ExecBehavior) {
		*self.exec_behavior.lock().unwrap() = behavior;
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().unwrap().clone()
	}

	pub fn create_pod_calls(&self) -> usize {
		self.calls()
			.iter()
			.filter(|c| matches!(c, Call::CreatePod { .. }))
			.count()
	}

	fn record(&self, call: Call) {
		self.calls.lock().unwrap().push(call);
	}
}

#[async_trait]
impl ClusterControlClient for MockClusterClient {
	async fn apply_secret(&self, namespace: &str, secret: Option<Secret>) -> Result<(), K8sError> {
		if let Some(secret) = secret {
			let nth = self.applies.fetch_add(1, Ordering::SeqCst) + 1;
			if let Some((fail_on, message)) = self.apply_failure.lock().unwrap().clone() {
				if fail_on == nth {
					return Err(K8sError::ApiError { message });
				}
			}
			self.record(Call::ApplySecret {
				namespace: namespace.to_string(),
				name: secret.metadata.name,
			});
		}
		Ok(())
	}

	async fn create_pod(&self, namespace: &str, pod: Pod) -> Result<Pod, K8sError> {
		self.record(Call::CreatePod {
			namespace: namespace.to_string(),
			name: pod.metadata.name.clone(),
		});
		match self.create_error.lock().unwrap().clone() {
			Some(message) => Err(K8sError::ApiError { message }),
			None => Ok(pod),
		}
	}

	async fn delete_pod(&self, name: &str, namespace: &str) -> Result<bool, K8sError> {
		self.record(Call::DeletePod {
			namespace: namespace.to_string(),
			name: name.to_string(),
		});
		match self.delete_outcome.lock().unwrap().clone() {
			DeleteOutcome::Deleted => Ok(true),
			DeleteOutcome::Absent => Ok(false),
			DeleteOutcome::Error(message) => Err(K8sError::ApiError { message }),
		}
	}

	async fn exec_in_container(
		&self,
		params: ExecParams,
		interrupt: &CancellationToken,
	) -> Result<ExecOutcome, K8sError> {
		self.record(Call::Exec(params));
		let behavior = self.exec_behavior.lock().unwrap().clone();
		match behavior {
			ExecBehavior::Succeeded => Ok(ExecOutcome::succeeded()),
			ExecBehavior::Failed(reason) => Ok(ExecOutcome::failed(reason)),
			ExecBehavior::Timeout => Err(K8sError::Timeout),
			ExecBehavior::WaitForInterrupt => {
				interrupt.cancelled().await;
				Err(K8sError::Interrupted)
			}
			ExecBehavior::Error(message) => Err(K8sError::StreamError { message }),
		}
	}
}

pub struct MockFactory {
	client: Arc<MockClusterClient>,
	connect_error: Option<String>,
	created: AtomicUsize,
}

impl MockFactory {
	pub fn new(client: Arc<MockClusterClient>) -> Self {
		Self {
			client,
			connect_error: None,
			created: AtomicUsize::new(0),
		}
	}

	pub fn unreachable(message: &str) -> Self {
		Self {
			client: Arc::new(MockClusterClient::new()),
			connect_error: Some(message.to_string()),
			created: AtomicUsize::new(0),
		}
	}

	pub fn created(&self) -> usize {
		self.created.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ClusterClientFactory for MockFactory {
	async fn create(
		&self,
		connection: &ClusterConnectionConfig,
		_encryption_details: &[EncryptedDataDetail],
	) -> TaskResult<Arc<dyn ClusterControlClient>> {
		self.created.fetch_add(1, Ordering::SeqCst);
		if let Some(message) = &self.connect_error {
			return Err(TaskError::Transport(K8sError::Connection {
				master_url: connection.master_url.clone(),
				message: message.clone(),
			}));
		}
		Ok(self.client.clone())
	}
}

#[derive(Default)]
pub struct MockEncryption {
	decrypts: AtomicUsize,
}

impl MockEncryption {
	pub fn decrypts(&self) -> usize {
		self.decrypts.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl EncryptionService for MockEncryption {
	async fn decrypt(
		&self,
		reference: &EncryptedRef,
		_details: &[EncryptedDataDetail],
	) -> TaskResult<SecretString> {
		self.decrypts.fetch_add(1, Ordering::SeqCst);
		Ok(SecretString::new(format!("decrypted-{reference}")))
	}
}

/// Builds a minimal pod and remembers the secrets it was given.
#[derive(Default)]
pub struct MockPodSpecBuilder {
	seen: Mutex<Vec<AppliedSecrets>>,
}

impl MockPodSpecBuilder {
	pub fn seen(&self) -> Vec<AppliedSecrets> {
		self.seen.lock().unwrap().clone()
	}
}

impl PodSpecBuilder for MockPodSpecBuilder {
	fn build(&self, params: &PodParams, secrets: &AppliedSecrets) -> TaskResult<Pod> {
		self.seen.lock().unwrap().push(secrets.clone());
		Ok(Pod {
			metadata: ObjectMeta {
				name: Some(params.name.clone()),
				namespace: Some(params.namespace.clone()),
				labels: Some(params.labels.clone()),
				..Default::default()
			},
			spec: Some(PodSpec {
				containers: params
					.containers
					.iter()
					.map(|c| Container {
						name: c.name.clone(),
						image: Some(c.image.clone()),
						..Default::default()
					})
					.collect(),
				..Default::default()
			}),
			..Default::default()
		})
	}
}

pub fn connection() -> ClusterConnectionConfig {
	ClusterConnectionConfig {
		master_url: "https://10.0.0.1:6443".to_string(),
		namespace: "ci".to_string(),
		auth: ConnectionAuth::None,
		ca_cert_data: None,
		skip_tls_verify: false,
	}
}

pub fn container(name: &str, registry: Option<RegistryCredential>) -> ContainerParams {
	ContainerParams {
		name: name.to_string(),
		image: format!("registry.example.com/{name}:latest"),
		registry,
		commands: Vec::new(),
		args: Vec::new(),
		env: BTreeMap::new(),
		working_dir: None,
	}
}

pub fn pod(containers: Vec<ContainerParams>) -> PodParams {
	PodParams {
		name: "build-42".to_string(),
		namespace: "ci".to_string(),
		labels: BTreeMap::from([("loom.dev/build".to_string(), "42".to_string())]),
		containers,
	}
}

pub fn registry(url: &str, user: &str, password: &str) -> RegistryCredential {
	RegistryCredential {
		registry_url: Some(url.to_string()),
		username: Some(user.to_string()),
		password: Some(SecretString::new(password)),
	}
}
