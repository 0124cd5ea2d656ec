// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Production [`ClusterClientFactory`] backed by kube-rs.

use std::sync::Arc;

use async_trait::async_trait;
use loom_ci_k8s::{ClusterAuth, ClusterControlClient, ClusterEndpoint, KubeClient, KubeClientOptions};
use tracing::{debug, instrument};

use crate::collaborators::{ClusterClientFactory, EncryptionService};
use crate::config::DelegateConfig;
use crate::error::{TaskError, TaskResult};
use crate::types::{ClusterConnectionConfig, ConnectionAuth, EncryptedDataDetail};

pub struct KubeClusterClientFactory {
	encryption: Arc<dyn EncryptionService>,
	options: KubeClientOptions,
	proxy_url: Option<String>,
}

impl KubeClusterClientFactory {
	pub fn new(
		encryption: Arc<dyn EncryptionService>,
		options: KubeClientOptions,
		proxy_url: Option<String>,
	) -> Self {
		Self {
			encryption,
			options,
			proxy_url,
		}
	}

	pub fn from_config(encryption: Arc<dyn EncryptionService>, config: &DelegateConfig) -> Self {
		Self::new(
			encryption,
			KubeClientOptions {
				field_manager: config.field_manager.clone(),
				delete_grace_period_secs: config.pod_delete_grace_period_secs,
			},
			config.http_proxy.clone(),
		)
	}

	/// Decrypt the connection's credentials into a ready-to-use endpoint.
	pub async fn resolve_endpoint(
		&self,
		connection: &ClusterConnectionConfig,
		encryption_details: &[EncryptedDataDetail],
	) -> TaskResult<ClusterEndpoint> {
		if connection.master_url.trim().is_empty() {
			return Err(TaskError::configuration("cluster master URL is empty"));
		}

		let auth = match &connection.auth {
			ConnectionAuth::None => ClusterAuth::None,
			ConnectionAuth::ServiceAccountToken { token } => {
				ClusterAuth::Token(self.encryption.decrypt(token, encryption_details).await?)
			}
			ConnectionAuth::UsernamePassword { username, password } => ClusterAuth::Basic {
				username: username.clone(),
				password: self.encryption.decrypt(password, encryption_details).await?,
			},
			ConnectionAuth::ClientCertificate { cert_data, key } => {
				ClusterAuth::ClientCertificate {
					cert_data: cert_data.clone(),
					key_data: self.encryption.decrypt(key, encryption_details).await?,
				}
			}
		};

		Ok(ClusterEndpoint {
			master_url: connection.master_url.clone(),
			namespace: connection.namespace.clone(),
			auth,
			ca_cert_data: connection.ca_cert_data.clone(),
			skip_tls_verify: connection.skip_tls_verify,
			proxy_url: self.proxy_url.clone(),
		})
	}
}

#[async_trait]
impl ClusterClientFactory for KubeClusterClientFactory {
	#[instrument(skip_all, fields(master_url = %connection.master_url))]
	async fn create(
		&self,
		connection: &ClusterConnectionConfig,
		encryption_details: &[EncryptedDataDetail],
	) -> TaskResult<Arc<dyn ClusterControlClient>> {
		let endpoint = self.resolve_endpoint(connection, encryption_details).await?;
		let client = KubeClient::connect(&endpoint, self.options.clone()).await?;
		debug!("Cluster client ready");
		Ok(Arc::new(client))
	}
}
