use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Aws,
}

impl CredentialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
        }
    }
}

/// A stored AWS access key pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsCredential {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for AwsCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Lists credentials the operator has stored in the console.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn list_credentials(&self, kind: CredentialKind) -> Result<Vec<AwsCredential>, BackendError>;
}

/// Lists the regions an AWS key pair can deploy to.
#[async_trait]
pub trait RegionLister: Send + Sync {
    async fn list_regions(
        &self,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Result<Vec<String>, BackendError>;
}

/// Resolve `credential_id` in `store` and list its regions, sorted.
pub async fn regions_for_credential(
    store: &dyn CredentialStore,
    lister: &dyn RegionLister,
    credential_id: &str,
) -> Result<Vec<String>, BackendError> {
    let credentials = store.list_credentials(CredentialKind::Aws).await?;
    let credential = credentials
        .iter()
        .find(|c| c.id == credential_id)
        .ok_or_else(|| BackendError::NotFound(format!("AWS credential {credential_id}")))?;

    let mut regions = lister
        .list_regions(&credential.access_key_id, &credential.secret_access_key)
        .await?;
    regions.sort();
    regions.dedup();
    Ok(regions)
}
