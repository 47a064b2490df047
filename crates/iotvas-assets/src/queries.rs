//! Read operations against the asset inventory.

use iotvas_core::{HostAsset, TagId};

use crate::client::{AssetClient, AssetError};
use crate::envelope;
use crate::response::parse_response;

impl AssetClient {
    /// Look up a tag by exact name.
    ///
    /// Returns `None` unless exactly one tag carries the name.
    pub async fn search_tag(&self, name: &str) -> Result<Option<TagId>, AssetError> {
        let body = envelope::search_equals("name", name);
        let xml = self.post(envelope::SEARCH_TAG, body).await?;
        let resp = parse_response(&xml)?.ensure_success("search tag")?;

        let tag_id = resp.single_tag_id();
        if tag_id.is_none() && resp.count.unwrap_or(0) > 1 {
            tracing::warn!(tag = %name, count = ?resp.count, "Tag name is ambiguous");
        }
        Ok(tag_id)
    }

    /// Find the host asset registered for a network address.
    pub async fn find_host_asset(&self, address: &str) -> Result<Option<HostAsset>, AssetError> {
        let body = envelope::search_equals("address", address);
        let xml = self.post(envelope::SEARCH_HOST_ASSET, body).await?;
        let resp = parse_response(&xml)?.ensure_success("search host asset")?;
        Ok(resp.first_host_asset())
    }
}
