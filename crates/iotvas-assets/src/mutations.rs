//! Write operations against the asset inventory.
//!
//! Tag definitions are only ever created here, never deleted. Asset changes
//! only touch the tag associations of pre-existing host assets.

use iotvas_core::{AssetId, TagId};

use crate::client::{AssetClient, AssetError};
use crate::envelope::{self, TagChange};
use crate::response::parse_response;

impl AssetClient {
    // ── Tag definitions ──────────────────────────────────────────

    /// Create a tag definition and return its new id.
    pub async fn create_tag(&self, name: &str) -> Result<TagId, AssetError> {
        let xml = self
            .post(envelope::CREATE_TAG, envelope::create_tag(name))
            .await?;
        let resp = parse_response(&xml)?.ensure_success("create tag")?;

        let tag_id = resp.first_tag_id().ok_or(AssetError::MissingField {
            operation: "create tag",
            field: "data/Tag/id",
        })?;
        tracing::info!(tag = %name, tag_id = %tag_id, "Created tag");
        Ok(tag_id)
    }

    /// Nest `child` under `parent`.
    pub async fn add_child_tag(&self, parent: &TagId, child: &TagId) -> Result<(), AssetError> {
        let path = format!("{}/{}", envelope::UPDATE_TAG, parent.0);
        let xml = self.post(&path, envelope::add_child_tag(child)).await?;
        parse_response(&xml)?.ensure_success("add child tag")?;
        Ok(())
    }

    // ── Asset tag associations ───────────────────────────────────

    /// Attach a tag to a host asset.
    pub async fn add_asset_tag(&self, asset: &AssetId, tag: &TagId) -> Result<(), AssetError> {
        self.update_asset_tags(asset, TagChange::Add, tag).await
    }

    /// Detach a tag from a host asset. The tag definition itself is kept.
    pub async fn remove_asset_tag(&self, asset: &AssetId, tag: &TagId) -> Result<(), AssetError> {
        self.update_asset_tags(asset, TagChange::Remove, tag).await
    }

    async fn update_asset_tags(
        &self,
        asset: &AssetId,
        change: TagChange,
        tag: &TagId,
    ) -> Result<(), AssetError> {
        let path = format!("{}/{}", envelope::UPDATE_HOST_ASSET, asset.0);
        let xml = self
            .post(&path, envelope::update_asset_tag(change, tag))
            .await?;
        let operation = match change {
            TagChange::Add => "add asset tag",
            TagChange::Remove => "remove asset tag",
        };
        parse_response(&xml)?.ensure_success(operation)?;
        Ok(())
    }
}
