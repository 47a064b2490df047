//! Tag reconciliation against the asset inventory.
//!
//! A [`TagReconciler`] is the per-run session: it owns the inventory handle,
//! the id of the parent tag every created tag is nested under, and the
//! name → id cache. Reconciling a host makes its tags match a desired list
//! with the fewest remote calls:
//!
//! - names already attached are left alone,
//! - otherwise the first attached tag of the same category is detached,
//! - the name is resolved (cache, then search, then create + nest) and
//!   attached.
//!
//! Nothing is transactional. Every remote failure is logged and the batch
//! moves on; the next run repairs whatever was left half done.

use std::collections::HashMap;
use std::ops::AddAssign;

use iotvas_assets::{AssetClient, AssetError};
use iotvas_core::{tag_category, AssetId, HostAsset, TagId};

use crate::error::DiscoverError;

/// Remote operations reconciliation needs from the inventory.
#[allow(async_fn_in_trait)]
pub trait TagInventory {
    async fn find_host_asset(&self, address: &str) -> Result<Option<HostAsset>, AssetError>;
    async fn search_tag(&self, name: &str) -> Result<Option<TagId>, AssetError>;
    async fn create_tag(&self, name: &str) -> Result<TagId, AssetError>;
    async fn add_child_tag(&self, parent: &TagId, child: &TagId) -> Result<(), AssetError>;
    async fn add_asset_tag(&self, asset: &AssetId, tag: &TagId) -> Result<(), AssetError>;
    async fn remove_asset_tag(&self, asset: &AssetId, tag: &TagId) -> Result<(), AssetError>;
}

impl TagInventory for AssetClient {
    async fn find_host_asset(&self, address: &str) -> Result<Option<HostAsset>, AssetError> {
        AssetClient::find_host_asset(self, address).await
    }

    async fn search_tag(&self, name: &str) -> Result<Option<TagId>, AssetError> {
        AssetClient::search_tag(self, name).await
    }

    async fn create_tag(&self, name: &str) -> Result<TagId, AssetError> {
        AssetClient::create_tag(self, name).await
    }

    async fn add_child_tag(&self, parent: &TagId, child: &TagId) -> Result<(), AssetError> {
        AssetClient::add_child_tag(self, parent, child).await
    }

    async fn add_asset_tag(&self, asset: &AssetId, tag: &TagId) -> Result<(), AssetError> {
        AssetClient::add_asset_tag(self, asset, tag).await
    }

    async fn remove_asset_tag(&self, asset: &AssetId, tag: &TagId) -> Result<(), AssetError> {
        AssetClient::remove_asset_tag(self, asset, tag).await
    }
}

/// Counts of what one or more reconciliations did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Addresses with no matching host asset.
    pub missing_assets: u32,
    /// Names already attached.
    pub unchanged: u32,
    pub added: u32,
    pub removed: u32,
    /// Names that could not be resolved or attached, and failed detaches.
    pub failed: u32,
}

impl AddAssign for ReconcileReport {
    fn add_assign(&mut self, other: Self) {
        self.missing_assets += other.missing_assets;
        self.unchanged += other.unchanged;
        self.added += other.added;
        self.removed += other.removed;
        self.failed += other.failed;
    }
}

/// Per-run reconciliation session.
pub struct TagReconciler<I> {
    inventory: I,
    parent_tag: TagId,
    cache: HashMap<String, TagId>,
    /// Tags created this run that could not be nested under the parent tag.
    unnested: HashMap<String, TagId>,
}

impl<I: TagInventory> TagReconciler<I> {
    /// Resolve the parent tag (search by name, else create) and start a
    /// session with an empty cache.
    pub async fn start(inventory: I, parent_tag_name: &str) -> crate::error::Result<Self> {
        let found = inventory
            .search_tag(parent_tag_name)
            .await
            .map_err(|source| DiscoverError::ParentTag {
                name: parent_tag_name.to_string(),
                source,
            })?;

        let parent_tag = match found {
            Some(id) => id,
            None => inventory
                .create_tag(parent_tag_name)
                .await
                .map_err(|source| DiscoverError::ParentTag {
                    name: parent_tag_name.to_string(),
                    source,
                })?,
        };

        tracing::info!(parent_tag = %parent_tag_name, tag_id = %parent_tag, "Parent tag resolved");
        Ok(Self::new(inventory, parent_tag))
    }

    /// Start a session with an already known parent tag.
    pub fn new(inventory: I, parent_tag: TagId) -> Self {
        Self {
            inventory,
            parent_tag,
            cache: HashMap::new(),
            unnested: HashMap::new(),
        }
    }

    pub fn parent_tag(&self) -> &TagId {
        &self.parent_tag
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Cached id for a tag name, if this session has resolved it.
    pub fn cached(&self, name: &str) -> Option<&TagId> {
        self.cache.get(name)
    }

    /// Tags created this run that are still not nested under the parent tag.
    pub fn unnested(&self) -> impl Iterator<Item = (&str, &TagId)> {
        self.unnested.iter().map(|(name, id)| (name.as_str(), id))
    }

    /// Make the host asset at `address` carry `desired` tags, replacing
    /// same-category tags.
    ///
    /// Stale tags are looked for in the tag set fetched at the start of the
    /// call only; tags attached earlier in the same batch are never detached
    /// by it.
    pub async fn reconcile_tags(&mut self, address: &str, desired: &[String]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        if desired.is_empty() {
            return report;
        }

        let asset = match self.inventory.find_host_asset(address).await {
            Ok(Some(asset)) => asset,
            Ok(None) => {
                tracing::warn!(address = %address, "No host asset found for discovered host");
                report.missing_assets += 1;
                return report;
            }
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Host asset lookup failed");
                report.missing_assets += 1;
                return report;
            }
        };

        for name in desired {
            if asset.has_tag(name) {
                report.unchanged += 1;
                continue;
            }

            if let Some(stale) = asset.same_category_tag(name) {
                tracing::info!(
                    address = %address,
                    asset_id = %asset.id,
                    old_tag = %stale.name,
                    new_tag = %name,
                    category = tag_category(name),
                    "Replacing tag"
                );
                match self.inventory.remove_asset_tag(&asset.id, &stale.id).await {
                    Ok(()) => report.removed += 1,
                    Err(e) => {
                        tracing::error!(
                            asset_id = %asset.id,
                            tag = %stale.name,
                            tag_id = %stale.id,
                            error = %e,
                            "Failed to remove tag from asset"
                        );
                        report.failed += 1;
                    }
                }
            }

            let Some(tag_id) = self.resolve_tag(name).await else {
                tracing::warn!(address = %address, tag = %name, "Failed to add tag for host");
                report.failed += 1;
                continue;
            };

            match self.inventory.add_asset_tag(&asset.id, &tag_id).await {
                Ok(()) => {
                    tracing::info!(asset_id = %asset.id, tag = %name, "Added tag to asset");
                    report.added += 1;
                }
                Err(e) => {
                    tracing::error!(
                        asset_id = %asset.id,
                        tag = %name,
                        tag_id = %tag_id,
                        error = %e,
                        "Failed to add tag to asset"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Tag id for `name`: cache, then a retry of a pending nest, then
    /// inventory search, then a new tag nested under the parent tag.
    /// Successful resolutions are cached.
    async fn resolve_tag(&mut self, name: &str) -> Option<TagId> {
        if let Some(id) = self.cache.get(name) {
            return Some(id.clone());
        }

        let id = if let Some(id) = self.unnested.get(name).cloned() {
            self.nest(name, id).await?
        } else {
            self.lookup_or_create(name).await?
        };

        self.cache.insert(name.to_string(), id.clone());
        Some(id)
    }

    async fn lookup_or_create(&mut self, name: &str) -> Option<TagId> {
        match self.inventory.search_tag(name).await {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                let id = match self.inventory.create_tag(name).await {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::error!(tag = %name, error = %e, "Failed to create tag");
                        return None;
                    }
                };
                self.nest(name, id).await
            }
            Err(e) => {
                tracing::error!(tag = %name, error = %e, "Tag search failed");
                None
            }
        }
    }

    /// Nest a created tag under the parent tag. On failure the tag is kept
    /// pending so the next resolution of `name` retries the nest instead of
    /// finding it by name and attaching it unparented.
    async fn nest(&mut self, name: &str, id: TagId) -> Option<TagId> {
        match self.inventory.add_child_tag(&self.parent_tag, &id).await {
            Ok(()) => {
                self.unnested.remove(name);
                Some(id)
            }
            Err(e) => {
                tracing::warn!(
                    tag = %name,
                    tag_id = %id,
                    parent_tag_id = %self.parent_tag,
                    error = %e,
                    "Tag created but not nested under parent tag"
                );
                self.unnested.insert(name.to_string(), id);
                None
            }
        }
    }
}
