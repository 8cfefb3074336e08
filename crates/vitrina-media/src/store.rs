//! In-memory model of a product's images, grouped by variant color.

use thiserror::Error;
use vitrina_core::{CropTransform, ImageDescriptor, ImageOrigin, ManifestEntry, VariantGroupKey};

use crate::blob::{ImageBlob, LocalBlobs};
use crate::error::TransformError;
use crate::transform::bake;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no image group named '{group}'")]
    UnknownGroup { group: VariantGroupKey },

    #[error("index {index} is out of range for group '{group}' with {len} images")]
    IndexOutOfRange {
        group: VariantGroupKey,
        index: usize,
        len: usize,
    },

    #[error("preview could not be rendered: {0}")]
    Preview(#[from] TransformError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaGroup {
    pub key: VariantGroupKey,
    pub images: Vec<ImageDescriptor>,
}

/// Ordered image groups for one edit session.
///
/// Groups iterate in the order they were first created; images within a group
/// in display order. Local images are backed by [`LocalBlobs`] entries that are
/// revoked on removal, replacement, group removal, and when the store drops.
#[derive(Debug, Default)]
pub struct MediaGroupStore {
    groups: Vec<MediaGroup>,
    blobs: LocalBlobs,
}

impl MediaGroupStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store of `Existing` descriptors from a persisted manifest.
    ///
    /// Entries without a color land in the default group.
    #[must_use]
    pub fn hydrate(entries: &[ManifestEntry]) -> Self {
        let mut store = Self::new();
        for entry in entries {
            let key = entry
                .color
                .as_deref()
                .map_or(VariantGroupKey::Default, VariantGroupKey::color);
            let descriptor =
                ImageDescriptor::existing(&entry.url, entry.storage_path.clone(), entry.is_primary);
            store.group_mut_or_insert(key).images.push(descriptor);
        }
        store
    }

    /// Append locally chosen images to `key`, creating the group if needed.
    /// Returns the local URLs in selection order.
    pub fn add_files(
        &mut self,
        key: &VariantGroupKey,
        files: impl IntoIterator<Item = ImageBlob>,
    ) -> Vec<String> {
        let urls: Vec<String> = files.into_iter().map(|b| self.blobs.create(b)).collect();
        let group = self.group_mut_or_insert(key.clone());
        group
            .images
            .extend(urls.iter().map(ImageDescriptor::new_local));
        urls
    }

    /// Remove one image. The group itself stays in place even when emptied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the group or index does not exist.
    pub fn remove(
        &mut self,
        key: &VariantGroupKey,
        index: usize,
    ) -> Result<ImageDescriptor, StoreError> {
        let group = self.group_mut(key)?;
        check_index(group, index)?;
        let removed = group.images.remove(index);
        self.release(&removed);
        Ok(removed)
    }

    /// Swap in a new local file at `index`, keeping its primary flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the group or index does not exist.
    pub fn replace(
        &mut self,
        key: &VariantGroupKey,
        index: usize,
        file: ImageBlob,
    ) -> Result<String, StoreError> {
        check_index(self.group(key)?, index)?;
        let url = self.blobs.create(file);
        let group = self.group_mut(key)?;
        let mut fresh = ImageDescriptor::new_local(url.clone());
        fresh.is_primary = group.images[index].is_primary;
        let old = std::mem::replace(&mut group.images[index], fresh);
        self.release(&old);
        Ok(url)
    }

    /// Swap the image at `index` with its neighbour. Moving past either end
    /// of the group does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the group or index does not exist.
    pub fn reorder(
        &mut self,
        key: &VariantGroupKey,
        index: usize,
        direction: Direction,
    ) -> Result<(), StoreError> {
        let group = self.group_mut(key)?;
        check_index(group, index)?;
        let target = match direction {
            Direction::Left => index.checked_sub(1),
            Direction::Right => Some(index + 1).filter(|&i| i < group.images.len()),
        };
        if let Some(target) = target {
            group.images.swap(index, target);
        }
        Ok(())
    }

    /// Record a crop for the image at `index`, replacing any earlier one.
    /// Nothing is baked until the store is materialized.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the group or index does not exist.
    pub fn apply_transform(
        &mut self,
        key: &VariantGroupKey,
        index: usize,
        transform: CropTransform,
    ) -> Result<(), StoreError> {
        self.descriptor_mut(key, index)?.transform = Some(transform);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the group or index does not exist.
    pub fn clear_transform(&mut self, key: &VariantGroupKey, index: usize) -> Result<(), StoreError> {
        self.descriptor_mut(key, index)?.transform = None;
        Ok(())
    }

    /// Flag one image as primary and clear the flag everywhere else.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the group or index does not exist.
    pub fn set_primary(&mut self, key: &VariantGroupKey, index: usize) -> Result<(), StoreError> {
        check_index(self.group(key)?, index)?;
        for group in &mut self.groups {
            let selected = group.key == *key;
            for (i, image) in group.images.iter_mut().enumerate() {
                image.is_primary = selected && i == index;
            }
        }
        Ok(())
    }

    /// `true` when exactly one image across `keys` is flagged primary.
    #[must_use]
    pub fn has_exactly_one_primary(&self, keys: &[VariantGroupKey]) -> bool {
        self.groups
            .iter()
            .filter(|g| keys.contains(&g.key))
            .flat_map(|g| &g.images)
            .filter(|i| i.is_primary)
            .count()
            == 1
    }

    /// Drop a whole group, releasing its local blobs. Returns how many images
    /// it held.
    pub fn remove_group(&mut self, key: &VariantGroupKey) -> usize {
        let Some(pos) = self.groups.iter().position(|g| g.key == *key) else {
            return 0;
        };
        let group = self.groups.remove(pos);
        for image in &group.images {
            self.release(image);
        }
        group.images.len()
    }

    /// Images of `key` in display order; empty for unknown groups.
    #[must_use]
    pub fn images(&self, key: &VariantGroupKey) -> &[ImageDescriptor] {
        self.group(key).map_or(&[], |g| g.images.as_slice())
    }

    #[must_use]
    pub fn groups(&self) -> &[MediaGroup] {
        &self.groups
    }

    #[must_use]
    pub fn get(&self, key: &VariantGroupKey, index: usize) -> Option<&ImageDescriptor> {
        self.images(key).get(index)
    }

    /// Total number of images across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.images.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn live_blob_count(&self) -> usize {
        self.blobs.live()
    }

    #[must_use]
    pub fn local_blob(&self, url: &str) -> Option<&ImageBlob> {
        self.blobs.resolve(url)
    }

    /// Render what the image at `index` will look like once saved, without
    /// touching the descriptor.
    ///
    /// Returns `Ok(None)` for images that live remotely; those are previewed
    /// from their URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the group or index does not exist or the crop
    /// cannot be baked.
    pub fn preview(
        &self,
        key: &VariantGroupKey,
        index: usize,
    ) -> Result<Option<ImageBlob>, StoreError> {
        let group = self.group(key)?;
        check_index(group, index)?;
        let descriptor = &group.images[index];
        let Some(source) = self.blobs.resolve(&descriptor.url) else {
            return Ok(None);
        };
        match descriptor.transform {
            Some(t) => Ok(Some(bake(source, t.pixel_crop)?)),
            None => Ok(Some(source.clone())),
        }
    }

    /// Drop every group and release every local blob.
    pub fn clear(&mut self) {
        self.groups.clear();
        let revoked = self.blobs.revoke_all();
        if revoked > 0 {
            tracing::debug!(revoked, "released local image blobs");
        }
    }

    /// `(group, index)` of every image in materialization order.
    pub(crate) fn positions(&self) -> Vec<(VariantGroupKey, usize)> {
        self.groups
            .iter()
            .flat_map(|g| (0..g.images.len()).map(|i| (g.key.clone(), i)))
            .collect()
    }

    /// Rewrite an uploaded image as `Existing` at its new location.
    pub(crate) fn promote(
        &mut self,
        key: &VariantGroupKey,
        index: usize,
        url: String,
        storage_path: String,
    ) -> Result<(), StoreError> {
        let descriptor = self.descriptor_mut(key, index)?;
        let previous = std::mem::replace(&mut descriptor.url, url);
        descriptor.origin = ImageOrigin::Existing;
        descriptor.storage_path = Some(storage_path);
        descriptor.transform = None;
        if LocalBlobs::is_local(&previous) {
            self.blobs.revoke(&previous);
        }
        Ok(())
    }

    fn release(&mut self, descriptor: &ImageDescriptor) {
        if descriptor.origin == ImageOrigin::New {
            self.blobs.revoke(&descriptor.url);
        }
    }

    fn group(&self, key: &VariantGroupKey) -> Result<&MediaGroup, StoreError> {
        self.groups
            .iter()
            .find(|g| g.key == *key)
            .ok_or_else(|| StoreError::UnknownGroup { group: key.clone() })
    }

    fn group_mut(&mut self, key: &VariantGroupKey) -> Result<&mut MediaGroup, StoreError> {
        self.groups
            .iter_mut()
            .find(|g| g.key == *key)
            .ok_or_else(|| StoreError::UnknownGroup { group: key.clone() })
    }

    fn group_mut_or_insert(&mut self, key: VariantGroupKey) -> &mut MediaGroup {
        let pos = match self.groups.iter().position(|g| g.key == key) {
            Some(pos) => pos,
            None => {
                self.groups.push(MediaGroup {
                    key,
                    images: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        &mut self.groups[pos]
    }

    fn descriptor_mut(
        &mut self,
        key: &VariantGroupKey,
        index: usize,
    ) -> Result<&mut ImageDescriptor, StoreError> {
        let group = self.group_mut(key)?;
        check_index(group, index)?;
        Ok(&mut group.images[index])
    }
}

impl Drop for MediaGroupStore {
    fn drop(&mut self) {
        self.clear();
    }
}

fn check_index(group: &MediaGroup, index: usize) -> Result<(), StoreError> {
    if index < group.images.len() {
        Ok(())
    } else {
        Err(StoreError::IndexOutOfRange {
            group: group.key.clone(),
            index,
            len: group.images.len(),
        })
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
