use anyhow::Result;

use crate::store::{ObjectStore, RemoteObject, Tag};

/// Result of an album query: names when unfiltered, objects when filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumQuery {
    Albums(Vec<String>),
    Images(Vec<RemoteObject>),
}

/// Secondary index over the store, rebuilt from a full listing on every call.
pub struct TagIndex<'a> {
    store: &'a dyn ObjectStore,
    tag_key: &'a str,
}

impl<'a> TagIndex<'a> {
    pub fn new(store: &'a dyn ObjectStore, tag_key: &'a str) -> Self {
        Self { store, tag_key }
    }

    /// An empty filter lists distinct album names; anything else lists the
    /// objects of that album, matched case-insensitively.
    pub async fn query_by_album(&self, album: &str) -> Result<AlbumQuery> {
        if album.is_empty() {
            Ok(AlbumQuery::Albums(self.albums().await?))
        } else {
            Ok(AlbumQuery::Images(self.album_images(album).await?))
        }
    }

    /// Distinct album names in listing order.
    pub async fn albums(&self) -> Result<Vec<String>> {
        let mut albums: Vec<String> = Vec::new();

        for object in self.scan().await? {
            for tag in object.tags {
                if self.is_album_tag(&tag) && !albums.contains(&tag.value) {
                    albums.push(tag.value);
                }
            }
        }

        tracing::debug!("Tag index: {} albums", albums.len());
        Ok(albums)
    }

    /// Objects tagged with `album`, in listing order.
    pub async fn album_images(&self, album: &str) -> Result<Vec<RemoteObject>> {
        let wanted = album.to_lowercase();
        let images: Vec<RemoteObject> = self
            .scan()
            .await?
            .into_iter()
            .filter(|object| {
                object
                    .tags
                    .iter()
                    .any(|tag| self.is_album_tag(tag) && tag.value.to_lowercase() == wanted)
            })
            .collect();

        tracing::debug!("Tag index: album={}, {} images", album, images.len());
        Ok(images)
    }

    /// List every object and fetch its tags one by one.
    async fn scan(&self) -> Result<Vec<RemoteObject>> {
        let keys = self.store.list_keys().await?;
        let mut objects = Vec::with_capacity(keys.len());

        for key in keys {
            let tags = self.store.get_tags(&key).await?;
            objects.push(RemoteObject { key, tags });
        }

        Ok(objects)
    }

    fn is_album_tag(&self, tag: &Tag) -> bool {
        !tag.value.is_empty() && tag.key.eq_ignore_ascii_case(self.tag_key)
    }
}
