use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{BlogError, Result};
use crate::model::{NewPost, Post, PostUpdate};

/// JSON file holding the whole post collection.
///
/// Every mutation loads the collection, changes it in memory and rewrites the
/// file. Callers serialise access by sharing the database behind a mutex.
#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Database {
        Database { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored post. A missing, unreadable or malformed file is
    /// treated as an empty collection.
    pub fn load(&self) -> Vec<Post> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("could not read {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(posts) => posts,
            Err(e) => {
                warn!("ignoring malformed posts file {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Replaces the stored collection with `posts`.
    pub fn save(&self, posts: &[Post]) -> Result<()> {
        self.write(posts).map_err(|source| BlogError::StorageWrite {
            path: self.path.clone(),
            source: source,
        })
    }

    fn write(&self, posts: &[Post]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        posts.serialize(&mut ser)?;

        // Rename over the target so readers never see a half-written file.
        let tmp = self.tmp_path();
        fs::write(&tmp, &buf)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    pub fn list_posts(&self) -> Vec<Post> {
        self.load()
    }

    pub fn find_post(&self, id: u64) -> Result<Post> {
        self.load()
            .into_iter()
            .find(|post| post.id == id)
            .ok_or(BlogError::NotFound(id))
    }

    pub fn add_post(&self, new_post: NewPost) -> Result<Post> {
        let mut posts = self.load();
        let post = Post::new(next_id(&posts)?, new_post)?;
        posts.push(post.clone());
        self.save(&posts)?;

        info!("added post {}", post.id);
        Ok(post)
    }

    pub fn update_post(&self, id: u64, update: PostUpdate) -> Result<Post> {
        let mut posts = self.load();
        let updated = {
            let post = posts
                .iter_mut()
                .find(|post| post.id == id)
                .ok_or(BlogError::NotFound(id))?;
            post.apply(update)?;
            post.clone()
        };
        self.save(&posts)?;

        info!("updated post {}", id);
        Ok(updated)
    }

    pub fn delete_post(&self, id: u64) -> Result<Post> {
        let mut posts = self.load();
        let index = posts
            .iter()
            .position(|post| post.id == id)
            .ok_or(BlogError::NotFound(id))?;
        let removed = posts.remove(index);
        self.save(&posts)?;

        info!("deleted post {}", id);
        Ok(removed)
    }
}

/// One greater than the highest id in `posts`, or 1 when there are none.
pub fn next_id(posts: &[Post]) -> Result<u64> {
    match posts.iter().map(|post| post.id).max() {
        Some(max) => max.checked_add(1).ok_or(BlogError::IdsExhausted(max)),
        None => Ok(1),
    }
}
