use quill_client::models::Post;

/// The displayed set of posts, always newest first. The collection is only
/// ever replaced wholesale from a fetch, never patched in place after a
/// mutation; the backend's list stays canonical.
#[derive(Default)]
pub struct PostCollection {
    posts: Vec<Post>,
}

impl PostCollection {
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn find(&self, id: i64) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn replace(&mut self, mut posts: Vec<Post>) {
        sort_newest_first(&mut posts);
        self.posts = posts;
    }

    pub fn clear(&mut self) {
        self.posts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Backends do not all guarantee list order; normalize client-side to
/// non-increasing creation time. Stable, so equal timestamps keep the
/// fetched order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
