use quill_client::models::{Category, CreatePost, ImageField, ImageUpload, Post, UpdatePost};

/// Which network call a submission performs. `Edit` carries the editing
/// reference and the post's existing image path so an unchanged image can be
/// resubmitted as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorMode {
    Create,
    Edit {
        post_id: i64,
        prior_image: Option<String>,
    },
}

/// The shared create/edit form. One form serves both intents; the mode
/// decides what `submit` does with it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorForm {
    pub mode: EditorMode,
    pub title: String,
    pub content: String,
    pub category: Option<Category>,
    pub image: Option<ImageUpload>,
    /// Auxiliary display value populated when a category is selected. Never
    /// wired into submission.
    pub category_detail: Option<Category>,
}

impl EditorForm {
    /// Open for a new post: every field starts blank.
    pub fn create() -> Self {
        Self {
            mode: EditorMode::Create,
            title: String::new(),
            content: String::new(),
            category: None,
            image: None,
            category_detail: None,
        }
    }

    /// Open over an existing post. Title and content are copied in, any
    /// pending image selection is dropped (the previous image is kept unless
    /// replaced), and the post's category becomes the current selection.
    pub fn edit(post: &Post) -> Self {
        Self {
            mode: EditorMode::Edit {
                post_id: post.id,
                prior_image: post.image.clone(),
            },
            title: post.title.clone(),
            content: post.content.clone(),
            category: post.category.clone(),
            image: None,
            category_detail: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::Edit { .. })
    }

    pub fn post_id(&self) -> Option<i64> {
        match &self.mode {
            EditorMode::Edit { post_id, .. } => Some(*post_id),
            EditorMode::Create => None,
        }
    }

    /// Create submission. `None` when no category is selected — the caller
    /// must refuse to submit without issuing any request.
    pub fn create_payload(&self, author_id: i64) -> Option<CreatePost> {
        let category = self.category.as_ref()?;
        Some(CreatePost {
            user_id: author_id,
            title: self.title.clone(),
            content: self.content.clone(),
            category_id: category.id,
            image: self.image.clone(),
        })
    }

    /// Update submission. The category is always present in the payload,
    /// empty when none is selected (the backend validates it); an unchanged
    /// image is resent as its prior path.
    pub fn update_payload(&self) -> UpdatePost {
        let prior_image = match &self.mode {
            EditorMode::Edit { prior_image, .. } => prior_image.clone(),
            EditorMode::Create => None,
        };

        let image = match (&self.image, prior_image) {
            (Some(upload), _) => ImageField::Upload(upload.clone()),
            (None, Some(path)) => ImageField::Path(path),
            (None, None) => ImageField::Empty,
        };

        UpdatePost {
            title: self.title.clone(),
            content: self.content.clone(),
            category_id: self.category.as_ref().map(|c| c.id),
            image,
        }
    }
}
