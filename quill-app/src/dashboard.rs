use crate::api::BlogApi;
use crate::categories::CategoryDirectory;
use crate::editor::{EditorForm, EditorMode};
use crate::error::AppError;
use crate::notify::{Notice, Notifier};
use crate::posts::PostCollection;
use crate::session::{Session, SessionStore};
use quill_client::models::{Category, ImageUpload, Post, User};
use quill_client::ClientError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Lifecycle of the dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unauthenticated,
    Loading,
    Ready,
}

/// Monotonic counter invalidating in-flight fetches. Logout and re-mount
/// bump it; a response that started under an older value is discarded
/// instead of being applied to a view that no longer wants it.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> GenerationGuard {
        GenerationGuard {
            generation: self.clone(),
            seen: self.current(),
        }
    }
}

/// Snapshot taken before a fetch starts; `is_stale` answers whether the
/// world moved on while the request was in flight.
pub struct GenerationGuard {
    generation: Generation,
    seen: u64,
}

impl GenerationGuard {
    pub fn is_stale(&self) -> bool {
        self.generation.current() != self.seen
    }
}

/// One guard for every mutating action. The original only debounced the
/// create button; here create, update and delete all refuse to start while
/// another mutation is outstanding.
#[derive(Clone, Default)]
pub struct MutationGuard(Arc<AtomicBool>);

impl MutationGuard {
    pub fn try_begin(&self) -> Option<MutationTicket> {
        if self.0.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(MutationTicket(self.0.clone()))
        }
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Held for the duration of a mutation request; releases on drop, so an
/// early return or a failure path cannot leave the guard stuck.
pub struct MutationTicket(Arc<AtomicBool>);

impl Drop for MutationTicket {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates the dashboard: session gating, category/post loading,
/// the editor workflow, and the refresh-after-mutation cycle.
pub struct DashboardController {
    api: Arc<dyn BlogApi>,
    directory: CategoryDirectory,
    notifier: Arc<dyn Notifier>,
    session_store: Arc<dyn SessionStore>,
    phase: Phase,
    session: Option<Session>,
    categories: Vec<Category>,
    posts: PostCollection,
    editor: Option<EditorForm>,
    generation: Generation,
    mutations: MutationGuard,
}

impl DashboardController {
    pub fn new(
        api: Arc<dyn BlogApi>,
        session_store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            directory: CategoryDirectory::new(api.clone()),
            api,
            notifier,
            session_store,
            phase: Phase::Unauthenticated,
            session: None,
            categories: Vec::new(),
            posts: PostCollection::default(),
            editor: None,
            generation: Generation::default(),
            mutations: MutationGuard::default(),
        }
    }

    // ==================== Жизненный цикл ====================

    /// Check the session and, when present, load categories and posts
    /// concurrently. Either fetch may fail without keeping the view out of
    /// `Ready`; each failure is surfaced on its own. With no session the
    /// view stays unauthenticated and issues no fetches at all.
    pub async fn mount(&mut self) -> Result<Phase, AppError> {
        self.generation.bump();

        let session = match self.session_store.load()? {
            Some(session) => session,
            None => {
                self.phase = Phase::Unauthenticated;
                return Ok(self.phase);
            }
        };
        self.session = Some(session);
        self.phase = Phase::Loading;

        let guard = self.generation.snapshot();
        let api = self.api.clone();
        let (categories, posts) = tokio::join!(self.directory.fetch_all(), api.list_posts());
        if guard.is_stale() {
            tracing::debug!("Discarding mount fetches: view was abandoned");
            return Ok(self.phase);
        }

        match categories {
            Ok(categories) => self.categories = categories,
            Err(e) => {
                tracing::warn!("Error fetching categories: {}", e);
                self.notifier
                    .notify(Notice::Error, "Failed to fetch categories");
            }
        }

        match posts {
            Ok(posts) => self.posts.replace(posts),
            Err(e) => {
                tracing::warn!("Error fetching posts: {}", e);
                self.notifier.notify(Notice::Error, "Failed to fetch posts");
            }
        }

        self.phase = Phase::Ready;
        Ok(self.phase)
    }

    /// Clear both persisted session values and drop all in-memory state.
    /// Anything still in flight resolves against a bumped generation and is
    /// discarded.
    pub fn logout(&mut self) -> Result<(), AppError> {
        self.session_store.clear()?;
        self.generation.bump();
        self.session = None;
        self.categories.clear();
        self.posts.clear();
        self.editor = None;
        self.phase = Phase::Unauthenticated;
        Ok(())
    }

    // ==================== Доступ к состоянию ====================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn posts(&self) -> &[Post] {
        self.posts.posts()
    }

    pub fn editor(&self) -> Option<&EditorForm> {
        self.editor.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation.clone()
    }

    pub fn mutations(&self) -> MutationGuard {
        self.mutations.clone()
    }

    /// Whether the session user may edit or delete the post. Client-side
    /// gating only, mirrored by nothing on the server.
    pub fn can_modify(&self, post: &Post) -> bool {
        self.user().map(|u| u.id == post.author.id).unwrap_or(false)
    }

    // ==================== Редактор ====================

    pub fn open_create(&mut self) {
        self.editor = Some(EditorForm::create());
    }

    /// Open the editor over an existing post. Resolving the post's category
    /// detail is best-effort: a failure is notified but never blocks editing.
    pub async fn open_edit(&mut self, post_id: i64) -> bool {
        let Some(post) = self.posts.find(post_id).cloned() else {
            self.notifier.notify(Notice::Error, "Post not found");
            return false;
        };
        if !self.can_modify(&post) {
            self.notifier
                .notify(Notice::Error, "You can only edit your own posts");
            return false;
        }

        self.editor = Some(EditorForm::edit(&post));

        if let Some(category) = &post.category {
            match self.directory.fetch_one(category.id).await {
                Ok(detail) => {
                    if let Some(editor) = self.editor.as_mut() {
                        editor.category = Some(detail);
                    }
                }
                Err(e) => {
                    tracing::warn!("Error fetching category data: {}", e);
                    self.notifier
                        .notify(Notice::Error, "Failed to fetch category data");
                }
            }
        }

        true
    }

    pub fn cancel_editor(&mut self) {
        self.editor = None;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(editor) = self.editor.as_mut() {
            editor.title = title.into();
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        if let Some(editor) = self.editor.as_mut() {
            editor.content = content.into();
        }
    }

    pub fn attach_image(&mut self, image: ImageUpload) {
        if let Some(editor) = self.editor.as_mut() {
            editor.image = Some(image);
        }
    }

    /// Select a category from the loaded directory. Also refreshes the
    /// side-channel detail value; that lookup failing only produces a
    /// notification.
    pub async fn select_category(&mut self, category_id: i64) -> bool {
        if self.editor.is_none() {
            return false;
        }
        let Some(category) = self
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()
        else {
            self.notifier.notify(Notice::Error, "Unknown category");
            return false;
        };

        if let Some(editor) = self.editor.as_mut() {
            editor.category = Some(category);
            editor.category_detail = None;
        }

        match self.directory.fetch_one(category_id).await {
            Ok(detail) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.category_detail = Some(detail);
                }
            }
            Err(e) => {
                tracing::warn!("Error fetching category data: {}", e);
                self.notifier
                    .notify(Notice::Error, "Failed to fetch category data");
            }
        }

        true
    }

    // ==================== Мутации ====================

    /// Submit the open editor. Create requires a selected category before
    /// any request goes out; edit sends the category as-is (possibly empty)
    /// and lets the backend validate. Success closes the editor and
    /// triggers exactly one full post reload.
    pub async fn submit_editor(&mut self) -> bool {
        let Some(form) = self.editor.clone() else {
            return false;
        };
        let Some(user_id) = self.user().map(|u| u.id) else {
            return false;
        };

        match &form.mode {
            EditorMode::Create => {
                let Some(payload) = form.create_payload(user_id) else {
                    self.notifier
                        .notify(Notice::Error, "Please select a category");
                    return false;
                };

                let Some(ticket) = self.mutations.try_begin() else {
                    self.notifier
                        .notify(Notice::Error, "Another operation is already in progress");
                    return false;
                };

                match self.api.create_post(payload).await {
                    Ok(_) => {
                        drop(ticket);
                        self.notifier
                            .notify(Notice::Success, "Blog Created Successfully");
                        self.editor = None;
                        self.refresh_posts().await;
                        true
                    }
                    Err(ClientError::Validation(errors)) => {
                        self.notifier
                            .notify(Notice::Error, &format!("Validation Error: {}", errors));
                        false
                    }
                    Err(e) => {
                        tracing::warn!("Error creating blog: {}", e);
                        self.notifier.notify(Notice::Error, "Failed to create blog");
                        false
                    }
                }
            }
            EditorMode::Edit { post_id, .. } => {
                let post_id = *post_id;
                let payload = form.update_payload();

                let Some(ticket) = self.mutations.try_begin() else {
                    self.notifier
                        .notify(Notice::Error, "Another operation is already in progress");
                    return false;
                };

                match self.api.update_post(post_id, payload).await {
                    Ok(_) => {
                        drop(ticket);
                        self.notifier
                            .notify(Notice::Success, "Post Updated Successfully");
                        self.editor = None;
                        self.refresh_posts().await;
                        true
                    }
                    Err(ClientError::Validation(errors)) => {
                        self.notifier
                            .notify(Notice::Error, &format!("Validation Error: {}", errors));
                        false
                    }
                    Err(e) => {
                        tracing::warn!("Error updating post: {}", e);
                        self.notifier.notify(Notice::Error, "Failed to update post");
                        false
                    }
                }
            }
        }
    }

    /// Delete one of the session user's posts, then reload the list once.
    pub async fn delete_post(&mut self, post_id: i64) -> bool {
        let Some(post) = self.posts.find(post_id).cloned() else {
            self.notifier.notify(Notice::Error, "Post not found");
            return false;
        };
        if !self.can_modify(&post) {
            self.notifier
                .notify(Notice::Error, "You can only delete your own posts");
            return false;
        }

        let Some(ticket) = self.mutations.try_begin() else {
            self.notifier
                .notify(Notice::Error, "Another operation is already in progress");
            return false;
        };

        match self.api.delete_post(post_id).await {
            Ok(()) => {
                drop(ticket);
                self.notifier
                    .notify(Notice::Success, "Post Deleted Successfully");
                self.refresh_posts().await;
                true
            }
            Err(e) => {
                tracing::warn!("Error deleting post: {}", e);
                self.notifier.notify(Notice::Error, "Failed to delete post");
                false
            }
        }
    }

    /// Full reload of the post collection. A result that comes back under a
    /// stale generation is dropped; a failed reload keeps whatever was
    /// displayed before (possibly pre-mutation data) and only notifies.
    pub async fn refresh_posts(&mut self) {
        let guard = self.generation.snapshot();
        match self.api.list_posts().await {
            Ok(posts) => {
                if guard.is_stale() {
                    tracing::debug!("Discarding stale post list");
                    return;
                }
                self.posts.replace(posts);
            }
            Err(e) => {
                tracing::warn!("Error fetching posts: {}", e);
                self.notifier.notify(Notice::Error, "Failed to fetch posts");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FsSessionStore;
    use crate::test_support::{post_at, sample_category, sample_user, FakeApi, RecordingNotifier};
    use quill_client::models::ImageField;

    struct Fixture {
        api: Arc<FakeApi>,
        notifier: Arc<RecordingNotifier>,
        store: Arc<FsSessionStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture_with(categories: Vec<Category>, posts: Vec<Post>) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        Fixture {
            api: Arc::new(FakeApi::with_data(categories, posts)),
            notifier: Arc::new(RecordingNotifier::default()),
            store: Arc::new(FsSessionStore::new(dir.path())),
            _dir: dir,
        }
    }

    fn seeded_fixture() -> Fixture {
        let mut with_image = post_at(5, "with image", "2024-02-01T00:00:00Z");
        with_image.image = Some("images/cat.png".to_string());
        with_image.category = Some(sample_category(2, "Travel"));

        let mut foreign = post_at(6, "someone else's", "2024-03-01T00:00:00Z");
        foreign.author = sample_user(9);

        fixture_with(
            vec![sample_category(2, "Travel"), sample_category(3, "Food")],
            vec![
                post_at(4, "plain", "2024-01-01T00:00:00Z"),
                with_image,
                foreign,
            ],
        )
    }

    fn save_session(fixture: &Fixture) {
        fixture
            .store
            .save(&Session {
                token: "tok-test".to_string(),
                user: sample_user(1),
            })
            .expect("save session");
    }

    fn controller(fixture: &Fixture) -> DashboardController {
        DashboardController::new(
            fixture.api.clone(),
            fixture.store.clone(),
            fixture.notifier.clone(),
        )
    }

    async fn mounted(fixture: &Fixture) -> DashboardController {
        save_session(fixture);
        let mut dashboard = controller(fixture);
        assert_eq!(dashboard.mount().await.expect("mount"), Phase::Ready);
        dashboard
    }

    #[tokio::test]
    async fn mount_without_session_issues_no_fetches() {
        let fixture = seeded_fixture();
        let mut dashboard = controller(&fixture);

        let phase = dashboard.mount().await.expect("mount");

        assert_eq!(phase, Phase::Unauthenticated);
        assert!(fixture.api.calls().is_empty());
    }

    #[tokio::test]
    async fn mount_sorts_posts_newest_first() {
        let fixture = seeded_fixture();
        let dashboard = mounted(&fixture).await;

        let ids: Vec<i64> = dashboard.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, [6, 5, 4]);
        for pair in dashboard.posts().windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn mount_reaches_ready_despite_fetch_failures() {
        let fixture = seeded_fixture();
        fixture.api.fail_categories.store(true, Ordering::SeqCst);
        fixture.api.fail_posts.store(true, Ordering::SeqCst);

        let dashboard = mounted(&fixture).await;

        assert_eq!(dashboard.phase(), Phase::Ready);
        assert!(dashboard.categories().is_empty());
        assert!(dashboard.posts().is_empty());
        assert!(fixture.notifier.saw("Failed to fetch categories"));
        assert!(fixture.notifier.saw("Failed to fetch posts"));
    }

    #[tokio::test]
    async fn create_without_category_never_issues_a_request() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        dashboard.open_create();
        dashboard.set_title("Hello");
        dashboard.set_content("World");

        assert!(!dashboard.submit_editor().await);
        assert_eq!(fixture.api.call_count("create_post"), 0);
        assert_eq!(fixture.api.call_count("list_posts"), 1); // mount only
        assert!(fixture.notifier.saw("Please select a category"));
        assert!(dashboard.editor().is_some());
    }

    #[tokio::test]
    async fn successful_create_reloads_the_list_exactly_once() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        dashboard.open_create();
        dashboard.set_title("Hello");
        dashboard.set_content("World");
        assert!(dashboard.select_category(2).await);

        assert!(dashboard.submit_editor().await);

        assert_eq!(fixture.api.created.lock().expect("lock").len(), 1);
        assert_eq!(fixture.api.call_count("list_posts"), 2); // mount + refresh
        assert!(dashboard.editor().is_none());
        assert!(fixture.notifier.saw("Blog Created Successfully"));
        // Новый пост виден после перезагрузки
        assert!(dashboard.posts().iter().any(|p| p.title == "Hello"));
    }

    #[tokio::test]
    async fn create_surfaces_structured_validation_errors() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        let mut errors = std::collections::HashMap::new();
        errors.insert(
            "title".to_string(),
            vec!["The title field is required.".to_string()],
        );
        *fixture.api.create_rejection.lock().expect("lock") =
            Some(quill_client::models::FieldErrors(errors));

        dashboard.open_create();
        assert!(dashboard.select_category(2).await);

        assert!(!dashboard.submit_editor().await);
        assert!(fixture
            .notifier
            .saw("Validation Error: The title field is required."));
        assert!(dashboard.editor().is_some());
        assert_eq!(fixture.api.call_count("list_posts"), 1); // no refresh
    }

    #[tokio::test]
    async fn edit_resends_prior_image_and_always_sends_a_category() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        assert!(dashboard.open_edit(5).await);
        dashboard.set_title("Updated title");
        assert!(dashboard.submit_editor().await);

        let updated = fixture.api.updated.lock().expect("lock").clone();
        assert_eq!(updated.len(), 1);
        let (id, payload) = &updated[0];
        assert_eq!(*id, 5);
        assert_eq!(payload.category_id, Some(2));
        assert_eq!(
            payload.image,
            ImageField::Path("images/cat.png".to_string())
        );
        assert_eq!(fixture.api.call_count("list_posts"), 2);
    }

    #[tokio::test]
    async fn edit_with_no_category_sends_an_empty_value() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        assert!(dashboard.open_edit(4).await);
        assert!(dashboard.submit_editor().await);

        let updated = fixture.api.updated.lock().expect("lock").clone();
        assert_eq!(updated[0].1.category_id, None);
    }

    #[tokio::test]
    async fn open_edit_resolves_category_detail_best_effort() {
        let fixture = seeded_fixture();
        fixture
            .api
            .fail_category_detail
            .store(true, Ordering::SeqCst);
        let mut dashboard = mounted(&fixture).await;

        assert!(dashboard.open_edit(5).await);
        assert!(dashboard.editor().is_some());
        assert!(fixture.notifier.saw("Failed to fetch category data"));
    }

    #[tokio::test]
    async fn foreign_posts_cannot_be_edited_or_deleted() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        assert!(!dashboard.open_edit(6).await);
        assert!(!dashboard.delete_post(6).await);
        assert_eq!(fixture.api.call_count("update_post"), 0);
        assert_eq!(fixture.api.call_count("delete_post"), 0);
    }

    #[tokio::test]
    async fn delete_reloads_the_list_exactly_once() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        assert!(dashboard.delete_post(5).await);

        assert_eq!(fixture.api.deleted.lock().expect("lock").clone(), vec![5]);
        assert_eq!(fixture.api.call_count("list_posts"), 2);
        assert!(!dashboard.posts().iter().any(|p| p.id == 5));
    }

    #[tokio::test]
    async fn logout_clears_both_values_and_later_mounts_stay_offline() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        dashboard.logout().expect("logout");

        assert_eq!(dashboard.phase(), Phase::Unauthenticated);
        assert_eq!(fixture.store.load().expect("load"), None);
        assert!(dashboard.posts().is_empty());

        // Повторный mount без сессии — ни одного запроса
        let quiet_api = Arc::new(FakeApi::default());
        let mut next = DashboardController::new(
            quiet_api.clone(),
            fixture.store.clone(),
            fixture.notifier.clone(),
        );
        assert_eq!(next.mount().await.expect("mount"), Phase::Unauthenticated);
        assert!(quiet_api.calls().is_empty());
    }

    #[tokio::test]
    async fn stale_responses_are_discarded() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;
        let before: Vec<i64> = dashboard.posts().iter().map(|p| p.id).collect();

        // The fake bumps the generation mid-request, as a logout landing
        // while the refresh is in flight would.
        fixture
            .api
            .posts
            .lock()
            .expect("lock")
            .push(post_at(7, "late arrival", "2024-04-01T00:00:00Z"));
        *fixture.api.bump_on_list_posts.lock().expect("lock") = Some(dashboard.generation());

        dashboard.refresh_posts().await;

        let after: Vec<i64> = dashboard.posts().iter().map(|p| p.id).collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn a_second_mutation_is_refused_while_one_is_in_flight() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        let _held = dashboard.mutations().try_begin().expect("ticket");

        assert!(!dashboard.delete_post(5).await);
        assert_eq!(fixture.api.call_count("delete_post"), 0);
        assert!(fixture
            .notifier
            .saw("Another operation is already in progress"));
    }

    #[tokio::test]
    async fn failed_refresh_after_a_mutation_keeps_old_data() {
        let fixture = seeded_fixture();
        let mut dashboard = mounted(&fixture).await;

        fixture.api.fail_posts.store(true, Ordering::SeqCst);
        assert!(dashboard.delete_post(5).await);

        // The delete went through but the reload failed: the deleted post is
        // still displayed and the failure was notified.
        assert!(dashboard.posts().iter().any(|p| p.id == 5));
        assert!(fixture.notifier.saw("Failed to fetch posts"));
    }
}
