use crate::api::BlogApi;
use crate::error::AppError;
use crate::notify::{Notice, Notifier};
use crate::session::{Session, SessionStore};
use quill_client::models::{LoginRequest, RegisterRequest};
use quill_client::ClientError;

/// Demo-era client-side denylist. Not enforced by the backend and not an
/// access-control boundary; it only short-circuits the two auth flows before
/// any network call.
pub const DENYLISTED_EMAIL: &str = "admin@gmail.com";

/// Authenticate and persist the session. Returns `None` when login did not
/// happen (denylisted address or a failure already surfaced to the user).
pub async fn login(
    api: &dyn BlogApi,
    store: &dyn SessionStore,
    notifier: &dyn Notifier,
    email: &str,
    password: &str,
) -> Result<Option<Session>, AppError> {
    if email == DENYLISTED_EMAIL {
        notifier.notify(Notice::Error, "Logging in as admin is not allowed");
        return Ok(None);
    }

    let req = LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    };

    match api.login(&req).await {
        Ok(auth) => {
            let session = Session {
                token: auth.token,
                user: auth.user,
            };
            store.save(&session)?;
            notifier.notify(Notice::Success, "Login successful");
            Ok(Some(session))
        }
        Err(e) => {
            tracing::warn!("Login failed for {}: {}", email, e);
            let message = match &e {
                ClientError::Unauthorized(message) if !message.is_empty() => message.clone(),
                _ => "Login failed".to_string(),
            };
            notifier.notify(Notice::Error, &message);
            Ok(None)
        }
    }
}

/// Create an account. Returns whether registration succeeded; the session is
/// not established here — the user logs in afterwards.
pub async fn register(
    api: &dyn BlogApi,
    notifier: &dyn Notifier,
    name: &str,
    email: &str,
    password: &str,
    confirm_password: Option<&str>,
) -> bool {
    if let Some(confirm) = confirm_password {
        if confirm != password {
            notifier.notify(Notice::Error, "Passwords do not match");
            return false;
        }
    }

    if email.eq_ignore_ascii_case(DENYLISTED_EMAIL) {
        notifier.notify(Notice::Error, "Registration as admin is not allowed");
        return false;
    }

    let req = RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };

    match api.register(&req).await {
        Ok(_user) => {
            notifier.notify(Notice::Success, "Registration successful");
            true
        }
        Err(e) => {
            tracing::warn!("Registration failed for {}: {}", email, e);
            let message = match &e {
                ClientError::Validation(errors) => format!("Validation Error: {}", errors),
                _ => "An error occurred while processing your request".to_string(),
            };
            notifier.notify(Notice::Error, &message);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FsSessionStore;
    use crate::test_support::{FakeApi, RecordingNotifier};

    #[tokio::test]
    async fn denylisted_login_never_reaches_the_network() {
        let api = FakeApi::default();
        let notifier = RecordingNotifier::default();
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsSessionStore::new(dir.path());

        let session = login(&api, &store, &notifier, "admin@gmail.com", "pw")
            .await
            .expect("login");

        assert!(session.is_none());
        assert!(api.calls().is_empty());
        assert!(notifier.saw("not allowed"));
    }

    #[tokio::test]
    async fn login_denylist_is_exact_match_only() {
        let api = FakeApi::default();
        let notifier = RecordingNotifier::default();
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsSessionStore::new(dir.path());

        login(&api, &store, &notifier, "Admin@gmail.com", "pw")
            .await
            .expect("login");

        assert_eq!(api.calls(), vec!["login".to_string()]);
    }

    #[tokio::test]
    async fn successful_login_persists_the_session() {
        let api = FakeApi::default();
        let notifier = RecordingNotifier::default();
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsSessionStore::new(dir.path());

        let session = login(&api, &store, &notifier, "alice@example.com", "pw")
            .await
            .expect("login")
            .expect("session");

        assert_eq!(session.user.email, "alice@example.com");
        let reloaded = store.load().expect("load").expect("stored");
        assert_eq!(reloaded, session);
    }

    #[tokio::test]
    async fn registration_denylist_is_case_insensitive() {
        let api = FakeApi::default();
        let notifier = RecordingNotifier::default();

        let ok = register(&api, &notifier, "Admin", "ADMIN@GMAIL.COM", "pw", None).await;

        assert!(!ok);
        assert!(api.calls().is_empty());
        assert!(notifier.saw("not allowed"));
    }

    #[tokio::test]
    async fn mismatched_passwords_block_registration() {
        let api = FakeApi::default();
        let notifier = RecordingNotifier::default();

        let ok = register(
            &api,
            &notifier,
            "Bob",
            "bob@example.com",
            "pw-one",
            Some("pw-two"),
        )
        .await;

        assert!(!ok);
        assert!(api.calls().is_empty());
        assert!(notifier.saw("Passwords do not match"));
    }
}
