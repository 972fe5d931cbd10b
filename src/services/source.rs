use crate::bridge::{BridgeHandle, ContinuationBridge, parallel, sequence};
use crate::models::{ErrorKind, Fixture, Post, ResultBox, SourceSettings, User};
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;

/// Completion callback of a callback-style lookup
pub type Completion<T> = Box<dyn FnOnce(ResultBox<T>) + Send>;

const FETCH_USER: ContinuationBridge = ContinuationBridge::new("fetch_user");
const FETCH_POSTS: ContinuationBridge = ContinuationBridge::new("fetch_posts");

/// A callback-style data source
///
/// Implementations may call `completion` from any thread, at most once.
#[cfg_attr(test, mockall::automock)]
pub trait UserSource: Send + Sync {
    fn fetch_user_with(&self, user_id: &str, completion: Completion<User>);

    fn fetch_posts_with(&self, user_id: &str, completion: Completion<Vec<Post>>);
}

/// Awaitable lookups for every [`UserSource`], built on the continuation bridge
pub trait UserSourceExt: UserSource {
    /// Look up a user; resolves once with the user or the failure
    fn fetch_user(&self, user_id: &str) -> BridgeHandle<User> {
        FETCH_USER.invoke(|k| self.fetch_user_with(user_id, Box::new(k.into_completion())))
    }

    /// Look up a user's posts
    fn fetch_posts(&self, user_id: &str) -> BridgeHandle<Vec<Post>> {
        FETCH_POSTS.invoke(|k| self.fetch_posts_with(user_id, Box::new(k.into_completion())))
    }

    /// User, then posts; the posts lookup never starts if the user lookup fails
    fn fetch_user_with_posts<'a>(
        &'a self,
        user_id: &'a str,
    ) -> impl Future<Output = ResultBox<(User, Vec<Post>)>> + Send + 'a {
        sequence(
            move || self.fetch_user(user_id),
            move || self.fetch_posts(user_id),
        )
    }

    /// Both lookups at once; first failure wins
    fn fetch_user_with_posts_parallel(
        &self,
        user_id: &str,
    ) -> impl Future<Output = ResultBox<(User, Vec<Post>)>> + Send {
        parallel(self.fetch_user(user_id), self.fetch_posts(user_id))
    }
}

impl<T: UserSource + ?Sized> UserSourceExt for T {}

/// Mock data source answering from a [`Fixture`] after a simulated delay.
///
/// Each pending lookup holds only a weak reference to the client. If the
/// client is dropped before the delay elapses, the lookup completes with
/// [`ErrorKind::NetworkFailure`].
pub struct LegacyApiClient {
    fixture: Fixture,
    delays: SourceSettings,
    runtime: Handle,
    weak_self: Weak<LegacyApiClient>,
}

impl LegacyApiClient {
    /// Create a client that schedules its delayed completions on `runtime`
    pub fn new(fixture: Fixture, delays: SourceSettings, runtime: Handle) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            fixture,
            delays,
            runtime,
            weak_self: weak_self.clone(),
        })
    }

    /// Client over the default fixture on the current runtime
    ///
    /// Panics outside a tokio runtime.
    pub fn with_defaults() -> Arc<Self> {
        Self::new(Fixture::default(), SourceSettings::default(), Handle::current())
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    fn respond_later<T, F>(&self, delay: std::time::Duration, completion: Completion<T>, lookup: F)
    where
        T: Send + 'static,
        F: FnOnce(&LegacyApiClient) -> ResultBox<T> + Send + 'static,
    {
        let weak_self = self.weak_self.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(this) = weak_self.upgrade() else {
                tracing::debug!("Client released before completion");
                completion(Err(ErrorKind::NetworkFailure));
                return;
            };

            completion(lookup(&*this));
        });
    }
}

impl UserSource for LegacyApiClient {
    fn fetch_user_with(&self, user_id: &str, completion: Completion<User>) {
        let user_id = user_id.to_string();
        self.respond_later(self.delays.user_delay(), completion, move |this| {
            this.fixture
                .user(&user_id)
                .cloned()
                .ok_or(ErrorKind::NotFound)
        });
    }

    fn fetch_posts_with(&self, user_id: &str, completion: Completion<Vec<Post>>) {
        let user_id = user_id.to_string();
        self.respond_later(self.delays.posts_delay(), completion, move |this| {
            Ok(this.fixture.posts_by(&user_id))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn fast_client() -> Arc<LegacyApiClient> {
        let delays = SourceSettings {
            user_delay_ms: 10,
            posts_delay_ms: 15,
        };
        LegacyApiClient::new(Fixture::default(), delays, Handle::current())
    }

    fn sample_user() -> User {
        Fixture::default().user("user1").cloned().unwrap()
    }

    #[tokio::test]
    async fn test_callback_api() {
        let client = fast_client();
        let (tx, rx) = tokio::sync::oneshot::channel();

        client.fetch_user_with(
            "user2",
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );

        let user = rx.await.unwrap().unwrap();
        assert_eq!(user.name, "이영희");
    }

    #[tokio::test]
    async fn test_fetch_user_found_and_missing() {
        let client = fast_client();

        let user = client.fetch_user("user1").await.unwrap();
        assert_eq!(user.name, "김철수");

        assert_eq!(client.fetch_user("missing").await, Err(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_fetch_user_with_posts() {
        let client = fast_client();

        let (user, posts) = client.fetch_user_with_posts("user1").await.unwrap();
        assert_eq!(user.id, "user1");
        assert_eq!(posts.len(), 2);

        let parallel = client.fetch_user_with_posts_parallel("user1").await.unwrap();
        assert_eq!(parallel, (user, posts));
    }

    #[tokio::test]
    async fn test_released_client_fails_with_network_failure() {
        let client = fast_client();
        let pending = client.fetch_user("user1");
        drop(client);

        let result = timeout(Duration::from_secs(1), pending).await.unwrap();
        assert_eq!(result, Err(ErrorKind::NetworkFailure));
    }

    #[tokio::test]
    async fn test_mock_source_short_circuits_posts() {
        let mut source = MockUserSource::new();
        source
            .expect_fetch_user_with()
            .times(1)
            .returning(|_, completion| completion(Err(ErrorKind::NotFound)));
        source.expect_fetch_posts_with().times(0);

        let result = source.fetch_user_with_posts("ghost").await;
        assert_eq!(result, Err(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_mock_source_that_never_calls_back() {
        let mut source = MockUserSource::new();
        source
            .expect_fetch_user_with()
            .returning(|_, completion| drop(completion));

        let result = timeout(Duration::from_secs(1), source.fetch_user("user1"))
            .await
            .unwrap();
        assert_eq!(result, Err(ErrorKind::NetworkFailure));
    }

    #[tokio::test]
    async fn test_mock_source_success_pairs_payloads() {
        let mut source = MockUserSource::new();
        source
            .expect_fetch_user_with()
            .returning(|_, completion| completion(Ok(sample_user())));
        source
            .expect_fetch_posts_with()
            .returning(|id, completion| completion(Ok(Fixture::default().posts_by(id))));

        let (user, posts) = source.fetch_user_with_posts("user1").await.unwrap();
        assert_eq!(user, sample_user());
        assert_eq!(posts.len(), 2);
    }
}
