// Ways of reaching UI state from async work
//
// Each pattern ends with a render inside the UI domain. None of them touch
// Screen outside a hop.

use super::bridge::UiBridge;
use super::screen::StateSink;
use crate::models::{Post, ResultBox, User};
use crate::services::UserSourceExt;
use crate::state::DomainError;
use tokio::task::JoinHandle;

/// Upper bound (exclusive) of the sum computed by [`compute_then_apply`]
pub const HEAVY_SUM_LIMIT: i64 = 500_000;

/// A detached task hops into the UI domain for its state change
pub fn hop_and_increment(ui: &UiBridge) -> JoinHandle<Result<i64, DomainError>> {
    let target = ui.clone();
    ui.spawn_async(move || async move {
        target
            .run(|screen| {
                screen.counter.increment();
                screen.show_counter("Pattern1");
                screen.counter.state()
            })
            .await
    })
}

/// A task whose whole body runs in the UI domain
pub fn start_in_ui(ui: &UiBridge) -> JoinHandle<Result<i64, DomainError>> {
    ui.spawn_in_ui(|screen| {
        screen.counter.increment();
        screen.show_counter("Pattern2");
        screen.counter.state()
    })
}

/// Heavy work on the blocking pool, then a single hop to publish the result
pub fn compute_then_apply(ui: &UiBridge) -> JoinHandle<Result<i64, DomainError>> {
    let target = ui.clone();
    ui.spawn_async(move || async move {
        let sum = match tokio::task::spawn_blocking(|| (0..HEAVY_SUM_LIMIT).sum::<i64>()).await {
            Ok(sum) => sum,
            Err(e) => {
                tracing::error!("Background computation failed: {}", e);
                return Err(DomainError::OperationPanicked {
                    domain: target.domain().name().to_string(),
                });
            }
        };

        target
            .run(move |screen| {
                screen.counter.set_state(sum % 100);
                screen.show_counter("Pattern3");
                screen.counter.state()
            })
            .await
    })
}

/// Fetch a user off the UI domain, then show it
///
/// The lookup's failure is rendered and returned; a closed UI domain maps to
/// [`ErrorKind::Cancelled`](crate::models::ErrorKind::Cancelled).
pub async fn load_user<S>(ui: &UiBridge, source: &S, user_id: &str) -> ResultBox<User>
where
    S: UserSourceExt + ?Sized,
{
    let outcome = source.fetch_user(user_id).await;

    ui.run(move |screen| match outcome {
        Ok(user) => {
            screen.label.render(format!("Hello, {}", user.name));
            screen.user = Some(user.clone());
            Ok(user)
        }
        Err(kind) => {
            screen.label.render(format!("Error loading user: {kind}"));
            Err(kind)
        }
    })
    .await?
}

/// Fetch a user and their posts in sequence, then show both
pub async fn load_user_with_posts<S>(
    ui: &UiBridge,
    source: &S,
    user_id: &str,
) -> ResultBox<(User, Vec<Post>)>
where
    S: UserSourceExt + ?Sized,
{
    let outcome = source.fetch_user_with_posts(user_id).await;

    ui.run(move |screen| match outcome {
        Ok((user, posts)) => {
            screen
                .label
                .render(format!("{}: {} posts", user.name, posts.len()));
            screen.user = Some(user.clone());
            Ok((user, posts))
        }
        Err(kind) => {
            screen.label.render(format!("Error loading user: {kind}"));
            Err(kind)
        }
    })
    .await?
}
