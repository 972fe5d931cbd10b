use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A user record served by the mock data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
}

/// A post authored by a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
}

/// In-memory data set backing the mock data source.
///
/// Users are keyed by id and keep insertion order so listings are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub users: IndexMap<String, User>,
    pub posts: Vec<Post>,
}

impl Fixture {
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    /// All posts written by `user_id`, in fixture order.
    pub fn posts_by(&self, user_id: &str) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        let users = [
            ("user1", "김철수", "kim@example.com", true),
            ("user2", "이영희", "lee@example.com", true),
            ("user3", "박민수", "park@example.com", false),
        ]
        .into_iter()
        .map(|(id, name, email, is_active)| {
            (
                id.to_string(),
                User {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    is_active,
                },
            )
        })
        .collect();

        let posts = [
            ("post1", "user1", "첫 번째 포스트", "안녕하세요"),
            ("post2", "user1", "두 번째 포스트", "반갑습니다"),
            ("post3", "user2", "영희의 포스트", "Hello"),
        ]
        .into_iter()
        .map(|(id, user_id, title, content)| Post {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        })
        .collect();

        Self { users, posts }
    }
}

/// Category of a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Article,
    Video,
    Podcast,
    Code,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Article => "Article",
            Category::Video => "Video",
            Category::Podcast => "Podcast",
            Category::Code => "Code",
        }
    }
}

/// One hit returned by a search service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    pub title: String,
    pub subtitle: String,
    pub category: Category,
    /// Age of the entry in seconds, relative to when the samples were built.
    pub age_secs: u64,
}

impl SearchResult {
    /// Sample corpus used by the mock search service.
    pub fn samples() -> Vec<SearchResult> {
        vec![
            SearchResult {
                id: 1,
                title: "Swift 6 Migration Guide".to_string(),
                subtitle: "Complete guide to migrating your codebase".to_string(),
                category: Category::Article,
                age_secs: 0,
            },
            SearchResult {
                id: 2,
                title: "WWDC24: What's new in Swift".to_string(),
                subtitle: "60 minutes of new Swift features".to_string(),
                category: Category::Video,
                age_secs: 3600,
            },
            SearchResult {
                id: 3,
                title: "SwiftUI Concurrency Patterns".to_string(),
                subtitle: "Best practices for async/await in SwiftUI".to_string(),
                category: Category::Podcast,
                age_secs: 7200,
            },
            SearchResult {
                id: 4,
                title: "Async/Await Deep Dive".to_string(),
                subtitle: "Understanding structured concurrency".to_string(),
                category: Category::Code,
                age_secs: 10800,
            },
        ]
    }

    /// Case-insensitive match against title or subtitle.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.subtitle.to_lowercase().contains(&needle)
    }
}
