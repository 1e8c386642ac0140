//! Social wall posts and comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A wall post. `likes` holds the ids of distinct students who liked it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub body: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    #[serde(default)]
    pub likes: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Create post request. `image` is a reference to an already stored upload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub body: String,
    pub image: Option<String>,
}
