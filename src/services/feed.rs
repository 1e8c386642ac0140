//! Social wall service
//!
//! Text is moderated once, at creation, before anything is stored.

use std::sync::Arc;

use crate::{
    clock::SharedClock,
    error::{AppError, AppResult},
    models::{Actor, Comment, NewPost, Post},
    moderation::ContentModerator,
    repository::{CirculationStore, FeedStore},
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct FeedService {
    feed: Arc<dyn FeedStore>,
    students: Arc<dyn CirculationStore>,
    moderator: ContentModerator,
    clock: SharedClock,
}

impl FeedService {
    pub fn new(
        feed: Arc<dyn FeedStore>,
        students: Arc<dyn CirculationStore>,
        moderator: ContentModerator,
        clock: SharedClock,
    ) -> Self {
        Self {
            feed,
            students,
            moderator,
            clock,
        }
    }

    pub async fn create_post(&self, actor: &Actor, post: &NewPost) -> AppResult<Post> {
        let author_id = self.require_active_student(actor).await?;

        if let Some(image) = &post.image {
            check_image_reference(image)?;
        }
        self.moderate(author_id, &post.body)?;

        let post = self.feed.insert_post(author_id, post, self.clock.now()).await?;
        tracing::info!("Post {} created by student {}", post.id, author_id);
        Ok(post)
    }

    pub async fn add_comment(&self, actor: &Actor, post_id: i32, body: &str) -> AppResult<Comment> {
        let author_id = self.require_active_student(actor).await?;
        self.moderate(author_id, body)?;

        let comment = self
            .feed
            .insert_comment(post_id, author_id, body, self.clock.now())
            .await?;
        tracing::info!("Comment {} added to post {} by student {}", comment.id, post_id, author_id);
        Ok(comment)
    }

    /// Returns whether the post is liked by the actor afterwards
    pub async fn toggle_like(&self, actor: &Actor, post_id: i32) -> AppResult<bool> {
        let student_id = self.require_active_student(actor).await?;
        self.feed.toggle_like(post_id, student_id).await
    }

    /// Staff may delete any post; students only their own
    pub async fn delete_post(&self, actor: &Actor, post_id: i32) -> AppResult<()> {
        let post = self.feed.get_post(post_id).await?;
        actor.require_self_or_staff(post.author_id)?;

        self.feed.delete_post(post_id).await?;
        tracing::info!("Post {} deleted by {:?}", post_id, actor);
        Ok(())
    }

    /// Newest first. `page` is 1-based.
    pub async fn list_posts(&self, page: i64, per_page: i64) -> AppResult<Vec<Post>> {
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        let offset = (page.max(1) - 1) * per_page;
        self.feed.list_posts(per_page, offset).await
    }

    pub async fn comments(&self, post_id: i32) -> AppResult<Vec<Comment>> {
        self.feed.get_post(post_id).await?;
        self.feed.post_comments(post_id).await
    }

    fn moderate(&self, author_id: i32, text: &str) -> AppResult<()> {
        let verdict = self.moderator.validate(text);
        if verdict.accepted {
            return Ok(());
        }
        tracing::warn!(
            "Content from student {} rejected by moderation ({:?})",
            author_id, verdict.kind
        );
        Err(AppError::Validation(
            verdict.reason.unwrap_or_default().to_string(),
        ))
    }

    async fn require_active_student(&self, actor: &Actor) -> AppResult<i32> {
        let student_id = actor.require_student()?;
        let student = self.students.get_student(student_id).await?;
        if !student.can_transact() {
            return Err(AppError::Authorization(format!(
                "Student account is {}",
                student.status
            )));
        }
        Ok(student_id)
    }
}

fn check_image_reference(image: &str) -> AppResult<()> {
    let extension = image
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Unsupported image type, expected one of: {}",
            IMAGE_EXTENSIONS.join(", ")
        )))
    }
}
