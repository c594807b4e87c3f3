use chrono::Utc;
use molttip_common::api::{NotificationList, Page};
use molttip_common::comment::Comment;
use molttip_common::identity::{NotificationId, PostId, UserId};
use molttip_common::notification::Notification;
use molttip_common::post::{validate_content, Post, COMMENT_MAX_CHARS, POST_MAX_CHARS};
use tracing::info;

use super::Economy;
use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

impl Economy {
    // ─── Posts ───────────────────────────────────────────────────────────────

    pub fn create_post(&mut self, author: &UserId, content: &str) -> Result<Post, ApiError> {
        self.user(author)?;
        let content = validate_content(content, POST_MAX_CHARS)?;
        let post = Post::new(author.clone(), content, Utc::now());
        self.posts.insert(post.id.clone(), post.clone());
        info!(post = %post.id, author = %author, "post created");
        Ok(post)
    }

    pub fn post(&self, id: &PostId) -> Result<&Post, ApiError> {
        self.posts.get(id).ok_or_else(|| ApiError::not_found("Post"))
    }

    /// One page of posts, newest first. `page` is 1-based.
    pub fn feed(&self, page: Option<usize>, limit: Option<usize>) -> Page<Post> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let mut posts: Vec<&Post> = self.posts.values().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        let items = posts
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();
        Page {
            items,
            total: self.posts.len(),
            page,
            limit,
        }
    }

    /// Delete a post and its comments. Only the author may do this; tips
    /// that referenced the post stay in the ledger.
    pub fn delete_post(&mut self, actor: &UserId, id: &PostId) -> Result<Post, ApiError> {
        if self.post(id)?.author != *actor {
            return Err(ApiError::Forbidden(
                "Only the author can delete this post".into(),
            ));
        }
        let post = self
            .posts
            .remove(id)
            .ok_or_else(|| ApiError::not_found("Post"))?;
        let before = self.comments.len();
        self.comments.retain(|_, c| c.post_id != *id);
        info!(
            post = %id,
            comments_removed = before - self.comments.len(),
            "post deleted"
        );
        Ok(post)
    }

    /// Like a post. Liking twice is a no-op; only the first like notifies.
    pub fn like_post(&mut self, actor: &UserId, id: &PostId) -> Result<Post, ApiError> {
        let label = self.user(actor)?.label().to_string();
        let post = self
            .posts
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found("Post"))?;
        let added = post.like(actor);
        let post = post.clone();
        if added && post.author != *actor {
            self.notify(Notification::like(
                post.author.clone(),
                actor.clone(),
                &label,
                &post.id,
                Utc::now(),
            ));
        }
        Ok(post)
    }

    // ─── Comments ────────────────────────────────────────────────────────────

    pub fn add_comment(
        &mut self,
        author: &UserId,
        post_id: &PostId,
        content: &str,
    ) -> Result<Comment, ApiError> {
        let label = self.user(author)?.label().to_string();
        let post_author = self.post(post_id)?.author.clone();
        let content = validate_content(content, COMMENT_MAX_CHARS)?;

        let now = Utc::now();
        let comment = Comment::new(post_id.clone(), author.clone(), content, now);
        if let Some(post) = self.posts.get_mut(post_id) {
            post.comments += 1;
        }
        self.comments.insert(comment.id.clone(), comment.clone());
        if post_author != *author {
            if let Some(owner) = self.users.get_mut(&post_author) {
                owner.reputation += 1;
            }
            self.notify(Notification::comment(
                post_author,
                author.clone(),
                &label,
                post_id,
                now,
            ));
        }
        Ok(comment)
    }

    /// Comments on a post, oldest first.
    pub fn comments_for(&self, post_id: &PostId) -> Result<Vec<Comment>, ApiError> {
        self.post(post_id)?;
        let mut comments: Vec<Comment> = self
            .comments
            .values()
            .filter(|c| c.post_id == *post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }

    // ─── Notifications ───────────────────────────────────────────────────────

    /// A user's notifications, newest first, with the unread count.
    pub fn notifications_for(&self, user: &UserId) -> NotificationList {
        let items: Vec<Notification> = self
            .notifications
            .get(user)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default();
        let unread_count = items.iter().filter(|n| !n.is_read).count();
        NotificationList {
            items,
            unread_count,
        }
    }

    /// Mark one notification read. Someone else's notification is reported
    /// as missing.
    pub fn mark_read(
        &mut self,
        user: &UserId,
        id: &NotificationId,
    ) -> Result<Notification, ApiError> {
        let notification = self
            .notifications
            .get_mut(user)
            .and_then(|list| list.iter_mut().find(|n| n.id == *id))
            .ok_or_else(|| ApiError::not_found("Notification"))?;
        notification.mark_read();
        Ok(notification.clone())
    }

    /// Mark everything read; returns how many changed.
    pub fn mark_all_read(&mut self, user: &UserId) -> usize {
        self.notifications
            .get_mut(user)
            .map(|list| list.iter_mut().filter_map(|n| n.mark_read().then_some(())).count())
            .unwrap_or(0)
    }
}
