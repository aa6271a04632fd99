use super::entity::{ForumComment, ForumPost};
use crate::domain::{require_text, DomainError, DomainResult};

pub fn validate_post(post: &ForumPost) -> DomainResult<()> {
    require_text("Post title", &post.title)?;
    require_text("Post content", &post.content)?;
    require_text("Author name", &post.author.name)?;
    if post.tags.iter().any(|t| t.contains(',')) {
        return Err(DomainError::InvariantViolation(
            "Tags cannot contain commas".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_comment(comment: &ForumComment) -> DomainResult<()> {
    require_text("Comment", &comment.content)?;
    require_text("Author name", &comment.author.name)?;
    if comment.parent_comment_id == Some(comment.id) && comment.id != 0 {
        return Err(DomainError::InvariantViolation(
            "A comment cannot reply to itself".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Author, ForumCategory};

    #[test]
    fn test_post_requires_title_and_body() {
        let post = ForumPost::new("", "body", Author::anonymous(), ForumCategory::General);
        assert!(validate_post(&post).is_err());
        let post = ForumPost::new("Title", "body", Author::anonymous(), ForumCategory::General);
        assert!(validate_post(&post).is_ok());
    }

    #[test]
    fn test_comma_in_tag_fails() {
        let post = ForumPost::new("T", "b", Author::anonymous(), ForumCategory::General)
            .with_tags(["a,b"]);
        assert!(validate_post(&post).is_err());
    }
}
