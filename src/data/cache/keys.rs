//! Cache key scheme for blog reads
//!
//! - `user:{id}:blogs` - unfiltered list of a user's blogs
//! - `user:{id}:blogs:title:{filter}` - list filtered by title
//! - `user:{id}:blog:{blog_id}` - a single blog

pub fn user_blogs(user_id: i64) -> String {
    format!("user:{user_id}:blogs")
}

pub fn user_blogs_by_title(user_id: i64, title: &str) -> String {
    format!("user:{user_id}:blogs:title:{title}")
}

pub fn user_blog(user_id: i64, blog_id: i64) -> String {
    format!("user:{user_id}:blog:{blog_id}")
}

/// Glob pattern matching every title-filtered list key of a user
pub fn user_title_pattern(user_id: i64) -> String {
    format!("user:{user_id}:blogs:title:*")
}

/// List key for an optional title filter
pub fn blog_list(user_id: i64, title: Option<&str>) -> String {
    match title {
        Some(title) => user_blogs_by_title(user_id, title),
        None => user_blogs(user_id),
    }
}
