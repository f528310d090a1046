//! Community board endpoints
//!
//! Articles and comments change constantly, so none of these reads are cached.

use serde_json::Value;

use super::client::{ApiClient, Query};
use crate::error::ApiError;

/// First comment page; the comment listing is 1-based
pub const FIRST_COMMENT_PAGE: u32 = 1;

/// Filters for the article search
///
/// Unset fields are left out of the query so the backend applies its own
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub board_type: Option<u32>,
    pub disease_id: Option<u64>,
    pub course_id: Option<u64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ArticleFilter {
    fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(board_type) = self.board_type {
            query.push(("boardType", board_type.to_string()));
        }
        if let Some(disease_id) = self.disease_id {
            query.push(("diseaseId", disease_id.to_string()));
        }
        if let Some(course_id) = self.course_id {
            query.push(("courseId", course_id.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("size", size.to_string()));
        }
        query
    }
}

/// Article and comment endpoints
#[derive(Debug, Clone, Copy)]
pub struct CommunityApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CommunityApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Searches articles
    pub async fn search_articles(&self, filter: &ArticleFilter) -> Result<Value, ApiError> {
        self.client.get("/articles/search", filter.to_query()).await
    }

    pub async fn article(&self, article_id: u64) -> Result<Value, ApiError> {
        self.client.get(&format!("/articles/{}", article_id), Query::new()).await
    }

    /// One page of an article's comments
    pub async fn comments(&self, article_id: u64, page: u32) -> Result<Value, ApiError> {
        self.client
            .get(
                &format!("/articles/{}/comments", article_id),
                vec![("page", page.to_string())],
            )
            .await
    }
}
