//! Hiking diary and visited-course endpoints
//!
//! Everything here belongs to the logged-in user. The course lists a diary can
//! be written for change only after a hike, so those are cached per
//! credential; diaries themselves are always fetched fresh.

use serde_json::Value;

use super::client::{ApiClient, Query};
use crate::error::ApiError;

const VISITED_COURSES_PATH: &str = "/visited-courses";
const AVAILABLE_COURSES_PATH: &str = "/courses/available";

/// Diary endpoints of the current user
#[derive(Debug, Clone, Copy)]
pub struct DiaryApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DiaryApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Lists the user's diaries grouped by `group_by`
    pub async fn diaries(&self, group_by: &str) -> Result<Value, ApiError> {
        self.client
            .get("/diaries", vec![("groupBy", group_by.to_string())])
            .await
    }

    pub async fn diary(&self, diary_id: u64) -> Result<Value, ApiError> {
        self.client.get(&format!("/diaries/{}", diary_id), Query::new()).await
    }

    /// Whether the user may generate another diary
    pub async fn permission(&self) -> Result<Value, ApiError> {
        self.client.get("/diaries/permission", Query::new()).await
    }

    /// Courses the user can write a diary for (cached per credential)
    pub async fn available_courses(&self) -> Result<Value, ApiError> {
        self.client
            .get_cached_private(AVAILABLE_COURSES_PATH, Query::new())
            .await
    }

    /// Courses the user has completed (cached per credential)
    pub async fn visited_courses(&self) -> Result<Value, ApiError> {
        self.client
            .get_cached_private(VISITED_COURSES_PATH, Query::new())
            .await
    }

    pub async fn visited_course(&self, visited_course_id: u64) -> Result<Value, ApiError> {
        self.client
            .get(&format!("{}/{}", VISITED_COURSES_PATH, visited_course_id), Query::new())
            .await
    }
}
