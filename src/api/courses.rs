//! Course, region and attraction endpoints
//!
//! Reference data (region codes, content types) and attraction lookups change
//! rarely and are requested repeatedly, so they go through the response cache.
//! Course listings and details are always fetched fresh.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::client::{ApiClient, Query};
use crate::error::ApiError;

/// Content type used for nearby attractions when none is given
pub const DEFAULT_CONTENT_TYPE_ID: u32 = 21;

/// Default page size of the full course listing
pub const DEFAULT_ALL_COURSES_SIZE: u32 = 500;

/// Default page size of paged listings
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default sort of condition-based course recommendations
pub const DEFAULT_DISEASE_SORT: &str = "created_at, asc";

/// Default sort of course reviews
pub const DEFAULT_REVIEW_SORT: &str = "visitedAt, desc";

const SCHEDULE_PATH: &str = "/courses/schedule";
const SCHEDULED_COURSES_PATH: &str = "/course/schedule";

/// Body of a schedule registration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub course_id: u64,
    pub due_date: NaiveDate,
    pub email: String,
    pub attraction_ids: Vec<u64>,
}

/// Course-related endpoints
#[derive(Debug, Clone, Copy)]
pub struct CourseApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CourseApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Lists every course, one page at a time
    pub async fn all_courses(&self, page: u32, size: u32) -> Result<Value, ApiError> {
        self.client
            .get("/courses", vec![("page", page.to_string()), ("size", size.to_string())])
            .await
    }

    /// Searches courses in a region
    pub async fn search_by_region(
        &self,
        sido_code: u32,
        sigungu_code: u32,
        email: Option<&str>,
        page: u32,
        size: u32,
    ) -> Result<Value, ApiError> {
        let mut query: Query = vec![
            ("sidoCode", sido_code.to_string()),
            ("sigunguCode", sigungu_code.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ];
        if let Some(email) = email {
            query.push(("email", email.to_string()));
        }
        self.client.get("/courses/region", query).await
    }

    pub async fn course_detail(&self, course_id: u64) -> Result<Value, ApiError> {
        self.client
            .get("/courses/detail", vec![("courseId", course_id.to_string())])
            .await
    }

    /// Attractions around a region (cached)
    pub async fn nearby_attractions(
        &self,
        sido_code: u32,
        sigungu_code: u32,
        content_type_id: u32,
    ) -> Result<Value, ApiError> {
        self.client
            .get_cached(
                "/attractions/region",
                vec![
                    ("sidoCode", sido_code.to_string()),
                    ("sigunguCode", sigungu_code.to_string()),
                    ("contentTypeId", content_type_id.to_string()),
                ],
            )
            .await
    }

    /// Province-level region codes (cached)
    pub async fn sidos(&self) -> Result<Value, ApiError> {
        self.client.get_cached("/regions/sido", Query::new()).await
    }

    /// District-level region codes within a province (cached)
    pub async fn sigungus(&self, sido_code: u32) -> Result<Value, ApiError> {
        self.client
            .get_cached("/regions/sigungu", vec![("sidoCode", sido_code.to_string())])
            .await
    }

    /// Attraction content types (cached)
    pub async fn content_types(&self) -> Result<Value, ApiError> {
        self.client.get_cached("/attractions/contenttypes", Query::new()).await
    }

    /// Top courses by rating, visits and reviews
    pub async fn top_courses(&self, email: Option<&str>) -> Result<Value, ApiError> {
        let query = email.map(|e| vec![("email", e.to_string())]).unwrap_or_default();
        self.client.get("/courses/top", query).await
    }

    /// Courses recommended for a user's conditions
    pub async fn disease_courses(
        &self,
        email: &str,
        disease_id: Option<u64>,
        page: u32,
        size: u32,
        sort: &str,
    ) -> Result<Value, ApiError> {
        let mut query: Query = vec![
            ("email", email.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
            ("sort", sort.to_string()),
        ];
        if let Some(id) = disease_id {
            query.push(("diseaseId", id.to_string()));
        }
        self.client.get("/courses/disease", query).await
    }

    pub async fn attraction_detail(&self, attraction_id: u64) -> Result<Value, ApiError> {
        self.client
            .get("/attractions/detail", vec![("attractionId", attraction_id.to_string())])
            .await
    }

    pub async fn course_reviews(&self, course_id: u64, page: u32, size: u32, sort: &str) -> Result<Value, ApiError> {
        self.client
            .get(
                "/courses/reviews",
                vec![
                    ("courseId", course_id.to_string()),
                    ("page", page.to_string()),
                    ("size", size.to_string()),
                    ("sort", sort.to_string()),
                ],
            )
            .await
    }

    /// Registers a planned visit and drops the user's cached schedule
    pub async fn register_schedule(&self, request: &ScheduleRequest) -> Result<Value, ApiError> {
        let response = self.client.post(SCHEDULE_PATH, request).await?;
        self.client
            .invalidate_private(SCHEDULED_COURSES_PATH, &scheduled_courses_query(&request.email));
        Ok(response)
    }

    /// Planned visits of a user (cached)
    pub async fn scheduled_courses(&self, email: &str) -> Result<Value, ApiError> {
        self.client
            .get_cached_private(SCHEDULED_COURSES_PATH, scheduled_courses_query(email))
            .await
    }

    /// Drops every cached response
    pub fn clear_all_requests(&self) {
        self.client.clear_cache();
    }
}

fn scheduled_courses_query(email: &str) -> Query {
    vec![("email", email.to_string())]
}
