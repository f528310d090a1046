//! Client for the odorok REST API
//!
//! `ApiClient` performs the requests and owns the response cache; the endpoint
//! wrappers borrow it and return the decoded JSON payloads.

pub mod attendance;
pub mod client;
pub mod community;
pub mod courses;
pub mod diaries;
pub mod mypage;

pub use attendance::AttendanceApi;
pub use client::{ApiClient, CacheScope, Query};
pub use community::{ArticleFilter, CommunityApi, FIRST_COMMENT_PAGE};
pub use courses::{
    CourseApi, ScheduleRequest, DEFAULT_ALL_COURSES_SIZE, DEFAULT_CONTENT_TYPE_ID, DEFAULT_DISEASE_SORT, DEFAULT_PAGE_SIZE,
    DEFAULT_REVIEW_SORT,
};
pub use diaries::DiaryApi;
pub use mypage::MypageApi;
