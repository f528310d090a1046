//! "My page" endpoints: profile, health record and activity statistics

use serde_json::Value;

use super::client::{ApiClient, Query};
use crate::error::ApiError;

const PROFILE_PATH: &str = "/me/profile";

/// Endpoints describing the current user
#[derive(Debug, Clone, Copy)]
pub struct MypageApi<'a> {
    client: &'a ApiClient,
}

impl<'a> MypageApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// The user's profile (cached per credential)
    pub async fn profile(&self) -> Result<Value, ApiError> {
        self.client.get_cached_private(PROFILE_PATH, Query::new()).await
    }

    /// The user's health record
    pub async fn user_health(&self) -> Result<Value, ApiError> {
        self.client.get("/me/userhealth", Query::new()).await
    }

    /// Counts of the user's hikes, diaries, articles and the like
    pub async fn activity_statistics(&self) -> Result<Value, ApiError> {
        self.client.get("/me/activity/statistics", Query::new()).await
    }

    /// Drops the cached profile of the current user
    pub fn forget_profile(&self) -> bool {
        self.client.invalidate_private(PROFILE_PATH, &Query::new())
    }
}
