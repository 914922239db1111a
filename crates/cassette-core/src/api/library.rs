//! Library endpoints

use crate::client::AuthenticatedRequestClient;
use crate::error::ApiError;
use crate::executor::RequestDescriptor;
use crate::models::LibraryStats;

pub const LIBRARY_STATS_ENDPOINT: &str = "/library/stats/";

impl AuthenticatedRequestClient {
    /// Aggregate counters over the caller's songs
    pub async fn library_stats(&self) -> Result<LibraryStats, ApiError> {
        self.execute_as(&RequestDescriptor::get(LIBRARY_STATS_ENDPOINT))
            .await
    }
}
