//! Progress lookups and owner listings for the Tracker.

use super::Tracker;
use crate::{
    error::{Result, TrackerError},
    models::{Page, Progress, ProgressDetail, ProgressFilter, ProgressSummary},
    params::{FindProgress, Id, ListProgress},
};

impl Tracker {
    pub async fn get_progress(&self, params: &Id) -> Result<Option<Progress>> {
        let progress_id = params.id;
        self.with_db(move |db| db.get_progress(progress_id)).await
    }

    /// A progress record with the status of every step, in step order.
    pub async fn get_progress_detail(&self, params: &Id) -> Result<Option<ProgressDetail>> {
        let progress_id = params.id;
        self.with_db(move |db| db.get_progress_detail(progress_id))
            .await
    }

    /// The latest record of a session for a process, in any status.
    pub async fn find_progress(&self, params: &FindProgress) -> Result<Option<Progress>> {
        let process_id = params.process_id;
        let session_id = params.session_id.clone();
        self.with_db(move |db| db.find_progress(process_id, &session_id))
            .await
    }

    /// Pages through the records of a process, newest first.
    ///
    /// Without an explicit limit the configured page size applies.
    pub async fn list_progress(&self, params: &ListProgress) -> Result<Page<ProgressSummary>> {
        let process_id = params.process_id;
        let mut filter = ProgressFilter::from(params);
        if params.limit.is_none() {
            filter.limit = self.settings.page_size;
        }

        self.with_db(move |db| {
            if db.get_process(process_id)?.is_none() {
                return Err(TrackerError::NotFound {
                    entity: "Process",
                    id: process_id,
                });
            }
            db.list_progress(process_id, &filter)
        })
        .await
    }
}
