use tracing::{info, warn};

use crate::api::types::ProjectRecord;
use crate::api::{ApiError, ProjectsClient};
use crate::storage::TokenStore;

pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Display value for the no-filtering sentinel.
pub const ALL_LABEL: &str = "All";

/// Active filter over the project list. A value matches a record when it
/// equals the record's category or its status label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProjectFilter {
    #[default]
    All,
    Value(String),
}

impl ProjectFilter {
    /// Translate a selector value into a filter. `All` and `*` are the
    /// sentinel spellings meaning no filtering.
    pub fn from_selection(value: &str) -> Self {
        if value == ALL_LABEL || value == "*" {
            ProjectFilter::All
        } else {
            ProjectFilter::Value(value.to_string())
        }
    }

    pub fn matches(&self, record: &ProjectRecord) -> bool {
        match self {
            ProjectFilter::All => true,
            ProjectFilter::Value(value) => {
                record.category.as_deref() == Some(value.as_str())
                    || record
                        .status
                        .map(|status| status.label() == value)
                        .unwrap_or(false)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingPhase {
    Loading,
    Ready,
    /// Terminal until the listing is re-activated; there is no automatic retry.
    Error(String),
}

/// Owns the project list fetched at activation and derives the
/// filtered/paginated view from it. Delete keeps the local copy consistent
/// with the backend without a refetch.
pub struct ProjectListing<S: TokenStore> {
    client: ProjectsClient<S>,
    phase: ListingPhase,
    records: Vec<ProjectRecord>,
    categories: Vec<String>,
    filter: ProjectFilter,
    current_page: usize,
    page_size: usize,
    last_error: Option<String>,
}

impl<S: TokenStore> ProjectListing<S> {
    pub fn new(client: ProjectsClient<S>) -> Self {
        Self {
            client,
            phase: ListingPhase::Loading,
            records: Vec::new(),
            categories: vec![ALL_LABEL.to_string()],
            filter: ProjectFilter::All,
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            last_error: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetch the project list and the category selector options. A failed
    /// list fetch leaves the listing in the Error phase with an empty list;
    /// a failed category fetch only costs the selector its options.
    pub async fn activate(&mut self) {
        self.phase = ListingPhase::Loading;
        self.filter = ProjectFilter::All;
        self.current_page = 1;
        self.last_error = None;

        match self.client.list_projects().await {
            Ok(records) => {
                info!(count = records.len(), "project listing loaded");
                self.records = records;
                self.phase = ListingPhase::Ready;
            }
            Err(err) => {
                warn!(error = %err, "initial project fetch failed");
                self.records.clear();
                self.phase = ListingPhase::Error(err.to_string());
                return;
            }
        }

        match self.client.list_categories().await {
            Ok(categories) => {
                self.categories = std::iter::once(ALL_LABEL.to_string())
                    .chain(categories)
                    .collect();
            }
            Err(err) => {
                warn!(error = %err, "category fetch failed, selector keeps the sentinel only");
            }
        }
    }

    pub fn set_filter(&mut self, filter: ProjectFilter) {
        self.filter = filter;
        self.current_page = 1;
    }

    /// Accepted only when `1 <= page <= total_pages`; out-of-range requests
    /// are ignored.
    pub fn set_page(&mut self, page: usize) {
        if (1..=self.total_pages()).contains(&page) {
            self.current_page = page;
        }
    }

    /// Delete on the backend, then drop the record locally. A failed delete
    /// leaves the list untouched so the row does not silently disappear.
    pub async fn delete(&mut self, id: &str) -> Result<(), ApiError> {
        match self.client.delete_project(id).await {
            Ok(()) => {
                info!(%id, "project deleted");
                self.records.retain(|record| record.id != id);
                self.last_error = None;
                self.clamp_page();
                Ok(())
            }
            Err(err) => {
                warn!(%id, error = %err, "project delete failed");
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn phase(&self) -> &ListingPhase {
        &self.phase
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    /// Selector options: the sentinel followed by the fetched categories.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn filter(&self) -> &ProjectFilter {
        &self.filter
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Message from the most recent failed delete, cleared by the next
    /// successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn filtered(&self) -> Vec<&ProjectRecord> {
        self.records
            .iter()
            .filter(|record| self.filter.matches(record))
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    /// The page-sized slice of the filtered view currently on screen.
    pub fn visible_page(&self) -> Vec<&ProjectRecord> {
        let start = (self.current_page - 1) * self.page_size;
        self.filtered()
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    fn clamp_page(&mut self) {
        let total = self.total_pages().max(1);
        if self.current_page > total {
            self.current_page = total;
        }
    }
}
