//! Business logic services

pub mod catalog;
pub mod feed;
pub mod import;
pub mod loans;
pub mod students;

use std::sync::Arc;

use crate::{
    clock::SharedClock,
    config::CirculationConfig,
    moderation::ContentModerator,
    repository::{CirculationStore, FeedStore},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub students: students::StudentsService,
    pub feed: feed::FeedService,
    pub import: import::ImportService,
}

impl Services {
    /// Create all services over one store. Both `Repository` and
    /// `MemoryStore` implement the two store traits.
    pub fn new<S>(store: Arc<S>, clock: SharedClock, circulation: &CirculationConfig) -> Self
    where
        S: CirculationStore + FeedStore + 'static,
    {
        let circulation_store: Arc<dyn CirculationStore> = store.clone();
        let feed_store: Arc<dyn FeedStore> = store;

        Self {
            catalog: catalog::CatalogService::new(circulation_store.clone()),
            loans: loans::LoansService::new(
                circulation_store.clone(),
                clock.clone(),
                circulation.default_loan_days,
            ),
            students: students::StudentsService::new(circulation_store.clone(), clock.clone()),
            feed: feed::FeedService::new(
                feed_store,
                circulation_store.clone(),
                ContentModerator::new(),
                clock.clone(),
            ),
            import: import::ImportService::new(circulation_store, clock, circulation.default_fine_rate),
        }
    }
}
