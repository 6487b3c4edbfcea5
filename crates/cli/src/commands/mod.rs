//! Command implementations.
//!
//! Every command runs against a [`Context`] built once in `run`: the API
//! client over the JSON state file, a notifier that logs, and the
//! confirmation source picked by `--yes`.

use std::num::NonZeroUsize;
use std::sync::Arc;

use emporium_admin::services::{
    AdminConsole, AlwaysConfirm, CartService, Confirm, HistoryService, Notifier, OfferDesk, OfferService,
    OrderService, RecommendationService, ShopperService, TracingNotifier,
};
use emporium_admin::{ApiClient, AppError, ClientConfig, FileStore, KeyValueStore};

use crate::prompt::StdinConfirm;

pub mod account;
pub mod admin;
pub mod offers;
pub mod session;
pub mod shop;

pub struct Context {
    pub config: ClientConfig,
    pub api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
}

impl Context {
    /// # Errors
    ///
    /// Returns an error if the state file cannot be read or the HTTP client
    /// cannot be built.
    pub fn open(config: ClientConfig, assume_yes: bool) -> Result<Self, AppError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.state_file)?);
        let api = ApiClient::new(&config, Arc::clone(&store))?;
        let confirm: Arc<dyn Confirm> = if assume_yes {
            Arc::new(AlwaysConfirm)
        } else {
            Arc::new(StdinConfirm)
        };

        Ok(Self {
            config,
            api,
            store,
            notifier: Arc::new(TracingNotifier),
            confirm,
        })
    }

    pub fn console(&self) -> AdminConsole {
        AdminConsole::new(
            self.api.clone(),
            Arc::clone(&self.notifier),
            Arc::clone(&self.confirm),
            self.config.transition_policy,
        )
    }

    pub fn cart(&self) -> CartService {
        CartService::new(self.api.clone(), Arc::clone(&self.notifier))
    }

    pub fn offers(&self) -> OfferService {
        OfferService::new(self.api.clone(), Arc::clone(&self.notifier))
    }

    pub fn offer_desk(&self, page_size: NonZeroUsize) -> OfferDesk {
        OfferDesk::new(
            self.api.clone(),
            Arc::clone(&self.notifier),
            Arc::clone(&self.confirm),
            page_size,
        )
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.api.clone(), Arc::clone(&self.notifier), Arc::clone(&self.confirm))
    }

    pub fn shopper(&self) -> ShopperService {
        ShopperService::new(self.api.clone(), Arc::clone(&self.notifier))
    }

    pub fn history(&self) -> HistoryService {
        HistoryService::new(Arc::clone(&self.store))
    }

    pub fn recommendations(&self) -> RecommendationService {
        RecommendationService::new(self.api.clone(), self.history())
    }
}
