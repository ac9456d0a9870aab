//! Persisted configuration overlay on top of the drug catalog.
//!
//! The store is the single source of truth for the current per-drug
//! configuration and the display order. Every mutation is applied in memory
//! first and then written through the [`KeyValueStore`]; a failed write is
//! reported as a [`Notice`] and never rolls the in-memory change back.
//!
//! The display order always lists enabled drugs before disabled ones. It is
//! renormalized with a stable partition after every mutation that can change
//! the order or an `enabled` flag, so readers never observe a violation.

use crate::catalog::get_default_catalog;
use crate::notice::Notice;
use crate::storage::KeyValueStore;
use crate::types::{Catalog, DrugConfig, DrugConfigs};
use crate::{Error, Result};
use std::collections::HashSet;

/// Key holding the serialized configuration overlay
pub const CONFIGS_KEY: &str = "drug_configs";
/// Key holding the serialized display order
pub const ORDER_KEY: &str = "drug_order";
/// Key holding the startup drug identifier
pub const INITIAL_DRUG_KEY: &str = "initial_drug";

/// Lifecycle of a store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Loading,
    Ready,
}

/// Change notifications delivered to subscribers
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    Loaded,
    ConfigsChanged,
    OrderChanged,
    Notice(Notice),
}

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

pub struct ConfigStore<S: KeyValueStore> {
    storage: S,
    catalog: Catalog,
    state: StoreState,
    configs: DrugConfigs,
    order: Vec<String>,
    initial_drug: String,
    notices: Vec<Notice>,
    subscribers: Vec<Subscriber>,
}

/// Stable partition of `order`: enabled drugs first, disabled drugs after,
/// relative order preserved within each group.
pub fn partition_enabled_first(order: &[String], configs: &DrugConfigs) -> Vec<String> {
    let is_enabled = |id: &String| configs.get(id).map_or(true, |c| c.enabled);
    let (mut enabled, disabled): (Vec<String>, Vec<String>) =
        order.iter().cloned().partition(|id| is_enabled(id));
    enabled.extend(disabled);
    enabled
}

/// True when no disabled drug precedes an enabled one
pub fn is_enabled_first(order: &[String], configs: &DrugConfigs) -> bool {
    let mut seen_disabled = false;
    for id in order {
        let enabled = configs.get(id).map_or(true, |c| c.enabled);
        if !enabled {
            seen_disabled = true;
        } else if seen_disabled {
            return false;
        }
    }
    true
}

impl<S: KeyValueStore> ConfigStore<S> {
    /// Create a store over the built-in catalog. Call [`ConfigStore::load`] before use.
    pub fn new(storage: S) -> Self {
        Self::with_catalog(storage, get_default_catalog().clone())
    }

    pub fn with_catalog(storage: S, catalog: Catalog) -> Self {
        let configs = catalog.default_configs();
        let order = catalog.order.clone();
        let initial_drug = order.first().cloned().unwrap_or_default();
        Self {
            storage,
            catalog,
            state: StoreState::Uninitialized,
            configs,
            order,
            initial_drug,
            notices: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn configs(&self) -> &DrugConfigs {
        &self.configs
    }

    pub fn config(&self, id: &str) -> Option<&DrugConfig> {
        self.configs.get(id)
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Enabled drugs in display order
    pub fn enabled_drugs(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|id| self.configs.get(*id).is_some_and(|c| c.enabled))
            .map(String::as_str)
            .collect()
    }

    /// Drug selected at startup (head of the display order)
    pub fn initial_drug(&self) -> &str {
        &self.initial_drug
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain the recorded notices, e.g. after showing them to the user
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Register a callback invoked after every change and notice
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load the persisted overlay and order, falling back to catalog defaults.
    ///
    /// Never fails: read and parse errors are recorded as a `LoadFailed`
    /// notice, incomplete data is logged and replaced by defaults.
    pub fn load(&mut self) {
        self.state = StoreState::Loading;

        let (configs, order) = match self.read_persisted() {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("Failed to load drug settings: {}. Using defaults.", e);
                self.notify(Notice::LoadFailed {
                    message: e.to_string(),
                });
                (self.catalog.default_configs(), self.catalog.order.clone())
            }
        };

        self.order = partition_enabled_first(&order, &configs);
        self.configs = configs;
        self.initial_drug = self.order.first().cloned().unwrap_or_default();
        self.state = StoreState::Ready;

        tracing::info!(
            "Loaded {} drug configs, startup drug '{}'",
            self.configs.len(),
            self.initial_drug
        );
        self.emit(StoreEvent::Loaded);
        self.persist_initial_drug();
    }

    fn read_persisted(&self) -> Result<(DrugConfigs, Vec<String>)> {
        let defaults = || (self.catalog.default_configs(), self.catalog.order.clone());

        let configs = match self.storage.get(CONFIGS_KEY)? {
            Some(json) => {
                let configs = serde_json::from_str::<DrugConfigs>(&json)?;
                if let Err(problem) = self.check_overlay_ids(&configs) {
                    tracing::warn!(
                        "Saved drug configs are incomplete ({}). Using defaults.",
                        problem
                    );
                    return Ok(defaults());
                }
                configs
            }
            None => {
                tracing::info!("No saved drug configs, using defaults");
                self.catalog.default_configs()
            }
        };

        let order = match self.storage.get(ORDER_KEY)? {
            Some(json) => {
                let saved: Vec<String> = serde_json::from_str(&json)?;
                self.complete_order(saved)
            }
            None => self.catalog.order.clone(),
        };

        Ok((configs, order))
    }

    /// Append missing catalog ids to a saved order; unknown or repeated ids discard it
    fn complete_order(&self, saved: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        for id in &saved {
            if !self.catalog.contains(id) || !seen.insert(id.clone()) {
                tracing::warn!("Saved drug order has invalid entry '{}'. Using natural order.", id);
                return self.catalog.order.clone();
            }
        }

        let mut order = saved;
        for id in &self.catalog.order {
            if !seen.contains(id) {
                tracing::debug!("Appending '{}' missing from saved order", id);
                order.push(id.clone());
            }
        }
        order
    }

    fn check_overlay_ids(&self, configs: &DrugConfigs) -> Result<()> {
        if let Some(unknown) = configs.keys().find(|id| !self.catalog.contains(id)) {
            return Err(Error::UnknownDrug(unknown.clone()));
        }
        if let Some(missing) = self.catalog.ids().find(|id| !configs.contains_key(*id)) {
            return Err(Error::InvalidDrugConfig(format!(
                "no configuration for '{}'",
                missing
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Replace the whole overlay.
    ///
    /// The overlay must cover exactly the catalog ids. The order is
    /// renormalized if `enabled` flags changed.
    pub fn set_configs(&mut self, configs: DrugConfigs) -> Result<()> {
        self.check_overlay_ids(&configs)?;

        let order = partition_enabled_first(&self.order, &configs);
        self.configs = configs;
        self.emit(StoreEvent::ConfigsChanged);
        if order != self.order {
            self.apply_order(order);
            self.persist_order();
            self.persist_initial_drug();
        }
        self.persist_configs();
        Ok(())
    }

    /// Validate and commit a single drug's override
    pub fn update_drug(&mut self, id: &str, config: DrugConfig) -> Result<()> {
        self.require_known(id)?;
        config.validate()?;

        let mut configs = self.configs.clone();
        configs.insert(id.to_string(), config);
        self.set_configs(configs)
    }

    /// Restore one drug's shipped defaults without touching the others
    pub fn reset_drug_to_default(&mut self, id: &str) -> Result<()> {
        let default = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownDrug(id.to_string()))?;

        let mut configs = self.configs.clone();
        configs.insert(id.to_string(), default);
        self.set_configs(configs)?;

        tracing::info!("Reset '{}' to defaults", id);
        self.notify(Notice::ResetDone {
            drug: self.configs[id].label.clone(),
        });
        Ok(())
    }

    /// Replace the display order.
    ///
    /// `order` must be a permutation of the catalog ids. It is stored
    /// enabled-first, and its head becomes the startup drug.
    pub fn set_drug_order(&mut self, order: Vec<String>) -> Result<()> {
        self.catalog.check_permutation(&order)?;

        let order = partition_enabled_first(&order, &self.configs);
        self.apply_order(order);
        self.persist_order();
        self.persist_initial_drug();
        Ok(())
    }

    /// Move one drug to `index` (clamped to the end), then renormalize
    pub fn move_drug(&mut self, id: &str, index: usize) -> Result<()> {
        self.require_known(id)?;

        let mut order: Vec<String> = self.order.iter().filter(|d| *d != id).cloned().collect();
        order.insert(index.min(order.len()), id.to_string());
        self.set_drug_order(order)
    }

    /// Show or hide a drug; the flag and the order change together
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        self.require_known(id)?;

        let mut configs = self.configs.clone();
        if let Some(config) = configs.get_mut(id) {
            config.enabled = enabled;
        }
        self.set_configs(configs)
    }

    /// Make an enabled drug the startup drug by moving it to the head of the order
    pub fn set_initial_drug(&mut self, id: &str) -> Result<()> {
        let enabled = self
            .configs
            .get(id)
            .ok_or_else(|| Error::UnknownDrug(id.to_string()))?
            .enabled;
        if !enabled {
            return Err(Error::InvalidOrder(format!(
                "disabled drug '{}' cannot be the startup drug",
                id
            )));
        }
        self.move_drug(id, 0)
    }

    /// Restore every drug's defaults and the natural catalog order
    pub fn reset_to_default(&mut self) {
        self.configs = self.catalog.default_configs();
        self.emit(StoreEvent::ConfigsChanged);
        let order = partition_enabled_first(&self.catalog.order, &self.configs);
        self.apply_order(order);

        tracing::info!("Reset all drug settings to defaults");
        self.persist_configs();
        self.persist_order();
        self.persist_initial_drug();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn require_known(&self, id: &str) -> Result<()> {
        if self.catalog.contains(id) {
            Ok(())
        } else {
            Err(Error::UnknownDrug(id.to_string()))
        }
    }

    fn apply_order(&mut self, order: Vec<String>) {
        self.order = order;
        self.initial_drug = self.order.first().cloned().unwrap_or_default();
        self.emit(StoreEvent::OrderChanged);
    }

    fn persist_configs(&mut self) {
        match serde_json::to_string(&self.configs) {
            Ok(json) => self.persist(CONFIGS_KEY, &json),
            Err(e) => self.report_write_failure(CONFIGS_KEY, e.into()),
        }
    }

    fn persist_order(&mut self) {
        match serde_json::to_string(&self.order) {
            Ok(json) => self.persist(ORDER_KEY, &json),
            Err(e) => self.report_write_failure(ORDER_KEY, e.into()),
        }
    }

    fn persist_initial_drug(&mut self) {
        let drug = self.initial_drug.clone();
        self.persist(INITIAL_DRUG_KEY, &drug);
    }

    fn persist(&mut self, key: &str, value: &str) {
        match self.storage.set(key, value) {
            Ok(()) => tracing::debug!("Persisted '{}'", key),
            Err(e) => self.report_write_failure(key, e),
        }
    }

    fn report_write_failure(&mut self, key: &str, error: Error) {
        tracing::warn!("Failed to persist '{}': {}", key, error);
        self.notify(Notice::PersistenceFailed {
            key: key.to_string(),
            message: error.to_string(),
        });
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice.clone());
        self.emit(StoreEvent::Notice(notice));
    }

    fn emit(&mut self, event: StoreEvent) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }
}
