//! # Metadata Registry
//!
//! The live description of the hierarchy: which kinds exist, how they nest,
//! which URIs serve them, and the side configuration (datamodel titles, CORS,
//! tenants) that arrives alongside.
//!
//! ## Architecture Note
//!
//! Every logical map sits behind its own `parking_lot::RwLock`, so a URI
//! notification never waits on a reader of kind metadata and vice versa.
//! Accessors clone what they return; no guard ever escapes a method, which is
//! what lets request handlers call into the registry and then go to the store
//! without holding anything.
//!
//! Multi-map updates (a URI set replacement touches three maps) take the locks
//! one after another rather than all at once. URI set installs themselves are
//! serialized by one mutex: the kind dispatcher re-expanding declared URIs and
//! the URI dispatcher replacing them never interleave, so the most recent
//! declaration always wins. A concurrent reader can observe
//! the URI→kind entry before the URI info lands; handlers treat a missing URI
//! info as "route no longer registered", which is the same answer they would
//! have given a moment earlier.

mod error;

pub use error::RegistryError;

use crate::model::{
    CorsConfig, DatamodelInfo, KindInfo, RestUri, TenantConfig, UriRegistration,
};
use crate::naming::datamodel_of;
use crate::routes::expand_uris;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

/// Outcome of [`Registry::upsert_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindChange {
    /// First time this kind was seen.
    Added,
    /// Ancestors, children, links or singleton flag changed. Routes derived
    /// from the kind are stale.
    Restructured,
    /// Only descriptive data (description, schemas) changed.
    Described,
    Unchanged,
}

/// Shared, concurrently mutable hierarchy metadata.
#[derive(Debug, Default)]
pub struct Registry {
    kinds: RwLock<HashMap<String, KindInfo>>,
    declared_uris: RwLock<HashMap<String, Vec<RestUri>>>,
    uri_to_kind: RwLock<HashMap<String, String>>,
    uri_info: RwLock<HashMap<String, UriRegistration>>,
    kind_to_uris: RwLock<HashMap<String, Vec<String>>>,
    datamodels: RwLock<BTreeMap<String, DatamodelInfo>>,
    cors: RwLock<BTreeMap<String, CorsConfig>>,
    tenants: RwLock<BTreeMap<String, TenantConfig>>,
    /// Held for the whole read-expand-install of a URI set.
    uri_install: Mutex<()>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Kinds
    // -------------------------------------------------------------------------

    /// Installs or overwrites a kind's metadata.
    ///
    /// Rejects ancestor chains that contain the kind itself or repeat an
    /// entry. When the kind's structure changed and URIs were already
    /// declared for it, the derived status and link URIs are re-expanded.
    pub fn upsert_kind(&self, kind: KindInfo) -> Result<KindChange, RegistryError> {
        validate_chain(&kind)?;
        let crd_type = kind.crd_type.clone();

        let change = {
            let mut kinds = self.kinds.write();
            let change = match kinds.get(&crd_type) {
                None => KindChange::Added,
                Some(old) if structure_differs(old, &kind) => KindChange::Restructured,
                Some(old) if old != &kind => KindChange::Described,
                Some(_) => KindChange::Unchanged,
            };
            kinds.insert(crd_type.clone(), kind);
            change
        };
        info!(%crd_type, ?change, "Kind upserted");

        if matches!(change, KindChange::Added | KindChange::Restructured) {
            let _install = self.uri_install.lock();
            let declared = self.declared_uris.read().get(&crd_type).cloned();
            if let Some(declared) = declared {
                self.install_uris(&crd_type, declared);
            }
        }
        Ok(change)
    }

    /// Removes a kind together with every URI registered for it.
    pub fn delete_kind(&self, crd_type: &str) -> bool {
        let _install = self.uri_install.lock();
        let existed = self.kinds.write().remove(crd_type).is_some();
        self.declared_uris.write().remove(crd_type);
        let uris = self.kind_to_uris.write().remove(crd_type).unwrap_or_default();
        self.forget_uris(crd_type, &uris);
        info!(%crd_type, existed, removed_uris = uris.len(), "Kind deleted");
        existed
    }

    pub fn kind(&self, crd_type: &str) -> Option<KindInfo> {
        self.kinds.read().get(crd_type).cloned()
    }

    /// Looks a kind up by its display field name (`orgchart.Leader`).
    pub fn kind_by_display_name(&self, name: &str) -> Option<KindInfo> {
        self.kinds.read().values().find(|k| k.name == name).cloned()
    }

    /// All kinds, ordered by type identifier.
    pub fn kinds(&self) -> Vec<KindInfo> {
        let mut all: Vec<_> = self.kinds.read().values().cloned().collect();
        all.sort_by(|a, b| a.crd_type.cmp(&b.crd_type));
        all
    }

    // -------------------------------------------------------------------------
    // URIs
    // -------------------------------------------------------------------------

    /// Replaces the kind's URI set with `declared` (plus the URIs derived
    /// from it). URIs in the previous set but not the new one lose their
    /// URI→kind and URI-info entries. Returns the installed registrations.
    pub fn upsert_uris(&self, crd_type: &str, declared: Vec<RestUri>) -> Vec<UriRegistration> {
        let _install = self.uri_install.lock();
        self.install_uris(crd_type, declared)
    }

    /// Caller holds `uri_install`. The kind is read here, under that lock, so
    /// the expansion matches the newest kind metadata.
    fn install_uris(&self, crd_type: &str, declared: Vec<RestUri>) -> Vec<UriRegistration> {
        let kind = self.kind(crd_type);
        let expanded = expand_uris(kind.as_ref(), crd_type, &declared);
        let new_set: Vec<String> = expanded.iter().map(|r| r.uri.clone()).collect();

        self.declared_uris.write().insert(crd_type.to_string(), declared);
        let old_set = self
            .kind_to_uris
            .write()
            .insert(crd_type.to_string(), new_set.clone())
            .unwrap_or_default();

        let keep: HashSet<&String> = new_set.iter().collect();
        let dropped: Vec<String> = old_set.into_iter().filter(|u| !keep.contains(u)).collect();
        self.forget_uris(crd_type, &dropped);

        {
            let mut uri_to_kind = self.uri_to_kind.write();
            for reg in &expanded {
                uri_to_kind.insert(reg.uri.clone(), crd_type.to_string());
            }
        }
        {
            let mut uri_info = self.uri_info.write();
            for reg in &expanded {
                uri_info.insert(reg.uri.clone(), reg.clone());
            }
        }

        info!(%crd_type, installed = expanded.len(), dropped = dropped.len(), "URIs upserted");
        expanded
    }

    /// Clears the lookups of `uris`, but only where they still belong to
    /// `crd_type` (another kind may have claimed the same path since).
    fn forget_uris(&self, crd_type: &str, uris: &[String]) {
        if uris.is_empty() {
            return;
        }
        let mut cleared = Vec::new();
        {
            let mut uri_to_kind = self.uri_to_kind.write();
            for uri in uris {
                if uri_to_kind.get(uri).map(String::as_str) == Some(crd_type) {
                    uri_to_kind.remove(uri);
                    cleared.push(uri);
                }
            }
        }
        let mut uri_info = self.uri_info.write();
        for uri in cleared {
            uri_info.remove(uri);
            debug!(%uri, "URI info cleared");
        }
    }

    pub fn kind_for_uri(&self, uri: &str) -> Option<KindInfo> {
        let crd_type = self.uri_to_kind.read().get(uri).cloned()?;
        self.kind(&crd_type)
    }

    pub fn uri_info(&self, uri: &str) -> Option<UriRegistration> {
        self.uri_info.read().get(uri).cloned()
    }

    pub fn uris_for_kind(&self, crd_type: &str) -> Option<Vec<String>> {
        self.kind_to_uris.read().get(crd_type).cloned()
    }

    /// Every live URI registration, ordered by URI.
    pub fn registrations(&self) -> Vec<UriRegistration> {
        let mut all: Vec<_> = self.uri_info.read().values().cloned().collect();
        all.sort_by(|a, b| a.uri.cmp(&b.uri));
        all
    }

    /// Datamodels that currently have at least one URI.
    pub fn datamodels_in_use(&self) -> BTreeSet<String> {
        self.kind_to_uris
            .read()
            .iter()
            .filter(|(_, uris)| !uris.is_empty())
            .map(|(crd, _)| datamodel_of(crd))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Side configuration
    // -------------------------------------------------------------------------

    pub fn upsert_datamodel(&self, info: DatamodelInfo) {
        info!(datamodel = %info.name, title = %info.title, "Datamodel upserted");
        self.datamodels.write().insert(info.name.clone(), info);
    }

    pub fn delete_datamodel(&self, name: &str) {
        self.datamodels.write().remove(name);
    }

    pub fn datamodel(&self, name: &str) -> Option<DatamodelInfo> {
        self.datamodels.read().get(name).cloned()
    }

    pub fn upsert_cors(&self, cors: CorsConfig) {
        info!(name = %cors.name, origins = cors.origins.len(), "CORS config upserted");
        self.cors.write().insert(cors.name.clone(), cors);
    }

    pub fn delete_cors(&self, name: &str) {
        self.cors.write().remove(name);
    }

    /// Union of origins over every CORS config.
    pub fn cors_origins(&self) -> BTreeSet<String> {
        self.cors
            .read()
            .values()
            .flat_map(|c| c.origins.iter().cloned())
            .collect()
    }

    /// Union of headers over every CORS config.
    pub fn cors_headers(&self) -> BTreeSet<String> {
        self.cors
            .read()
            .values()
            .flat_map(|c| c.headers.iter().cloned())
            .collect()
    }

    pub fn upsert_tenant(&self, tenant: TenantConfig) {
        info!(tenant = %tenant.name, "Tenant upserted");
        self.tenants.write().insert(tenant.name.clone(), tenant);
    }

    pub fn delete_tenant(&self, name: &str) {
        self.tenants.write().remove(name);
    }

    pub fn tenants(&self) -> Vec<TenantConfig> {
        self.tenants.read().values().cloned().collect()
    }

    pub fn cors_configs(&self) -> Vec<CorsConfig> {
        self.cors.read().values().cloned().collect()
    }
}

fn validate_chain(kind: &KindInfo) -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    for parent in &kind.parent_hierarchy {
        if parent == &kind.crd_type || !seen.insert(parent) {
            return Err(RegistryError::CyclicHierarchy {
                crd_type: kind.crd_type.clone(),
                ancestor: parent.clone(),
            });
        }
    }
    Ok(())
}

fn structure_differs(old: &KindInfo, new: &KindInfo) -> bool {
    old.name != new.name
        || old.parent_hierarchy != new.parent_hierarchy
        || old.children != new.children
        || old.links != new.links
        || old.is_singleton != new.is_singleton
}

#[cfg(test)]
mod tests;
