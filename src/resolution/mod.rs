//! Symbol Resolution Cache (spec §4.2): maps unqualified or partially
//! qualified references to previously-seen symbols given the active
//! namespace/using-directive context.

use crate::error::IndexError;
use crate::symbol::{Symbol, SymbolId};
use crate::types::LogicalClock;
use std::collections::{HashMap, HashSet};

/// The scope a reference is being resolved from.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    pub current_file: String,
    pub current_namespace: Option<String>,
    /// Insertion order matters: ties are broken by the order `using namespace`
    /// directives were seen (spec §4.2 step 2).
    pub imported_namespaces: Vec<String>,
    pub type_aliases: HashMap<String, String>,
}

impl ResolutionContext {
    pub fn for_file(current_file: impl Into<String>) -> Self {
        Self {
            current_file: current_file.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.current_namespace = Some(namespace.into());
        self
    }

    pub fn import_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.imported_namespaces.push(namespace.into());
        self
    }

    pub fn alias(mut self, local: impl Into<String>, target: impl Into<String>) -> Self {
        self.type_aliases.insert(local.into(), target.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct CacheEntry {
    symbol: Symbol,
    access_count: u64,
    last_accessed: u64,
}

type IdentityKey = (String, String, String, u32);

/// Bounded LRU cache of symbols indexed for name resolution.
///
/// Capacity defaults to 50,000 entries; once exceeded, the least-recently
/// accessed entries are evicted down to 90% full, skipping any entry whose
/// source file is currently pinned by an in-flight parse (spec §4.2,
/// §9 "pinning").
pub struct SymbolResolutionCache {
    capacity: usize,
    entries: HashMap<SymbolId, CacheEntry>,
    by_simple_name: HashMap<String, Vec<SymbolId>>,
    by_qualified_name: HashMap<String, SymbolId>,
    by_namespace: HashMap<String, Vec<SymbolId>>,
    identity_index: HashMap<IdentityKey, SymbolId>,
    pinned_files: HashSet<String>,
    clock: LogicalClock,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl SymbolResolutionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            by_simple_name: HashMap::new(),
            by_qualified_name: HashMap::new(),
            by_namespace: HashMap::new(),
            identity_index: HashMap::new(),
            pinned_files: HashSet::new(),
            clock: LogicalClock::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Mark a file as currently being parsed: its entries are immune to
    /// eviction until [`Self::unpin_file`] is called.
    pub fn pin_file(&mut self, file_path: impl Into<String>) {
        self.pinned_files.insert(file_path.into());
    }

    pub fn unpin_file(&mut self, file_path: &str) {
        self.pinned_files.remove(file_path);
    }

    /// Idempotent by `(language, qualifiedName, filePath, line)`. Re-adding
    /// the same identity replaces the stored symbol and resets its access
    /// stats, matching spec §4.2 ("records lastAccessed = now, accessCount =
    /// 0").
    pub fn add_symbol(&mut self, symbol: Symbol) -> Result<(), IndexError> {
        let identity = symbol.identity_key();
        let id = symbol.id;

        if let Some(&old_id) = self.identity_index.get(&identity) {
            if old_id != id {
                self.entries.remove(&old_id);
            }
        }

        let qualified = symbol.qualified_name.to_string();
        let simple = symbol.simple_name_from_qualified().to_string();
        let namespace = symbol.namespace.as_ref().map(|n| n.to_string());

        self.by_qualified_name.insert(qualified, id);
        let simple_list = self.by_simple_name.entry(simple).or_default();
        if !simple_list.contains(&id) {
            simple_list.push(id);
        }
        if let Some(ns) = namespace {
            let ns_list = self.by_namespace.entry(ns).or_default();
            if !ns_list.contains(&id) {
                ns_list.push(id);
            }
        }

        let now = self.clock.tick();
        self.entries.insert(
            id,
            CacheEntry {
                symbol,
                access_count: 0,
                last_accessed: now,
            },
        );
        self.identity_index.insert(identity, id);

        self.evict_if_needed()
    }

    /// Resolution order per spec §4.2:
    /// 1. Fully-qualified lookup when `reference` contains `::`.
    /// 2. `<currentNamespace>::<reference>`, then each imported namespace in
    ///    insertion order, then a type-alias lookup.
    /// 3. Simple-name match, but only if exactly one candidate exists —
    ///    ties return `None` rather than guessing.
    pub fn resolve_symbol(
        &mut self,
        reference: &str,
        ctx: &ResolutionContext,
    ) -> Option<Symbol> {
        let found = self.resolve_id(reference, ctx);
        match found {
            Some(id) => {
                let now_tick = self.clock.tick();
                let entry = self.entries.get_mut(&id)?;
                entry.access_count += 1;
                entry.last_accessed = now_tick;
                self.hits += 1;
                Some(entry.symbol.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn resolve_id(&self, reference: &str, ctx: &ResolutionContext) -> Option<SymbolId> {
        if reference.contains("::") {
            return self.by_qualified_name.get(reference).copied();
        }

        if let Some(ns) = &ctx.current_namespace {
            if let Some(id) = self
                .by_qualified_name
                .get(&format!("{ns}::{reference}"))
                .copied()
            {
                return Some(id);
            }
        }

        for ns in &ctx.imported_namespaces {
            if let Some(id) = self
                .by_qualified_name
                .get(&format!("{ns}::{reference}"))
                .copied()
            {
                return Some(id);
            }
        }

        if let Some(target) = ctx.type_aliases.get(reference) {
            if let Some(id) = self.by_qualified_name.get(target).copied() {
                return Some(id);
            }
        }

        match self.by_simple_name.get(reference) {
            Some(candidates) if candidates.len() == 1 => Some(candidates[0]),
            _ => None,
        }
    }

    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            size: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_simple_name.clear();
        self.by_qualified_name.clear();
        self.by_namespace.clear();
        self.identity_index.clear();
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    fn evict_if_needed(&mut self) -> Result<(), IndexError> {
        if self.entries.len() <= self.capacity {
            return Ok(());
        }

        let target = (self.capacity * 9) / 10;

        loop {
            if self.entries.len() <= target {
                return Ok(());
            }

            let victim = self
                .entries
                .iter()
                .filter(|(_, entry)| !self.pinned_files.contains(entry.symbol.file_path.as_ref()))
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(id, _)| *id);

            match victim {
                Some(id) => {
                    self.remove_entry(id);
                    self.evictions += 1;
                }
                None => {
                    return Err(IndexError::OverCapacity {
                        size: self.entries.len(),
                        capacity: self.capacity,
                    });
                }
            }
        }
    }

    fn remove_entry(&mut self, id: SymbolId) {
        if let Some(entry) = self.entries.remove(&id) {
            let identity = entry.symbol.identity_key();
            self.identity_index.remove(&identity);
            let qualified = entry.symbol.qualified_name.to_string();
            if self.by_qualified_name.get(&qualified) == Some(&id) {
                self.by_qualified_name.remove(&qualified);
            }
            let simple = entry.symbol.simple_name_from_qualified().to_string();
            if let Some(list) = self.by_simple_name.get_mut(&simple) {
                list.retain(|&x| x != id);
            }
            if let Some(ns) = &entry.symbol.namespace {
                if let Some(list) = self.by_namespace.get_mut(ns.as_ref()) {
                    list.retain(|&x| x != id);
                }
            }
        }
    }
}
