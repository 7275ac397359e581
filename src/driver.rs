//! Parser Driver (C10, spec §4.10/§5): grammar load-once, the AST-vs-
//! fallback decision, the in-process parse cache, optional worker-pool
//! fan-out across files, and per-file timeout/cancellation.

use crate::config::{ParseOptions, ResolutionCacheConfig};
use crate::error::IndexError;
use crate::parsing::registry::LanguageRegistry;
use crate::parsing::ParseInput;
use crate::resolution::SymbolResolutionCache;
use crate::storage::{FileIndex, ParseResult, PersistenceSink};
use crate::symbol::SymbolCounter;
use crate::types::{compact_string, ProjectId};
use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One file's work item: the driver never sees a filesystem, only the
/// `(path, content)` pairs the surrounding application feeds it (spec §6
/// "File feed").
pub struct FileJob {
    pub language_id: &'static str,
    pub file_path: String,
    pub content: String,
}

/// Ties together the grammar(s), the shared resolution cache, the in-process
/// parse cache, and the persistence sink (spec §4.10, §5 "shared resources").
pub struct ParserDriver {
    registry: Arc<LanguageRegistry>,
    sink: Arc<dyn PersistenceSink>,
    options: ParseOptions,
    project_id: ProjectId,
    parse_cache: DashMap<(String, String), ParseResult>,
    /// Last content hash successfully indexed per file path, used to detect
    /// a changed re-parse that must cascade-delete the stale parse first.
    indexed_hashes: DashMap<String, String>,
    resolution_cache: Mutex<SymbolResolutionCache>,
    counter: Mutex<SymbolCounter>,
}

impl ParserDriver {
    pub fn new(
        registry: LanguageRegistry,
        sink: Arc<dyn PersistenceSink>,
        options: ParseOptions,
        resolution_cache_config: ResolutionCacheConfig,
        project_id: ProjectId,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            sink,
            options,
            project_id,
            parse_cache: DashMap::new(),
            indexed_hashes: DashMap::new(),
            resolution_cache: Mutex::new(SymbolResolutionCache::new(
                resolution_cache_config.capacity,
            )),
            counter: Mutex::new(SymbolCounter::new()),
        }
    }

    /// `parseFile` (spec §4.10). Consults the parse cache, routes AST vs
    /// fallback by size, retries once via fallback on timeout, and always
    /// hands a `FileIndex` to the sink — even on failure.
    pub fn parse_file(&self, job: &FileJob) -> Result<(), IndexError> {
        let started = Instant::now();
        let hash = hash_content(&job.content);
        let cache_key = (job.file_path.clone(), hash.clone());

        let content_changed = self
            .indexed_hashes
            .get(&job.file_path)
            .is_some_and(|prev| *prev != hash);

        if let Some(cached) = self.parse_cache.get(&cache_key) {
            let cached = cached.clone();
            let index = self.build_file_index(job, &hash, &cached, started.elapsed(), false, None);
            if content_changed {
                self.sink
                    .remove_symbols_for_file(self.project_id, &job.file_path)?;
            }
            self.sink.submit(cached)?;
            self.sink.record_file_index(index)?;
            self.indexed_hashes.insert(job.file_path.clone(), hash);
            return Ok(());
        }

        let definition = match self.registry.get(job.language_id) {
            Ok(def) => def,
            Err(err) => {
                let index = self.build_error_file_index(job, &hash, started.elapsed(), &err.to_string());
                self.sink.record_file_index(index)?;
                return Err(err);
            }
        };
        let parser = definition.parser.clone();

        let input = ParseInput {
            file_path: &job.file_path,
            content: &job.content,
            project_id: self.project_id,
        };

        self.resolution_cache.lock().pin_file(job.file_path.as_str());
        let outcome = self.parse_with_fallback(&parser, &input);
        self.resolution_cache.lock().unpin_file(&job.file_path);

        let (result, has_errors, error_message) = match outcome {
            Ok(result) => (result, false, None),
            Err(err) => (ParseResult::default(), true, Some(err.to_string())),
        };

        self.parse_cache.insert(cache_key, result.clone());
        let index = self.build_file_index(
            job,
            &hash,
            &result,
            started.elapsed(),
            has_errors,
            error_message,
        );
        if content_changed {
            self.sink
                .remove_symbols_for_file(self.project_id, &job.file_path)?;
        }
        self.sink.submit(result)?;
        self.sink.record_file_index(index)?;
        self.indexed_hashes.insert(job.file_path.clone(), hash);
        Ok(())
    }

    /// Dispatch a batch of files across a rayon thread pool sized per
    /// `ParseOptions::worker_pool_size` (spec §4.10 "parcel files to a
    /// worker pool"). One file is the unit of parallelism; the resolution
    /// cache and parse cache are shared and internally synchronised.
    pub fn parse_files(&self, jobs: &[FileJob]) -> Vec<(String, Result<(), IndexError>)> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.worker_pool_size.max(1))
            .build();
        let Ok(pool) = pool else {
            return jobs
                .iter()
                .map(|job| (job.file_path.clone(), self.parse_file(job)))
                .collect();
        };
        pool.install(|| {
            use rayon::prelude::*;
            jobs.par_iter()
                .map(|job| (job.file_path.clone(), self.parse_file(job)))
                .collect()
        })
    }

    /// Route AST-vs-fallback (spec §5 "size-gated AST attempt"). The AST
    /// path enforces its own wall-clock deadline cooperatively (checked once
    /// per visited node, since the visitor is pure CPU with no suspension
    /// points) and signals a miss via `None`, which falls through to the
    /// deterministic fallback.
    fn parse_with_fallback(
        &self,
        parser: &Arc<dyn crate::parsing::LanguageParser>,
        input: &ParseInput<'_>,
    ) -> Result<ParseResult, IndexError> {
        let large_file = input.content.len() as u64 > self.options.large_file_threshold;

        if !large_file {
            let mut counter = self.counter.lock();
            let mut cache = self.resolution_cache.lock();
            if let Some(result) = parser.parse_ast(input, &self.options, &mut counter, &mut cache)
            {
                return Ok(result);
            }
        }

        let mut counter = self.counter.lock();
        let mut cache = self.resolution_cache.lock();
        Ok(parser.parse_fallback(input, &self.options, &mut counter, &mut cache))
    }

    fn build_file_index(
        &self,
        job: &FileJob,
        hash: &str,
        result: &ParseResult,
        elapsed: Duration,
        has_errors: bool,
        error_message: Option<String>,
    ) -> FileIndex {
        FileIndex {
            project_id: self.project_id,
            language_id: compact_string(job.language_id),
            file_path: job.file_path.clone(),
            file_hash: hash.to_string(),
            indexed_at: crate::utils::get_utc_timestamp(),
            parse_duration_ms: elapsed.as_millis() as u64,
            symbol_count: result.symbols.len(),
            relationship_count: result.relationships.len(),
            pattern_count: result.patterns.len(),
            is_indexed: !has_errors,
            has_errors,
            error_message,
        }
    }

    fn build_error_file_index(
        &self,
        job: &FileJob,
        hash: &str,
        elapsed: Duration,
        error_message: &str,
    ) -> FileIndex {
        FileIndex {
            project_id: self.project_id,
            language_id: compact_string(job.language_id),
            file_path: job.file_path.clone(),
            file_hash: hash.to_string(),
            indexed_at: crate::utils::get_utc_timestamp(),
            parse_duration_ms: elapsed.as_millis() as u64,
            symbol_count: 0,
            relationship_count: 0,
            pattern_count: 0,
            is_indexed: false,
            has_errors: true,
            error_message: Some(error_message.to_string()),
        }
    }
}
