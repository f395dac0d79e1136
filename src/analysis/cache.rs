//! Content-addressed LRU cache around any analyzer
//!
//! Entries are keyed by (backend id, path, BLAKE3 hash of the contents), so
//! an edited file never serves stale results. Each entry memoizes the
//! whole-file queries; function-targeted queries pass through.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, trace};

use super::source::{content_hash, DEFAULT_MAX_FILE_BYTES};
use super::types::{
    AnalysisResult, CallGraph, ErrorPath, FunctionDependencies, FunctionInfo, FunctionSummary,
    GlobalInfo, SideEffects, SymbolOccurrences,
};
use super::CodeAnalyzer;
use crate::errors::Result;
use crate::preprocessor::PreprocessorDirectives;

/// Default number of files kept
pub const DEFAULT_MAX_FILES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    backend: String,
    path: PathBuf,
    hash: String,
}

/// Results derived from one version of one file
#[derive(Debug, Default)]
struct Derived {
    analysis: Option<AnalysisResult>,
    functions: Option<Vec<FunctionInfo>>,
    call_graph: Option<CallGraph>,
    globals: Option<Vec<GlobalInfo>>,
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Entries dropped because the file changed
    pub invalidations: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, Derived>,
    /// Least recently used first
    order: VecDeque<CacheKey>,
    stats: CacheStats,
}

impl CacheState {
    /// Make `key` the most recently used entry, creating it if needed
    fn touch(&mut self, key: &CacheKey, capacity: usize) -> &mut Derived {
        if self.entries.contains_key(key) {
            if let Some(pos) = self.order.iter().position(|k| k == key) {
                self.order.remove(pos);
            }
        } else {
            let stale: Vec<CacheKey> = self
                .order
                .iter()
                .filter(|k| k.backend == key.backend && k.path == key.path)
                .cloned()
                .collect();
            for old in stale {
                self.remove(&old);
                self.stats.invalidations += 1;
                debug!(path = %old.path.display(), "Dropped cache entry for changed file");
            }

            while self.entries.len() >= capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
                trace!(path = %oldest.path.display(), "Evicted cache entry");
            }
            self.entries.insert(key.clone(), Derived::default());
        }
        self.order.push_back(key.clone());
        self.stats.entries = self.entries.len();
        self.entries.entry(key.clone()).or_default()
    }

    fn remove(&mut self, key: &CacheKey) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

/// Caching proxy for a [`CodeAnalyzer`]
pub struct CachedAnalyzer<A> {
    inner: A,
    max_files: usize,
    max_file_bytes: u64,
    state: Mutex<CacheState>,
}

impl<A: CodeAnalyzer> CachedAnalyzer<A> {
    pub fn new(inner: A) -> Self {
        Self::with_capacity(inner, DEFAULT_MAX_FILES)
    }

    /// Cache holding at most `max_files` file versions (at least one)
    pub fn with_capacity(inner: A, max_files: usize) -> Self {
        Self {
            inner,
            max_files: max_files.max(1),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key_for(&self, path: &Path) -> Result<CacheKey> {
        Ok(CacheKey {
            backend: self.inner.backend_id().to_string(),
            path: path.to_path_buf(),
            hash: content_hash(path, self.max_file_bytes)?,
        })
    }

    /// The file still hashes to the contents `key` was built from
    fn unchanged(&self, key: &CacheKey) -> bool {
        content_hash(&key.path, self.max_file_bytes).is_ok_and(|hash| hash == key.hash)
    }

    /// Serve `slot` from the entry for the current contents of `path`,
    /// computing it with the inner analyzer on a miss
    fn memoized<T: Clone>(
        &self,
        path: &Path,
        slot: fn(&mut Derived) -> &mut Option<T>,
        compute: impl FnOnce(&A) -> Result<T>,
    ) -> Result<T> {
        let key = self.key_for(path)?;
        {
            let mut state = self.lock();
            let cached = slot(state.touch(&key, self.max_files)).clone();
            if let Some(value) = cached {
                state.stats.hits += 1;
                debug!(path = %path.display(), hits = state.stats.hits, "Cache hit");
                return Ok(value);
            }
            state.stats.misses += 1;
            debug!(path = %path.display(), misses = state.stats.misses, "Cache miss");
        }

        let value = compute(&self.inner)?;

        // the inner analyzer reads the file again; only keep results for `key`'s contents
        if !self.unchanged(&key) {
            debug!(path = %path.display(), "File changed during analysis, result not cached");
            return Ok(value);
        }
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(&key) {
            *slot(entry) = Some(value.clone());
        }
        Ok(value)
    }
}

impl<A: CodeAnalyzer> CodeAnalyzer for CachedAnalyzer<A> {
    fn backend_id(&self) -> &str {
        self.inner.backend_id()
    }

    fn analyze_file(&self, path: &Path) -> Result<AnalysisResult> {
        self.memoized(path, |d| &mut d.analysis, |a| a.analyze_file(path))
    }

    fn list_functions(&self, path: &Path) -> Result<Vec<FunctionInfo>> {
        self.memoized(path, |d| &mut d.functions, |a| a.list_functions(path))
    }

    fn get_function_body(&self, path: &Path, function_name: &str) -> Result<Option<String>> {
        self.inner.get_function_body(path, function_name)
    }

    fn get_preprocessor_directives(&self, path: &Path) -> Result<PreprocessorDirectives> {
        self.inner.get_preprocessor_directives(path)
    }

    fn get_call_graph(&self, path: &Path) -> Result<CallGraph> {
        self.memoized(path, |d| &mut d.call_graph, |a| a.get_call_graph(path))
    }

    fn get_function_dependencies(&self, path: &Path, function_name: &str) -> Result<FunctionDependencies> {
        self.inner.get_function_dependencies(path, function_name)
    }

    fn summarize_function(&self, path: &Path, function_name: &str) -> Result<FunctionSummary> {
        self.inner.summarize_function(path, function_name)
    }

    fn list_globals(&self, path: &Path) -> Result<Vec<GlobalInfo>> {
        self.memoized(path, |d| &mut d.globals, |a| a.list_globals(path))
    }

    fn find_symbol(&self, path: &Path, symbol: &str) -> Result<SymbolOccurrences> {
        self.inner.find_symbol(path, symbol)
    }

    fn get_error_handling_paths(&self, path: &Path, function_name: &str) -> Result<Vec<ErrorPath>> {
        self.inner.get_error_handling_paths(path, function_name)
    }

    fn list_side_effects(&self, path: &Path, function_name: &str) -> Result<SideEffects> {
        self.inner.list_side_effects(path, function_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SyntaxAnalyzer;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_second_lookup_hits() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.c", "int a(void) { return 0; }\n");
        let cache = CachedAnalyzer::new(SyntaxAnalyzer::new());

        let first = cache.list_functions(&path).unwrap();
        let second = cache.list_functions(&path).unwrap();
        assert_eq!(first, second);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_changed_contents_replace_entry() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.c", "int a(void) { return 0; }\n");
        let cache = CachedAnalyzer::new(SyntaxAnalyzer::new());

        assert_eq!(cache.list_functions(&path).unwrap().len(), 1);
        std::fs::write(&path, "int a(void) { return 0; }\nint b(void) { return 1; }\n").unwrap();
        assert_eq!(cache.list_functions(&path).unwrap().len(), 2);

        let stats = cache.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.invalidations, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.c", "int a;\n");
        let b = write(&dir, "b.c", "int b;\n");
        let c = write(&dir, "c.c", "int c;\n");
        let cache = CachedAnalyzer::with_capacity(SyntaxAnalyzer::new(), 2);

        cache.list_globals(&a).unwrap();
        cache.list_globals(&b).unwrap();
        cache.list_globals(&a).unwrap();
        cache.list_globals(&c).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);

        // `a` was used more recently than `b`, so `b` went
        cache.list_globals(&a).unwrap();
        assert_eq!(cache.stats().hits, 2);
        cache.list_globals(&b).unwrap();
        assert_eq!(cache.stats().misses, 4);
    }

    #[test]
    fn test_pass_through_and_errors() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.c", "int a(void) { return 0; }\n");
        let cache = CachedAnalyzer::new(SyntaxAnalyzer::new());

        assert!(cache.get_function_body(&path, "a").unwrap().is_some());
        assert!(cache.summarize_function(&path, "missing").is_err());
        assert!(cache.analyze_file(&dir.path().join("nope.c")).is_err());
        assert_eq!(cache.stats().hits + cache.stats().misses, 0);
    }

    /// Rewrites the file once, in the middle of `list_functions`
    struct RewritingAnalyzer {
        inner: SyntaxAnalyzer,
        contents: &'static str,
        pending: AtomicBool,
    }

    impl CodeAnalyzer for RewritingAnalyzer {
        fn backend_id(&self) -> &str {
            self.inner.backend_id()
        }

        fn analyze_file(&self, path: &Path) -> Result<AnalysisResult> {
            self.inner.analyze_file(path)
        }

        fn list_functions(&self, path: &Path) -> Result<Vec<FunctionInfo>> {
            if self.pending.swap(false, Ordering::SeqCst) {
                std::fs::write(path, self.contents)?;
            }
            self.inner.list_functions(path)
        }

        fn get_function_body(&self, path: &Path, function_name: &str) -> Result<Option<String>> {
            self.inner.get_function_body(path, function_name)
        }

        fn get_preprocessor_directives(&self, path: &Path) -> Result<PreprocessorDirectives> {
            self.inner.get_preprocessor_directives(path)
        }

        fn get_call_graph(&self, path: &Path) -> Result<CallGraph> {
            self.inner.get_call_graph(path)
        }

        fn get_function_dependencies(&self, path: &Path, function_name: &str) -> Result<FunctionDependencies> {
            self.inner.get_function_dependencies(path, function_name)
        }

        fn summarize_function(&self, path: &Path, function_name: &str) -> Result<FunctionSummary> {
            self.inner.summarize_function(path, function_name)
        }

        fn list_globals(&self, path: &Path) -> Result<Vec<GlobalInfo>> {
            self.inner.list_globals(path)
        }

        fn find_symbol(&self, path: &Path, symbol: &str) -> Result<SymbolOccurrences> {
            self.inner.find_symbol(path, symbol)
        }

        fn get_error_handling_paths(&self, path: &Path, function_name: &str) -> Result<Vec<ErrorPath>> {
            self.inner.get_error_handling_paths(path, function_name)
        }

        fn list_side_effects(&self, path: &Path, function_name: &str) -> Result<SideEffects> {
            self.inner.list_side_effects(path, function_name)
        }
    }

    #[test]
    fn test_result_for_file_changed_mid_analysis_is_not_cached() {
        const ONE: &str = "int a(void) { return 0; }\n";
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.c", ONE);
        let cache = CachedAnalyzer::new(RewritingAnalyzer {
            inner: SyntaxAnalyzer::new(),
            contents: "int a(void) { return 0; }\nint b(void) { return 1; }\n",
            pending: AtomicBool::new(true),
        });

        assert_eq!(cache.list_functions(&path).unwrap().len(), 2);
        std::fs::write(&path, ONE).unwrap();
        assert_eq!(cache.list_functions(&path).unwrap().len(), 1);
        assert_eq!(cache.stats().hits, 0);
    }
}
