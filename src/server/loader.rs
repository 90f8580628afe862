//! Discovers tools from directory trees of compiled plugin libraries, watches
//! those trees for changes, and publishes freshly-built registries.
//!
//! Dynamic tools are compiled plugin libraries (`.so`/`.dylib`/`.dll`) exposing
//! a minimal C-ABI manifest/invoke interface. Rust has no analogue of
//! `importlib`'s dynamic module re-import, and dlopen-level caching means
//! reloading the *same path* can hand back a stale image; to force a fresh
//! load on every reload, the library file is copied to a uniquely-named
//! temporary path keyed by its modification time before each `Library::new`.

use crate::error::{Error, Result};
use crate::server::registry::ToolRegistry;
use crate::tool::{NativeHandler, Tool, ToolHandler};
use crate::wire::ToolArgument;
use libloading::Library;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use serde_json::Value;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use walkdir::WalkDir;

const DYNAMIC_LIB_EXTENSIONS: &[&str] = &["so", "dylib", "dll"];
const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// One tool entry in a plugin library's manifest.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    args: Vec<ToolArgument>,
    #[serde(default)]
    wants_registry: bool,
}

type ManifestFn = unsafe extern "C" fn() -> *mut c_char;
type InvokeFn = unsafe extern "C" fn(*const c_char, *const c_char, *const c_char) -> *mut c_char;
type FreeFn = unsafe extern "C" fn(*mut c_char);

/// A loaded handle to one tool exposed by a dynamic plugin library. Cheap to
/// clone: the underlying `Library` is reference counted so the last handle
/// referencing it keeps the mapped image alive.
pub struct DynamicToolHandle {
    library: Arc<Library>,
    pub library_path: PathBuf,
    tool_name: String,
}

impl DynamicToolHandle {
    /// Invokes the tool's FFI entry point. Must run on a blocking worker
    /// thread: a C-ABI boundary cannot itself be `.await`ed.
    pub fn invoke_blocking(&self, args: &Value, registry_defs: &Value) -> Result<Value> {
        let tool_name = CString::new(self.tool_name.as_str())
            .map_err(|e| Error::Other(format!("tool name contains NUL: {}", e)))?;
        let args_json = CString::new(args.to_string())
            .map_err(|e| Error::Other(format!("args serialization contains NUL: {}", e)))?;
        let registry_json = CString::new(registry_defs.to_string())
            .map_err(|e| Error::Other(format!("registry serialization contains NUL: {}", e)))?;

        let raw_result = unsafe {
            let invoke: libloading::Symbol<InvokeFn> = self
                .library
                .get(b"mcp_tool_invoke\0")
                .map_err(|e| Error::Other(format!("plugin missing mcp_tool_invoke: {}", e)))?;
            invoke(
                tool_name.as_ptr(),
                args_json.as_ptr(),
                registry_json.as_ptr(),
            )
        };

        if raw_result.is_null() {
            return Err(Error::Other("plugin returned a null result".into()));
        }

        let result_str = unsafe { CStr::from_ptr(raw_result) }
            .to_string_lossy()
            .into_owned();

        unsafe {
            if let Ok(free) = self.library.get::<FreeFn>(b"mcp_tool_free\0") {
                let free: libloading::Symbol<FreeFn> = free;
                free(raw_result);
            }
        }

        let envelope: Value = serde_json::from_str(&result_str)?;
        let ok = envelope.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if ok {
            Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
        } else {
            let message = envelope
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("tool execution failed")
                .to_string();
            Err(Error::Other(message))
        }
    }
}

/// Builds a `ToolRegistry` from a bundled set of native tools plus whatever
/// dynamic plugin libraries are found under the configured tool repos.
pub struct ToolLoader {
    repos: Vec<PathBuf>,
    native_seed: Arc<dyn Fn(&mut ToolRegistry) -> Result<()> + Send + Sync>,
}

impl ToolLoader {
    pub fn new(
        repos: Vec<PathBuf>,
        native_seed: impl Fn(&mut ToolRegistry) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            repos,
            native_seed: Arc::new(native_seed),
        }
    }

    pub fn repos(&self) -> &[PathBuf] {
        &self.repos
    }

    /// Scans every configured repo and builds a fresh registry. Never depends
    /// on any previously built registry: a failure anywhere (duplicate name,
    /// unreadable plugin, malformed manifest) fails the whole reload and the
    /// caller is expected to retain its previous snapshot.
    pub fn load_registry(&self) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        (self.native_seed)(&mut registry)?;

        for repo in &self.repos {
            if !repo.exists() {
                continue;
            }
            for entry in WalkDir::new(repo).into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if !entry.file_type().is_file() || !has_dynamic_lib_extension(path) {
                    continue;
                }
                self.load_library_tools(path, &mut registry)?;
            }
        }

        Ok(registry)
    }

    fn load_library_tools(&self, path: &Path, registry: &mut ToolRegistry) -> Result<()> {
        let fresh_copy = copy_to_unique_temp_path(path)?;
        let library = Arc::new(unsafe {
            Library::new(&fresh_copy)
                .map_err(|e| Error::Other(format!("failed to load plugin {}: {}", path.display(), e)))?
        });

        let manifest_json = unsafe {
            let manifest_fn: libloading::Symbol<ManifestFn> = library
                .get(b"mcp_tool_manifest\0")
                .map_err(|e| Error::Other(format!("plugin {} missing mcp_tool_manifest: {}", path.display(), e)))?;
            let raw = manifest_fn();
            if raw.is_null() {
                return Err(Error::Other(format!("plugin {} returned a null manifest", path.display())));
            }
            let s = CStr::from_ptr(raw).to_string_lossy().into_owned();
            if let Ok(free) = library.get::<FreeFn>(b"mcp_tool_free\0") {
                let free: libloading::Symbol<FreeFn> = free;
                free(raw);
            }
            s
        };

        let entries: Vec<ManifestEntry> = serde_json::from_str(&manifest_json)
            .map_err(|e| Error::Other(format!("plugin {} has a malformed manifest: {}", path.display(), e)))?;

        for entry in entries {
            let handle = Arc::new(DynamicToolHandle {
                library: library.clone(),
                library_path: path.to_path_buf(),
                tool_name: entry.name.clone(),
            });
            registry.register(Tool {
                name: entry.name,
                description: entry.description,
                args: entry.args,
                wants_registry: entry.wants_registry,
                handler: ToolHandler::Dynamic(handle),
            })?;
        }

        let _ = std::fs::remove_file(&fresh_copy);
        Ok(())
    }
}

fn has_dynamic_lib_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DYNAMIC_LIB_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Copies `path` to a uniquely-named file under the system temp dir, keyed by
/// the source file's modification time in nanoseconds, so every reload of an
/// unchanged-but-recompiled file gets a fresh `dlopen` image rather than a
/// cached one.
fn copy_to_unique_temp_path(path: &Path) -> Result<PathBuf> {
    let metadata = std::fs::metadata(path)?;
    let mtime_ns = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("plugin");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("so");
    let unique_name = format!("mcp_dynamic_tools_{}_{}.{}", stem, mtime_ns, ext);
    let dest = std::env::temp_dir().join(unique_name);
    std::fs::copy(path, &dest)?;
    Ok(dest)
}

fn is_relevant_event(event: &Event) -> bool {
    if matches!(event.kind, EventKind::Access(_) | EventKind::Other) {
        return false;
    }
    event.paths.iter().any(|p| has_dynamic_lib_extension(p))
}

/// Watches the loader's configured repos, debounces bursts of filesystem
/// events by `DEBOUNCE_WINDOW`, and invokes `on_update` with a freshly built
/// registry after each settled burst. The watcher runs on a background
/// thread owned by `notify`; events are handed to the async debounce task
/// over an unbounded channel rather than invoking async code directly from
/// that thread.
pub struct ToolWatcher {
    _fs_watcher: RecommendedWatcher,
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ToolWatcher {
    pub fn start(
        loader: Arc<ToolLoader>,
        on_update: impl Fn(Arc<ToolRegistry>) + Send + Sync + 'static,
    ) -> Result<Self> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_callback = stop.clone();

        let mut fs_watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if stop_for_callback.load(Ordering::SeqCst) {
                return;
            }
            if let Ok(event) = res {
                if is_relevant_event(&event) {
                    let _ = tx.send(());
                }
            }
        })
        .map_err(|e| Error::Other(format!("failed to start filesystem watcher: {}", e)))?;

        for repo in loader.repos() {
            if repo.exists() {
                fs_watcher
                    .watch(repo, RecursiveMode::Recursive)
                    .map_err(|e| Error::Other(format!("failed to watch {}: {}", repo.display(), e)))?;
            }
        }

        let stop_for_task = stop.clone();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Some(()) => {}
                    None => return,
                }
                if stop_for_task.load(Ordering::SeqCst) {
                    return;
                }
                loop {
                    match tokio::time::timeout(DEBOUNCE_WINDOW, rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => return,
                        Err(_elapsed) => break,
                    }
                }
                if stop_for_task.load(Ordering::SeqCst) {
                    return;
                }
                match loader.load_registry() {
                    Ok(registry) => on_update(Arc::new(registry)),
                    Err(e) => {
                        tracing::error!(error = %e, "hot-reload failed, retaining previous registry");
                    }
                }
            }
        });

        Ok(Self {
            _fs_watcher: fs_watcher,
            stop,
            task,
        })
    }

    /// Sets the stop flag (suppressing any further scheduling), cancels the
    /// pending debounce timer, and joins the debounce task. Idempotent.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        self.task.abort();
        let _ = self.task.await;
    }
}
