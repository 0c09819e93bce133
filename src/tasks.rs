use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
  thread,
  time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
  engine::{self, CoreError, CoreOptions, SessionState},
  models::{ImportOutcome, Task, TaskInfo, TaskKind},
};

#[derive(Clone, Default)]
pub struct TaskManager {
  tasks: Arc<Mutex<HashMap<String, Arc<TaskState>>>>,
}

#[derive(Debug)]
struct TaskState {
  id: String,
  kind: TaskKind,
  started_at_ms: i64,

  finished: AtomicBool,
  applied: AtomicBool,
  error: Mutex<Option<String>>,
  outcome: Mutex<Option<ImportOutcome>>,
}

impl TaskManager {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reads and parses `path` on a worker thread, then swaps it into `session` under one lock.
  ///
  /// Any load, import or clear that lands on the session after this call supersedes the task:
  /// its result is dropped and the session is left as the newer operation set it.
  pub(crate) fn start_import(
    &self,
    path: PathBuf,
    session: Arc<Mutex<SessionState>>,
    options: CoreOptions,
  ) -> TaskInfo {
    let id = Uuid::new_v4().to_string();
    let state = Arc::new(TaskState {
      id: id.clone(),
      kind: TaskKind::Import,
      started_at_ms: now_ms(),
      finished: AtomicBool::new(false),
      applied: AtomicBool::new(false),
      error: Mutex::new(None),
      outcome: Mutex::new(None),
    });
    self.tasks.lock().insert(id.clone(), state.clone());

    let generation = session.lock().generation;
    tracing::debug!(task = %id, path = %path.display(), generation, "import task started");

    thread::spawn(move || {
      match run_import(&path, &session, generation, &options) {
        Ok(outcome) => {
          state.applied.store(true, Ordering::SeqCst);
          *state.outcome.lock() = Some(outcome);
        }
        Err(e) => {
          *state.error.lock() = Some(e.to_string());
        }
      }
      state.finished.store(true, Ordering::SeqCst);
    });

    TaskInfo {
      id,
      kind: TaskKind::Import,
    }
  }

  pub fn get_task(&self, task_id: &str) -> Result<Task, String> {
    let t = self
      .tasks
      .lock()
      .get(task_id)
      .cloned()
      .ok_or_else(|| "unknown task".to_string())?;
    let finished = t.finished.load(Ordering::SeqCst);
    let error = t.error.lock().clone();
    let outcome = t.outcome.lock().clone();
    if finished {
      // The final state has been handed out; later lookups report an unknown task.
      self.tasks.lock().remove(task_id);
    }
    Ok(Task {
      id: t.id.clone(),
      kind: t.kind.clone(),
      started_at_ms: t.started_at_ms,
      finished,
      applied: t.applied.load(Ordering::SeqCst),
      error,
      outcome,
    })
  }
}

fn run_import(
  path: &Path,
  session: &Mutex<SessionState>,
  generation: u64,
  options: &CoreOptions,
) -> Result<ImportOutcome, CoreError> {
  // Read and parse outside the lock; only the swap holds it.
  let parsed = engine::read_import_file(path, options.max_import_bytes)
    .and_then(|text| engine::parse_import_text(&text, options.export_indent));

  let mut s = session.lock();
  if s.generation != generation {
    tracing::info!(path = %path.display(), "import superseded by a newer load");
    return Err(CoreError::Task("import superseded by a newer load".into()));
  }
  match parsed {
    Ok((value, echo)) => {
      let summary = engine::install_document(&mut s, value);
      tracing::info!(path = %path.display(), "document imported");
      Ok(ImportOutcome { summary, echo })
    }
    Err(e) => {
      s.error = Some(engine::INVALID_FILE_MESSAGE.into());
      tracing::warn!(path = %path.display(), error = %e, "import rejected");
      Err(e)
    }
  }
}

fn now_ms() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as i64
}
