//! Tasks and their three-phase lifecycle
//!
//! A task wraps up to three callbacks: pre-execute, execute and post-execute.
//! Each phase moves the task from not-running to running and back, recording
//! when the phase started and when it finished or failed.

use crate::context::Context;
use crate::error::{TaskError, TaskResult};
use crate::runner::{Event, Outcome, Reporter, TaskConfig, TaskSet, TaskSets};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Callback driving one phase of a [`Task`]
pub type PhaseFn = Rc<dyn Fn(&Task, &mut Invocation<'_>) -> anyhow::Result<Outcome>>;

/// A bare task: a single callback with no lifecycle around it
pub type TaskFn = Rc<dyn Fn(&mut Invocation<'_>) -> anyhow::Result<Outcome>>;

/// Wrap a closure as a [`PhaseFn`]
///
/// The closure may return anything convertible into an [`Outcome`]:
/// `()` for no preference, or a `bool`.
pub fn phase_fn<F, R>(f: F) -> PhaseFn
where
    F: Fn(&Task, &mut Invocation<'_>) -> anyhow::Result<R> + 'static,
    R: Into<Outcome>,
{
    Rc::new(
        move |task: &Task, inv: &mut Invocation<'_>| -> anyhow::Result<Outcome> {
            f(task, inv).map(Into::into)
        },
    )
}

/// Wrap a closure as a [`TaskFn`]
pub fn task_fn<F, R>(f: F) -> TaskFn
where
    F: Fn(&mut Invocation<'_>) -> anyhow::Result<R> + 'static,
    R: Into<Outcome>,
{
    Rc::new(move |inv: &mut Invocation<'_>| -> anyhow::Result<Outcome> {
        f(inv).map(Into::into)
    })
}

/// Everything a callback gets to see while it runs
pub struct Invocation<'a> {
    /// Configuration of the task entry being run (empty for plain entries)
    pub config: &'a TaskConfig,
    /// Name of the task set the task belongs to
    pub task_set_name: &'a str,
    /// The task set the task belongs to
    pub task_set: &'a TaskSet,
    /// Every loaded task set
    pub task_sets: &'a TaskSets,
    /// The run's shared property store
    pub context: &'a mut Context,
    reporter: &'a dyn Reporter,
    log_keys: &'a [String],
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(
        config: &'a TaskConfig,
        task_set_name: &'a str,
        task_set: &'a TaskSet,
        task_sets: &'a TaskSets,
        context: &'a mut Context,
        reporter: &'a dyn Reporter,
        log_keys: &'a [String],
    ) -> Self {
        Invocation {
            config,
            task_set_name,
            task_set,
            task_sets,
            context,
            reporter,
            log_keys,
        }
    }

    /// Print a message through the run's reporter
    pub fn echo(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if !message.is_empty() {
            self.reporter.report(self.log_keys, &Event::Echo { message });
        }
    }

    /// The current breadcrumb of task-set and task names
    pub fn log_keys(&self) -> &[String] {
        self.log_keys
    }
}

/// The three lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreExecute,
    Execute,
    PostExecute,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::PreExecute => write!(f, "pre-execution"),
            Phase::Execute => write!(f, "execution"),
            Phase::PostExecute => write!(f, "post-execution"),
        }
    }
}

/// Whether a task is inside one of its phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunningState {
    #[default]
    NotRunning,
    Running,
}

/// Timestamps of the most recent run of one phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseTimes {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

/// Observable run history of a task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskState {
    pub current: RunningState,
    pub pre_execute: PhaseTimes,
    pub execute: PhaseTimes,
    pub post_execute: PhaseTimes,
}

impl TaskState {
    pub fn phase(&self, phase: Phase) -> &PhaseTimes {
        match phase {
            Phase::PreExecute => &self.pre_execute,
            Phase::Execute => &self.execute,
            Phase::PostExecute => &self.post_execute,
        }
    }

    fn phase_mut(&mut self, phase: Phase) -> &mut PhaseTimes {
        match phase {
            Phase::PreExecute => &mut self.pre_execute,
            Phase::Execute => &mut self.execute,
            Phase::PostExecute => &mut self.post_execute,
        }
    }
}

/// Task options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskOptions {
    /// Run post-execute even when execute halted or failed
    #[serde(default)]
    pub always_run_post_execute: bool,
}

/// A named unit of work with pre-execute, execute and post-execute phases
#[derive(Clone)]
pub struct Task {
    name: String,
    description: Option<String>,
    pre_execute: Option<PhaseFn>,
    execute: PhaseFn,
    post_execute: Option<PhaseFn>,
    options: TaskOptions,
    state: RefCell<TaskState>,
}

impl Task {
    /// Create a task whose execute phase does nothing
    pub fn new(name: impl Into<String>) -> TaskResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TaskError::InvalidArgument(
                "Unable to create a task: a task name was not provided".to_string(),
            ));
        }

        Ok(Task {
            name,
            description: None,
            pre_execute: None,
            execute: phase_fn(|_, _| Ok(())),
            post_execute: None,
            options: TaskOptions::default(),
            state: RefCell::new(TaskState::default()),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_pre_execute<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Task, &mut Invocation<'_>) -> anyhow::Result<R> + 'static,
        R: Into<Outcome>,
    {
        self.pre_execute = Some(phase_fn(f));
        self
    }

    pub fn with_execute<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Task, &mut Invocation<'_>) -> anyhow::Result<R> + 'static,
        R: Into<Outcome>,
    {
        self.execute = phase_fn(f);
        self
    }

    pub fn with_post_execute<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Task, &mut Invocation<'_>) -> anyhow::Result<R> + 'static,
        R: Into<Outcome>,
    {
        self.post_execute = Some(phase_fn(f));
        self
    }

    pub fn with_options(mut self, options: TaskOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn options(&self) -> TaskOptions {
        self.options
    }

    /// Snapshot of the task's run history
    pub fn state(&self) -> Ref<'_, TaskState> {
        self.state.borrow()
    }

    /// Run the pre-execute callback, if any
    ///
    /// [`Outcome::Halt`] skips this task's remaining phases without halting the run.
    pub fn perform_pre_execute(&self, inv: &mut Invocation<'_>) -> anyhow::Result<Outcome> {
        self.perform(Phase::PreExecute, inv)
    }

    /// Run the execute callback
    ///
    /// [`Outcome::Halt`] skips post-execute (unless configured otherwise) and halts the run.
    pub fn perform_execute(&self, inv: &mut Invocation<'_>) -> anyhow::Result<Outcome> {
        self.perform(Phase::Execute, inv)
    }

    /// Run the post-execute callback, if any
    ///
    /// [`Outcome::Halt`] halts the run.
    pub fn perform_post_execute(&self, inv: &mut Invocation<'_>) -> anyhow::Result<Outcome> {
        self.perform(Phase::PostExecute, inv)
    }

    fn hook(&self, phase: Phase) -> Option<&PhaseFn> {
        match phase {
            Phase::PreExecute => self.pre_execute.as_ref(),
            Phase::Execute => Some(&self.execute),
            Phase::PostExecute => self.post_execute.as_ref(),
        }
    }

    fn perform(&self, phase: Phase, inv: &mut Invocation<'_>) -> anyhow::Result<Outcome> {
        let Some(hook) = self.hook(phase) else {
            return Ok(Outcome::Continue);
        };

        {
            let mut state = self.state.borrow_mut();
            state.current = RunningState::Running;
            *state.phase_mut(phase) = PhaseTimes {
                started_at: Some(Utc::now()),
                ..PhaseTimes::default()
            };
        }

        // The state borrow must be released: the callback may inspect it.
        let result = hook(self, inv);

        let mut state = self.state.borrow_mut();
        state.current = RunningState::NotRunning;
        let times = state.phase_mut(phase);
        match result {
            Ok(_) => times.finished_at = Some(Utc::now()),
            Err(_) => times.failed_at = Some(Utc::now()),
        }

        result
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("pre_execute", &self.pre_execute.is_some())
            .field("post_execute", &self.post_execute.is_some())
            .field("options", &self.options)
            .field("state", &self.state)
            .finish()
    }
}

/// A task with only an execute phase
pub fn simple_task<F, R>(name: impl Into<String>, execute: F) -> TaskResult<Task>
where
    F: Fn(&Task, &mut Invocation<'_>) -> anyhow::Result<R> + 'static,
    R: Into<Outcome>,
{
    Ok(Task::new(name)?.with_execute(execute))
}

/// A task with a description and only an execute phase
pub fn descriptive_task<F, R>(
    name: impl Into<String>,
    description: impl Into<String>,
    execute: F,
) -> TaskResult<Task>
where
    F: Fn(&Task, &mut Invocation<'_>) -> anyhow::Result<R> + 'static,
    R: Into<Outcome>,
{
    Ok(Task::new(name)?
        .with_description(description)
        .with_execute(execute))
}

/// A task from already wrapped callbacks
pub fn create_task(
    name: impl Into<String>,
    description: Option<String>,
    pre_execute: Option<PhaseFn>,
    execute: Option<PhaseFn>,
    post_execute: Option<PhaseFn>,
    options: TaskOptions,
) -> TaskResult<Task> {
    let mut task = Task::new(name)?.with_options(options);
    task.description = description;
    task.pre_execute = pre_execute;
    if let Some(execute) = execute {
        task.execute = execute;
    }
    task.post_execute = post_execute;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::NullReporter;
    use std::cell::Cell;

    struct Fixture {
        config: TaskConfig,
        task_set: TaskSet,
        task_sets: TaskSets,
        context: Context,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                config: TaskConfig::default(),
                task_set: TaskSet::new(),
                task_sets: TaskSets::new(),
                context: Context::new(),
            }
        }

        fn invocation(&mut self) -> Invocation<'_> {
            Invocation::new(
                &self.config,
                "test",
                &self.task_set,
                &self.task_sets,
                &mut self.context,
                &NullReporter,
                &[],
            )
        }
    }

    #[test]
    fn test_task_requires_a_name() {
        assert!(matches!(Task::new(""), Err(TaskError::InvalidArgument(_))));
        assert!(matches!(Task::new("   "), Err(TaskError::InvalidArgument(_))));
        assert!(simple_task("", |_, _| Ok(())).is_err());
    }

    #[test]
    fn test_missing_hooks_continue_without_touching_state() {
        let mut fx = Fixture::new();
        let task = Task::new("noop").unwrap();

        let outcome = task.perform_pre_execute(&mut fx.invocation()).unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(task.state().pre_execute, PhaseTimes::default());

        let outcome = task.perform_post_execute(&mut fx.invocation()).unwrap();
        assert_eq!(outcome, Outcome::Continue);
    }

    #[test]
    fn test_default_execute_is_a_recorded_noop() {
        let mut fx = Fixture::new();
        let task = Task::new("noop").unwrap();

        let outcome = task.perform_execute(&mut fx.invocation()).unwrap();
        assert_eq!(outcome, Outcome::Unspecified);

        let state = task.state();
        assert!(state.execute.started_at.is_some());
        assert!(state.execute.finished_at.is_some());
        assert!(state.execute.failed_at.is_none());
        assert_eq!(state.current, RunningState::NotRunning);
    }

    #[test]
    fn test_callback_sees_running_state() {
        let mut fx = Fixture::new();
        let seen = Rc::new(Cell::new(RunningState::NotRunning));
        let sink = Rc::clone(&seen);
        let task = Task::new("observer")
            .unwrap()
            .with_execute(move |task: &Task, _: &mut Invocation<'_>| {
                sink.set(task.state().current);
                Ok(true)
            });

        let outcome = task.perform_execute(&mut fx.invocation()).unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(seen.get(), RunningState::Running);
        assert_eq!(task.state().current, RunningState::NotRunning);
    }

    #[test]
    fn test_failure_records_failed_at_and_propagates() {
        let mut fx = Fixture::new();
        let task = Task::new("boom")
            .unwrap()
            .with_pre_execute(|_: &Task, _: &mut Invocation<'_>| -> anyhow::Result<()> {
                anyhow::bail!("pre-execute exploded")
            });

        let err = task.perform_pre_execute(&mut fx.invocation()).unwrap_err();
        assert_eq!(err.to_string(), "pre-execute exploded");

        let state = task.state();
        assert!(state.pre_execute.failed_at.is_some());
        assert!(state.pre_execute.finished_at.is_none());
        assert_eq!(state.current, RunningState::NotRunning);
    }

    #[test]
    fn test_callbacks_share_the_context() {
        let mut fx = Fixture::new();
        let task = Task::new("writer")
            .unwrap()
            .with_execute(|_: &Task, inv: &mut Invocation<'_>| {
                inv.context.set("written.by", serde_json::json!("writer"))?;
                Ok(())
            });

        task.perform_execute(&mut fx.invocation()).unwrap();
        assert_eq!(
            fx.context.get("written.by").unwrap(),
            Some(&serde_json::json!("writer"))
        );
    }

    #[test]
    fn test_create_task_helpers() {
        let task = create_task(
            "full",
            Some("All phases".to_string()),
            Some(phase_fn(|_, _| Ok(true))),
            None,
            Some(phase_fn(|_, _| Ok(false))),
            TaskOptions {
                always_run_post_execute: true,
            },
        )
        .unwrap();

        assert_eq!(task.name(), "full");
        assert_eq!(task.description(), Some("All phases"));
        assert!(task.options().always_run_post_execute);

        let described = descriptive_task("d", "desc", |_, _| Ok(())).unwrap();
        assert_eq!(described.description(), Some("desc"));
    }
}
