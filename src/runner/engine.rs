//! The task-set runner
//!
//! Running a task set first runs the task sets it depends on, in declared
//! order, then each of its own task entries. Any halt or error stops
//! everything that has not started yet, across the whole run.

use crate::context::Context;
use crate::error::{exit_code, exit_code_of, RunError};
use crate::runner::{
    ErrorEvent, Event, Invocation, NullReporter, Outcome, Phase, Reporter, Task, TaskConfig,
    TaskEntry, TaskFn, TaskSet, TaskSets,
};
use std::rc::Rc;

/// Name of the task set run when none is requested
pub const DEFAULT_TASK_SET: &str = "default";

/// Called once at the end of every run with the last error, its message and the exit code
pub type FinishedFn = Box<dyn FnMut(Option<&anyhow::Error>, Option<&str>, i32)>;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Every requested task set ran to completion
    pub completed: bool,
    pub exit_code: i32,
}

/// Mutable state of the current run
#[derive(Debug)]
struct RunState {
    can_continue: bool,
    last_error: Option<anyhow::Error>,
    last_message: Option<String>,
    exit_code: i32,
    log_keys: Vec<String>,
    /// Task sets currently being resolved, outermost first
    resolving: Vec<String>,
}

impl RunState {
    fn new() -> Self {
        RunState {
            can_continue: true,
            last_error: None,
            last_message: None,
            exit_code: exit_code::SUCCESS,
            log_keys: Vec::new(),
            resolving: Vec::new(),
        }
    }
}

/// Runs task sets against a shared context
pub struct Runner {
    task_sets: Rc<TaskSets>,
    context: Context,
    reporter: Box<dyn Reporter>,
    on_finished: Option<FinishedFn>,
    state: RunState,
}

impl Runner {
    /// Create a runner for the given task sets
    ///
    /// A context carried by the task sets replaces the runner's fresh one.
    pub fn new(mut task_sets: TaskSets) -> Self {
        let context = task_sets.take_context().unwrap_or_default();
        Runner {
            task_sets: Rc::new(task_sets),
            context,
            reporter: Box::new(NullReporter),
            on_finished: None,
            state: RunState::new(),
        }
    }

    pub fn with_reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Register the completion callback
    pub fn on_finished<F>(mut self, f: F) -> Self
    where
        F: FnMut(Option<&anyhow::Error>, Option<&str>, i32) + 'static,
    {
        self.on_finished = Some(Box::new(f));
        self
    }

    pub fn task_sets(&self) -> &TaskSets {
        &self.task_sets
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn can_continue(&self) -> bool {
        self.state.can_continue
    }

    pub fn exit_code(&self) -> i32 {
        self.state.exit_code
    }

    pub fn last_error(&self) -> Option<&anyhow::Error> {
        self.state.last_error.as_ref()
    }

    pub fn last_message(&self) -> Option<&str> {
        self.state.last_message.as_deref()
    }

    /// The current breadcrumb of task-set and task names
    pub fn log_keys(&self) -> &[String] {
        &self.state.log_keys
    }

    /// Run the named task sets in order, or `default` when none are named
    ///
    /// Stops at the first task set that does not complete. The completion
    /// callback is invoked exactly once, whatever happened.
    pub fn run<S: AsRef<str>>(&mut self, names: &[S]) -> RunSummary {
        self.state = RunState::new();

        let mut names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        if names.is_empty() && self.task_sets.contains(DEFAULT_TASK_SET) {
            names.push(DEFAULT_TASK_SET.to_string());
        }

        for name in &names {
            if !self.run_task_set(name) {
                break;
            }
        }

        let summary = RunSummary {
            completed: self.state.can_continue,
            exit_code: self.state.exit_code,
        };

        if let Some(on_finished) = self.on_finished.as_mut() {
            on_finished(
                self.state.last_error.as_ref(),
                self.state.last_message.as_deref(),
                self.state.exit_code,
            );
        }

        summary
    }

    /// Run one task set, its dependencies first
    ///
    /// Returns whether the run can continue afterwards.
    pub fn run_task_set(&mut self, name: &str) -> bool {
        let pushed = self.push_log_key(name);

        let task_sets = Rc::clone(&self.task_sets);
        let result = if self.state.resolving.iter().any(|n| n == name) {
            let mut chain = self.state.resolving.clone();
            chain.push(name.to_string());
            let err = anyhow::Error::new(RunError::CircularDependency(chain.join(" -> ")));
            self.encountered_error(err, ErrorEvent::Error, None);
            false
        } else if let Some(task_set) = task_sets.get(name) {
            self.state.resolving.push(name.to_string());
            self.emit(&Event::RunningTaskSet { task_set: name });
            let completed = self.run_resolved_task_set(name, task_set, &task_sets);
            self.emit(&Event::RunningTaskSetFinished {
                task_set: name,
                completed,
            });
            self.state.resolving.pop();
            completed
        } else {
            let err = anyhow::Error::new(RunError::TaskSetNotFound(name.to_string()));
            self.encountered_error(err, ErrorEvent::TaskSetNotFound, None);
            false
        };

        if pushed {
            self.pop_log_key();
        }
        self.state.can_continue = result;
        result
    }

    fn run_resolved_task_set(&mut self, name: &str, task_set: &TaskSet, task_sets: &TaskSets) -> bool {
        let deps = task_set.deps();
        if !deps.is_empty() {
            self.emit(&Event::RunningDependentTaskSets {
                task_set: name,
                deps: &deps,
            });

            for dep in deps.iter() {
                if !self.run_task_set(dep) {
                    break;
                }
            }

            if self.state.can_continue {
                self.emit(&Event::RunningDependentTaskSetsFinished { task_set: name });
            }
        }

        if !self.state.can_continue {
            return false;
        }

        let no_config = TaskConfig::default();
        for entry in task_set.tasks().iter() {
            if !self.run_task(entry, &no_config, name, task_set, task_sets) {
                return false;
            }
        }

        true
    }

    /// Run a single task entry with the given configuration
    ///
    /// Returns whether later tasks may run.
    pub fn run_task(
        &mut self,
        entry: &TaskEntry,
        config: &TaskConfig,
        task_set_name: &str,
        task_set: &TaskSet,
        task_sets: &TaskSets,
    ) -> bool {
        match entry {
            TaskEntry::Configured(inner_config, inner) => {
                self.run_task(inner, inner_config, task_set_name, task_set, task_sets)
            }
            TaskEntry::Callable(f) => self.run_callable(f, config, task_set_name, task_set, task_sets),
            TaskEntry::Task(task) => self.run_lifecycle(task, config, task_set_name, task_set, task_sets),
        }
    }

    fn run_callable(
        &mut self,
        f: &TaskFn,
        config: &TaskConfig,
        task_set_name: &str,
        task_set: &TaskSet,
        task_sets: &TaskSets,
    ) -> bool {
        let name = config.name();
        let pushed = name.is_some_and(|name| self.push_log_key(name));

        self.emit(&Event::RunningTask {
            task: name,
            task_set: task_set_name,
        });
        self.emit(&Event::PhaseStarting {
            task: name,
            phase: Phase::Execute,
        });

        let result = {
            let mut inv = self.invocation(config, task_set_name, task_set, task_sets);
            f(&mut inv)
        };

        let completed = match result {
            Ok(outcome) => {
                self.emit(&Event::PhaseFinished {
                    task: name,
                    phase: Phase::Execute,
                    outcome,
                });
                outcome.should_continue()
            }
            Err(err) => {
                self.task_failed(name.unwrap_or("anonymous task"), err);
                false
            }
        };

        self.emit(&Event::RunningTaskFinished {
            task: name,
            completed,
        });

        if pushed {
            self.pop_log_key();
        }

        completed
    }

    fn run_lifecycle(
        &mut self,
        task: &Task,
        config: &TaskConfig,
        task_set_name: &str,
        task_set: &TaskSet,
        task_sets: &TaskSets,
    ) -> bool {
        let pushed = self.push_log_key(task.name());
        self.emit(&Event::RunningTask {
            task: Some(task.name()),
            task_set: task_set_name,
        });

        let run_phase = |runner: &mut Self, phase: Phase| {
            runner.run_phase(task, phase, config, task_set_name, task_set, task_sets)
        };

        let mut completed = true;
        match run_phase(self, Phase::PreExecute) {
            // Pre-execute asked to skip the task; the run goes on.
            Some(Outcome::Halt) => {}
            None => completed = false,
            Some(_) => {
                let run_post = match run_phase(self, Phase::Execute) {
                    Some(outcome) if outcome.should_continue() => true,
                    _ => {
                        completed = false;
                        task.options().always_run_post_execute
                    }
                };

                if run_post && !matches!(run_phase(self, Phase::PostExecute), Some(o) if o.should_continue()) {
                    completed = false;
                }
            }
        }

        self.emit(&Event::RunningTaskFinished {
            task: Some(task.name()),
            completed,
        });
        if pushed {
            self.pop_log_key();
        }

        completed
    }

    /// Run one phase; `None` means the phase failed and the error was recorded
    fn run_phase(
        &mut self,
        task: &Task,
        phase: Phase,
        config: &TaskConfig,
        task_set_name: &str,
        task_set: &TaskSet,
        task_sets: &TaskSets,
    ) -> Option<Outcome> {
        let name = Some(task.name());
        self.emit(&Event::PhaseStarting { task: name, phase });

        let result = {
            let mut inv = self.invocation(config, task_set_name, task_set, task_sets);
            match phase {
                Phase::PreExecute => task.perform_pre_execute(&mut inv),
                Phase::Execute => task.perform_execute(&mut inv),
                Phase::PostExecute => task.perform_post_execute(&mut inv),
            }
        };

        match result {
            Ok(outcome) => {
                self.emit(&Event::PhaseFinished {
                    task: name,
                    phase,
                    outcome,
                });
                Some(outcome)
            }
            Err(err) => {
                self.task_failed(task.name(), err);
                None
            }
        }
    }

    fn invocation<'a>(
        &'a mut self,
        config: &'a TaskConfig,
        task_set_name: &'a str,
        task_set: &'a TaskSet,
        task_sets: &'a TaskSets,
    ) -> Invocation<'a> {
        Invocation::new(
            config,
            task_set_name,
            task_set,
            task_sets,
            &mut self.context,
            self.reporter.as_ref(),
            &self.state.log_keys,
        )
    }

    fn task_failed(&mut self, task: &str, err: anyhow::Error) {
        let message = format!("Encountered an error while running task: {}", task);
        let err = anyhow::Error::new(RunError::CallbackFailure {
            task: task.to_string(),
            source: err,
        });
        self.encountered_error(err, ErrorEvent::TaskError, Some(message));
    }

    /// Record an error and halt the run
    ///
    /// The exit code is the error's own, else the one tied to `kind`, else the
    /// generic error code.
    pub fn encountered_error(&mut self, err: anyhow::Error, kind: ErrorEvent, message: Option<String>) {
        self.state.can_continue = false;
        self.state.exit_code = exit_code_of(&err)
            .or_else(|| kind.exit_code())
            .unwrap_or(exit_code::ERROR);

        self.reporter.report(
            &self.state.log_keys,
            &Event::Error {
                kind,
                error: &err,
                message: message.as_deref(),
            },
        );

        self.state.last_error = Some(err);
        self.state.last_message = message;
    }

    fn emit(&self, event: &Event<'_>) {
        self.reporter.report(&self.state.log_keys, event);
    }

    /// Returns whether a key was pushed; empty keys are skipped
    fn push_log_key(&mut self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        self.state.log_keys.push(key.to_string());
        true
    }

    fn pop_log_key(&mut self) -> Option<String> {
        self.state.log_keys.pop()
    }
}
