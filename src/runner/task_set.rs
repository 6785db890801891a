//! Task sets and task entries
//!
//! A task set is a named, ordered list of task entries plus the names of the
//! task sets it depends on. Both lists may be given directly or computed when
//! the set runs.

use crate::context::Context;
use crate::runner::{task_fn, Invocation, Outcome, Task, TaskFn};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A value given up front or computed on demand
pub enum Resolvable<T> {
    Value(T),
    Computed(Rc<dyn Fn() -> T>),
}

impl<T: Clone> Resolvable<T> {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Resolvable::Computed(Rc::new(f))
    }

    pub fn resolve(&self) -> Cow<'_, T> {
        match self {
            Resolvable::Value(value) => Cow::Borrowed(value),
            Resolvable::Computed(f) => Cow::Owned(f()),
        }
    }
}

impl<T: Clone> Clone for Resolvable<T> {
    fn clone(&self) -> Self {
        match self {
            Resolvable::Value(value) => Resolvable::Value(value.clone()),
            Resolvable::Computed(f) => Resolvable::Computed(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolvable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolvable::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Resolvable::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Extra configuration attached to a task entry
///
/// Callbacks see it as [`Invocation::config`]. The `name` and `description`
/// fields double as the entry's display name and description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskConfig {
    fields: Map<String, Value>,
}

impl TaskConfig {
    pub fn new() -> Self {
        TaskConfig::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        TaskConfig { fields }
    }

    /// Add a field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// A field, if it holds a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// A field, if it holds a boolean
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// A field holding one string or a list of strings
    pub fn get_strings(&self, key: &str) -> Option<Vec<String>> {
        match self.fields.get(key)? {
            Value::String(s) => Some(vec![s.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name").filter(|name| !name.is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// One entry of a task set's task list
#[derive(Clone)]
pub enum TaskEntry {
    /// A bare callback; it only has an execute phase
    Callable(TaskFn),
    /// A task with the full pre-execute, execute and post-execute lifecycle
    Task(Task),
    /// A task wrapped with extra configuration
    Configured(TaskConfig, Box<TaskEntry>),
}

impl TaskEntry {
    /// A bare callback entry
    pub fn callable<F, R>(f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> anyhow::Result<R> + 'static,
        R: Into<Outcome>,
    {
        TaskEntry::Callable(task_fn(f))
    }

    /// Wrap an entry with configuration
    pub fn configured(config: TaskConfig, task: impl Into<TaskEntry>) -> Self {
        TaskEntry::Configured(config, Box::new(task.into()))
    }

    /// A name for display, when the entry has one
    pub fn name(&self) -> Option<&str> {
        match self {
            TaskEntry::Callable(_) => None,
            TaskEntry::Task(task) => Some(task.name()),
            TaskEntry::Configured(config, inner) => config.name().or_else(|| inner.name()),
        }
    }
}

impl From<Task> for TaskEntry {
    fn from(task: Task) -> Self {
        TaskEntry::Task(task)
    }
}

impl fmt::Debug for TaskEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskEntry::Callable(_) => f.write_str("Callable(..)"),
            TaskEntry::Task(task) => f.debug_tuple("Task").field(task).finish(),
            TaskEntry::Configured(config, inner) => f
                .debug_tuple("Configured")
                .field(config)
                .field(inner)
                .finish(),
        }
    }
}

/// A named group of task entries and the task sets it depends on
#[derive(Debug, Clone)]
pub struct TaskSet {
    description: Option<String>,
    deps: Option<Resolvable<Vec<String>>>,
    tasks: Resolvable<Vec<TaskEntry>>,
}

impl Default for TaskSet {
    fn default() -> Self {
        TaskSet::new()
    }
}

impl TaskSet {
    pub fn new() -> Self {
        TaskSet {
            description: None,
            deps: None,
            tasks: Resolvable::Value(Vec::new()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Depend on a single task set
    pub fn with_dep(self, name: impl Into<String>) -> Self {
        self.with_deps([name.into()])
    }

    /// Depend on task sets, run in the given order
    pub fn with_deps<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into);
        if let Some(Resolvable::Value(deps)) = &mut self.deps {
            deps.extend(names);
        } else {
            self.deps = Some(Resolvable::Value(names.collect()));
        }
        self
    }

    /// Compute the dependencies when the set runs
    pub fn with_lazy_deps<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Vec<String> + 'static,
    {
        self.deps = Some(Resolvable::computed(f));
        self
    }

    pub fn with_task(mut self, entry: impl Into<TaskEntry>) -> Self {
        let entry = entry.into();
        if let Resolvable::Value(tasks) = &mut self.tasks {
            tasks.push(entry);
        } else {
            self.tasks = Resolvable::Value(vec![entry]);
        }
        self
    }

    pub fn with_tasks<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = TaskEntry>,
    {
        for entry in entries {
            self = self.with_task(entry);
        }
        self
    }

    /// Compute the task list when the set runs
    pub fn with_lazy_tasks<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Vec<TaskEntry> + 'static,
    {
        self.tasks = Resolvable::computed(f);
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The dependency names, in run order
    pub fn deps(&self) -> Cow<'_, Vec<String>> {
        match &self.deps {
            Some(deps) => deps.resolve(),
            None => Cow::Owned(Vec::new()),
        }
    }

    /// The task entries, in run order
    pub fn tasks(&self) -> Cow<'_, Vec<TaskEntry>> {
        self.tasks.resolve()
    }
}

/// Every task set known to a run, by name
#[derive(Debug, Clone, Default)]
pub struct TaskSets {
    sets: BTreeMap<String, TaskSet>,
    context: Option<Context>,
}

impl TaskSets {
    pub fn new() -> Self {
        TaskSets::default()
    }

    pub fn with(mut self, name: impl Into<String>, task_set: TaskSet) -> Self {
        self.insert(name, task_set);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, task_set: TaskSet) {
        self.sets.insert(name.into(), task_set);
    }

    pub fn get(&self, name: &str) -> Option<&TaskSet> {
        self.sets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Task sets sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskSet)> {
        self.sets.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Use this context for runs instead of a fresh one
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub(crate) fn take_context(&mut self) -> Option<Context> {
        self.context.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_config_accessors() {
        let config = TaskConfig::new()
            .with("name", "copy assets")
            .with("files", json!(["a", "b"]))
            .with("single", "c")
            .with("quiet", true);

        assert_eq!(config.name(), Some("copy assets"));
        assert_eq!(config.get_strings("files"), Some(vec!["a".into(), "b".into()]));
        assert_eq!(config.get_strings("single"), Some(vec!["c".into()]));
        assert_eq!(config.get_bool("quiet"), Some(true));
        assert_eq!(config.get_strings("quiet"), None);
        assert_eq!(config.description(), None);
    }

    #[test]
    fn test_single_dep_is_a_one_element_list() {
        let set = TaskSet::new().with_dep("base");
        assert_eq!(*set.deps(), vec!["base".to_string()]);
    }

    #[test]
    fn test_lazy_deps_and_tasks() {
        let set = TaskSet::new()
            .with_lazy_deps(|| vec!["a".to_string(), "b".to_string()])
            .with_lazy_tasks(|| vec![TaskEntry::callable(|_| Ok(()))]);

        assert_eq!(set.deps().len(), 2);
        assert_eq!(set.tasks().len(), 1);
    }

    #[test]
    fn test_no_deps() {
        assert!(TaskSet::new().deps().is_empty());
    }

    #[test]
    fn test_entry_names() {
        let task = Task::new("named").unwrap();
        assert_eq!(TaskEntry::from(task.clone()).name(), Some("named"));
        assert_eq!(TaskEntry::callable(|_| Ok(())).name(), None);

        let wrapped = TaskEntry::configured(TaskConfig::new().with("name", "outer"), task);
        assert_eq!(wrapped.name(), Some("outer"));
    }

    #[test]
    fn test_task_sets_are_sorted() {
        let sets = TaskSets::new()
            .with("zeta", TaskSet::new())
            .with("alpha", TaskSet::new());
        let names: Vec<&str> = sets.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
