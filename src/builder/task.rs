//! Named build tasks and the ordered pipeline that runs them.

use super::BuildContext;
use crate::error::{PackError, Result};
use crate::project::TaskDirective;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error, info};

/// A unit of work in the build pipeline.
pub trait Task {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()>;
}

impl<F> Task for F
where
    F: Fn(&mut BuildContext<'_>) -> Result<()>,
{
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        self(ctx)
    }
}

/// Box a closure as a task.
pub fn task_fn<F>(f: F) -> Box<dyn Task>
where
    F: Fn(&mut BuildContext<'_>) -> Result<()> + 'static,
{
    Box::new(f)
}

type Constructor = Box<dyn Fn() -> Box<dyn Task>>;

/// Named task constructors that directives refer to.
#[derive(Default)]
pub struct TaskFactory {
    constructors: BTreeMap<String, Constructor>,
}

impl TaskFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory holding every built-in task.
    pub fn standard() -> Self {
        let mut factory = Self::new();
        super::tasks::register_all(&mut factory);
        factory
    }

    /// Register a constructor under `name`.
    pub fn register<F>(&mut self, name: &str, constructor: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Task> + 'static,
    {
        if self.constructors.contains_key(name) {
            return Err(PackError::DuplicateTask(name.to_string()));
        }
        self.constructors
            .insert(name.to_string(), Box::new(constructor));
        Ok(())
    }

    pub(crate) fn register_builtin(&mut self, name: &str, constructor: fn() -> Box<dyn Task>) {
        self.constructors
            .insert(name.to_string(), Box::new(constructor));
    }

    /// Builder form of [`TaskFactory::register`].
    pub fn with<F>(mut self, name: &str, constructor: F) -> Result<Self>
    where
        F: Fn() -> Box<dyn Task> + 'static,
    {
        self.register(name, constructor)?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Task>> {
        self.constructors
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| PackError::UnknownTask(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

/// Ordered, name-keyed task list. Order is execution order.
#[derive(Default)]
pub struct TaskGraph {
    tasks: Vec<(String, Box<dyn Task>)>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default pipeline, created from `factory`.
    ///
    /// `upload` is included only when `with_upload` is set.
    pub fn standard(factory: &TaskFactory, with_upload: bool) -> Result<Self> {
        let mut graph = Self::new();
        for name in super::tasks::DEFAULT_ORDER {
            if name == super::tasks::UPLOAD && !with_upload {
                continue;
            }
            graph.push(name, factory.create(name)?)?;
        }
        Ok(graph)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| PackError::UnknownTask(name.to_string()))
    }

    fn check_unique(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(PackError::DuplicateTask(name.to_string()));
        }
        Ok(())
    }

    /// Append a task.
    pub fn push(&mut self, name: &str, task: Box<dyn Task>) -> Result<()> {
        self.check_unique(name)?;
        self.tasks.push((name.to_string(), task));
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Box<dyn Task>> {
        let index = self.position(name)?;
        Ok(self.tasks.remove(index).1)
    }

    /// Put `task` in the place of `name`, under `new_name`.
    pub fn replace(&mut self, name: &str, new_name: &str, task: Box<dyn Task>) -> Result<()> {
        let index = self.position(name)?;
        if new_name != name {
            self.check_unique(new_name)?;
        }
        self.tasks[index] = (new_name.to_string(), task);
        Ok(())
    }

    pub fn insert_after(&mut self, anchor: &str, name: &str, task: Box<dyn Task>) -> Result<()> {
        let index = self.position(anchor)?;
        self.check_unique(name)?;
        self.tasks.insert(index + 1, (name.to_string(), task));
        Ok(())
    }

    pub fn insert_before(&mut self, anchor: &str, name: &str, task: Box<dyn Task>) -> Result<()> {
        let index = self.position(anchor)?;
        self.check_unique(name)?;
        self.tasks.insert(index, (name.to_string(), task));
        Ok(())
    }

    /// Apply a configured directive, creating new tasks from `factory`.
    ///
    /// Removing a task the factory knows but the pipeline does not hold (for
    /// example `upload` without a hosting collaborator) does nothing.
    pub fn apply(&mut self, directive: &TaskDirective, factory: &TaskFactory) -> Result<()> {
        debug!(?directive, "Applying task directive");
        match directive {
            TaskDirective::Remove { task } => {
                if !self.contains(task) && factory.contains(task) {
                    return Ok(());
                }
                self.remove(task).map(|_| ())
            }
            TaskDirective::Replace { task, with } => {
                let replacement = factory.create(with)?;
                self.replace(task, with, replacement)
            }
            TaskDirective::InsertAfter { task, factory: name } => {
                let inserted = factory.create(name)?;
                self.insert_after(task, name, inserted)
            }
            TaskDirective::InsertBefore { task, factory: name } => {
                let inserted = factory.create(name)?;
                self.insert_before(task, name, inserted)
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task in order, stopping at the first failure.
    pub fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        for (name, task) in &self.tasks {
            info!(task = %name, "> Task :{}", name);
            let started = Instant::now();
            if let Err(e) = task.run(ctx) {
                error!(task = %name, error = %e, "Task failed");
                return Err(e);
            }
            debug!(
                task = %name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Task finished"
            );
        }
        Ok(())
    }
}
