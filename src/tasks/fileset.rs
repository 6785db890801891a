//! Glob-expanded sets of files

use crate::context::{interpolate_list, Context};
use crate::error::{TaskError, TaskResult};
use crate::runner::TaskConfig;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;

/// Files matching one or more glob patterns, minus any excluded ones
#[derive(Debug, Clone)]
pub struct FileSet {
    patterns: Vec<String>,
    exclude: Option<GlobSet>,
}

impl FileSet {
    /// A file set over the given candidate patterns
    pub fn new<I, S>(patterns: I) -> TaskResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        if patterns.is_empty() {
            return Err(TaskError::InvalidArgument(
                "Unable to create a file set: no candidate files were given".to_string(),
            ));
        }

        Ok(FileSet {
            patterns,
            exclude: None,
        })
    }

    /// Leave out paths matching any of these patterns
    pub fn with_exclude<I, S>(mut self, patterns: I) -> TaskResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern.as_ref())
                .map_err(|e| TaskError::InvalidArgument(e.to_string()))?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| TaskError::InvalidArgument(e.to_string()))?;
        self.exclude = Some(set);
        Ok(self)
    }

    /// Read the file set from a configuration field, plus an optional `exclude` field
    ///
    /// Patterns are interpolated against the context first.
    pub fn from_config(config: &TaskConfig, key: &str, ctx: &Context) -> anyhow::Result<Self> {
        let patterns = config.get_strings(key).ok_or_else(|| {
            TaskError::InvalidArgument(format!("'{}' must be a pattern or a list of patterns", key))
        })?;
        let mut set = FileSet::new(interpolate_list(&patterns, ctx)?)?;

        if let Some(exclude) = config.get_strings("exclude") {
            set = set.with_exclude(interpolate_list(&exclude, ctx)?)?;
        }
        Ok(set)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Expand every pattern, in pattern order, without duplicates
    pub fn files(&self) -> TaskResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for pattern in &self.patterns {
            let paths = glob::glob(pattern)
                .map_err(|e| TaskError::InvalidArgument(format!("Invalid pattern '{}': {}", pattern, e)))?;

            for path in paths {
                let path = path.map_err(|e| TaskError::Io(e.into()))?;
                if self.is_excluded(&path) || files.contains(&path) {
                    continue;
                }
                files.push(path);
            }
        }

        Ok(files)
    }

    fn is_excluded(&self, path: &std::path::Path) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(path))
    }
}
