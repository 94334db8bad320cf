//! Shared server state.
//!
//! One daemon can serve several projects (keyed by project file). The map
//! is an explicit context object handed to every transport handler rather
//! than process-wide state.

use hdlcheck_project::Project;
use log::info;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

/// Maps project files to live [`Project`] instances.
#[derive(Default)]
pub struct ServerContext {
    projects: Mutex<HashMap<Option<PathBuf>, Project>>,
}

impl ServerContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the project for a project file, creating it on first use.
    ///
    /// Newly created projects kick off a background dependency build so
    /// the first editor request finds warm caches.
    pub fn get_or_create(&self, project_file: Option<PathBuf>) -> io::Result<Project> {
        let mut projects = self.projects.lock().unwrap();
        if let Some(project) = projects.get(&project_file) {
            return Ok(project.clone());
        }

        info!("creating project for {project_file:?}");
        let project = Project::new(project_file.clone())?;
        project.build_by_dependency();
        projects.insert(project_file, project.clone());
        Ok(project)
    }

    /// Drops a project, halting its background work first.
    pub fn remove(&self, project_file: &Option<PathBuf>) {
        let removed = self.projects.lock().unwrap().remove(project_file);
        if let Some(project) = removed {
            project.halt();
            project.wait_for_build();
        }
    }

    /// Halts and joins every project's background worker.
    pub fn shutdown(&self) {
        let projects: Vec<Project> = self.projects.lock().unwrap().values().cloned().collect();
        for project in projects {
            project.halt();
            project.wait_for_build();
            project.save_cache();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_returns_same_project() {
        let context = ServerContext::new();
        let a = context.get_or_create(None).unwrap();
        let b = context.get_or_create(None).unwrap();
        a.wait_for_build();
        // Clones share state: draining UI messages on one drains the other.
        b.ui_messages();
        assert!(a.ui_messages().is_empty());
    }

    #[test]
    fn distinct_keys_get_distinct_projects() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("p.prj");
        std::fs::write(&config, "").unwrap();

        let context = ServerContext::new();
        let a = context.get_or_create(None).unwrap();
        let b = context.get_or_create(Some(config.clone())).unwrap();
        a.wait_for_build();
        b.wait_for_build();
        assert_eq!(b.project_file(), Some(config.as_path()));
        assert_eq!(a.project_file(), None);
    }

    #[test]
    fn remove_then_recreate() {
        let context = ServerContext::new();
        context.get_or_create(None).unwrap().wait_for_build();
        context.remove(&None);
        let again = context.get_or_create(None).unwrap();
        again.wait_for_build();
        assert!(again.has_finished_building());
    }

    #[test]
    fn shutdown_joins_all_projects() {
        let context = ServerContext::new();
        context.get_or_create(None).unwrap();
        context.shutdown();
    }
}
