// src/resolver.rs

//! Dependency resolution for catalog apps
//!
//! Dependencies are declared by name in the catalog. Resolving an app
//! produces an install plan in which every dependency appears before the
//! apps that need it, each app once. The whole plan is validated before
//! anything is installed: a missing dependency or a cycle fails resolution
//! and nothing runs.

use crate::config::{AppConfig, Catalog};
use crate::error::{Error, Result};
use std::collections::HashSet;
use tracing::debug;

/// Resolves dependency chains against a catalog
pub struct DependencyResolver<'c> {
    catalog: &'c Catalog,
}

impl<'c> DependencyResolver<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Install plan for `name`: dependencies first, `name` last
    pub fn resolve(&self, name: &str) -> Result<Vec<&'c AppConfig>> {
        self.resolve_all([name])
    }

    /// Combined install plan for several apps, each app appearing once
    pub fn resolve_all<'n, I>(&self, names: I) -> Result<Vec<&'c AppConfig>>
    where
        I: IntoIterator<Item = &'n str>,
    {
        let mut plan = Vec::new();
        let mut done = HashSet::new();
        let mut path = Vec::new();

        for name in names {
            let app = self.catalog.get(name)?;
            self.visit(app, &mut path, &mut done, &mut plan)?;
        }

        debug!(
            "Resolved plan: {}",
            plan.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
        );
        Ok(plan)
    }

    /// Depth-first post-order walk; `path` holds the apps being visited
    fn visit(
        &self,
        app: &'c AppConfig,
        path: &mut Vec<&'c str>,
        done: &mut HashSet<&'c str>,
        plan: &mut Vec<&'c AppConfig>,
    ) -> Result<()> {
        if done.contains(app.name.as_str()) {
            return Ok(());
        }
        path.push(&app.name);

        for dep_name in &app.dependencies {
            if let Some(start) = path.iter().position(|p| *p == dep_name.as_str()) {
                let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(dep_name.clone());
                return Err(Error::DependencyCycle(cycle));
            }

            let dep = self.catalog.find(dep_name).ok_or_else(|| Error::DependencyNotFound {
                app: app.name.clone(),
                dependency: dep_name.clone(),
            })?;
            self.visit(dep, path, done, plan)?;
        }

        path.pop();
        done.insert(&app.name);
        plan.push(app);
        Ok(())
    }

    /// Catalog apps that declare `name` as a direct dependency
    pub fn dependents(&self, name: &str) -> Vec<&'c str> {
        self.catalog
            .apps()
            .iter()
            .filter(|app| app.dependencies.iter().any(|d| d == name))
            .map(|app| app.name.as_str())
            .collect()
    }
}
