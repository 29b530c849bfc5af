//! Discovery of the images to export.
//!
//! Walks the configured projects in order, resolves each project's
//! repositories (explicitly listed or fetched from the registry), and
//! flattens every tag of every artifact into an [`ImageReference`].

use crate::client::RegistryApi;
use crate::config::ProjectSpec;
use crate::error::Result;
use crate::reference::ImageReference;
use tracing::{debug, info};


/// Builds the ordered list of images to export.
///
/// Order is: projects in configuration order, repositories in resolved order,
/// artifacts and tags in the order the registry returns them. The first
/// registry error aborts discovery; no partial list is returned.
pub async fn discover<R: RegistryApi>(
    api: &R,
    registry: &str,
    projects: &[ProjectSpec],
) -> Result<Vec<ImageReference>> {
    let mut images = Vec::new();

    for project in projects {
        info!(project = %project.name, "Preparing project");

        let repositories = resolve_repositories(api, project).await?;
        for repository in &repositories {
            let found = discover_repository(api, registry, &project.name, repository).await?;
            debug!(
                project = %project.name,
                repository = %repository,
                images = found.len(),
                "Discovered repository"
            );
            images.extend(found);
        }
    }

    Ok(images)
}

/// Returns the bare repository names to export for `project`.
pub async fn resolve_repositories<R: RegistryApi>(
    api: &R,
    project: &ProjectSpec,
) -> Result<Vec<String>> {
    if !project.repository.fetch_all {
        return Ok(project.repository.items.clone());
    }

    let prefix = format!("{}/", project.name);
    let repositories = api
        .list_repositories(&project.name)
        .await?
        .into_iter()
        .map(|repository| match repository.name.strip_prefix(&prefix) {
            Some(bare) => bare.to_string(),
            None => repository.name,
        })
        .collect();

    Ok(repositories)
}

/// Lists one image reference per tag of every artifact in `project/repository`.
pub async fn discover_repository<R: RegistryApi>(
    api: &R,
    registry: &str,
    project: &str,
    repository: &str,
) -> Result<Vec<ImageReference>> {
    let artifacts = api.list_artifacts(project, repository).await?;

    Ok(artifacts
        .iter()
        .flat_map(|artifact| artifact.tags.iter())
        .map(|tag| ImageReference::new(registry, project, repository, &tag.name))
        .collect())
}
