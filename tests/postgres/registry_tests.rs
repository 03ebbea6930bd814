//! Registry persistence against `PostgreSQL`.

use std::sync::Arc;

use super::helpers::isolated_pool;
use archwarden::registry::{
    adapters::postgres::PostgresRegistryRepository,
    domain::{ComponentKind, FilePath, RepoName, ScopeRules, UnregisteredStatus},
    services::{MapFileRequest, RegisterComponentRequest, RegistryService},
};
use eyre::ensure;
use mockable::DefaultClock;
use rstest::rstest;

type PgRegistry = RegistryService<PostgresRegistryRepository, DefaultClock>;

fn service() -> eyre::Result<Option<PgRegistry>> {
    Ok(isolated_pool()?.map(|pool| {
        RegistryService::new(
            Arc::new(PostgresRegistryRepository::new(pool)),
            Arc::new(DefaultClock),
        )
    }))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_registration_merges_and_keeps_scope_json() -> eyre::Result<()> {
    let Some(registry) = service()? else {
        return Ok(());
    };
    let first = registry
        .register_component(
            RegisterComponentRequest::new("ProposalManager", ComponentKind::Class, "meridian-core")
                .with_scope(ScopeRules::new(
                    vec!["core/".to_owned()],
                    vec!["trading/".to_owned()],
                ))
                .with_description("Scores proposals"),
        )
        .await?;
    let merged = registry
        .register_component(RegisterComponentRequest::new(
            "ProposalManager",
            ComponentKind::Module,
            "meridian-core",
        ))
        .await?;

    ensure!(merged.id() == first.id(), "same component");
    ensure!(merged.kind() == ComponentKind::Module, "kind replaced");
    ensure!(merged.description() == Some("Scores proposals"), "description kept");
    ensure!(
        merged.scope().forbidden_paths == vec!["trading/".to_owned()],
        "scope kept"
    );
    let listed = registry
        .list_components(Some(&RepoName::new("meridian-core")?))
        .await?;
    ensure!(listed.len() == 1, "one row per name and repo");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remapping_a_path_updates_the_single_row() -> eyre::Result<()> {
    let Some(registry) = service()? else {
        return Ok(());
    };
    let old = registry
        .register_component(RegisterComponentRequest::new(
            "Old",
            ComponentKind::Module,
            "workspace",
        ))
        .await?;
    let new = registry
        .register_component(RegisterComponentRequest::new(
            "New",
            ComponentKind::Module,
            "workspace",
        ))
        .await?;
    let path = FilePath::new("wms/cli.py")?;
    registry
        .record_unregistered(&path, &RepoName::new("workspace")?)
        .await?;

    let first = registry
        .map_file(MapFileRequest::new(path.as_str(), old.id(), "first owner"))
        .await?;
    let second = registry
        .map_file(MapFileRequest::new(path.as_str(), new.id(), "moved"))
        .await?;

    ensure!(second.id() == first.id(), "upsert keeps the row");
    let lookup = registry.is_mapped(&path).await?;
    ensure!(lookup.component_id == Some(new.id()), "lookup sees the new owner");
    ensure!(
        registry.component_files(old.id()).await?.is_empty(),
        "old owner has no files"
    );
    let resolved = registry
        .list_unregistered(None, Some(UnregisteredStatus::Mapped))
        .await?;
    ensure!(resolved.len() == 1, "ledger row resolved by the mapping");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn redetection_increments_one_ledger_row() -> eyre::Result<()> {
    let Some(registry) = service()? else {
        return Ok(());
    };
    let path = FilePath::new("scripts/tmp.py")?;
    let repo = RepoName::new("workspace")?;
    for _ in 0..3 {
        registry.record_unregistered(&path, &repo).await?;
    }

    let rows = registry.list_unregistered(Some(repo), None).await?;

    ensure!(rows.len() == 1, "one row per path");
    ensure!(
        rows.first().map(|row| row.detection_count()) == Some(3),
        "counter incremented"
    );
    Ok(())
}
