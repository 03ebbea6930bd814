//! Registry behaviour through the service with in-memory storage.

use super::helpers::{Workspace, workspace};
use archwarden::registry::{
    domain::{ComponentKind, FilePath, RepoName, ScannedFile, UnregisteredStatus},
    services::{MapFileRequest, RegisterComponentRequest, ReviewUnregisteredRequest},
};
use eyre::ensure;
use rstest::rstest;

fn scanned(path: &str, repo: &str) -> eyre::Result<ScannedFile> {
    Ok(ScannedFile::new(FilePath::new(path)?, RepoName::new(repo)?))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn merge_keeps_fields_the_second_registration_omits(
    workspace: eyre::Result<Workspace>,
) -> eyre::Result<()> {
    let ws = workspace?;
    ws.registry
        .register_component(
            RegisterComponentRequest::new("Backtester", ComponentKind::Module, "meridian-trading")
                .with_expected_path("trading/backtest/")
                .with_description("Replays fills")
                .with_registered_by("erin"),
        )
        .await?;

    let merged = ws
        .registry
        .register_component(
            RegisterComponentRequest::new("Backtester", ComponentKind::Package, "meridian-trading")
                .with_description("Replays fills and quotes"),
        )
        .await?;

    ensure!(merged.kind() == ComponentKind::Package, "kind replaced");
    ensure!(
        merged.expected_path() == Some("trading/backtest/"),
        "expected path kept"
    );
    ensure!(
        merged.description() == Some("Replays fills and quotes"),
        "description replaced"
    );
    ensure!(merged.registered_by() == Some("erin"), "registrant kept");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scan_then_map_moves_files_into_coverage(
    workspace: eyre::Result<Workspace>,
) -> eyre::Result<()> {
    let ws = workspace?;
    let component = ws
        .registry
        .register_component(RegisterComponentRequest::new(
            "VotingSystem",
            ComponentKind::Module,
            "meridian-core",
        ))
        .await?;
    let first = ws
        .registry
        .ingest_scan(vec![
            scanned("core/voting.py", "meridian-core")?,
            scanned("core/tally.py", "meridian-core")?,
            scanned("scripts/one_off.py", "workspace")?,
        ])
        .await?;
    ensure!(first.newly_unregistered == 3, "all files start unregistered");

    ws.registry
        .map_file(MapFileRequest::new(
            "core/voting.py",
            component.id(),
            "ballot logic",
        ))
        .await?;
    ws.registry
        .review_unregistered(ReviewUnregisteredRequest::new(
            "scripts/one_off.py",
            UnregisteredStatus::Ignored,
            "erin",
        ))
        .await?;
    let second = ws
        .registry
        .ingest_scan(vec![
            scanned("core/voting.py", "meridian-core")?,
            scanned("core/tally.py", "meridian-core")?,
        ])
        .await?;
    ensure!(second.mapped == 1, "mapped file recognised");
    ensure!(second.redetected == 1, "pending file re-detected");

    let report = ws.registry.coverage(None).await?;
    let core = report
        .repos
        .iter()
        .find(|row| row.repo.as_str() == "meridian-core")
        .ok_or_else(|| eyre::eyre!("core row missing"))?;
    ensure!((core.mapped, core.unmapped) == (1, 1), "core counts");
    ensure!(core.percent() == 50, "core coverage is 50%");
    let pending = ws.registry.list_unregistered(None, None).await?;
    ensure!(pending.len() == 1, "only core/tally.py is pending");
    let tally = pending
        .first()
        .ok_or_else(|| eyre::eyre!("pending row missing"))?;
    ensure!(tally.detection_count() == 2, "seen by both scans");
    Ok(())
}
