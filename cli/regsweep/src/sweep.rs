//! Sweep orchestration: list images, plan, report, delete.
//!
//! The flow mirrors a scheduled maintenance run:
//!
//! 1. List repositories (optionally filtered) and their manifests.
//! 2. Compute a cleanup plan from the policy engine, or take the whole
//!    listing when `--purge` is set.
//! 3. Print the plan, then delete each target unless this is a dry run.
//!
//! Any listing error aborts the run. A delete hitting an already-missing
//! digest counts as success.

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, info};

use regsweep_policy::{plan, CleanupPlan, ImageRecord, PlanEntry};
use regsweep_registry::{DeleteOutcome, RegistryClient};

use crate::error::CliError;
use crate::output::{print_info, print_json, print_output, print_success, OutputFormat};

/// Options for one sweep run.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Images older than this are deleted.
    pub max_age_days: u32,

    /// Byte budget the registry must fit into.
    pub limit_bytes: u64,

    /// Substring filters on repository names; empty means all repositories.
    pub repositories: Vec<String>,

    /// CI markers: images in repositories matching one of these are deleted
    /// outright, before the age/size rules run.
    pub ci: Vec<String>,

    /// Report only, delete nothing.
    pub dry_run: bool,

    /// Delete every manifest, bypassing the policy engine.
    pub purge: bool,
}

/// Run one sweep against the registry.
pub async fn run(
    client: &dyn RegistryClient,
    options: &SweepOptions,
    format: OutputFormat,
) -> Result<(), CliError> {
    if options.dry_run {
        print_info("Dry run: no images will be deleted.");
    }

    let images = collect_images(client, &options.repositories).await?;
    let total_bytes: u64 = images.iter().map(|i| i.size_bytes).sum();
    info!(
        images = images.len(),
        total_bytes, "Fetched image listing"
    );

    let targets = if options.purge {
        info!(images = images.len(), "Purge: every manifest is a target");
        images
    } else {
        // Images from CI-marked repositories go first and are not offered
        // to the age/size rules.
        let (mut targets, images) = split_ci_images(images, &options.ci);
        if !targets.is_empty() {
            info!(
                images = targets.len(),
                "CI-marked images are deletion targets"
            );
        }

        let plan = plan(&images, options.max_age_days, options.limit_bytes, Utc::now())?;
        report_plan(&plan, format);

        // Delete a planned digest from every repository that lists it.
        targets.extend(
            images
                .into_iter()
                .filter(|i| plan.contains(&i.digest)),
        );
        targets
    };

    if options.dry_run {
        print_info(&format!(
            "{} image(s) eligible for deletion.",
            targets.len()
        ));
        return Ok(());
    }

    let summary = delete_images(client, &targets).await?;
    print_success(&format!(
        "Deleted {} image(s) ({} already absent), freed {} bytes.",
        summary.deleted, summary.missing, summary.freed_bytes
    ));

    Ok(())
}

/// List manifests across repositories, applying name filters.
async fn collect_images(
    client: &dyn RegistryClient,
    filters: &[String],
) -> Result<Vec<ImageRecord>, CliError> {
    let repositories = client.list_repositories().await?;
    debug!(repositories = repositories.len(), "Listed repositories");

    let mut images = Vec::new();
    for repository in repositories {
        if !filters.is_empty() && !filters.iter().any(|f| repository.contains(f.as_str())) {
            continue;
        }

        let mut records = client.list_manifests(&repository).await?;
        info!(
            repository = %repository,
            manifests = records.len(),
            "Listed repository manifests"
        );
        images.append(&mut records);
    }

    Ok(images)
}

/// Partition the listing into CI-marked deletion targets and the rest.
///
/// Markers match on the repository name, not the digest, so short markers
/// cannot collide with digest hex.
fn split_ci_images(
    images: Vec<ImageRecord>,
    markers: &[String],
) -> (Vec<ImageRecord>, Vec<ImageRecord>) {
    if markers.is_empty() {
        return (Vec::new(), images);
    }

    images.into_iter().partition(|image| {
        markers
            .iter()
            .any(|marker| image.repository.contains(marker.as_str()))
    })
}

#[derive(Debug, Default)]
struct DeleteSummary {
    deleted: usize,
    missing: usize,
    freed_bytes: u64,
}

/// Delete targets one at a time; the first registry error aborts the run.
async fn delete_images(
    client: &dyn RegistryClient,
    targets: &[ImageRecord],
) -> Result<DeleteSummary, CliError> {
    let mut summary = DeleteSummary::default();

    for image in targets {
        match client
            .delete_manifest(&image.repository, &image.digest)
            .await?
        {
            DeleteOutcome::Deleted => {
                info!(
                    repository = %image.repository,
                    digest = %image.digest,
                    size_bytes = image.size_bytes,
                    "Deleted image"
                );
                summary.deleted += 1;
                summary.freed_bytes += image.size_bytes;
            }
            DeleteOutcome::NotFound => {
                info!(
                    repository = %image.repository,
                    digest = %image.digest,
                    "Image already absent"
                );
                summary.missing += 1;
            }
        }
    }

    Ok(summary)
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct PlanRow {
    #[tabled(rename = "Repository")]
    repository: String,

    #[tabled(rename = "Digest")]
    digest: String,

    #[tabled(rename = "Created")]
    created: String,

    #[tabled(rename = "Size (bytes)")]
    size_bytes: u64,

    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&PlanEntry> for PlanRow {
    fn from(entry: &PlanEntry) -> Self {
        Self {
            repository: entry.repository.clone(),
            digest: entry.digest.clone(),
            created: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            size_bytes: entry.size_bytes,
            reason: entry.reason.to_string(),
        }
    }
}

fn report_plan(plan: &CleanupPlan, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<PlanRow> = plan.entries.iter().map(PlanRow::from).collect();
            print_output(&rows, format);
            print_info(&format!(
                "Registry holds {} bytes; plan frees {} bytes, leaving {}.",
                plan.total_bytes,
                plan.freed_bytes,
                plan.remaining_bytes()
            ));
        }
        OutputFormat::Json => print_json(plan),
    }
}
