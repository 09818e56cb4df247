//! Offline linkage run over CSV inputs.
//!
//! Loads the registry exports and the UKTR extract, runs the linkage
//! and transplant linking, and writes the matched output and audit
//! tables. Dry run by default; `--commit` applies staged writes.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use log::info;
use rustc_hash::FxHashSet;

use nhsbt_link::report::stage;
use nhsbt_link::{
    link_patient_transplants, load_extract, load_paeds, load_registry, run_linkage, AuditReport,
    LinkageConfigBuilder, MemoryStore, RegistrySnapshot,
};

#[derive(Parser, Debug)]
#[command(
    name = "nhsbt-link",
    about = "Link a UKTR transplant extract against the renal registry"
)]
struct Args {
    /// UKTR extract CSV
    #[arg(long)]
    extract: PathBuf,

    /// Live registry patient export CSV
    #[arg(long)]
    registry: PathBuf,

    /// Deleted registry patient export CSV
    #[arg(long)]
    deleted: Option<PathBuf>,

    /// Paediatric cohort CSV, merged into the live partition
    #[arg(long)]
    paeds: Option<PathBuf>,

    /// Directory for the matched output and audit tables
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Apply staged writes instead of a dry run
    #[arg(long)]
    commit: bool,

    /// Disable the fuzzy-name stage
    #[arg(long)]
    no_fuzzy: bool,

    /// Maximum edit distance for close-name candidates
    #[arg(long, default_value_t = 2)]
    fuzzy_max_distance: usize,

    /// Close-name candidates kept per name
    #[arg(long, default_value_t = 5)]
    fuzzy_candidate_cap: usize,

    /// Drop deceased paediatric cohort patients who died before this date
    #[arg(long, default_value = "1900-01-01")]
    paeds_death_cutoff: NaiveDate,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = LinkageConfigBuilder::new()
        .with_fuzzy(!args.no_fuzzy)
        .with_fuzzy_max_distance(args.fuzzy_max_distance)
        .with_fuzzy_candidate_cap(args.fuzzy_candidate_cap)
        .with_paeds_death_cutoff(args.paeds_death_cutoff)
        .with_commit(args.commit)
        .build();

    let mut store = MemoryStore::new();
    store.add_patients(
        load_registry(&args.registry, false)
            .with_context(|| format!("loading registry patients from {}", args.registry.display()))?,
    );
    if let Some(deleted) = &args.deleted {
        store.add_patients(
            load_registry(deleted, true)
                .with_context(|| format!("loading deleted patients from {}", deleted.display()))?,
        );
    }
    if let Some(paeds) = &args.paeds {
        store.add_patients(
            load_paeds(paeds, &config)
                .with_context(|| format!("loading paediatric cohort from {}", paeds.display()))?,
        );
    }

    let snapshot = RegistrySnapshot::load(&store)?;

    let (incoming, _stats) = load_extract(&args.extract, &config)
        .with_context(|| format!("loading extract from {}", args.extract.display()))?;

    let linked = run_linkage(&incoming, &snapshot, &config)?;

    let mut report = AuditReport::new();
    let mut seen_patients = FxHashSet::default();
    let mut seen_registrations = FxHashSet::default();

    for row in &linked {
        seen_patients.insert(row.incoming.uktssa_no);
        let clean = stage::stage_patient(&mut store, row, &config, &mut report)?;
        // Transplants are only linked under a confirmed patient match
        if clean && row.is_matched() {
            link_patient_transplants(
                &mut store,
                row,
                &config,
                &mut seen_registrations,
                &mut report,
            )?;
        }
    }

    stage::check_missing_patients(&store, &seen_patients, &mut report)?;
    stage::check_missing_transplants(&store, &seen_registrations, &mut report)?;
    stage::check_deleted_patients(&linked, &mut report);

    fs::create_dir_all(&args.out_dir)?;
    nhsbt_link::write_matched_output(&args.out_dir.join("matched_output.csv"), &linked)?;
    report.write_csv(&args.out_dir)?;
    report.log_summary();

    if !config.commit {
        info!("dry run: no store writes applied (pass --commit to persist)");
    }

    Ok(())
}
