use crate::infra::{demo_class, demo_institution, demo_round, InMemoryAdmissionStore};
use admissions::error::AppError;
use admissions::workflows::admission::{
    AdmissionService, DrawConfig, LotteryOutcome, StatisticsView,
};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Fixed seed for the selection draw (defaults to 2026 so demo output is
    /// stable run to run)
    #[arg(long)]
    pub(crate) selection_seed: Option<u64>,
    /// Fixed seed for the waitlist placement draw
    #[arg(long)]
    pub(crate) placement_seed: Option<u64>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryAdmissionStore::seeded());
    let draw = DrawConfig {
        selection_seed: Some(args.selection_seed.unwrap_or(2026)),
        placement_seed: Some(args.placement_seed.unwrap_or(411)),
    };
    let service = AdmissionService::with_draw_config(store, draw);

    println!("Admission allocation demo");
    println!(
        "Institution {} / round {}",
        demo_institution().0,
        demo_round().0
    );

    let outcome = service.run_lottery(&demo_institution())?;
    render_outcome(&outcome);

    if let Some(first) = outcome.waitlisted.first() {
        let cancelled = service.cancel_participant(
            &demo_round(),
            &first.national_id,
            "family declined the offer",
        )?;
        println!(
            "\nCancelled {} (held waitlist position {}); the line closed up behind them",
            cancelled.national_id.0,
            first.current_order.unwrap_or_default()
        );
    }

    if let Some(last) = outcome.waitlisted.last() {
        let admitted = service.manual_admit(&demo_round(), &last.national_id, &demo_class())?;
        println!(
            "\nManually admitted {} into {}",
            last.national_id.0,
            demo_class().0
        );
        if let Some(warning) = &admitted.warning {
            println!("  warning: {warning}");
        }
    }

    let stats = service.statistics(&demo_institution())?;
    render_statistics(&stats);

    Ok(())
}

fn render_outcome(outcome: &LotteryOutcome) {
    println!("\nLottery outcome: {}", outcome.message);
    println!("Processed {} applicants", outcome.total_processed);
    for tally in &outcome.accepted_by_tier {
        println!("- tier {}: {} accepted", tally.tier.0, tally.accepted);
    }

    println!("\nAccepted");
    for applicant in &outcome.accepted {
        println!("- {} (tier {})", applicant.national_id.0, applicant.tier.0);
    }

    println!("\nWaitlist");
    for applicant in &outcome.waitlisted {
        println!(
            "- #{} {} (tier {})",
            applicant.current_order.unwrap_or_default(),
            applicant.national_id.0,
            applicant.tier.0
        );
    }
}

fn render_statistics(stats: &StatisticsView) {
    println!("\nInstitution statistics");
    println!(
        "Capacity {} (enrolled {}, available {})",
        stats.total_capacity, stats.enrolled, stats.available
    );
    for count in &stats.tier_counts {
        println!(
            "- tier {}: {} pending, {} waitlisted",
            count.tier.0, count.pending, count.waitlisted
        );
    }
}
