use anyhow::{Result, ensure};
use cuvee_game::{
    Action, AromaProfile, Command, ContainerStatus, Defect, FermentationStatus, Parameter,
    ProcessConfig, ProcessPath, QualityGrade, Stage, ThermostatStatus, TimedAction,
};

use crate::logic::{SimulationPlan, SimulationSummary, Step};

pub struct CatalogEntry {
    pub key: &'static str,
    pub name: &'static str,
    pub build: fn() -> SimulationPlan,
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        key: "perfect-still",
        name: "Perfect Still Run",
        build: perfect_still,
    },
    CatalogEntry {
        key: "perfect-sparkling",
        name: "Perfect Sparkling Run",
        build: perfect_sparkling,
    },
    CatalogEntry {
        key: "careless-preparation",
        name: "Careless Preparation",
        build: careless_preparation,
    },
    CatalogEntry {
        key: "hot-fermentation",
        name: "Hot Fermentation",
        build: hot_fermentation,
    },
    CatalogEntry {
        key: "spoiled-fermentation",
        name: "Spoiled Fermentation",
        build: spoiled_fermentation,
    },
    CatalogEntry {
        key: "skipped-freezing",
        name: "Disgorgement Without Freezing",
        build: skipped_freezing,
    },
    CatalogEntry {
        key: "leaky-bottling",
        name: "Leaky Bottling Line",
        build: leaky_bottling,
    },
    CatalogEntry {
        key: "navigation-review",
        name: "Stage Review Navigation",
        build: navigation_review,
    },
    CatalogEntry {
        key: "restart-mid-action",
        name: "Restart During Timed Action",
        build: restart_mid_action,
    },
    CatalogEntry {
        key: "wall-clock",
        name: "Wall-Clock Driver",
        build: wall_clock,
    },
    CatalogEntry {
        key: "random-walk",
        name: "Seeded Random Walk Invariants",
        build: random_walk,
    },
];

const ADVANCE: Step = Step::Apply(Command::Advance);
const SETTLE: Step = Step::Settle;
const RANDOM_WALK_STEPS: usize = 400;

const fn select(path: ProcessPath) -> Step {
    Step::Apply(Command::SelectPath { path })
}

const fn begin(action: TimedAction) -> Step {
    Step::Apply(Command::Begin { action })
}

const fn perform(action: Action) -> Step {
    Step::Apply(Command::Perform { action })
}

const fn set(parameter: Parameter) -> Step {
    Step::Apply(Command::SetParameter { parameter })
}

fn careful_preparation() -> Vec<Step> {
    vec![
        begin(TimedAction::Wash),
        SETTLE,
        begin(TimedAction::Crush),
        SETTLE,
        perform(Action::AddYeast),
        ADVANCE,
    ]
}

fn clean_fermentation() -> Vec<Step> {
    vec![perform(Action::StartFermentation), SETTLE, ADVANCE]
}

fn clean_filtration() -> Vec<Step> {
    vec![
        begin(TimedAction::Press),
        SETTLE,
        begin(TimedAction::Filter),
        SETTLE,
        ADVANCE,
    ]
}

fn up_to_finishing(path: ProcessPath) -> Vec<Step> {
    let mut steps = vec![select(path)];
    steps.extend(careful_preparation());
    steps.extend(clean_fermentation());
    steps.extend(clean_filtration());
    steps
}

fn riddle_and_freeze() -> Vec<Step> {
    vec![
        perform(Action::FillTirage),
        ADVANCE,
        perform(Action::RiddleTurn),
        perform(Action::RiddleTurn),
        perform(Action::RiddleTurn),
        perform(Action::RiddleTurn),
        Step::Refused(Command::Perform {
            action: Action::RiddleTurn,
        }),
        ADVANCE,
    ]
}

fn perfect_still() -> SimulationPlan {
    let mut steps = up_to_finishing(ProcessPath::Still);
    steps.extend([
        set(Parameter::AgingWeeks(4)),
        ADVANCE,
        perform(Action::RunBottlingLine),
        ADVANCE,
    ]);
    SimulationPlan::script(ProcessPath::Still, steps)
        .with_expectation(flawless_expectation)
        .with_expectation(oak_profile_expectation)
}

fn perfect_sparkling() -> SimulationPlan {
    let mut steps = up_to_finishing(ProcessPath::Sparkling);
    steps.extend(riddle_and_freeze());
    steps.extend([perform(Action::FreezeNeck), ADVANCE, perform(Action::Disgorge), ADVANCE]);
    SimulationPlan::script(ProcessPath::Sparkling, steps)
        .with_expectation(flawless_expectation)
        .with_expectation(bouquet_expectation)
}

fn careless_preparation() -> SimulationPlan {
    SimulationPlan::script(
        ProcessPath::Still,
        vec![
            select(ProcessPath::Still),
            set(Parameter::CrushGranularity(90)),
            ADVANCE,
        ],
    )
    .with_expectation(careless_preparation_expectation)
}

fn hot_fermentation() -> SimulationPlan {
    let mut steps = vec![select(ProcessPath::Still)];
    steps.extend(careful_preparation());
    steps.extend([
        set(Parameter::FermentationTemp(32.0)),
        perform(Action::StartFermentation),
        SETTLE,
        ADVANCE,
    ]);
    SimulationPlan::script(ProcessPath::Still, steps).with_expectation(hot_fermentation_expectation)
}

fn spoiled_fermentation() -> SimulationPlan {
    let mut steps = vec![select(ProcessPath::Still)];
    steps.extend(careful_preparation());
    steps.extend([
        set(Parameter::FermentationTemp(35.0)),
        perform(Action::StartFermentation),
        SETTLE,
        Step::Refused(Command::Perform {
            action: Action::StartFermentation,
        }),
        ADVANCE,
    ]);
    SimulationPlan::script(ProcessPath::Still, steps)
        .with_tuning(runaway_overheat)
        .with_expectation(spoiled_expectation)
}

fn runaway_overheat(config: &mut ProcessConfig) {
    config.fermentation.overheat_speed = 70.0;
}

fn skipped_freezing() -> SimulationPlan {
    let mut steps = up_to_finishing(ProcessPath::Sparkling);
    steps.extend(riddle_and_freeze());
    steps.extend([ADVANCE, perform(Action::Disgorge), ADVANCE]);
    SimulationPlan::script(ProcessPath::Sparkling, steps)
        .with_expectation(skipped_freezing_expectation)
}

fn leaky_bottling() -> SimulationPlan {
    let mut steps = up_to_finishing(ProcessPath::Still);
    steps.extend([
        ADVANCE,
        perform(Action::ToggleHermetic),
        perform(Action::RunBottlingLine),
        ADVANCE,
    ]);
    SimulationPlan::script(ProcessPath::Still, steps).with_expectation(leaky_bottling_expectation)
}

fn navigation_review() -> SimulationPlan {
    let mut steps = vec![
        select(ProcessPath::Still),
        set(Parameter::CrushGranularity(95)),
    ];
    steps.extend(careful_preparation());
    steps.extend([
        Step::Refused(Command::NavigateTo {
            stage: Stage::Aging,
        }),
        Step::Refused(Command::NavigateTo {
            stage: Stage::Tirage,
        }),
        Step::Apply(Command::NavigateTo {
            stage: Stage::Preparation,
        }),
        Step::Refused(Command::Perform {
            action: Action::AddYeast,
        }),
        ADVANCE,
    ]);
    SimulationPlan::script(ProcessPath::Still, steps).with_expectation(navigation_expectation)
}

fn restart_mid_action() -> SimulationPlan {
    SimulationPlan::script(
        ProcessPath::Sparkling,
        vec![
            select(ProcessPath::Still),
            begin(TimedAction::Wash),
            Step::Apply(Command::Wait { ms: 1_000 }),
            Step::Apply(Command::Restart),
            select(ProcessPath::Sparkling),
            SETTLE,
            Step::Refused(Command::Begin {
                action: TimedAction::Crush,
            }),
        ],
    )
    .with_expectation(restart_expectation)
}

fn wall_clock() -> SimulationPlan {
    SimulationPlan::script(
        ProcessPath::Still,
        vec![
            select(ProcessPath::Still),
            begin(TimedAction::Wash),
            Step::WallClock { ms: 80 },
            begin(TimedAction::Crush),
            Step::WallClock { ms: 80 },
            perform(Action::AddYeast),
        ],
    )
    .with_tuning(quick_actions)
    .with_expectation(wall_clock_expectation)
}

fn quick_actions(config: &mut ProcessConfig) {
    config.actions.wash_ms = 20;
    config.actions.crush_ms = 20;
}

fn random_walk() -> SimulationPlan {
    SimulationPlan::random_walk(RANDOM_WALK_STEPS)
        .with_expectation(score_bounds_expectation)
        .with_expectation(score_monotonic_expectation)
        .with_expectation(log_consistency_expectation)
        .with_expectation(stage_on_path_expectation)
}

fn flawless_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.final_stage() == Stage::Results,
        "Run should finish at results, ended at {}",
        summary.final_stage()
    );
    ensure!(summary.score() == 100, "Expected 100, scored {}", summary.score());
    ensure!(
        summary.result.grade == QualityGrade::Premium,
        "Expected premium grade"
    );
    ensure!(summary.result.is_flawless(), "Log should be empty");
    let path = summary.path.map_or(&[] as &[Stage], ProcessPath::stages);
    ensure!(
        summary.reached == path,
        "Every stage of the path should be reached"
    );
    Ok(())
}

fn oak_profile_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.readings.aroma == AromaProfile::OakAged,
        "Four weeks in oak should give the oak profile, got {:?}",
        summary.readings.aroma
    );
    Ok(())
}

fn bouquet_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.readings.aroma == AromaProfile::HighClassBouquet,
        "Disgorged sparkling should show the full bouquet"
    );
    ensure!(summary.final_state.riddling_progress == 100, "Riddling incomplete");
    Ok(())
}

fn careless_preparation_expectation(summary: &SimulationSummary) -> Result<()> {
    let quality = &summary.final_state.quality;
    ensure!(quality.len() == 3, "Expected three remarks, got {}", quality.len());
    ensure!(quality.total_penalty() == 60, "Expected a 60 point penalty");
    ensure!(summary.score() == 40, "Expected 40, scored {}", summary.score());
    ensure!(
        summary.result.grade == QualityGrade::TechnicalReject,
        "40 points is a technical reject"
    );
    ensure!(summary.final_stage() == Stage::Fermentation, "Should sit in fermentation");
    Ok(())
}

fn hot_fermentation_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        has_defect(summary, Defect::TemperatureStress),
        "Hot tank should be flagged"
    );
    ensure!(summary.score() == 85, "Expected 85, scored {}", summary.score());
    ensure!(
        summary.final_state.fermentation_status == FermentationStatus::Done,
        "Fermentation should still complete"
    );
    ensure!(
        summary.readings.thermostat == ThermostatStatus::CriticalOverheat,
        "Thermostat should read overheat"
    );
    Ok(())
}

fn spoiled_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.final_state.fermentation_status == FermentationStatus::Spoiled,
        "Runaway tank should spoil"
    );
    ensure!(has_defect(summary, Defect::AceticSpoilage), "Spoilage not logged");
    ensure!(summary.score() == 25, "Expected 25, scored {}", summary.score());
    ensure!(
        summary.readings.aroma == AromaProfile::VinegarDefect,
        "Spoiled batch should smell of vinegar"
    );
    Ok(())
}

fn skipped_freezing_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        has_defect(summary, Defect::DisgorgedWithoutFreezing),
        "Missing freeze should be flagged"
    );
    ensure!(
        summary.reached.contains(&Stage::Disgorgement),
        "Disgorgement should still be reached"
    );
    ensure!(summary.score() == 60, "Expected 60, scored {}", summary.score());
    ensure!(summary.result.grade == QualityGrade::BulkMaterial, "Expected bulk grade");
    Ok(())
}

fn leaky_bottling_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(has_defect(summary, Defect::Oxidation), "Oxidation not logged");
    ensure!(summary.score() == 50, "Expected 50, scored {}", summary.score());
    ensure!(
        summary.readings.container == ContainerStatus::OxidationRisk,
        "Open line should show oxidation risk"
    );
    Ok(())
}

fn navigation_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.final_state.quality.len() == 2,
        "Preparation must be scored on both exits, log has {} entries",
        summary.final_state.quality.len()
    );
    ensure!(summary.score() == 70, "Expected 70, scored {}", summary.score());
    ensure!(summary.final_stage() == Stage::Fermentation, "Should be back in fermentation");
    Ok(())
}

fn restart_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.generation == 1, "Expected exactly one restart");
    ensure!(
        !summary.final_state.is_washed && !summary.final_state.is_washing,
        "Stale wash completion leaked across restart"
    );
    ensure!(summary.path == Some(ProcessPath::Sparkling), "New path not kept");
    ensure!(summary.score() == 100, "Fresh session should score 100");
    Ok(())
}

fn wall_clock_expectation(summary: &SimulationSummary) -> Result<()> {
    let state = &summary.final_state;
    ensure!(
        state.is_washed && state.is_crushed && state.is_yeast_added,
        "Wall-clock driver did not complete preparation"
    );
    Ok(())
}

fn score_bounds_expectation(summary: &SimulationSummary) -> Result<()> {
    for sample in &summary.samples {
        ensure!(sample.score <= 100, "Score {} out of range", sample.score);
    }
    Ok(())
}

fn score_monotonic_expectation(summary: &SimulationSummary) -> Result<()> {
    for pair in summary.samples.windows(2) {
        if pair[0].generation == pair[1].generation {
            ensure!(
                pair[1].score <= pair[0].score,
                "Score rose from {} to {} at {}",
                pair[0].score,
                pair[1].score,
                pair[1].stage
            );
        }
    }
    Ok(())
}

fn log_consistency_expectation(summary: &SimulationSummary) -> Result<()> {
    let quality = &summary.final_state.quality;
    let expected = 100_u32.saturating_sub(quality.total_penalty());
    ensure!(
        quality.final_score() == expected,
        "Score {} does not match log total {}",
        quality.final_score(),
        quality.total_penalty()
    );
    for entry in quality.entries() {
        ensure!(
            entry.penalty == entry.defect.penalty() && entry.message == entry.defect.message(),
            "{} logged a mismatched {} entry",
            entry.stage,
            entry.defect.key()
        );
    }
    Ok(())
}

fn stage_on_path_expectation(summary: &SimulationSummary) -> Result<()> {
    let stage = summary.final_stage();
    match summary.path {
        None => {
            ensure!(stage == Stage::ModeSelection, "No path but stage {stage}");
        }
        Some(path) => {
            ensure!(path.contains(stage), "{stage} is not on the {path} path");
        }
    }
    Ok(())
}

fn has_defect(summary: &SimulationSummary, defect: Defect) -> bool {
    summary
        .final_state
        .quality
        .entries()
        .iter()
        .any(|entry| entry.defect == defect)
}
