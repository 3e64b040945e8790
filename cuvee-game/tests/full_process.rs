use cuvee_game::analytics::{AromaProfile, Clarity, PanelReadings};
use cuvee_game::{
    Action, FermentationStatus, Parameter, ProcessPath, ProcessSession, QualityGrade, Stage,
    TimedAction,
};
use std::time::Duration;

const PATIENCE: Duration = Duration::from_secs(120);

fn careful_preparation(session: &mut ProcessSession) {
    session.begin_timed_action(TimedAction::Wash).unwrap();
    session.run_until_idle(PATIENCE);
    session.begin_timed_action(TimedAction::Crush).unwrap();
    session.run_until_idle(PATIENCE);
    session.perform(Action::AddYeast).unwrap();
    assert!(session.is_stage_complete());
    assert_eq!(session.advance(), Ok(Stage::Fermentation));
}

fn clean_fermentation(session: &mut ProcessSession) {
    session.perform(Action::StartFermentation).unwrap();
    session.run_until_idle(PATIENCE);
    assert_eq!(session.state().fermentation_status, FermentationStatus::Done);
    assert_eq!(session.advance(), Ok(Stage::Filtration));
}

fn clean_filtration(session: &mut ProcessSession) {
    session.begin_timed_action(TimedAction::Press).unwrap();
    session.run_until_idle(PATIENCE);
    assert_eq!(session.state().press_fill, 80);
    session.begin_timed_action(TimedAction::Filter).unwrap();
    session.run_until_idle(PATIENCE);
    assert!(session.state().is_filtered);
}

#[test]
fn careful_still_run_scores_full_marks() {
    let mut session = ProcessSession::default();
    session.select_path(ProcessPath::Still).unwrap();
    careful_preparation(&mut session);
    clean_fermentation(&mut session);
    clean_filtration(&mut session);
    assert_eq!(session.advance(), Ok(Stage::Aging));

    session.set_parameter(Parameter::AgingWeeks(4));
    let readings = PanelReadings::from_state(session.state());
    assert_eq!(readings.clarity, Clarity::CrystalClear);
    assert_eq!(readings.aroma, AromaProfile::OakAged);

    assert_eq!(session.advance(), Ok(Stage::Bottling));
    session.perform(Action::RunBottlingLine).unwrap();
    assert_eq!(session.advance(), Ok(Stage::Results));

    let summary = session.summary();
    assert_eq!(summary.score, 100);
    assert_eq!(summary.grade, QualityGrade::Premium);
    assert!(summary.is_flawless());
    assert_eq!(session.reached_stages(), ProcessPath::Still.stages());
    assert_eq!(session.pending_tasks(), 0);
}

#[test]
fn careful_sparkling_run_scores_full_marks() {
    let mut session = ProcessSession::default();
    session.select_path(ProcessPath::Sparkling).unwrap();
    careful_preparation(&mut session);
    clean_fermentation(&mut session);
    clean_filtration(&mut session);

    assert_eq!(session.advance(), Ok(Stage::Tirage));
    session.perform(Action::FillTirage).unwrap();
    assert_eq!(session.advance(), Ok(Stage::Riddling));
    while !session.is_stage_complete() {
        session.perform(Action::RiddleTurn).unwrap();
    }
    assert_eq!(session.state().riddling_progress, 100);
    assert_eq!(session.advance(), Ok(Stage::Freezing));
    session.perform(Action::FreezeNeck).unwrap();
    assert_eq!(session.advance(), Ok(Stage::Disgorgement));
    session.perform(Action::Disgorge).unwrap();
    assert_eq!(
        PanelReadings::from_state(session.state()).aroma,
        AromaProfile::HighClassBouquet
    );
    assert_eq!(session.advance(), Ok(Stage::Results));

    assert_eq!(session.final_score(), 100);
    assert!(session.state().quality.is_empty());
}

#[test]
fn paths_never_share_finishing_stages() {
    let still = ProcessPath::Still.stages();
    let sparkling = ProcessPath::Sparkling.stages();
    for stage in [Stage::Tirage, Stage::Riddling, Stage::Freezing, Stage::Disgorgement] {
        assert!(!still.contains(&stage));
        assert!(sparkling.contains(&stage));
    }
    for stage in [Stage::Aging, Stage::Bottling] {
        assert!(still.contains(&stage));
        assert!(!sparkling.contains(&stage));
    }
    assert_eq!(still.last(), Some(&Stage::Results));
    assert_eq!(sparkling.last(), Some(&Stage::Results));
}

#[test]
fn state_snapshot_serializes_for_the_view() {
    let mut session = ProcessSession::default();
    session.select_path(ProcessPath::Sparkling).unwrap();
    session.advance().unwrap();
    let json = serde_json::to_value(session.state()).unwrap();
    assert_eq!(json["current_stage"], "fermentation");
    assert_eq!(json["path"], "sparkling");
    assert_eq!(json["is_hermetic"], true);
}
