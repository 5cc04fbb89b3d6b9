//! End-to-end scenarios through the public tree API.

use story_branching::{
    BranchDraft, BranchError, BranchId, BranchTree, CollapseTrigger, Constraint, DecisionContext, DivergenceKind, ExplorationQueue,
    FixedDraw, GeneratorEnv, GeneratorKind, RngSource, ScoreComponents, StructureContext, ThemeContext,
    ThemeRegistry, TreeConfig, TriggerContext, TriggerScope, TriggerType, IRREVERSIBLE_CHOICE,
};
use story_rules::{CharacterId, InitialContext, ProfileCatalog, StoryPosition};

const PROFILES: &str = r#"
[[characters]]
name = "Nora"
background = "a wife who has lived as a doll in her husband's house"
fears = ["exposure of the forged signature"]
desires = ["freedom", "self-respect"]
values = ["honesty"]
relationships = ["Torvald", "the children"]
emotion = { emotion = "fear", intensity = 0.7 }
"#;

fn tree(max_active: usize) -> BranchTree {
    let config = TreeConfig {
        max_active,
        ..TreeConfig::default()
    };
    let context = InitialContext::new("a Norwegian parlour", "freedom vs duty").with_participant("Nora");
    BranchTree::create_root(&context, config).unwrap()
}

fn children(tree: &BranchTree, scores: &[ScoreComponents]) -> Vec<BranchDraft> {
    let tip = tree.tip();
    scores
        .iter()
        .enumerate()
        .map(|(i, s)| {
            BranchDraft::child_of(tip, DivergenceKind::DramaticStructure, format!("weighted option {i}"))
                .with_scores(*s)
        })
        .collect()
}

/// Consistent enough to pass the default filter; quality rises with `q`.
fn steady(q: f64) -> ScoreComponents {
    ScoreComponents::new(1.0, q, q, q)
}

#[test]
fn weighted_draw_uses_cumulative_ranges() {
    let mut tree = tree(5);
    let root = tree.tip().id;
    // Scores 0.72, 0.36 and 0.12 normalize to 0.6, 0.3 and 0.1.
    let scores = [
        ScoreComponents::new(1.0, 1.0, 0.1, 0.0),
        ScoreComponents::new(0.9, 0.0, 0.0, 0.0),
        ScoreComponents::new(0.3, 0.0, 0.0, 0.0),
    ];
    let drafts = children(&tree, &scores);
    let outcome = tree.admit(root, drafts).unwrap();
    let [a, b, c] = outcome.admitted[..] else {
        panic!("expected three branches");
    };
    assert!(a < b && b < c);

    let weights: Vec<f64> = tree.active_branches().values().map(|b| b.selection_weight).collect();
    assert!((weights[0] - 0.6).abs() < 1e-9);
    assert!((weights[1] - 0.3).abs() < 1e-9);
    assert!((weights[2] - 0.1).abs() < 1e-9);

    let selected = tree
        .collapse(CollapseTrigger::forced("scenario"), &mut FixedDraw::new(0.5))
        .unwrap();
    assert_eq!(selected, a);
}

#[test]
fn two_generator_calls_overflow_by_one() {
    let mut tree = tree(3);
    let root = tree.tip().id;

    let first = tree.admit(root, children(&tree, &[steady(0.7), steady(0.4)])).unwrap();
    let second = tree.admit(root, children(&tree, &[steady(0.9), steady(0.2)])).unwrap();

    assert_eq!(tree.active_branches().len(), 3);
    assert_eq!(first.admitted, vec![BranchId(1), BranchId(2)]);
    // The last draft is the lightest of the four.
    assert_eq!(second.pruned, vec![BranchId(4)]);
    assert_eq!(second.admitted, vec![BranchId(3)]);
    assert!(tree.active_branch(BranchId(4)).is_none());
}

#[test]
fn irreversible_choice_fires_character_commitment() {
    let tree = tree(5);
    let context = TriggerContext::new().with(IRREVERSIBLE_CHOICE, true);
    let trigger = tree.evaluate_trigger(&context).unwrap();
    assert_eq!(trigger.trigger_type, TriggerType::CharacterCommitment);
    assert_eq!(trigger.trigger_type.as_str(), "character_commitment");
    assert_eq!(trigger.urgency, 0.9);
    assert_eq!(trigger.scope, TriggerScope::Scene);
    assert_eq!(trigger.scope.as_str(), "scene");
}

#[test]
fn collapse_on_empty_tree_is_rejected() {
    let mut tree = tree(5);
    let before = tree.committed_path().to_vec();
    let err = tree
        .collapse(CollapseTrigger::forced("empty"), &mut FixedDraw::new(0.5))
        .unwrap_err();
    assert!(matches!(err, BranchError::CollapseOnEmptyTree));
    assert_eq!(tree.committed_path(), before.as_slice());
}

#[test]
fn full_decision_cycle() {
    let profiles = ProfileCatalog::from_toml_str(PROFILES).unwrap();
    let themes = ThemeRegistry::new();
    let env = GeneratorEnv::new(&profiles, &themes);
    let mut tree = tree(4);
    let mut rng = RngSource::seeded(7);
    let nora = CharacterId::from_name("Nora");

    let root = tree.tip().id;
    let decision = GeneratorKind::Decision(DecisionContext::new(
        nora.clone(),
        "must choose between leaving the house and keeping her secret",
    ));
    let outcome = tree.evolve(root, &decision, &env).unwrap();
    assert!(!outcome.admitted.is_empty());
    assert!(tree.active_branches().len() <= 4);

    let theme = GeneratorKind::Theme(ThemeContext::new("freedom vs duty"));
    tree.evolve(root, &theme, &env).unwrap();
    assert!(tree.active_branches().len() <= 4);

    tree.apply_constraint(&Constraint::artistic_vision(|b| b.kind != DivergenceKind::NeutralContinuation))
        .unwrap();

    let first = tree
        .collapse(CollapseTrigger::forced("director"), &mut rng)
        .unwrap();
    assert_eq!(tree.committed_path(), &[root, first]);

    let position = StoryPosition::new(2, 3, 3, 4).unwrap();
    let structure = GeneratorKind::Structure(StructureContext::from_story_position(&position));
    let mut queue = ExplorationQueue::from_tip(&tree);
    queue.run(&mut tree, &env, |_| Some(structure.clone())).unwrap();
    assert!(tree.active_branches().len() <= 4);
    assert!(tree.frontier_depth() <= tree.max_depth());

    let context = TriggerContext::from_story_position(&position);
    let fired = tree.evaluate_trigger(&context);
    let trigger = fired.unwrap_or_else(|| CollapseTrigger::forced("end of scene"));
    let second = tree.collapse(trigger, &mut rng).unwrap();

    let path = tree.committed_path();
    assert_eq!(path.len(), 3);
    assert_eq!(path[2], second);
    assert_eq!(tree.collapse_history().len(), 2);
    // Whatever was drawn descends from the first commitment.
    assert!(tree.get(second).unwrap().generation > tree.get(first).unwrap().generation);
    assert!(tree.active_branches().values().all(|b| b.generation > tree.tip().generation));
}

#[test]
fn time_pressure_stops_deeper_evolution() {
    let profiles = ProfileCatalog::new();
    let themes = ThemeRegistry::new();
    let env = GeneratorEnv::new(&profiles, &themes);
    let mut tree = tree(5);
    let root = tree.tip().id;

    let theme = GeneratorKind::Theme(ThemeContext::new("order vs chaos"));
    let outcome = tree.evolve(root, &theme, &env).unwrap();
    tree.apply_constraint(&Constraint::time_pressure(1)).unwrap();

    let child: BranchId = outcome.admitted[0];
    let err = tree.evolve(child, &theme, &env).unwrap_err();
    assert!(matches!(err, BranchError::DepthBudgetExhausted { max_depth: 1, .. }));
}
