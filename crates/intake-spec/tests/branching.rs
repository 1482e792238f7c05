mod support;

use intake_spec::{
    Branch, Operator, active_branch_ids, get_active_branches, relevant_groups, triggered_branch,
};
use serde_json::json;
use support::{builtin, state};

#[test]
fn survival_surgery_activates_surgery_branch() {
    let catalogue = builtin();
    let answers = state(json!({
        "procedure_types": ["survival_surgery", "behavioral_testing"]
    }))
    .answers;
    let ids = active_branch_ids(&catalogue, &answers);
    assert!(ids.contains(&"surgery_branch".to_string()));
    assert!(ids.contains(&"behavior_branch".to_string()));
    assert_eq!(ids[0], "surgery_branch");
}

#[test]
fn pain_category_e_activates_justification_branch() {
    let catalogue = builtin();
    let answers = state(json!({ "pain_category": "E" })).answers;
    let ids = active_branch_ids(&catalogue, &answers);
    assert_eq!(ids, vec!["category_e_branch"]);
}

#[test]
fn usda_branch_depends_on_species() {
    let catalogue = builtin();
    let rabbit = active_branch_ids(&catalogue, &state(json!({ "species": "rabbit" })).answers);
    assert!(rabbit.contains(&"usda_covered_branch".to_string()));

    let mouse = active_branch_ids(&catalogue, &state(json!({ "species": "mouse" })).answers);
    assert!(!mouse.contains(&"usda_covered_branch".to_string()));
    assert!(mouse.contains(&"mouse_branch".to_string()));
}

#[test]
fn no_answers_means_no_branches() {
    let catalogue = builtin();
    assert!(get_active_branches(&catalogue, &state(json!({})).answers).is_empty());
}

#[test]
fn active_branches_are_sorted_by_priority_then_declaration() {
    let catalogue = builtin();
    let answers = state(json!({
        "species": "mouse",
        "animal_source": "wild_caught",
        "pain_category": "D",
        "procedure_types": [
            "breeding",
            "injections",
            "blood_collection",
            "imaging",
            "behavioral_testing",
            "tumor_implantation",
            "survival_surgery"
        ]
    }))
    .answers;
    let active: Vec<&Branch> = get_active_branches(&catalogue, &answers);

    for pair in active.windows(2) {
        assert!(pair[0].priority >= pair[1].priority);
    }

    let ids: Vec<&str> = active.iter().map(|branch| branch.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "pain_management_branch",
            "surgery_branch",
            "tumor_branch",
            "injection_branch",
            "blood_branch",
            "behavior_branch",
            "imaging_branch",
            "breeding_branch",
            "wildlife_branch",
            "mouse_branch",
        ]
    );
}

#[test]
fn malformed_answers_do_not_activate_anything() {
    let catalogue = builtin();
    let answers = state(json!({
        "species": ["rabbit"],
        "procedure_types": "survival_surgery",
        "pain_category": { "value": "E" }
    }))
    .answers;
    assert!(active_branch_ids(&catalogue, &answers).is_empty());
}

#[test]
fn branch_groups_join_base_groups_in_catalogue_order() {
    let catalogue = builtin();
    let answers = state(json!({ "pain_category": "E", "species": "rabbit" })).answers;
    let ids: Vec<&str> = relevant_groups(&catalogue, &answers)
        .iter()
        .map(|entry| entry.group.id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![
            "basic_info",
            "species",
            "procedures",
            "category_e_branch",
            "usda_covered_branch"
        ]
    );
}

#[test]
fn option_triggers_match_branch_conditions() {
    let catalogue = builtin();
    let species = catalogue.question("species").expect("species question");
    let rabbit = species.option("rabbit").expect("rabbit option");
    assert_eq!(triggered_branch(rabbit), Some("usda_covered_branch"));
    let other = species.option("other").expect("other option");
    assert_eq!(triggered_branch(other), None);

    for option in &species.options {
        let Some(branch_id) = triggered_branch(option) else {
            continue;
        };
        let answers = state(json!({ "species": option.value })).answers;
        assert!(
            active_branch_ids(&catalogue, &answers).contains(&branch_id.to_string()),
            "option {} should activate {}",
            option.value,
            branch_id
        );
    }
}

#[test]
fn ne_and_not_in_fail_closed_on_missing_answers() {
    use intake_spec::{BranchCondition, evaluate};

    let answers = state(json!({})).answers;
    let ne = BranchCondition::new("species", Operator::Ne, "mouse".into());
    let not_in = BranchCondition::new("species", Operator::NotIn, vec!["mouse", "rat"].into());
    assert!(!evaluate(&ne, &answers));
    assert!(!evaluate(&not_in, &answers));
}
