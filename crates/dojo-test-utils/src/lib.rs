//! Testing utilities for the Review Dojo workspace
//!
//! Shared fixtures, catalogs and assertions.

#![allow(missing_docs)]

use dojo_core::{Catalog, EngineConfig, Mission, MissionId};

/// Mission from the worked example: replace destructive sort/reverse
pub fn destructive_sort_mission(id: u32) -> Mission {
    Mission::new(
        id,
        "Remove destructive methods",
        "def f(d); d.sort!; d.reverse!; end",
        "def f(d)\n  d.sort.reverse\nend",
    )
    .with_keywords(["sort.reverse"])
    .with_remove_keywords(["sort!", "reverse!"])
}

/// Mission `id` whose keyword rule requires `fixed_{id}` and forbids `broken_{id}`
pub fn keyword_mission(id: u32) -> Mission {
    Mission::new(
        id,
        format!("Mission {id}"),
        format!("value = broken_{id}()"),
        format!("value = fixed_{id}()"),
    )
    .with_keywords([format!("fixed_{id}")])
    .with_remove_keywords([format!("broken_{id}")])
}

/// Accepted answer for [`keyword_mission`]
pub fn keyword_answer(id: u32) -> String {
    format!("value = fixed_{id}() # done")
}

/// Catalog of `n` missions; mission 1 is [`destructive_sort_mission`]
pub fn create_test_catalog(n: u32) -> Catalog {
    assert!(n >= 1, "catalog needs at least one mission");
    let missions = (1..=n)
        .map(|id| {
            if id == 1 {
                destructive_sort_mission(1)
            } else {
                keyword_mission(id)
            }
        })
        .collect();
    Catalog::from_missions(missions).expect("test catalog is valid")
}

/// Configuration with pacing disabled
pub fn instant_config() -> EngineConfig {
    EngineConfig::new().with_feedback_delay(std::time::Duration::ZERO)
}

/// Correct answer for any mission of [`create_test_catalog`]
pub fn answer_for(id: MissionId) -> String {
    if id == MissionId(1) {
        "def f(d); d.sort.reverse; end".to_string()
    } else {
        keyword_answer(id.0)
    }
}
