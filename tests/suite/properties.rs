//! Invariants of the violation machine across mixed event sequences.

use serena_guard_core::{Disposition, GuardAction};

use crate::common::{FIND_SYMBOL, Fixture, at};

#[test]
fn count_equals_generic_events_since_last_reset() {
    let fx = Fixture::new();
    let mut expected = 0;
    let mut clock = 0;

    // g = generic, a = allow-listed, s = specialized
    for step in "gggagsggaggsg".chars() {
        clock += 7;
        match step {
            'g' => {
                fx.hooks.guard(&fx.generic("Read"), at(clock));
                // Escalation stops once any specialized tool is on record.
                if fx.state().mcp_tools_used().is_empty() {
                    expected += 1;
                }
            }
            'a' => {
                fx.hooks.guard(&fx.bash("echo checkpoint"), at(clock));
            }
            's' => {
                fx.hooks.track(&fx.specialized(FIND_SYMBOL));
                expected = 0;
            }
            _ => unreachable!(),
        }
        assert_eq!(fx.state().violation_count(), expected, "after step {step}");
    }
}

#[test]
fn allowed_events_never_change_existing_state() {
    let fx = Fixture::new();
    fx.hooks.guard(&fx.generic("Read"), at(0));
    fx.hooks.guard(&fx.generic("Grep"), at(1));
    let before = fx.state();

    for command in ["git diff", "cargo test", "which serena", "ECHO done", "listMcpResources"] {
        let report = fx.hooks.guard(&fx.bash(command), at(2));
        assert_eq!(report.disposition, Disposition::Allowed, "{command}");
    }

    assert_eq!(fx.state(), before);
}

#[test]
fn specialized_event_always_zeroes_the_count() {
    for generic_events in [0_i64, 1, 3, 9] {
        let fx = Fixture::new();
        for i in 0..generic_events {
            fx.hooks.guard(&fx.generic("Bash"), at(i));
        }
        fx.hooks.track(&fx.specialized("mcp__serena-daemon__get_symbols_overview"));
        assert_eq!(fx.state().violation_count(), 0);
    }
}

#[test]
fn rendered_warnings_are_at_least_one_cooldown_apart() {
    let fx = Fixture::new();
    let mut rendered = Vec::new();

    for secs in (0..300).step_by(13) {
        let report = fx.hooks.guard(&fx.generic("Read"), at(secs));
        if matches!(report.disposition, Disposition::Guarded(GuardAction::Warn(_))) {
            assert_eq!(report.messages.len(), 1);
            rendered.push(secs);
        } else {
            assert!(report.messages.is_empty());
        }
    }

    assert!(rendered.len() > 1);
    for pair in rendered.windows(2) {
        assert!(pair[1] - pair[0] >= 60, "warnings at {pair:?}");
    }
    assert_eq!(fx.state().last_warning_at(), rendered.last().map(|s| at(*s)));
}

#[test]
fn tool_sets_never_shrink() {
    let fx = Fixture::new();
    let mut last_generic = 0;
    let mut last_mcp = 0;

    let steps: [(&str, bool); 6] = [
        ("Read", false),
        (FIND_SYMBOL, true),
        ("Grep", false),
        ("Read", false),
        ("mcp__serena-daemon__search_for_pattern", true),
        (FIND_SYMBOL, true),
    ];
    for (i, (tool, specialized)) in (0_i64..).zip(steps) {
        if specialized {
            fx.hooks.track(&fx.specialized(tool));
        } else {
            fx.hooks.guard(&fx.generic(tool), at(i));
        }
        let state = fx.state();
        assert!(state.generic_tools_used().len() >= last_generic);
        assert!(state.mcp_tools_used().len() >= last_mcp);
        last_generic = state.generic_tools_used().len();
        last_mcp = state.mcp_tools_used().len();
    }
    assert_eq!((last_generic, last_mcp), (2, 2));
}
