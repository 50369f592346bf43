//! The merged machine set built from whole grammars: entry points per
//! resolved language, recognition through the shared minimized graph,
//! and the state sharing that merging before minimizing buys.

use super::support::{grammar, word};
use crate::atomic::LanguageId;
use crate::automata::{Dfa, FiniteAutomaton, MinimizedDfa};
use crate::machines::AtomicLanguageMachines;

fn id(base: char, prefix: char) -> LanguageId<char> {
    LanguageId::new(base, prefix)
}

#[test]
fn bracket_grammar_machines_recognize_their_continuations() {
    let g = grammar(
        "S → ○
         S → S○
         S → S◁S▷",
    );
    let languages = g.atomic_languages();
    let machines = AtomicLanguageMachines::new(&languages);

    // S⁽○⁾ = (○|◁S▷)*
    let s = &machines[&id('S', '○')];
    assert!(s.recognizes(&word("")));
    assert!(s.recognizes(&word("○")));
    assert!(s.recognizes(&word("◁S▷")));
    assert!(s.recognizes(&word("○◁S▷○")));
    assert!(!s.recognizes(&word("◁")));
    assert!(!s.recognizes(&word("▷")));

    // Terminal self-languages accept exactly the empty continuation.
    let circle = &machines[&id('○', '○')];
    assert!(circle.recognizes(&word("")));
    assert!(!circle.recognizes(&word("○")));

    assert!(machines.machine(&id('S', '◁')).is_none());
}

#[test]
fn every_resolved_language_has_a_machine() {
    let g = grammar("S = ()|a|Sa|SbSc");
    let languages = g.atomic_languages();
    let machines = AtomicLanguageMachines::new(&languages);
    for (id, language) in &languages {
        let machine = machines
            .machine(id)
            .unwrap_or_else(|| panic!("no machine for {id}"));
        // The sliced machine and the language's own minimized DFA accept
        // the same short words.
        let reference = MinimizedDfa::new(language.dfa());
        for w in [word(""), word("a"), word("bc"), word("bac"), word("cc")] {
            assert_eq!(
                machine.recognizes(&w),
                reference.recognizes(&w),
                "{id} disagrees on {w:?}"
            );
        }
    }
}

#[test]
fn merging_before_minimizing_shares_suffix_states() {
    let g = grammar(
        "A →Ba
         A →a
         B →Ca
         B →b
         C →Aa
         C →c",
    );
    let languages = g.atomic_languages();
    let machines = AtomicLanguageMachines::new(&languages);

    let merged_states = machines.merged_dfa().states().len();
    let independent_states: usize = languages
        .values()
        .map(|l| MinimizedDfa::new(l.dfa()).states().len())
        .sum();
    // One shared start plus the shared subgraphs can never exceed the
    // disjoint union of the independently minimized machines.
    assert!(
        merged_states <= independent_states + 1,
        "merged machine has {merged_states} states, disjoint union {independent_states}"
    );
}

#[test]
fn dot_rendering_lists_entries_and_transitions() {
    let g = grammar("S → ○; S → S○");
    let machines = AtomicLanguageMachines::new(&g.atomic_languages());
    let dot = machines.to_string();
    assert!(dot.starts_with("digraph \"Atomic Languages\""));
    assert!(dot.contains("\"S⁽○⁾\" [shape=none]"));
    assert!(dot.contains("doublecircle"));
    assert!(dot.ends_with("}\n"));
}
