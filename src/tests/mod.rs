//! Integration tests spanning the full pipeline, plus the char-level
//! token helpers they share.

mod support;

mod automata_tests;
mod elimination_tests;
mod machine_tests;
