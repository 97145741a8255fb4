#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use bristlecone_fuzz_utils::{CommandSequence, RunnerState};
use libfuzzer_sys::fuzz_target;
use std::fmt::{self, Debug, Formatter};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct UpperLetter(char);

// Forward the Debug implementation to the inner `char` so that printing the fuzz input can be more
// easily replicated.
impl Debug for UpperLetter {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'d> Arbitrary<'d> for UpperLetter {
    fn arbitrary(u: &mut Unstructured<'d>) -> arbitrary::Result<Self> {
        Ok(UpperLetter((b'A' + u.int_in_range(0_u8..=25)?) as char))
    }
}

fuzz_target!(|cmds: CommandSequence<UpperLetter>| {
    let cmds = cmds.map(|c| c.0);

    let mut runner: RunnerState<char> = RunnerState::init();
    for c in &cmds.cmds {
        runner.run_cmd(c);
    }
    runner.finish();
});
