#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use bristlecone_fuzz_utils::{CommandSequence, RunnerState};
use libfuzzer_sys::fuzz_target;

/// Integer in `0..8`, so that there are lots of duplicates to sort
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SmallInt(u8);

impl<'d> Arbitrary<'d> for SmallInt {
    fn arbitrary(u: &mut Unstructured<'d>) -> arbitrary::Result<Self> {
        Ok(SmallInt(u.int_in_range(0_u8..=7)?))
    }
}

fuzz_target!(|cmds: CommandSequence<SmallInt>| {
    let cmds = cmds.map(|x| x.0);

    let mut runner: RunnerState<u8> = RunnerState::init();
    for c in &cmds.cmds {
        runner.run_cmd(c);
    }
    runner.finish();
});
