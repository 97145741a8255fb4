use arbitrary::{Arbitrary, Unstructured};
use bristlecone::Vector;
use std::fmt::{self, Debug, Display, Formatter};

const VARIANTS: u8 = 12;

/// Largest number of values produced for a single `InsertRange`
const MAX_RANGE_LEN: usize = 40;

/// A single operation on one of the [`Vector`]s, together with its expected result
///
/// The expected results are computed while generating the command, by running it against a plain
/// `Vec` that stands in for each tree.
#[derive(Clone)]
pub enum Command<T> {
    Iter {
        id: TreeId,
        start: usize,
        end: usize,
        /// Access pattern for the iterator, only if the range is valid
        access: Option<Vec<(IterDirection, Option<T>)>>,
    },
    Get {
        id: TreeId,
        index: usize,
        expected: Option<T>,
    },
    Insert {
        id: TreeId,
        index: usize,
        value: T,
        ok: bool,
    },
    InsertRange {
        id: TreeId,
        index: usize,
        values: Vec<T>,
        ok: bool,
    },
    RemoveAt {
        id: TreeId,
        index: usize,
        /// The removed value, if the index is in bounds
        removed: Option<T>,
    },
    RemoveRange {
        id: TreeId,
        start: usize,
        end: usize,
        ok: bool,
    },
    Set {
        id: TreeId,
        index: usize,
        value: T,
        ok: bool,
    },
    Sort {
        id: TreeId,
    },
    Reverse {
        id: TreeId,
        start: usize,
        end: usize,
        ok: bool,
    },
    TrimExcess {
        id: TreeId,
    },
    ShallowClone {
        src_id: TreeId,
        new_id: TreeId,
    },
    DropTree {
        id: TreeId,
    },
}

#[derive(Debug, Copy, Clone, Arbitrary)]
pub struct TreeId(usize);

impl Display for TreeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Copy, Clone, Arbitrary)]
pub enum IterDirection {
    Forward,
    Backward,
}

/// Sequence of [`Command`]s
pub struct CommandSequence<T> {
    pub cmds: Vec<Command<T>>,
}

impl<T: Debug> Debug for CommandSequence<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let init_id = TreeId(0);
        f.write_str("#[test]\n")?;
        f.write_str("fn test_case() {\n")?;
        writeln!(f, "    let mut tree_{init_id} = Vector::new();")?;
        for c in &self.cmds {
            c.fmt(f)?;
        }
        f.write_str("}")
    }
}

/// Formats the success or failure of a fallible call as a suffix for the generated test
fn outcome(ok: bool) -> &'static str {
    match ok {
        true => ".unwrap()",
        false => ".unwrap_err()",
    }
}

impl<T: Debug> Debug for Command<T> {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Iter { id, start, end, access } => {
                let call = format!("tree_{id}.iter_range({start}..{end})");
                let Some(access) = access else {
                    return writeln!(f, "    assert!({call}.is_err());");
                };

                f.write_str("    {\n")?;
                let maybe_mut = match access.is_empty() {
                    true => "_", // add an underscore to mark `iter` as unused
                    false => "mut ",
                };
                writeln!(f, "        let {maybe_mut}iter = {call}.unwrap();")?;
                for (dir, expected) in access {
                    let method = match dir {
                        IterDirection::Forward => "next",
                        IterDirection::Backward => "next_back",
                    };
                    match expected {
                        None => writeln!(f, "        assert!(iter.{method}().is_none());")?,
                        Some(v) => {
                            writeln!(f, "        assert_eq!(iter.{method}(), Some(&{v:?}));")?
                        }
                    }
                }
                f.write_str("    }\n")
            }
            Self::Get { id, index, expected } => match expected {
                Some(v) => writeln!(f, "    assert_eq!(tree_{id}.get({index}), Some(&{v:?}));"),
                None => writeln!(f, "    assert!(tree_{id}.get({index}).is_none());"),
            },
            Self::Insert { id, index, value, ok } => writeln!(
                f,
                "    tree_{id} = tree_{id}.insert({index}, {value:?}){};",
                outcome(*ok),
            ),
            Self::InsertRange { id, index, values, ok } => writeln!(
                f,
                "    tree_{id} = tree_{id}.insert_range({index}, {values:?}){};",
                outcome(*ok),
            ),
            Self::RemoveAt { id, index, removed } => writeln!(
                f,
                "    tree_{id} = tree_{id}.remove_at({index}){}; // {removed:?}",
                outcome(removed.is_some()),
            ),
            Self::RemoveRange { id, start, end, ok } => writeln!(
                f,
                "    tree_{id} = tree_{id}.remove_range({start}..{end}){};",
                outcome(*ok),
            ),
            Self::Set { id, index, value, ok } => writeln!(
                f,
                "    tree_{id} = tree_{id}.set({index}, {value:?}){};",
                outcome(*ok),
            ),
            Self::Sort { id } => writeln!(f, "    tree_{id} = tree_{id}.sort();"),
            Self::Reverse { id, start, end, ok } => writeln!(
                f,
                "    tree_{id} = tree_{id}.reverse_range({start}..{end}){};",
                outcome(*ok),
            ),
            Self::TrimExcess { id } => writeln!(f, "    tree_{id} = tree_{id}.trim_excess();"),
            Self::ShallowClone { src_id, new_id } => {
                writeln!(f, "    let mut tree_{new_id} = tree_{src_id}.clone();")
            }
            Self::DropTree { id } => writeln!(f, "    drop(tree_{id});"),
        }
    }
}

impl<T> CommandSequence<T> {
    /// Converts the values in every command
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> CommandSequence<U> {
        CommandSequence {
            cmds: self.cmds.into_iter().map(|c| c.map(&mut f)).collect(),
        }
    }
}

impl<T> Command<T> {
    /// Converts the values in the command
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> Command<U> {
        match self {
            Self::Iter { id, start, end, access } => Command::Iter {
                id,
                start,
                end,
                access: access.map(|a| a.into_iter().map(|(d, v)| (d, v.map(&mut f))).collect()),
            },
            Self::Get {
                id,
                index,
                expected,
            } => Command::Get {
                id,
                index,
                expected: expected.map(f),
            },
            Self::Insert {
                id,
                index,
                value,
                ok,
            } => Command::Insert {
                id,
                index,
                value: f(value),
                ok,
            },
            Self::InsertRange {
                id,
                index,
                values,
                ok,
            } => Command::InsertRange {
                id,
                index,
                values: values.into_iter().map(f).collect(),
                ok,
            },
            Self::RemoveAt { id, index, removed } => Command::RemoveAt {
                id,
                index,
                removed: removed.map(f),
            },
            Self::RemoveRange { id, start, end, ok } => Command::RemoveRange { id, start, end, ok },
            Self::Set {
                id,
                index,
                value,
                ok,
            } => Command::Set {
                id,
                index,
                value: f(value),
                ok,
            },
            Self::Sort { id } => Command::Sort { id },
            Self::Reverse { id, start, end, ok } => Command::Reverse { id, start, end, ok },
            Self::TrimExcess { id } => Command::TrimExcess { id },
            Self::ShallowClone { src_id, new_id } => Command::ShallowClone { src_id, new_id },
            Self::DropTree { id } => Command::DropTree { id },
        }
    }
}

impl<'d, T: Arbitrary<'d> + Clone + Ord> Arbitrary<'d> for CommandSequence<T> {
    fn arbitrary(u: &mut Unstructured<'d>) -> arbitrary::Result<Self> {
        let mut cmds = Vec::new();

        let mut models: Vec<Option<Vec<T>>> = vec![Some(Vec::new())];
        let mut num_trees = 1;

        while !u.is_empty() && num_trees != 0 {
            let id = TreeId(choose_sparse_index(u, num_trees, &models)?);
            let variant = u.int_in_range(0..=VARIANTS - 1)?;
            cmds.push(Command::arbitrary(u, variant, id, &mut num_trees, &mut models)?);
        }

        Ok(CommandSequence { cmds })
    }
}

fn choose_sparse_index<T>(
    u: &mut Unstructured,
    count: usize,
    vals: &[Option<T>],
) -> arbitrary::Result<usize> {
    let mut idx = u.choose_index(count)?;
    let mut i = 0;
    while i <= idx {
        if vals[i].is_none() {
            idx += 1;
        }
        i += 1;
    }
    Ok(idx)
}

/// Picks a range that's usually, but not always, within `0..len`
fn arbitrary_range(u: &mut Unstructured, len: usize) -> arbitrary::Result<(usize, usize, bool)> {
    let start = u.int_in_range(0..=len + 1)?;
    let end = u.int_in_range(0..=len + 1)?;
    Ok((start, end, start <= end && end <= len))
}

impl<T: Clone + Ord> Command<T> {
    /// Creates a new command and executes it on the model for the tree it applies to
    #[rustfmt::skip]
    fn arbitrary<'d>(
        u: &mut Unstructured<'d>,
        variant: u8,
        id: TreeId,
        count: &mut usize,
        models: &mut Vec<Option<Vec<T>>>,
    ) -> arbitrary::Result<Self>
    where
        T: Arbitrary<'d>,
    {
        // Cloning and dropping need the whole list; everything else just needs this model
        match variant {
            10 => {
                let new_id = TreeId(models.len());
                models.push(models[id.0].clone());
                *count += 1;
                return Ok(Self::ShallowClone { src_id: id, new_id });
            }
            11 => {
                models[id.0].take();
                *count -= 1;
                return Ok(Self::DropTree { id });
            }
            _ => (),
        }

        let Some(model) = models[id.0].as_mut() else {
            unreachable!("chose dropped tree {id}")
        };
        let len = model.len();

        let cmd = match variant {
            0 => {
                let (start, end, ok) = arbitrary_range(u, len)?;
                let access = match ok {
                    false => None,
                    true => {
                        let mut remaining = model[start..end].iter();
                        let n = u.int_in_range(0..=end - start + 1)?;
                        let mut access = Vec::with_capacity(n);
                        for _ in 0..n {
                            let dir = IterDirection::arbitrary(u)?;
                            let item = match dir {
                                IterDirection::Forward => remaining.next(),
                                IterDirection::Backward => remaining.next_back(),
                            };
                            access.push((dir, item.cloned()));
                        }
                        Some(access)
                    }
                };
                Self::Iter { id, start, end, access }
            }
            1 => {
                let index = u.int_in_range(0..=len)?;
                Self::Get { id, index, expected: model.get(index).cloned() }
            }
            2 => {
                let index = u.int_in_range(0..=len + 1)?;
                let value = T::arbitrary(u)?;
                let ok = index <= len;
                if ok {
                    model.insert(index, value.clone());
                }
                Self::Insert { id, index, value, ok }
            }
            3 => {
                let index = u.int_in_range(0..=len + 1)?;
                let n = u.int_in_range(0..=MAX_RANGE_LEN)?;
                let values: Vec<T> = (0..n)
                    .map(|_| T::arbitrary(u))
                    .collect::<arbitrary::Result<_>>()?;
                let ok = index <= len;
                if ok {
                    model.splice(index..index, values.iter().cloned());
                }
                Self::InsertRange { id, index, values, ok }
            }
            4 => {
                let index = u.int_in_range(0..=len)?;
                let removed = (index < len).then(|| model.remove(index));
                Self::RemoveAt { id, index, removed }
            }
            5 => {
                let (start, end, ok) = arbitrary_range(u, len)?;
                if ok {
                    model.drain(start..end);
                }
                Self::RemoveRange { id, start, end, ok }
            }
            6 => {
                let index = u.int_in_range(0..=len)?;
                let value = T::arbitrary(u)?;
                let ok = index < len;
                if ok {
                    model[index] = value.clone();
                }
                Self::Set { id, index, value, ok }
            }
            7 => {
                model.sort();
                Self::Sort { id }
            }
            8 => {
                let (start, end, ok) = arbitrary_range(u, len)?;
                if ok {
                    model[start..end].reverse();
                }
                Self::Reverse { id, start, end, ok }
            }
            9 => Self::TrimExcess { id },
            _ => unreachable!("bad Command variant {variant}"),
        };

        Ok(cmd)
    }
}

/// Ongoing state for executing commands to a set of [`Vector`]s
pub struct RunnerState<T> {
    trees: Vec<Option<Vector<T>>>,
    /// The contents of every tree that has been replaced by a newer version, to check that none of
    /// them are modified
    history: Vec<(Vector<T>, Vec<T>)>,
}

impl<T: Clone + Ord + Debug> RunnerState<T> {
    /// Creates a new, blank `RunnerState` to run a series of commands
    pub fn init() -> Self {
        RunnerState {
            trees: vec![Some(Vector::new())],
            history: Vec::new(),
        }
    }

    fn tree(&self, id: TreeId) -> &Vector<T> {
        match self.trees[id.0].as_ref() {
            Some(t) => t,
            None => panic!("tree {id} used after drop"),
        }
    }

    /// Replaces the tree at `id` with `new`, keeping the old version around for later checks
    fn replace(&mut self, id: TreeId, new: Vector<T>) {
        new.validate();
        let old = self.trees[id.0].replace(new);
        if let Some(old) = old {
            let contents = old.to_vec();
            self.history.push((old, contents));
        }
    }

    /// Runs the command
    #[rustfmt::skip]
    pub fn run_cmd(&mut self, cmd: &Command<T>) {
        match cmd {
            Command::Iter { id, start, end, access: None } => {
                assert!(self.tree(*id).iter_range(*start..*end).is_err());
            }
            Command::Iter { id, start, end, access: Some(access) } => {
                let tree = self.tree(*id);
                let mut iter = match tree.iter_range(*start..*end) {
                    Ok(iter) => iter,
                    Err(e) => panic!("unexpected error {e}"),
                };
                for (dir, expected) in access {
                    let item = match dir {
                        IterDirection::Forward => iter.next(),
                        IterDirection::Backward => iter.next_back(),
                    };
                    assert_eq!(item, expected.as_ref());
                }
            }
            Command::Get { id, index, expected } => {
                assert_eq!(self.tree(*id).get(*index), expected.as_ref());
            }
            Command::Insert { id, index, value, ok } => {
                let result = self.tree(*id).insert(*index, value.clone());
                assert_eq!(result.is_ok(), *ok);
                if let Ok(new) = result {
                    self.replace(*id, new);
                }
            }
            Command::InsertRange { id, index, values, ok } => {
                let result = self.tree(*id).insert_range(*index, values.iter().cloned());
                assert_eq!(result.is_ok(), *ok);
                if let Ok(new) = result {
                    self.replace(*id, new);
                }
            }
            Command::RemoveAt { id, index, removed } => {
                let tree = self.tree(*id);
                assert_eq!(tree.get(*index), removed.as_ref());
                let result = tree.remove_at(*index);
                assert_eq!(result.is_ok(), removed.is_some());
                if let Ok(new) = result {
                    self.replace(*id, new);
                }
            }
            Command::RemoveRange { id, start, end, ok } => {
                let result = self.tree(*id).remove_range(*start..*end);
                assert_eq!(result.is_ok(), *ok);
                if let Ok(new) = result {
                    self.replace(*id, new);
                }
            }
            Command::Set { id, index, value, ok } => {
                let result = self.tree(*id).set(*index, value.clone());
                assert_eq!(result.is_ok(), *ok);
                if let Ok(new) = result {
                    self.replace(*id, new);
                }
            }
            Command::Sort { id } => {
                let new = self.tree(*id).sort();
                self.replace(*id, new);
            }
            Command::Reverse { id, start, end, ok } => {
                let result = self.tree(*id).reverse_range(*start..*end);
                assert_eq!(result.is_ok(), *ok);
                if let Ok(new) = result {
                    self.replace(*id, new);
                }
            }
            Command::TrimExcess { id } => {
                let new = self.tree(*id).trim_excess();
                new.validate_packed();
                self.replace(*id, new);
            }
            Command::ShallowClone { src_id, .. } => {
                let new = self.tree(*src_id).clone();
                self.trees.push(Some(new));
            }
            Command::DropTree { id } => drop(self.trees[id.0].take()),
        }
    }

    /// Checks that every tree, current or replaced, is still valid and unchanged
    pub fn finish(self) {
        for tree in self.trees.iter().flatten() {
            tree.validate();
        }

        for (old, contents) in self.history {
            old.validate();
            assert_eq!(old.to_vec(), contents);
        }
    }
}
