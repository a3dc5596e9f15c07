//! Beat predicates gating generator activation.
//!
//! Every predicate is a pure function of the beat index. Cycles are aligned
//! to beat 0, not to the start of the generator or scene that uses them, and
//! use floor modulo so negative beats continue the same pattern.

use std::fmt;
use std::rc::Rc;

use crate::{Beat, Result, TimelineError};

/// Activation rule evaluated once per beat.
#[derive(Clone)]
pub enum BeatPredicate {
    Always,
    EveryN(Beat),
    OnOff { on: Beat, off: Beat },
    OffOn { off: Beat, on: Beat },
    Before(Beat),
    At(Beat),
    All(Vec<BeatPredicate>),
    Custom(Rc<dyn Fn(Beat) -> bool>),
}

impl BeatPredicate {
    pub fn evaluate(&self, beat: Beat) -> bool {
        match self {
            BeatPredicate::Always => true,
            BeatPredicate::EveryN(n) => beat.checked_rem_euclid(*n) == Some(0),
            BeatPredicate::OnOff { on, off } => {
                cycle_position(beat, *on, *off).is_some_and(|pos| pos < *on)
            }
            BeatPredicate::OffOn { off, on } => {
                cycle_position(beat, *on, *off).is_some_and(|pos| pos >= *off)
            }
            BeatPredicate::Before(n) => beat < *n,
            BeatPredicate::At(n) => beat == *n,
            BeatPredicate::All(preds) => preds.iter().all(|p| p.evaluate(beat)),
            BeatPredicate::Custom(f) => f(beat),
        }
    }

    /// Logical AND with another predicate, flattening nested conjunctions.
    pub fn and(self, other: BeatPredicate) -> BeatPredicate {
        let mut preds = match self {
            BeatPredicate::All(preds) => preds,
            single => vec![single],
        };
        match other {
            BeatPredicate::All(more) => preds.extend(more),
            single => preds.push(single),
        }
        BeatPredicate::All(preds)
    }
}

impl fmt::Debug for BeatPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeatPredicate::Always => f.write_str("Always"),
            BeatPredicate::EveryN(n) => f.debug_tuple("EveryN").field(n).finish(),
            BeatPredicate::OnOff { on, off } => f
                .debug_struct("OnOff")
                .field("on", on)
                .field("off", off)
                .finish(),
            BeatPredicate::OffOn { off, on } => f
                .debug_struct("OffOn")
                .field("off", off)
                .field("on", on)
                .finish(),
            BeatPredicate::Before(n) => f.debug_tuple("Before").field(n).finish(),
            BeatPredicate::At(n) => f.debug_tuple("At").field(n).finish(),
            BeatPredicate::All(preds) => f.debug_tuple("All").field(preds).finish(),
            BeatPredicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// True on every beat.
pub fn always() -> BeatPredicate {
    BeatPredicate::Always
}

/// True when the beat is a multiple of `n`. Beat 0 always qualifies.
pub fn every_n_beats(n: Beat) -> Result<BeatPredicate> {
    if n <= 0 {
        return Err(TimelineError::invalid_predicate(format!(
            "every_n_beats requires n > 0, got {n}"
        )));
    }
    Ok(BeatPredicate::EveryN(n))
}

/// True for the first `on` beats of every `on + off` cycle.
pub fn every_on_off(on: Beat, off: Beat) -> Result<BeatPredicate> {
    validate_cycle("every_on_off", on, off)?;
    Ok(BeatPredicate::OnOff { on, off })
}

/// True for the last `on` beats of every `off + on` cycle.
pub fn every_off_on(off: Beat, on: Beat) -> Result<BeatPredicate> {
    validate_cycle("every_off_on", on, off)?;
    Ok(BeatPredicate::OffOn { off, on })
}

/// True while the beat is strictly below `n`.
pub fn before_n(n: Beat) -> BeatPredicate {
    BeatPredicate::Before(n)
}

/// True only on beat `n`.
pub fn at_beat(n: Beat) -> BeatPredicate {
    BeatPredicate::At(n)
}

/// Conjunction of all predicates. An empty list is always true.
pub fn combine_conditions<I>(preds: I) -> BeatPredicate
where
    I: IntoIterator<Item = BeatPredicate>,
{
    BeatPredicate::All(preds.into_iter().collect())
}

/// Wraps an arbitrary pure function of the beat.
pub fn custom<F>(f: F) -> BeatPredicate
where
    F: Fn(Beat) -> bool + 'static,
{
    BeatPredicate::Custom(Rc::new(f))
}

/// Position of `beat` within an `on + off` cycle. Variants built by hand with
/// an empty or overflowing cycle never match.
fn cycle_position(beat: Beat, on: Beat, off: Beat) -> Option<Beat> {
    on.checked_add(off)
        .filter(|len| *len > 0)
        .map(|len| beat.rem_euclid(len))
}

fn validate_cycle(name: &str, on: Beat, off: Beat) -> Result<()> {
    if on < 0 || off < 0 {
        return Err(TimelineError::invalid_predicate(format!(
            "{name} requires non-negative windows, got on={on} off={off}"
        )));
    }
    match on.checked_add(off) {
        None => Err(TimelineError::invalid_predicate(format!(
            "{name} cycle of on={on} off={off} does not fit in a beat"
        ))),
        Some(0) => Err(TimelineError::invalid_predicate(format!(
            "{name} requires a cycle longer than zero beats"
        ))),
        Some(_) => Ok(()),
    }
}
