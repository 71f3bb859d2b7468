//!
//! Open reading frame (ORF) constraints
//!
//! A transition between two states carrying ORF phases must keep the reading
//! frame (`gap mod 3 == target`) and must not read through a stop codon
//! (`taa`, `tag`, `tga`) in that frame.
//!
use crate::common::Pos;
use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

///
/// Stop-codon table of a sequence.
///
/// `is_stop(i)` is true if a stop codon starts at `i` on the forward strand.
///
#[derive(Debug, Clone, PartialEq)]
pub struct StopCodons {
    stops: FixedBitSet,
    len: usize,
}

impl StopCodons {
    ///
    /// Scan the sequence (case-insensitive) for `taa`, `tag` and `tga`.
    /// The last two positions are never stops.
    ///
    pub fn from_seq(seq: &[u8]) -> Self {
        let mut stops = FixedBitSet::with_capacity(seq.len());
        for (i, codon) in seq.windows(3).enumerate() {
            let codon = [
                codon[0].to_ascii_lowercase(),
                codon[1].to_ascii_lowercase(),
                codon[2].to_ascii_lowercase(),
            ];
            if matches!(&codon, b"taa" | b"tag" | b"tga") {
                stops.insert(i);
            }
        }
        StopCodons {
            stops,
            len: seq.len(),
        }
    }
    ///
    /// Table with stops only at the given positions
    ///
    pub fn from_positions(len: usize, positions: &[usize]) -> Self {
        let mut stops = FixedBitSet::with_capacity(len);
        for &p in positions {
            stops.insert(p);
        }
        StopCodons { stops, len }
    }
    /// length of the sequence
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    /// `false` for positions outside of the sequence
    pub fn is_stop(&self, pos: Pos) -> bool {
        pos >= 0 && self.stops.contains(pos as usize)
    }
    /// iterator of positions of stop codons
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.stops.ones()
    }
}

///
/// ORF phases of a state
///
/// `from` is the phase used when the state is the source of a transition,
/// `to` when it is the target.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateOrf {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

///
/// ORF phases of a transition `source -> target`
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrfPhases {
    /// `from` phase of the source state
    pub from: i64,
    /// `to` phase of the target state
    pub to: i64,
}

impl OrfPhases {
    ///
    /// Phases of the transition, or `None` if the transition is not
    /// ORF-constrained.
    ///
    /// # Panics
    ///
    /// Panics if exactly one of the two ends carries a phase.
    ///
    pub fn of_transition(source: &StateOrf, target: &StateOrf) -> Option<OrfPhases> {
        match (source.from, target.to) {
            (Some(from), Some(to)) => Some(OrfPhases { from, to }),
            (None, None) => None,
            (from, to) => panic!(
                "ORF metadata present on only one side of a transition (from={:?} to={:?})",
                from, to
            ),
        }
    }
    /// required `gap mod 3`, in `[0, 3)`
    pub fn target(&self) -> i64 {
        (self.to - self.from).rem_euclid(3)
    }
    /// check if a transition spanning `gap` keeps the frame
    pub fn is_frame_consistent(&self, gap: Pos) -> bool {
        gap.rem_euclid(3) == self.target()
    }
}

///
/// Check that no stop codon lies on the frame between `start` and the end
/// of a transition ending at `to`, resuming the backward scan from
/// `last_pos`.
///
/// `last_pos` is the scan cursor shared by the calls of one backward scan.
/// It must be initialized to `to`; after a successful check it points to the
/// next codon position to be scanned, so positions already cleared are not
/// scanned again.
///
pub fn extend_orf(
    stops: &StopCodons,
    phases: OrfPhases,
    start: Pos,
    last_pos: &mut Pos,
    to: Pos,
) -> bool {
    let start = start.max(0);
    let to = to.max(0);

    let mut pos = if *last_pos == to {
        to - phases.to - 3
    } else {
        *last_pos
    };
    if pos < 0 {
        return true;
    }
    while pos >= start {
        if stops.is_stop(pos) {
            return false;
        }
        pos -= 3;
    }
    *last_pos = (pos + 3).min(to - phases.to - 3);
    true
}

///
/// Scan cursor of `extend_orf` for a single backward scan over one
/// transition.
///
/// The end of the transition must not decrease between calls.
///
#[derive(Debug, Clone)]
pub struct OrfCursor {
    phases: OrfPhases,
    last_pos: Pos,
    to: Pos,
}

impl OrfCursor {
    pub fn new(phases: OrfPhases, to: Pos) -> Self {
        OrfCursor {
            phases,
            last_pos: to,
            to,
        }
    }
    pub fn phases(&self) -> OrfPhases {
        self.phases
    }
    ///
    /// Check that a transition from `start` to `to` reads through no stop.
    ///
    pub fn extend(&mut self, stops: &StopCodons, start: Pos, to: Pos) -> bool {
        debug_assert!(
            to >= self.to,
            "transition end decreased from {} to {} within an ORF scan",
            self.to,
            to
        );
        self.to = to;
        extend_orf(stops, self.phases, start, &mut self.last_pos, to)
    }
}

//
// tests
//
