//! # Log Audit
//!
//! Checks a finished event log for the properties every correct run has:
//!
//! 1. Sequence numbers run 1, 2, 3, ... without gaps.
//! 2. Each unit's own lines follow `started`, `going to queue`, then either
//!    `not enough` or `creating n` followed by `molecule n created`.
//! 3. Every molecule is started and credited by exactly one oxygen and two
//!    hydrogen.
//! 4. Every unit's last line ends its run: `not enough` or `created`.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::log::{Event, LogLine, ParseLineError, UnitId, UnitKind};

/// A violated log property.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// A line could not be parsed.
    #[error(transparent)]
    Malformed(#[from] ParseLineError),

    /// Sequence numbers are not contiguous from 1.
    #[error("expected sequence number {expected}, found {found}")]
    Sequence {
        /// Next number the log should have used.
        expected: u64,
        /// Number actually found.
        found: u64,
    },

    /// A unit logged events out of order.
    #[error("{unit} logged {event:?} out of order")]
    UnitOrder {
        /// Offending unit.
        unit: UnitId,
        /// Event that arrived too early or twice.
        event: Event,
    },

    /// A unit credited a molecule it never started creating.
    #[error("{unit} created molecule {molecule} without creating it first")]
    CreatedWithoutCreating {
        /// Offending unit.
        unit: UnitId,
        /// Molecule number in the `created` line.
        molecule: u32,
    },

    /// A molecule was started by other than 1 oxygen + 2 hydrogen.
    #[error("molecule {molecule} started by {oxygen} oxygen and {hydrogen} hydrogen")]
    CreatingPartySize {
        /// Molecule number.
        molecule: u32,
        /// Oxygen `creating` lines.
        oxygen: u32,
        /// Hydrogen `creating` lines.
        hydrogen: u32,
    },

    /// A molecule does not have exactly 1 oxygen + 2 hydrogen credits.
    #[error("molecule {molecule} credited by {oxygen} oxygen and {hydrogen} hydrogen")]
    PartySize {
        /// Molecule number.
        molecule: u32,
        /// Oxygen `created` lines.
        oxygen: u32,
        /// Hydrogen `created` lines.
        hydrogen: u32,
    },

    /// A unit's last line does not end its run.
    #[error("{unit} never finished, last logged {last:?}")]
    Unfinished {
        /// Offending unit.
        unit: UnitId,
        /// Last event the unit logged.
        last: Event,
    },
}

/// What a clean log contained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuditSummary {
    /// Molecules credited by a full party.
    pub molecules: u32,
    /// Oxygen units that left through the cascade.
    pub oxygen_exits: u32,
    /// Hydrogen units that left through the cascade.
    pub hydrogen_exits: u32,
    /// Total lines read.
    pub lines: u64,
}

#[derive(Default)]
struct UnitTrack {
    last: Option<Event>,
}

/// `creating` and `created` lines of one molecule, as (oxygen, hydrogen).
#[derive(Default)]
struct PartyTrack {
    creating: (u32, u32),
    created: (u32, u32),
}

impl PartyTrack {
    fn count(tally: &mut (u32, u32), kind: UnitKind) {
        match kind {
            UnitKind::Oxygen => tally.0 += 1,
            UnitKind::Hydrogen => tally.1 += 1,
        }
    }
}

/// Audits the lines of a finished run.
///
/// # Errors
///
/// Returns the first [`AuditError`] found.
pub fn audit<I, S>(lines: I) -> Result<AuditSummary, AuditError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut summary = AuditSummary::default();
    let mut units: HashMap<UnitId, UnitTrack> = HashMap::new();
    let mut parties: BTreeMap<u32, PartyTrack> = BTreeMap::new();

    for raw in lines {
        let line: LogLine = raw.as_ref().parse()?;
        let expected = summary.lines + 1;
        if line.seq != expected {
            return Err(AuditError::Sequence {
                expected,
                found: line.seq,
            });
        }
        summary.lines = expected;

        let track = units.entry(line.unit).or_default();
        let in_order = match track.last {
            None => line.event == Event::Started,
            Some(prev) => match (prev, line.event) {
                (Event::Created(_), Event::Created(_)) => false,
                (Event::Creating(n), Event::Created(m)) if n != m => {
                    return Err(AuditError::CreatedWithoutCreating {
                        unit: line.unit,
                        molecule: m,
                    });
                }
                (Event::Creating(_), Event::Created(_)) => true,
                (_, Event::Created(m)) => {
                    return Err(AuditError::CreatedWithoutCreating {
                        unit: line.unit,
                        molecule: m,
                    });
                }
                (prev, next) => next.rank() == prev.rank() + 1 && prev != Event::NotEnough,
            },
        };
        if !in_order {
            return Err(AuditError::UnitOrder {
                unit: line.unit,
                event: line.event,
            });
        }
        track.last = Some(line.event);

        match line.event {
            Event::Creating(molecule) => {
                PartyTrack::count(&mut parties.entry(molecule).or_default().creating, line.unit.kind);
            }
            Event::Created(molecule) => {
                PartyTrack::count(&mut parties.entry(molecule).or_default().created, line.unit.kind);
            }
            Event::NotEnough => match line.unit.kind {
                UnitKind::Oxygen => summary.oxygen_exits += 1,
                UnitKind::Hydrogen => summary.hydrogen_exits += 1,
            },
            _ => {}
        }
    }

    for (&molecule, party) in &parties {
        let (oxygen, hydrogen) = party.creating;
        if oxygen != 1 || hydrogen != 2 {
            return Err(AuditError::CreatingPartySize {
                molecule,
                oxygen,
                hydrogen,
            });
        }
        let (oxygen, hydrogen) = party.created;
        if oxygen != 1 || hydrogen != 2 {
            return Err(AuditError::PartySize {
                molecule,
                oxygen,
                hydrogen,
            });
        }
    }

    let mut unfinished: Vec<(UnitId, Event)> = units
        .into_iter()
        .filter_map(|(unit, track)| track.last.map(|last| (unit, last)))
        .filter(|(_, last)| !matches!(last, Event::NotEnough | Event::Created(_)))
        .collect();
    unfinished.sort_by_key(|&(unit, _)| unit);
    if let Some(&(unit, last)) = unfinished.first() {
        return Err(AuditError::Unfinished { unit, last });
    }
    summary.molecules = u32::try_from(parties.len()).unwrap_or(u32::MAX);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_MOLECULE: &[&str] = &[
        "1: O 1: started",
        "2: H 1: started",
        "3: H 2: started",
        "4: H 1: going to queue",
        "5: O 1: going to queue",
        "6: H 2: going to queue",
        "7: O 1: creating molecule 1",
        "8: H 2: creating molecule 1",
        "9: H 1: creating molecule 1",
        "10: H 1: molecule 1 created",
        "11: O 1: molecule 1 created",
        "12: H 2: molecule 1 created",
    ];

    #[test]
    fn test_clean_log() {
        let summary = audit(ONE_MOLECULE).unwrap();
        assert_eq!(summary.molecules, 1);
        assert_eq!(summary.lines, 12);
        assert_eq!(summary.oxygen_exits, 0);
    }

    #[test]
    fn test_cascade_exits_are_counted() {
        let summary = audit([
            "1: H 1: started",
            "2: H 1: going to queue",
            "3: H 1: not enough O or H",
        ])
        .unwrap();
        assert_eq!(summary.hydrogen_exits, 1);
        assert_eq!(summary.molecules, 0);
    }

    #[test]
    fn test_sequence_gap() {
        let err = audit(["1: O 1: started", "3: O 1: going to queue"]).unwrap_err();
        assert_eq!(
            err,
            AuditError::Sequence {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_missing_hydrogen() {
        let err = audit(&ONE_MOLECULE[..11]).unwrap_err();
        assert_eq!(
            err,
            AuditError::PartySize {
                molecule: 1,
                oxygen: 1,
                hydrogen: 1
            }
        );
    }

    #[test]
    fn test_extra_participant_is_rejected() {
        let mut lines = ONE_MOLECULE.to_vec();
        lines.extend([
            "13: H 3: started",
            "14: H 3: going to queue",
            "15: H 3: creating molecule 1",
        ]);
        let err = audit(&lines).unwrap_err();
        assert_eq!(
            err,
            AuditError::CreatingPartySize {
                molecule: 1,
                oxygen: 1,
                hydrogen: 3
            }
        );
    }

    #[test]
    fn test_unit_left_in_queue_is_rejected() {
        let mut lines = ONE_MOLECULE.to_vec();
        lines.extend(["13: O 2: started", "14: O 2: going to queue"]);
        let err = audit(&lines).unwrap_err();
        assert_eq!(
            err,
            AuditError::Unfinished {
                unit: UnitId::new(UnitKind::Oxygen, 2),
                last: Event::GoingToQueue
            }
        );

        let err = audit(["1: H 4: started"]).unwrap_err();
        assert!(matches!(err, AuditError::Unfinished { last: Event::Started, .. }));
    }

    #[test]
    fn test_created_without_creating() {
        let err = audit([
            "1: O 1: started",
            "2: O 1: going to queue",
            "3: O 1: molecule 1 created",
        ])
        .unwrap_err();
        assert!(matches!(err, AuditError::CreatedWithoutCreating { molecule: 1, .. }));

        let err = audit([
            "1: O 1: started",
            "2: O 1: going to queue",
            "3: O 1: creating molecule 1",
            "4: O 1: molecule 2 created",
        ])
        .unwrap_err();
        assert!(matches!(err, AuditError::CreatedWithoutCreating { molecule: 2, .. }));
    }

    #[test]
    fn test_out_of_order() {
        let err = audit(["1: O 1: going to queue"]).unwrap_err();
        assert!(matches!(err, AuditError::UnitOrder { .. }));

        let err = audit([
            "1: H 1: started",
            "2: H 1: going to queue",
            "3: H 1: not enough O or H",
            "4: H 1: creating molecule 1",
        ])
        .unwrap_err();
        assert!(matches!(err, AuditError::UnitOrder { .. }));
    }
}
