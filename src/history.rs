//! Causal history of a finished simulation run.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

use uuid::Uuid;

use crate::abstractions::{Event, EventKind, ProcessId, Timestamp};

/// A message edge between a `Sent` event and the `Received` event that consumed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CausalLink {
    pub source: ProcessId,
    pub destination: ProcessId,
    pub sent: Timestamp,
    pub received: Timestamp,
}

impl fmt::Display for CausalLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p{}@{} -> p{}@{}",
            self.source, self.sent, self.destination, self.received
        )
    }
}

/// Event logs of every process, keyed and iterated by ascending process id.
///
/// Built once after every process has finished and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct History {
    run_id: Uuid,
    logs: BTreeMap<ProcessId, Vec<Event>>,
}

impl History {
    pub fn new(run_id: Uuid, logs: BTreeMap<ProcessId, Vec<Event>>) -> Self {
        Self { run_id, logs }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn process_count(&self) -> usize {
        self.logs.len()
    }

    pub fn events(&self, id: ProcessId) -> Option<&[Event]> {
        self.logs.get(&id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, &[Event])> {
        self.logs.iter().map(|(id, events)| (*id, events.as_slice()))
    }

    pub fn timestamps(&self, id: ProcessId) -> Vec<Timestamp> {
        self.events(id)
            .map(|events| events.iter().map(|e| e.timestamp).collect())
            .unwrap_or_default()
    }

    pub fn kinds(&self, id: ProcessId) -> Vec<EventKind> {
        self.events(id)
            .map(|events| events.iter().map(|e| e.kind).collect())
            .unwrap_or_default()
    }

    /// Every distinct timestamp across all processes, ascending.
    pub fn distinct_timestamps(&self) -> BTreeSet<Timestamp> {
        self.logs
            .values()
            .flat_map(|events| events.iter().map(|e| e.timestamp))
            .collect()
    }

    /// Pairs each `Sent` event with the `Received` event that consumed it.
    ///
    /// Messages of one (source, destination) pair are matched in FIFO order.
    /// Links are ordered by sender id, then by the sender's log order. A send
    /// that was never received has no link.
    pub fn causal_links(&self) -> Vec<CausalLink> {
        let mut pending: HashMap<(ProcessId, ProcessId), VecDeque<Timestamp>> = HashMap::new();
        for events in self.logs.values() {
            for event in events.iter().filter(|e| e.kind == EventKind::Received) {
                if let Some(pair) = event.endpoints() {
                    pending.entry(pair).or_default().push_back(event.timestamp);
                }
            }
        }

        let mut links = Vec::new();
        for events in self.logs.values() {
            for event in events.iter().filter(|e| e.kind == EventKind::Sent) {
                let Some((source, destination)) = event.endpoints() else {
                    continue;
                };
                let received = pending
                    .get_mut(&(source, destination))
                    .and_then(VecDeque::pop_front);
                if let Some(received) = received {
                    links.push(CausalLink {
                        source,
                        destination,
                        sent: event.timestamp,
                        received,
                    });
                }
            }
        }
        links
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, events) in self.iter() {
            write!(f, "p{id}:")?;
            for event in events {
                write!(f, " {event}")?;
            }
            writeln!(f)?;
        }
        for link in self.causal_links() {
            writeln!(f, "{link}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> History {
        let logs = BTreeMap::from([
            (
                0,
                vec![
                    Event::sent(1, 0, 1),
                    Event::sent(2, 0, 1),
                    Event::local(3),
                ],
            ),
            (
                1,
                vec![
                    Event::local(1),
                    Event::received(2, 0, 1),
                    Event::received(4, 0, 1),
                ],
            ),
        ]);
        History::new(Uuid::nil(), logs)
    }

    #[test]
    fn links_pair_sends_in_fifo_order() {
        assert_eq!(
            sample().causal_links(),
            vec![
                CausalLink {
                    source: 0,
                    destination: 1,
                    sent: 1,
                    received: 2,
                },
                CausalLink {
                    source: 0,
                    destination: 1,
                    sent: 2,
                    received: 4,
                },
            ]
        );
    }

    #[test]
    fn unreceived_send_has_no_link() {
        let logs = BTreeMap::from([(0, vec![Event::sent(1, 0, 1)]), (1, vec![])]);
        let history = History::new(Uuid::nil(), logs);
        assert!(history.causal_links().is_empty());
    }

    #[test]
    fn distinct_timestamps_are_sorted() {
        let timestamps: Vec<_> = sample().distinct_timestamps().into_iter().collect();
        assert_eq!(timestamps, vec![1, 2, 3, 4]);
    }

    #[test]
    fn display_lists_processes_then_links() {
        assert_eq!(
            sample().to_string(),
            "p0: s1@1 s1@2 l@3\np1: l@1 r0@2 r0@4\np0@1 -> p1@2\np0@2 -> p1@4\n"
        );
    }

    #[test]
    fn missing_process_has_no_events() {
        let history = sample();
        assert_eq!(history.events(5), None);
        assert!(history.timestamps(5).is_empty());
        assert_eq!(history.process_count(), 2);
    }
}
