//! The Thompson-NFA event matcher: walk the current-thread set (which grows
//! in place as `JUMP`/`SPLIT` spawn more threads for the same event), moving
//! threads that want another event into the next-thread set, then swap the
//! sets.

use super::error::MatchOutcome;
use super::opcode::Opcode;
use super::thread::{MatcherThread, ThreadSet};

fn event_name(event: u32) -> u32 {
    event & 0xff
}

fn event_screen(event: u32) -> u32 {
    (event >> 16) & 0xff
}

/// An NFA matcher bound to a borrowed bytecode program.
///
/// Bytecode is borrowed for the matcher's lifetime; `create`/`reset`/
/// `accept` form the matcher's lifecycle, with `Drop` handling teardown.
pub struct Matcher<'a> {
    bytecode: &'a [u8],
    current: ThreadSet,
    next: ThreadSet,
}

impl<'a> Matcher<'a> {
    pub fn create(bytecode: &'a [u8]) -> Self {
        Matcher {
            bytecode,
            current: ThreadSet::new(),
            next: ThreadSet::new(),
        }
    }

    /// Empty both thread sets. No cross-call leakage of thread state beyond
    /// what `NEXT` explicitly preserves.
    pub fn reset(&mut self) {
        self.current.clear();
        self.next.clear();
    }

    /// Feed one event and advance the NFA by one step.
    pub fn accept(&mut self, event: u32) -> MatchOutcome {
        // On every event, start a fresh attempt from the beginning — this
        // is what gives "match anywhere in the stream" semantics rather
        // than requiring the match to start at event 0.
        self.current.push(MatcherThread { ip: 0 });

        let mut thread_index = 0;
        while thread_index < self.current.len() {
            let thread = self.current.get(thread_index);
            thread_index += 1;

            match self.run_thread(thread, event) {
                ThreadResult::Done => {}
                ThreadResult::Match => return MatchOutcome::Ok,
                ThreadResult::Error => return MatchOutcome::Error,
            }
        }

        self.current.swap_in(&mut self.next);
        MatchOutcome::Next
    }

    /// Step `thread` through instructions until it decides it's done with
    /// this event, matches, or aborts. Spawned threads (`JUMP`/`SPLIT`) are
    /// pushed onto `self.current` so the enclosing `while` loop in `accept`
    /// picks them up within the same event.
    fn run_thread(&mut self, thread: MatcherThread, event: u32) -> ThreadResult {
        let mut ip = thread.ip;

        loop {
            let Some(&byte) = self.bytecode.get(ip) else {
                return ThreadResult::Error;
            };
            let Some(op) = Opcode::from_byte(byte) else {
                return ThreadResult::Error;
            };

            match op {
                Opcode::Abort => return ThreadResult::Error,
                Opcode::Name => {
                    let Some(name) = self.read_u16(ip + 1) else {
                        return ThreadResult::Error;
                    };
                    ip += 3;
                    if event_name(event) != name as u32 {
                        return ThreadResult::Done;
                    }
                }
                Opcode::Screen => {
                    let Some(screen) = self.read_u16(ip + 1) else {
                        return ThreadResult::Error;
                    };
                    ip += 3;
                    if event_screen(event) != screen as u32 {
                        return ThreadResult::Done;
                    }
                }
                Opcode::Next => {
                    self.next.push(MatcherThread { ip: ip + 1 });
                    return ThreadResult::Done;
                }
                Opcode::Jump => {
                    let Some(target) = self.read_u16(ip + 1) else {
                        return ThreadResult::Error;
                    };
                    self.current.push(MatcherThread { ip: target as usize });
                    return ThreadResult::Done;
                }
                Opcode::Split => {
                    let Some(left) = self.read_u16(ip + 1) else {
                        return ThreadResult::Error;
                    };
                    let Some(right) = self.read_u16(ip + 3) else {
                        return ThreadResult::Error;
                    };
                    self.current.push(MatcherThread { ip: left as usize });
                    self.current.push(MatcherThread { ip: right as usize });
                    return ThreadResult::Done;
                }
                Opcode::Match => return ThreadResult::Match,
            }
        }
    }

    fn read_u16(&self, at: usize) -> Option<u16> {
        let hi = *self.bytecode.get(at)?;
        let lo = *self.bytecode.get(at + 1)?;
        Some(((hi as u16) << 8) | lo as u16)
    }
}

enum ThreadResult {
    Done,
    Match,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::asm::assemble;

    fn event(name: u32, screen: u32) -> u32 {
        (screen << 16) | name
    }

    #[test]
    fn three_event_chain_matches_on_the_third_event() {
        let bytecode = assemble("NEXT\nNAME 1\nNEXT\nNAME 2\nNEXT\nNAME 3\nMATCH\n").unwrap();
        let mut matcher = Matcher::create(&bytecode);
        assert_eq!(matcher.accept(event(1, 3)), MatchOutcome::Next);
        assert_eq!(matcher.accept(event(2, 3)), MatchOutcome::Next);
        assert_eq!(matcher.accept(event(3, 3)), MatchOutcome::Ok);
    }

    #[test]
    fn restarts_the_attempt_on_every_event() {
        let bytecode = assemble("NEXT\nNAME 1\nNEXT\nNAME 2\nNEXT\nNAME 3\nMATCH\n").unwrap();
        let mut matcher = Matcher::create(&bytecode);
        let events = [
            event(9, 9),
            event(1, 3),
            event(2, 3),
            event(9, 3),
            event(1, 3),
            event(2, 3),
            event(3, 3),
        ];
        let mut last = MatchOutcome::Next;
        for e in events {
            last = matcher.accept(e);
        }
        assert_eq!(last, MatchOutcome::Ok);
    }

    #[test]
    fn reset_clears_both_thread_sets() {
        let bytecode = assemble("NEXT\nNAME 1\nMATCH\n").unwrap();
        let mut matcher = Matcher::create(&bytecode);
        matcher.accept(event(1, 0));
        matcher.reset();
        assert!(matcher.current.is_empty());
        assert!(matcher.next.is_empty());
    }
}
