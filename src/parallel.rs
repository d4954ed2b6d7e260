//! Slot-based evaluation drivers.
//!
//! Population initialization and variation both reduce to the same job:
//! produce one accepted chromosome per slot in `0..n_add`, where producing
//! a chromosome may take several attempts because the caller's evaluation
//! can reject candidates. Three drivers execute that job:
//!
//! - [`run_sequential`] — one slot at a time on the calling thread;
//! - [`run_static`] — the slots are split into near-equal contiguous
//!   chunks, one worker per chunk, each writing only its own chunk;
//! - [`run_dynamic`] — persistent workers receive one slot at a time from
//!   the control thread, which polls for an idle worker and sleeps between
//!   polls; this balances heterogeneous per-candidate cost at the price of
//!   dispatch overhead.
//!
//! All drivers honor the cooperative stop flag between slots: in-flight
//! slots complete, unstarted slots stay `None`, and per-worker attempt
//! counters are summed at the join barrier.

use crate::chromosome::Chromosome;
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::thread;
use std::time::Duration;

/// Produces one accepted chromosome, incrementing the attempt counter as
/// its retry policy dictates.
pub(crate) type SlotAction<'a, G, M> = dyn Fn(&mut u64) -> Chromosome<G, M> + Sync + 'a;

/// Optional callback pumped while the dynamic dispatcher waits.
pub(crate) type IdleRefresh<'a> = dyn Fn() + Sync + 'a;

const MAILBOX_IDLE: isize = -1;
const MAILBOX_SHUTDOWN: isize = -2;

pub(crate) fn run_sequential<G, M>(
    n_add: usize,
    cancel: &AtomicBool,
    action: &SlotAction<'_, G, M>,
) -> (Vec<Option<Chromosome<G, M>>>, u64) {
    let mut slots = Vec::with_capacity(n_add);
    let mut attempts = 0;
    for _ in 0..n_add {
        if cancel.load(Ordering::Relaxed) {
            slots.push(None);
            continue;
        }
        slots.push(Some(action(&mut attempts)));
    }
    (slots, attempts)
}

pub(crate) fn run_static<G, M>(
    n_add: usize,
    n_threads: usize,
    cancel: &AtomicBool,
    action: &SlotAction<'_, G, M>,
) -> (Vec<Option<Chromosome<G, M>>>, u64)
where
    G: Send + Sync,
    M: Send + Sync,
{
    let mut slots: Vec<Option<Chromosome<G, M>>> = (0..n_add).map(|_| None).collect();
    let chunk_size = (n_add / n_threads).max(1);

    let attempts = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(n_threads);
        let mut remaining = slots.as_mut_slice();
        for worker in 0..n_threads {
            if remaining.is_empty() {
                break;
            }
            // The last worker absorbs the remainder.
            let take = if worker + 1 == n_threads {
                remaining.len()
            } else {
                chunk_size.min(remaining.len())
            };
            let (chunk, rest) = std::mem::take(&mut remaining).split_at_mut(take);
            remaining = rest;
            handles.push(scope.spawn(move || {
                let mut attempts = 0;
                for slot in chunk.iter_mut() {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    *slot = Some(action(&mut attempts));
                }
                attempts
            }));
        }
        handles
            .into_iter()
            .map(|handle| handle.join().expect("evaluation worker panicked"))
            .sum()
    });

    (slots, attempts)
}

pub(crate) fn run_dynamic<G, M>(
    n_add: usize,
    n_threads: usize,
    idle_delay: Duration,
    cancel: &AtomicBool,
    refresh: Option<&IdleRefresh<'_>>,
    action: &SlotAction<'_, G, M>,
) -> (Vec<Option<Chromosome<G, M>>>, u64)
where
    G: Send + Sync,
    M: Send + Sync,
{
    let mailboxes: Vec<AtomicIsize> =
        (0..n_threads).map(|_| AtomicIsize::new(MAILBOX_IDLE)).collect();

    let idle = || {
        if let Some(refresh) = refresh {
            refresh();
        }
        thread::sleep(idle_delay);
    };

    let results: Vec<(u64, Vec<(usize, Chromosome<G, M>)>)> = thread::scope(|scope| {
        let handles: Vec<_> = mailboxes
            .iter()
            .map(|mailbox| {
                scope.spawn(move || {
                    let mut attempts = 0;
                    let mut produced = Vec::new();
                    loop {
                        match mailbox.load(Ordering::Acquire) {
                            MAILBOX_SHUTDOWN => break,
                            MAILBOX_IDLE => thread::sleep(idle_delay),
                            slot => {
                                produced.push((slot as usize, action(&mut attempts)));
                                mailbox.store(MAILBOX_IDLE, Ordering::Release);
                            }
                        }
                    }
                    (attempts, produced)
                })
            })
            .collect();

        // Hand out one slot at a time to the first idle worker.
        let mut next_slot = 0;
        while next_slot < n_add && !cancel.load(Ordering::Relaxed) {
            let free = mailboxes
                .iter()
                .find(|mailbox| mailbox.load(Ordering::Acquire) == MAILBOX_IDLE);
            match free {
                Some(mailbox) => {
                    mailbox.store(next_slot as isize, Ordering::Release);
                    next_slot += 1;
                }
                None => idle(),
            }
        }

        // Wait for in-flight slots, then retire the pool.
        while mailboxes
            .iter()
            .any(|mailbox| mailbox.load(Ordering::Acquire) != MAILBOX_IDLE)
        {
            idle();
        }
        for mailbox in &mailboxes {
            mailbox.store(MAILBOX_SHUTDOWN, Ordering::Release);
        }

        handles
            .into_iter()
            .map(|handle| handle.join().expect("evaluation worker panicked"))
            .collect()
    });

    let mut slots: Vec<Option<Chromosome<G, M>>> = (0..n_add).map(|_| None).collect();
    let mut attempts = 0;
    for (worker_attempts, produced) in results {
        attempts += worker_attempts;
        for (slot, chromosome) in produced {
            slots[slot] = Some(chromosome);
        }
    }
    (slots, attempts)
}
