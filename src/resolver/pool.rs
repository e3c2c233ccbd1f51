use crossbeam_channel::unbounded;
use std::thread;

/// Run `work` over `jobs` on at most `limit` worker threads.
///
/// Jobs are queued in submission order and workers pull from the shared
/// queue. Each result lands in the slot of its job's original index, so the
/// returned vector lines up with `jobs` whatever order the work finishes in.
pub fn run_bounded<T, R, F>(jobs: Vec<T>, limit: usize, work: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let total = jobs.len();
    if total == 0 {
        return Vec::new();
    }
    let workers = limit.clamp(1, total);

    let (job_tx, job_rx) = unbounded::<(usize, T)>();
    for job in jobs.into_iter().enumerate() {
        // the receiver is alive for the whole function
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let (result_tx, result_rx) = unbounded::<(usize, R)>();
    let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let work = &work;
            scope.spawn(move || {
                for (index, job) in job_rx.iter() {
                    if result_tx.send((index, work(job))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        for (index, result) in result_rx.iter() {
            slots[index] = Some(result);
        }
    });

    tracing::trace!("{} job(s) finished on {} worker(s)", total, workers);
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn results_follow_submission_order() {
        let jobs: Vec<u64> = (0..20).collect();
        // later jobs finish first
        let results = run_bounded(jobs, 4, |n| {
            thread::sleep(Duration::from_millis(20 - n));
            n * 10
        });
        assert_eq!(results, (0..20).map(|n| n * 10).collect::<Vec<_>>());
    }

    #[test]
    fn never_exceeds_limit() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        run_bounded((0..16).collect::<Vec<_>>(), 3, |_: i32| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {peak}");
        assert!(peak >= 1);
    }

    #[test]
    fn zero_limit_still_runs() {
        assert_eq!(run_bounded(vec![1, 2, 3], 0, |n| n + 1), vec![2, 3, 4]);
    }

    #[test]
    fn empty_input() {
        let results: Vec<i32> = run_bounded(Vec::<i32>::new(), 8, |n| n);
        assert!(results.is_empty());
    }
}
