mod common;

use std::sync::{
    Arc, Mutex, mpsc,
    atomic::{AtomicU64, Ordering},
};

use common::{Gate, TIMEOUT, boot, spawn, wait_until};
use kproc::SchedulingPolicy;

#[test]
fn test_lower_priority_value_runs_first() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = mpsc::channel();
    let log = order.clone();
    boot(SchedulingPolicy::Priority, 1, move |k| {
        let gate = Gate::new();
        for priority in [5, 10, 5] {
            let gate = gate.clone();
            let log = log.clone();
            spawn(k, move |k| {
                k.set_priority(priority).unwrap();
                gate.arrive_and_wait(k);
                log.lock().unwrap().push(priority);
            })
            .unwrap();
        }
        gate.wait_arrivals(k, 3);
        gate.open(k);
        for _ in 0..3 {
            k.wait().unwrap();
        }
        tx.send(()).unwrap();
    });

    rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(*order.lock().unwrap(), vec![5, 5, 10]);
}

#[test]
fn test_priority_change_takes_effect() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = mpsc::channel();
    let log = order.clone();
    boot(SchedulingPolicy::Priority, 1, move |k| {
        let gate = Gate::new();
        for name in ["low", "high"] {
            let gate = gate.clone();
            let log = log.clone();
            spawn(k, move |k| {
                if name == "high" {
                    assert!(k.set_priority(201).is_err());
                    assert!(k.set_priority(-1).is_err());
                    k.set_priority(10).unwrap();
                }
                gate.arrive_and_wait(k);
                log.lock().unwrap().push(name);
            })
            .unwrap();
        }
        gate.wait_arrivals(k, 2);
        gate.open(k);
        for _ in 0..2 {
            k.wait().unwrap();
        }
        tx.send(()).unwrap();
    });

    rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["high", "low"]);
}

#[test]
fn test_lottery_shares_follow_tickets() {
    const TICKETS: [i32; 3] = [10, 20, 30];
    const ROUNDS: u64 = 3000;

    let (tx, rx) = mpsc::channel();
    boot(SchedulingPolicy::Lottery, 1, move |k| {
        let start = Gate::new();
        let done = Gate::new();
        let served = Arc::new(AtomicU64::new(0));
        let mut pids = Vec::new();
        for tickets in TICKETS {
            let start = start.clone();
            let done = done.clone();
            let served = served.clone();
            let pid = spawn(k, move |k| {
                k.set_tickets(tickets).unwrap();
                start.arrive_and_wait(k);
                // 每次从 yield 回来都是一次中签
                while served.fetch_add(1, Ordering::SeqCst) < ROUNDS {
                    k.yield_now();
                }
                done.arrive_and_wait(k);
            })
            .unwrap();
            pids.push(pid);
        }
        start.wait_arrivals(k, TICKETS.len());
        start.open(k);

        // 三个进程都睡在 done 上，快照里的 ticks 不再变化
        done.wait_arrivals(k, TICKETS.len());
        let stat = k.snapshot();
        let ticks: Vec<u64> = pids
            .iter()
            .map(|&pid| stat.find(pid).map_or(0, |row| row.ticks))
            .collect();
        done.open(k);
        for _ in 0..TICKETS.len() {
            k.wait().unwrap();
        }
        tx.send((pids, ticks)).unwrap();
    });

    let (pids, ticks) = rx.recv_timeout(TIMEOUT).unwrap();
    let total: u64 = ticks.iter().sum();
    assert!(total >= ROUNDS, "only {} dispatches", total);
    for (i, &tickets) in TICKETS.iter().enumerate() {
        let share = ticks[i] as f64 / total as f64;
        let expected = tickets as f64 / 60.0;
        assert!(
            (share - expected).abs() < 0.06,
            "pid {} got {:.3} of the CPU, expected {:.3}",
            pids[i],
            share,
            expected
        );
    }
}

#[test]
fn test_tickets_inherited_priority_reset() {
    let (tx, rx) = mpsc::channel();
    boot(SchedulingPolicy::Lottery, 2, move |k| {
        k.set_tickets(7).unwrap();
        k.set_priority(3).unwrap();
        let (child_tx, child_rx) = mpsc::channel();
        let child = spawn(k, move |k| {
            let me = k.current_pid().unwrap();
            let row = *k.snapshot().find(me).unwrap();
            child_tx.send((row.tickets, row.priority)).unwrap();
        })
        .unwrap();
        k.wait().unwrap();
        tx.send((child, child_rx.recv().unwrap())).unwrap();
    });

    let (_, (tickets, priority)) = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(tickets, 7);
    assert_eq!(priority, 50);
}

#[test]
fn test_snapshot_counts_dispatches() {
    let (pid_tx, pid_rx) = mpsc::channel();
    let pm = boot(SchedulingPolicy::Priority, 1, move |k| {
        let pid = spawn(k, |k| {
            for _ in 0..10 {
                k.yield_now();
            }
            common::park(k);
        })
        .unwrap();
        pid_tx.send(pid).unwrap();
    });

    let pid = pid_rx.recv_timeout(TIMEOUT).unwrap();
    // 每次 yield 回来都是一次新的调度
    assert!(wait_until(|| pm
        .snapshot()
        .find(pid)
        .is_some_and(|row| row.ticks >= 11)));
    let stat = pm.snapshot();
    let row = stat.find(pid).unwrap();
    assert!(row.in_use);
    assert_eq!(row.tickets, 1);
    assert_eq!(row.priority, 50);
    assert!(stat.to_string().contains(&format!("{:>4}", pid)));
}
