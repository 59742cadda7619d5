//! Runs every collector through `RealFs` against a proc tree written to disk.

use std::collections::BTreeSet;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use procsnap::collector::{
    CollectError, CpuVmStatsCollector, DiskStatsCollector, MemoryStatsCollector, MockFs,
    ProcessTableCollector, RealFs,
};
use procsnap::model::{Detail, DetailPolicy, ParentDisk, ProcessFilter, ProcessState};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small host: one process, memory, cpu and two disks.
fn fake_host() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "proc/meminfo", "MemTotal: 16777216 kB\nMemFree: 8388608 kB\nSwapTotal: 0 kB\nSwapFree: 0 kB\n");
    write(
        root,
        "proc/stat",
        "cpu  100 2 30 400 5 6 7 8\nintr 99 1 2\nctxt 77\nbtime 1700000000\nprocesses 12\nprocs_running 1\nprocs_blocked 0\n",
    );
    write(root, "proc/vmstat", "pgpgin 11\npgpgout 22\npswpin 0\npswpout 0\n");
    write(
        root,
        "proc/diskstats",
        "   8       0 sda 10 0 80 1 20 0 160 2 0 3 3 0 0 0 0\n   8       1 sda1 9 0 72 1 19 0 152 2 0 3 3 0 0 0 0\n 253       0 dm-0 4 0 32 0 4 0 32 0 0 1 1\n",
    );
    fs::create_dir_all(root.join("sys/block/sda")).unwrap();
    fs::create_dir_all(root.join("sys/block/dm-0")).unwrap();

    write(
        root,
        "proc/4242/stat",
        "4242 (worker) D 1 4242 4242 0 -1 4194304 10 0 1 0 250 50 0 0 20 5 3 0 9000 1000000 100 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 3 0 0 0 0 0",
    );
    write(
        root,
        "proc/4242/status",
        "Name:\tworker\nUid:\t1\t2\t3\t4\nGid:\t5\t6\t7\t8\nVmRSS:\t 400 kB\n",
    );
    write(root, "proc/4242/cmdline", "worker\0--threads\03\0");
    write(root, "proc/4242/environ", "LANG=C\0");
    write(root, "proc/4242/statm", "250 100 10 5 0 50 0\n");
    fs::create_dir_all(root.join("proc/self")).unwrap();

    dir
}

#[test]
fn process_table_from_disk() {
    let host = fake_host();
    let proc_path = host.path().join("proc");
    let owner = fs::metadata(proc_path.join("4242")).unwrap().uid();

    let collector = ProcessTableCollector::new(RealFs::new(), &proc_path).with_page_size(4096);
    let records = collector.scan(&DetailPolicy::full()).unwrap();

    assert_eq!(records.len(), 1);
    let worker = &records[0];
    assert_eq!(worker.pid, 4242);
    assert_eq!(worker.uid, owner);
    assert_eq!(worker.comm, "worker");
    assert_eq!(worker.state, ProcessState::DiskSleep);
    assert_eq!(worker.nice, 5);
    assert_eq!(worker.num_threads, 3);
    assert_eq!(worker.processor, 3);
    assert_eq!(
        worker.cmdline,
        Detail::Collected(vec![
            "worker".to_string(),
            "--threads".to_string(),
            "3".to_string()
        ])
    );
    assert_eq!(worker.memory.as_collected().unwrap().resident_kb, 400);
    assert_eq!(worker.status.as_collected().unwrap().fs_gid, 8);

    let basic = collector.scan(&DetailPolicy::basic()).unwrap();
    assert!(basic[0].environ.is_not_requested());
}

#[test]
fn process_filter_on_missing_pid_is_empty() {
    let host = fake_host();
    let collector = ProcessTableCollector::new(RealFs::new(), host.path().join("proc"));

    let policy = DetailPolicy::basic().with_filter(ProcessFilter::Pids(BTreeSet::from([31337])));

    assert!(collector.scan(&policy).unwrap().is_empty());
}

#[test]
fn memory_from_disk() {
    let host = fake_host();
    let collector = MemoryStatsCollector::new(RealFs::new(), host.path().join("proc"));

    let mem = collector.collect(20).unwrap();

    assert_eq!(mem.main_total, 16384);
    assert_eq!(mem.main_free, 8192);
    assert_eq!(mem.main_used, 8192);
}

#[test]
fn cpu_vm_from_disk() {
    let host = fake_host();
    let collector = CpuVmStatsCollector::new(RealFs::new(), host.path().join("proc"));

    let stats = collector.collect().unwrap();

    assert_eq!(stats.cpu.as_array(), [100, 2, 30, 400, 5, 6, 7, 8]);
    assert_eq!((stats.pgpgin, stats.pgpgout), (11, 22));
    assert_eq!(stats.interrupts, 99);
    assert_eq!(stats.context_switches, 77);
}

#[test]
fn disks_from_disk() {
    let host = fake_host();
    let collector = DiskStatsCollector::new(
        RealFs::new(),
        host.path().join("proc"),
        host.path().join("sys"),
    );

    let snapshot = collector.collect().unwrap();

    let disks: Vec<_> = snapshot.disks.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(disks, vec!["sda", "dm-0"]);
    assert_eq!(snapshot.disk("sda").unwrap().partitions, 1);
    assert_eq!(
        snapshot.partitions[0].parent,
        ParentDisk::Disk("sda".to_string())
    );
}

#[test]
fn saved_proc_tree_replays_through_mock_fs() {
    let host = fake_host();
    let fs = MockFs::from_snapshot(&host.path().join("proc")).unwrap();

    let records = ProcessTableCollector::new(fs.clone(), "/proc")
        .with_page_size(4096)
        .scan(&DetailPolicy::full())
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].pid, 4242);
    assert_eq!(records[0].uid, 0);
    assert_eq!(records[0].comm, "worker");
    assert_eq!(records[0].memory.as_collected().unwrap().size_kb, 1000);
    assert_eq!(
        records[0].environ.as_collected().unwrap().get("LANG").map(String::as_str),
        Some("C")
    );

    let mem = MemoryStatsCollector::new(fs.clone(), "/proc").collect(10).unwrap();
    assert_eq!(mem.main_total, 16777216);

    let stats = CpuVmStatsCollector::new(fs, "/proc").collect().unwrap();
    assert_eq!(stats.processes, 12);
}

#[test]
fn missing_proc_tree_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let proc_path = dir.path().join("proc");

    assert!(matches!(
        MemoryStatsCollector::new(RealFs::new(), &proc_path).collect(10),
        Err(CollectError::SourceUnavailable { .. })
    ));
    assert!(matches!(
        CpuVmStatsCollector::new(RealFs::new(), &proc_path).collect(),
        Err(CollectError::SourceUnavailable { .. })
    ));
    assert!(matches!(
        ProcessTableCollector::new(RealFs::new(), &proc_path).scan(&DetailPolicy::basic()),
        Err(CollectError::SourceUnavailable { .. })
    ));
}

#[cfg(target_os = "linux")]
#[test]
fn live_proc_contains_this_process() {
    let pid = std::process::id();
    let collector = ProcessTableCollector::new(RealFs::new(), "/proc");
    let policy = DetailPolicy::basic()
        .with_cmdline()
        .with_filter(ProcessFilter::Pids(BTreeSet::from([pid])));

    let records = collector.scan(&policy).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].pid, pid);
    assert!(records[0].cmdline.is_collected());
}

#[cfg(target_os = "linux")]
#[test]
fn live_meminfo_and_stat() {
    let mem = MemoryStatsCollector::new(RealFs::new(), "/proc")
        .collect(10)
        .unwrap();
    assert!(mem.main_total > 0);
    assert!(mem.main_free <= mem.main_total);

    let stats = CpuVmStatsCollector::new(RealFs::new(), "/proc")
        .collect()
        .unwrap();
    assert!(stats.boot_time > 0);
}
