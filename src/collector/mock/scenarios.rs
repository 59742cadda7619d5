//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` filesystem states
//! for testing various system conditions.

use super::filesystem::MockFs;

#[allow(dead_code)]
impl MockFs {
    /// Creates a typical modern system with a few processes.
    ///
    /// Includes: systemd (PID 1), kthreadd (PID 2), a bash shell (PID 1000)
    /// and a running `cat` (PID 1001), plus every system-wide source and
    /// `/sys/block` entries for sda, nvme0n1 and loop0.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
Active:          4096000 kB
Inactive:        2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
Dirty:              1024 kB
Writeback:             0 kB
Mapped:           300000 kB
Slab:             512000 kB
SReclaimable:     256000 kB
PageTables:        40000 kB
Committed_AS:    6000000 kB
HugePages_Total:       0
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 50 0 0
cpu0 2500 125 750 20000 250 50 25 12 0 0
cpu1 2500 125 750 20000 250 50 25 13 0 0
cpu2 2500 125 750 20000 250 50 25 12 0 0
cpu3 2500 125 750 20000 250 50 25 13 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
softirq 300000 0 100000 0 50000 0 0 100000 0 0 50000
",
        );
        fs.add_file(
            "/proc/vmstat",
            "\
nr_free_pages 2048000
pgpgin 123456
pgpgout 654321
pswpin 100
pswpout 200
pgfault 999999
pgmajfault 1234
",
        );

        fs.add_file(
            "/proc/diskstats",
            "\
   7       0 loop0 50 0 400 10 0 0 0 0 0 10 10 0 0 0 0
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0
   8       2 sda2 2000 20 180000 900 1700 10 56000 450 0 480 1400 0 0 0 0
 259       0 nvme0n1 50000 200 2000000 10000 30000 150 1500000 8000 5 15000 18000 0 0 0 0
 259       1 nvme0n1p1 49000 190 1990000 9900 29000 140 1490000 7900 5 14900 17900 0 0 0 0
",
        );
        fs.add_dir("/sys/block/loop0");
        fs.add_dir("/sys/block/sda");
        fs.add_dir("/sys/block/nvme0n1");

        // PID 1 - init/systemd
        fs.add_process(
            1,
            0,
            "1 (systemd) S 0 1 1 0 -1 4194560 50000 1000000 100 500 1000 500 2000 1000 20 0 1 0 1 170000000 3000 18446744073709551615 0 0 0 0 0 0 0 0 1073745152 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "\
Name:\tsystemd
Pid:\t1
PPid:\t0
Uid:\t0\t0\t0\t0
Gid:\t0\t0\t0\t0
VmPeak:\t  200000 kB
VmSize:\t  170000 kB
VmLck:\t        0 kB
VmRSS:\t    12000 kB
VmData:\t   10000 kB
VmStk:\t      136 kB
VmExe:\t     1400 kB
VmLib:\t    10000 kB
VmSwap:\t        0 kB
voluntary_ctxt_switches:\t1000
nonvoluntary_ctxt_switches:\t100
",
        );
        fs.add_file("/proc/1/cmdline", "/sbin/init\0splash\0");
        fs.add_file("/proc/1/environ", "HOME=/\0TERM=linux\0");
        fs.add_file("/proc/1/statm", "42500 3000 2000 350 0 2600 0\n");

        // PID 2 - kernel thread, no memory map and an empty cmdline
        fs.add_process(
            2,
            0,
            "2 (kthreadd) S 0 0 0 0 -1 2129984 0 0 0 0 0 12 0 0 20 0 1 0 2 0 0 18446744073709551615 0 0 0 0 0 0 0 2147483647 0 0 0 0 17 1 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "\
Name:\tkthreadd
Pid:\t2
PPid:\t0
Uid:\t0\t0\t0\t0
Gid:\t0\t0\t0\t0
voluntary_ctxt_switches:\t3000
nonvoluntary_ctxt_switches:\t20
",
        );
        fs.add_file("/proc/2/cmdline", "");
        fs.add_file("/proc/2/environ", "");
        fs.add_file("/proc/2/statm", "0 0 0 0 0 0 0\n");

        // PID 1000 - bash shell
        fs.add_process(
            1000,
            1000,
            "1000 (bash) S 999 1000 1000 34816 1001 4194304 5000 50000 0 0 100 50 200 100 20 0 1 0 100000 25000000 2000 18446744073709551615 0 0 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "\
Name:\tbash
Pid:\t1000
PPid:\t999
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
VmPeak:\t   30000 kB
VmSize:\t   25000 kB
VmLck:\t        0 kB
VmRSS:\t    8000 kB
VmData:\t    2000 kB
VmStk:\t      136 kB
VmExe:\t     900 kB
VmLib:\t    3000 kB
VmSwap:\t        0 kB
voluntary_ctxt_switches:\t500
nonvoluntary_ctxt_switches:\t50
",
        );
        fs.add_file("/proc/1000/cmdline", "/bin/bash\0--login\0");
        fs.add_file(
            "/proc/1000/environ",
            "HOME=/home/user\0PATH=/usr/bin:/bin\0LANG=C.UTF-8\0",
        );
        fs.add_file("/proc/1000/statm", "6250 2000 500 225 0 800 0\n");

        // PID 1001 - cat command (child of bash)
        fs.add_process(
            1001,
            1000,
            "1001 (cat) R 1000 1000 1000 34816 1001 4194304 100 0 0 0 5 2 0 0 20 0 1 0 100100 5000000 500 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "\
Name:\tcat
Pid:\t1001
PPid:\t1000
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
VmPeak:\t    6000 kB
VmSize:\t    5000 kB
VmLck:\t        0 kB
VmRSS:\t    2000 kB
VmData:\t     200 kB
VmStk:\t      136 kB
VmExe:\t      20 kB
VmLib:\t    2000 kB
VmSwap:\t        0 kB
voluntary_ctxt_switches:\t10
nonvoluntary_ctxt_switches:\t2
",
        );
        fs.add_file("/proc/1001/cmdline", "/bin/cat\0file.txt\0");
        fs.add_file("/proc/1001/environ", "HOME=/home/user\0");
        fs.add_file("/proc/1001/statm", "1250 500 300 5 0 50 0\n");

        // Non-process entries that live next to the pid directories.
        fs.add_dir("/proc/sys");
        fs.add_dir("/proc/self");

        fs
    }

    /// Creates a system with memory pressure (low free memory, swap in use).
    pub fn memory_pressure() -> Self {
        let mut fs = Self::typical_system();

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:          256000 kB
MemAvailable:     512000 kB
Buffers:           64000 kB
Cached:           256000 kB
SwapCached:       128000 kB
Active:         12000000 kB
Inactive:        3000000 kB
SwapTotal:       4096000 kB
SwapFree:        1024000 kB
Dirty:            102400 kB
Writeback:         10240 kB
Slab:             800000 kB
SReclaimable:     200000 kB
",
        );

        fs
    }

    /// Creates a 2.4/early-2.6 era system.
    ///
    /// Four-column `cpu` line, `page`/`swap` lines in `/proc/stat`, no
    /// `/proc/vmstat`, 2.4 inactive-list accounting in `/proc/meminfo`,
    /// highmem lines, legacy seven-column partition lines and no `/sys/block`.
    pub fn legacy_kernel() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:        1034424 kB
MemFree:          120000 kB
Buffers:           40000 kB
Cached:           300000 kB
SwapCached:         1000 kB
Active:           500000 kB
Inact_dirty:       20000 kB
Inact_laundry:      5000 kB
Inact_clean:       30000 kB
Inact_target:      90000 kB
HighTotal:        131008 kB
HighFree:           2000 kB
LowTotal:         903416 kB
LowFree:          118000 kB
SwapTotal:       2096472 kB
SwapFree:        2000000 kB
ReverseMaps:       70000
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  4705 356 584 3699
cpu0 4705 356 584 3699
page 5741 1808
swap 1 0
intr 1462898 1462898 0 0 0
ctxt 115315
btime 769041601
processes 86031
",
        );
        fs.add_file(
            "/proc/diskstats",
            "\
   3    0 hda 446216 784926 9550688 4382310 424847 312726 5922052 19310380 0 3376340 23705160
   3    1 hda1 35486 38030 38030 38030
   3    2 hda2 180 360 0 0
",
        );

        fs.add_process(
            1,
            0,
            "1 (init) S 0 1 1 0 -1 256 200 0 20 0 100 50 0 0 15 0 1 0 5 1388544 120",
            "Name:\tinit\nUid:\t0\t0\t0\t0\nGid:\t0\t0\t0\t0\nVmSize:\t    1356 kB\n",
        );

        fs
    }

    /// Creates a system with a zombie process.
    pub fn with_zombie_process() -> Self {
        let mut fs = Self::typical_system();

        // Zombies have no memory map and an empty cmdline.
        fs.add_process(
            4000,
            1000,
            "4000 (defunct) Z 1000 4000 1000 0 -1 4194308 0 0 0 0 0 0 0 0 20 0 1 0 400000 0 0 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 -1 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "\
Name:\tdefunct
Pid:\t4000
PPid:\t1000
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
",
        );
        fs.add_file("/proc/4000/cmdline", "");
        fs.add_file("/proc/4000/statm", "0 0 0 0 0 0 0\n");

        fs
    }

    /// Creates a system with processes that have special characters in names.
    pub fn with_special_names() -> Self {
        let mut fs = Self::typical_system();

        // Process with spaces in name (like Firefox's "Web Content")
        fs.add_process(
            5000,
            1000,
            "5000 (Web Content) S 4999 5000 4999 0 -1 4194304 100000 0 500 0 5000 1000 0 0 20 0 20 0 500000 2000000000 50000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "Name:\tWeb Content\nUid:\t1000\t1000\t1000\t1000\nGid:\t1000\t1000\t1000\t1000\n",
        );
        fs.add_file(
            "/proc/5000/cmdline",
            "/usr/lib/firefox/firefox\0-contentproc\0",
        );

        // Process with parentheses in name
        fs.add_process(
            5001,
            1000,
            "5001 (test(1)) S 1 5001 5001 0 -1 4194304 1000 0 0 0 10 5 0 0 20 0 1 0 500100 10000000 1000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "Name:\ttest(1)\nUid:\t1000\t1000\t1000\t1000\nGid:\t1000\t1000\t1000\t1000\n",
        );
        fs.add_file("/proc/5001/cmdline", "/usr/bin/test(1)\0");

        fs
    }

    /// Creates a system where an unprivileged reader cannot see another
    /// user's `environ` and `statm`, as happens for root-owned processes.
    pub fn with_restricted_process() -> Self {
        let mut fs = Self::typical_system();
        fs.deny("/proc/1/environ");
        fs.deny("/proc/1/statm");
        fs
    }

    /// Creates a system where PID 1001 is listed in `/proc` but exits
    /// before its `stat` can be read.
    pub fn with_vanishing_process() -> Self {
        let mut fs = Self::typical_system();
        fs.remove("/proc/1001");
        // The directory entry is still enumerated, the contents are gone.
        fs.add_dir("/proc/1001");
        fs
    }
}
