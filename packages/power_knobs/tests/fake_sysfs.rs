//! Integration tests that drive the tool against a fake control file tree.
//!
//! Every test builds a throwaway directory laid out like `/sys` on the reference platform and
//! points the configuration at it.

#![cfg(not(miri))]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use power_knobs::{
    Knob, KnobError, PlatformConfig, RunInput, RunOutcome, SmtStatus, run, smt_status,
};
use tempfile::TempDir;

const PHYSICAL_CORES: u32 = 8;

/// A fake `/sys` tree with every logical core online and plausible power settings.
struct FakeSysfs {
    dir: TempDir,
    config: PlatformConfig,
}

impl FakeSysfs {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = PlatformConfig::default().rerooted(dir.path());

        for cpu in 0..PHYSICAL_CORES * 2 {
            let cpu_dir = config.cpu_root().join(format!("cpu{cpu}"));
            fs::create_dir_all(&cpu_dir).unwrap();
            fs::write(cpu_dir.join("online"), "1\n").unwrap();
        }

        for (path, value) in [
            (config.spl_control(), "15\n"),
            (config.fppt_control(), "15\n"),
            (config.sppt_control(), "15\n"),
            (config.profile_control(), "quiet\n"),
            (config.charge_control(), "80\n"),
            (config.boost_control(), "1\n"),
        ] {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, value).unwrap();
        }

        Self { dir, config }
    }

    fn online_path(&self, cpu: u32) -> PathBuf {
        let cpu_dir = self.config.cpu_root().join(format!("cpu{cpu}"));
        cpu_dir.join("online")
    }

    fn set_online(&self, cpu: u32, value: &str) {
        fs::write(self.online_path(cpu), value).unwrap();
    }

    fn online(&self, cpu: u32) -> String {
        read_trimmed(&self.online_path(cpu))
    }

    fn input(&self) -> RunInput {
        RunInput::new(self.config.clone())
    }
}

fn read_trimmed(path: &Path) -> String {
    fs::read_to_string(path).unwrap().trim().to_string()
}

#[test]
fn core_count_with_smt_on() {
    let sysfs = FakeSysfs::new();

    let outcome = run(&RunInput {
        cores: Some(4),
        ..sysfs.input()
    });

    assert!(outcome.succeeded());
    for cpu in 1..PHYSICAL_CORES {
        let expected = if cpu < 4 { "1" } else { "0" };

        assert_eq!(sysfs.online(cpu), expected, "cpu{cpu}");
        assert_eq!(
            sysfs.online(cpu + PHYSICAL_CORES),
            expected,
            "sibling of cpu{cpu}"
        );
    }
    assert_eq!(sysfs.online(0), "1");
    assert_eq!(sysfs.online(PHYSICAL_CORES), "1");
}

#[test]
fn core_count_with_smt_off_keeps_siblings_offline() {
    let sysfs = FakeSysfs::new();
    for cpu in PHYSICAL_CORES..PHYSICAL_CORES * 2 {
        sysfs.set_online(cpu, "0");
    }
    sysfs.set_online(2, "0");

    let outcome = run(&RunInput {
        cores: Some(8),
        ..sysfs.input()
    });

    assert!(outcome.succeeded());
    for cpu in 1..PHYSICAL_CORES {
        assert_eq!(sysfs.online(cpu), "1");
        assert_eq!(sysfs.online(cpu + PHYSICAL_CORES), "0");
    }
}

#[test]
fn smt_on_skips_offline_cores() {
    let sysfs = FakeSysfs::new();
    for cpu in PHYSICAL_CORES..PHYSICAL_CORES * 2 {
        sysfs.set_online(cpu, "0");
    }
    sysfs.set_online(5, "0");

    let outcome = run(&RunInput {
        smt: Some(1),
        ..sysfs.input()
    });

    assert!(outcome.succeeded());
    assert_eq!(sysfs.online(5 + PHYSICAL_CORES), "0");
    for cpu in (0..PHYSICAL_CORES).filter(|&cpu| cpu != 5) {
        assert_eq!(
            sysfs.online(cpu + PHYSICAL_CORES),
            "1",
            "sibling of cpu{cpu}"
        );
    }
}

#[test]
fn smt_status_follows_sibling_pairs() {
    let sysfs = FakeSysfs::new();
    assert!(matches!(smt_status(&sysfs.config), SmtStatus::On));

    sysfs.set_online(12, "0");
    assert!(matches!(smt_status(&sysfs.config), SmtStatus::Off));

    fs::remove_file(sysfs.online_path(12)).unwrap();
    let status = smt_status(&sysfs.config);
    assert!(matches!(status, SmtStatus::Indeterminate(_)));
}

#[test]
fn missing_core_is_reported_but_others_are_written() {
    let sysfs = FakeSysfs::new();
    fs::remove_dir_all(sysfs.config.cpu_root().join("cpu3")).unwrap();

    let outcome = run(&RunInput {
        cores: Some(2),
        ..sysfs.input()
    });

    let RunOutcome::Applied(outcomes) = outcome else {
        panic!("expected applied outcome");
    };
    let Err(KnobError::Aggregate(failure)) = &outcomes[0].result else {
        panic!("expected aggregate failure, got {:?}", outcomes[0].result);
    };

    // cpu3 is the primary of the third managed core, position 4 in the interleaved sequence.
    assert_eq!(failure.failures().len(), 1);
    assert_eq!(failure.failures()[0].unit(), 4);

    // The failing write must not have been created either.
    assert!(!sysfs.online_path(3).exists());

    for cpu in (4..PHYSICAL_CORES).chain(PHYSICAL_CORES + 2..PHYSICAL_CORES * 2) {
        let path = sysfs.online_path(cpu);
        assert_eq!(read_trimmed(&path), "0", "{}", path.display());
    }
}

#[test]
fn tdp_charge_and_boost() {
    let sysfs = FakeSysfs::new();

    let outcome = run(&RunInput {
        tdp: Some(25),
        charge: Some(60),
        boost: Some(0),
        ..sysfs.input()
    });

    assert!(outcome.succeeded());
    assert_eq!(read_trimmed(sysfs.config.profile_control()), "performance");
    assert_eq!(read_trimmed(sysfs.config.spl_control()), "25");
    assert_eq!(read_trimmed(sysfs.config.fppt_control()), "25");
    assert_eq!(read_trimmed(sysfs.config.sppt_control()), "25");
    assert_eq!(read_trimmed(sysfs.config.charge_control()), "60");
    assert_eq!(read_trimmed(sysfs.config.boost_control()), "0");
}

#[test]
fn out_of_range_values_change_nothing() {
    let sysfs = FakeSysfs::new();

    let outcome = run(&RunInput {
        cores: Some(1),
        charge: Some(101),
        ..sysfs.input()
    });

    let RunOutcome::Applied(outcomes) = outcome else {
        panic!("expected applied outcome");
    };
    for outcome in &outcomes {
        assert!(matches!(outcome.result, Err(KnobError::Range(_))));
    }
    assert_eq!(outcomes[0].knob, Knob::Cores);
    assert_eq!(read_trimmed(sysfs.config.charge_control()), "80");
    for cpu in 0..PHYSICAL_CORES * 2 {
        assert_eq!(sysfs.online(cpu), "1");
    }
}

#[test]
fn status_report_reads_the_tree() {
    let sysfs = FakeSysfs::new();
    sysfs.set_online(6, "0");
    sysfs.set_online(7, "0");
    sysfs.set_online(14, "0");
    sysfs.set_online(15, "0");

    let outcome = run(&RunInput {
        json: true,
        ..sysfs.input()
    });

    let RunOutcome::Status(report) = outcome else {
        panic!("expected status outcome");
    };
    assert_eq!(report.cores.as_deref(), Some("6"));
    assert_eq!(report.smt.as_deref(), Some("on"));
    assert_eq!(report.tdp.as_deref(), Some("15"));
    assert_eq!(report.charge.as_deref(), Some("80"));
    assert_eq!(report.boost.as_deref(), Some("1"));
}

#[test]
fn binary_without_arguments_prints_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_power-knobs"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--cores"), "{stdout}");
}

#[test]
fn binary_prints_json_status() {
    let sysfs = FakeSysfs::new();

    let output = Command::new(env!("CARGO_BIN_EXE_power-knobs"))
        .arg("--json")
        .arg("--sysfs-root")
        .arg(sysfs.dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"smt\": \"on\""), "{stdout}");
    assert!(stdout.starts_with("{\n \"cores\": \"8\",\n"), "{stdout}");
}

#[test]
fn binary_reports_input_errors_and_continues() {
    let sysfs = FakeSysfs::new();

    let output = Command::new(env!("CARGO_BIN_EXE_power-knobs"))
        .args(["--cores", "9", "--boost", "0", "--sysfs-root"])
        .arg(sysfs.dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Input error: -cores 9 is out of range (2 - 8)"),
        "{stdout}"
    );
    assert_eq!(read_trimmed(sysfs.config.boost_control()), "0");
}
