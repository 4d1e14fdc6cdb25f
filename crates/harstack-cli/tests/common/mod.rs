//! Synthetic wearable-sensor tables shared by the CLI integration tests.
#![allow(dead_code)]
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use harstack_classifiers::config::{CrossValidationConfig, ModelType};
use harstack_cli::pipeline::input::PipelineConfig;

pub const CLASSES: [&str; 5] = ["A", "B", "C", "D", "E"];
const HEADER: &str = "X,user_name,raw_timestamp_part_1,raw_timestamp_part_2,cvtd_timestamp,new_window,num_window,\
roll_belt,pitch_belt,yaw_belt,accel_arm_x,max_roll_belt";

fn sensors(class: usize, i: usize) -> [f64; 4] {
    let jitter = ((i * 37) % 11) as f64 * 0.1;
    let jitter2 = ((i * 13) % 7) as f64 * 0.1;
    let c = class as f64;
    [8.0 * c + jitter, 3.0 - 4.0 * c + jitter2, jitter * jitter2, 2.0 * c * c - jitter]
}

/// Write `pml-training.csv` (with an NA-bearing summary column) and
/// `pml-testing.csv` (with a `problem_id` column) into `dir`.
pub fn write_tables(dir: &Path, n_train: usize, n_test: usize) -> (PathBuf, PathBuf) {
    let mut train = format!("{},classe\n", HEADER);
    for i in 0..n_train {
        let class = i % CLASSES.len();
        let s = sensors(class, i);
        let max_roll = if i % 4 == 0 { "NA".to_string() } else { format!("{}", i) };
        writeln!(
            train,
            "{},carlitos,{},{},05/12/2011 11:23,no,{},{},{},{},{},{},{}",
            i + 1,
            1323084231 + i,
            788290 + i,
            11 + i % 7,
            s[0],
            s[1],
            s[2],
            s[3],
            max_roll,
            CLASSES[class]
        )
        .unwrap();
    }

    let mut test = format!("{},problem_id\n", HEADER);
    for i in 0..n_test {
        let s = sensors((i * 2) % CLASSES.len(), i + 500);
        writeln!(
            test,
            "{},pedro,{},{},05/12/2011 11:24,no,{},{},{},{},{},NA,{}",
            i + 1,
            1323095002 + i,
            868349 + i,
            74,
            s[0],
            s[1],
            s[2],
            s[3],
            i + 1
        )
        .unwrap();
    }

    let train_path = dir.join("pml-training.csv");
    let test_path = dir.join("pml-testing.csv");
    fs::write(&train_path, train).unwrap();
    fs::write(&test_path, test).unwrap();
    (train_path, test_path)
}

/// A configuration over the synthetic tables with a small CV budget.
pub fn quick_config(dir: &Path) -> PipelineConfig {
    let (train_path, test_path) = write_tables(dir, 100, 20);
    PipelineConfig {
        train_data: train_path.to_string_lossy().into_owned(),
        test_data: test_path.to_string_lossy().into_owned(),
        output_dir: dir.join("out").to_string_lossy().into_owned(),
        cv: CrossValidationConfig {
            folds: 2,
            repeats: 1,
            tune_length: 1,
        },
        ensemble: ModelType::RandomForest {
            n_trees: 25,
            max_features: None,
            max_depth: None,
            sample_fraction: 1.0,
        },
        seed: 42,
        n_threads: 2,
        ..PipelineConfig::default()
    }
}
