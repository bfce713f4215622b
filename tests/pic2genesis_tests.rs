/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use approx::assert_relative_eq;
use ndarray::arr1;
use simex_rs::converters::convert_pic_to_genesis;
use simex_rs::s2e::{write_tree, ContainerFormat, Dataset, Group};
use simex_rs::utils::constants::{ELECTRON_MASS, SPEED_OF_LIGHT};
use std::fs;
use tempfile::tempdir;

/// Electron bunch of three macro-particles at iterations 5 and 40
fn openpmd() -> Group {
    let mut root = Group::new();
    for (iteration, shift) in [("5", 0.0), ("40", 1.0)] {
        let base = format!("data/{}/particles/e", iteration);
        let records = [
            ("position/x", [shift, 1.0, 2.0]),
            ("position/y", [10.0, 20.0, 30.0]),
            ("position/z", [-1.0, 0.0, 1.0]),
            ("momentum/x", [0.0, 1.0, 0.0]),
            ("momentum/y", [100.0, 100.0, 100.0]),
            ("momentum/z", [0.0, 0.0, -1.0]),
        ];
        for (record, values) in records {
            let unit = if record.starts_with("position") { 1e-6 } else { ELECTRON_MASS * SPEED_OF_LIGHT };
            root.insert(
                &format!("{}/{}", base, record),
                Dataset::float(arr1(&values).into_dyn()).with_attr("unitSI", unit),
            )
            .unwrap();
        }
        let charge = root.ensure_group(&format!("{}/charge", base)).unwrap();
        charge.set_attr("value", -1.602e-19);
        charge.set_attr("unitSI", 1.0);
        root.insert(
            &format!("{}/particlePatches/numParticles", base),
            Dataset::int(arr1(&[1000_i64, 2000]).into_dyn()),
        )
        .unwrap();
    }
    root
}

#[test]
fn test_convert_pic_to_genesis() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("pic.h5");
    write_tree(&input, &openpmd(), ContainerFormat::Json).unwrap();
    let output = dir.path().join("beam.dist");

    let distribution = convert_pic_to_genesis(&input, &output).unwrap();
    assert_eq!(distribution.len(), 3);
    // last iteration (40) is used
    assert_relative_eq!(distribution.particles[[0, 0]], 1e-6, max_relative = 1e-12);
    assert_relative_eq!(distribution.particles[[1, 1]], (0.01f64).atan(), max_relative = 1e-12);
    assert_relative_eq!(distribution.particles[[2, 3]], (-0.01f64).atan(), max_relative = 1e-12);
    assert_relative_eq!(distribution.particles[[0, 5]], 100.0, max_relative = 1e-12);
    assert_relative_eq!(distribution.charge, -3000.0 * 1.602e-19, max_relative = 1e-12);

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "? VERSION = 1.0");
    assert_eq!(lines[1], "? SIZE = 3");
    assert_eq!(lines[2], "? CHARGE = -4.806000E-16");
    assert_eq!(lines[3], "? COLUMNS X XPRIME Y YPRIME T P");
    assert_eq!(lines.len(), 7);
    let t: f64 = lines[6].split_whitespace().nth(4).unwrap().parse().unwrap();
    assert_relative_eq!(t, 30e-6 / SPEED_OF_LIGHT, max_relative = 1e-12);
}

#[test]
fn test_missing_charge() {
    let dir = tempdir().unwrap();
    let mut root = openpmd();
    root.remove("data/40/particles/e/charge");
    let input = dir.path().join("pic.h5");
    write_tree(&input, &root, ContainerFormat::Json).unwrap();
    assert!(convert_pic_to_genesis(&input, &dir.path().join("beam.dist")).is_err());
}
