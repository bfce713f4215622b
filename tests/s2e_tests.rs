/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use ndarray::{arr1, Array3};
use simex_rs::s2e::{
    detect_format, link_parent, new_document, read_tree, validate_layout, write_tree,
    ContainerFormat, Dataset, S2eError, S2eInfo, S2E_FORMAT_VERSION,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_json_container_preserves_tree() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pmi_out_0000001.h5");

    let mut root = new_document(&S2eInfo::new("XMDYN", "snapshots")).unwrap();
    root.insert_float(
        "data/snp_0000001/r",
        Array3::<f64>::zeros((1, 4, 3)).into_dyn(),
    )
    .unwrap();
    root.insert(
        "data/snp_0000001/Z",
        Dataset::int(arr1(&[6_i64, 8]).into_dyn()).with_attr("units", "e"),
    )
    .unwrap();
    root.ensure_group("params/beam").unwrap().set_attr("source", "test");
    link_parent(&mut root, Path::new("prop/prop_out_0000001.h5")).unwrap();

    write_tree(&path, &root, ContainerFormat::Json).unwrap();
    assert_eq!(detect_format(&path).unwrap(), ContainerFormat::Json);

    let back = read_tree(&path).unwrap();
    assert_eq!(back, root);
    validate_layout(&back).unwrap();
    assert_eq!(back.float_scalar("version").unwrap(), S2E_FORMAT_VERSION);
    assert_eq!(
        back.float_array("data/snp_0000001/Z").unwrap().iter().copied().collect::<Vec<_>>(),
        vec![6.0, 8.0]
    );
}

#[test]
fn test_missing_container() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        read_tree(&dir.path().join("absent.h5")),
        Err(S2eError::Io { .. })
    ));
}

#[cfg(not(feature = "hdf5"))]
#[test]
fn test_hdf5_requires_feature() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("native.h5");
    fs::write(&path, b"\x89HDF\r\n\x1a\n\x00\x00\x00\x00").unwrap();
    assert_eq!(detect_format(&path).unwrap(), ContainerFormat::Hdf5);
    assert!(matches!(read_tree(&path), Err(S2eError::Hdf5Unavailable(_))));

    let root = new_document(&S2eInfo::new("m", "d")).unwrap();
    assert!(matches!(
        write_tree(&dir.path().join("out.h5"), &root, ContainerFormat::Hdf5),
        Err(S2eError::Hdf5Unavailable(_))
    ));
}

#[cfg(feature = "hdf5")]
#[test]
fn test_hdf5_container_preserves_tree() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("diffr_out_0000001.h5");
    let mut root = new_document(&S2eInfo::new("pattern_sim", "pattern")).unwrap();
    root.insert_float("data/data", Array3::<f64>::ones((2, 3, 4)).into_dyn())
        .unwrap();
    write_tree(&path, &root, ContainerFormat::Hdf5).unwrap();

    assert_eq!(detect_format(&path).unwrap(), ContainerFormat::Hdf5);
    let back = read_tree(&path).unwrap();
    validate_layout(&back).unwrap();
    assert_eq!(back.float_array("data/data").unwrap().shape(), &[2, 3, 4]);
}
