/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Helpers shared by the integration tests: sample files, upstream s2e files
//! and shell scripts standing in for the backengines.

#![allow(dead_code)]

use simex_rs::config::{ExecutablePaths, PlatformConfig};
use simex_rs::parameters::{DetectorGeometry, DetectorPanel, PhotonBeamParameters};
use simex_rs::s2e::{new_document, write_tree, ContainerFormat, Group, S2eInfo};
use simex_rs::utils::{Energy, Length};
use std::fs;
use std::path::{Path, PathBuf};

/// Four atoms of a lysozyme residue plus a sulfur
pub const SAMPLE_PDB: &str = "\
ATOM      1  N   LYS A   1       3.294  10.164  10.266  1.00 11.18           N
ATOM      2  CA  LYS A   1       2.388  10.533   9.168  1.00  9.68           C
ATOM      3  C   LYS A   1       2.438   9.451   8.092  1.00  9.29           C
ATOM      4  O   LYS A   1       2.137   8.278   8.347  1.00 10.02           O
ATOM      5  SD  MET A  12       1.000   2.000   3.000  1.00 12.00           S
END
";

pub fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("sample.pdb");
    fs::write(&path, SAMPLE_PDB).unwrap();
    path
}

pub fn beam() -> PhotonBeamParameters {
    PhotonBeamParameters::new(
        Energy::from_electronvolts(4.96e3),
        1e-3,
        Energy::from_joules(2e-3),
    )
    .unwrap()
    .with_beam_diameter_fwhm(Length::from_meters(1e-7))
    .unwrap()
}

/// Propagation-like s2e file carrying `beam()` under `params/beam`
pub fn write_propagation_file(path: &Path) {
    let mut root = new_document(&S2eInfo::new("wavefront propagation", "wavefront")).unwrap();
    beam().write_s2e(root.ensure_group("params/beam").unwrap()).unwrap();
    write_tree(path, &root, ContainerFormat::Json).unwrap();
}

pub fn detector() -> DetectorGeometry {
    let panel =
        DetectorPanel::square(16, Length::from_meters(2.2e-4), Length::from_meters(0.13)).unwrap();
    DetectorGeometry::new(vec![panel]).unwrap()
}

pub fn config(xmdyn: &Path, pattern_sim: &Path) -> PlatformConfig {
    PlatformConfig {
        executables: ExecutablePaths {
            xmdyn: xmdyn.to_path_buf(),
            pattern_sim: pattern_sim.to_path_buf(),
        },
        storage: ContainerFormat::Json,
        mpi_launcher: "mpirun".to_string(),
    }
}

#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}

/// Stand-in for XMDYN: two snapshots built from `sample.xyz`
#[cfg(unix)]
pub fn fake_xmdyn(dir: &Path) -> PathBuf {
    write_script(
        &dir.join("xmdyn"),
        r#"#!/bin/sh
[ -f "$1" ] || exit 2
for step in 00000000 00000001; do
  d="snp/$step"
  mkdir -p "$d"
  awk -v d="$d" -v step="$step" 'NR > 2 {
    if ($1 == "H") { t = 0; z = 1 } else if ($1 == "C") { t = 1; z = 6 }
    else if ($1 == "N") { t = 2; z = 7 } else if ($1 == "O") { t = 3; z = 8 }
    else { t = 4; z = 16 }
    print z > (d "/Z.dat"); print t > (d "/T.dat"); print NR - 2 > (d "/uid.dat")
    printf "%e %e %e\n", $2 * 1e-10, $3 * 1e-10, $4 * 1e-10 > (d "/r.dat")
    print "0 0 0" > (d "/v.dat"); print z * 2 > (d "/m.dat"); print step + 0 > (d "/q.dat")
  }' sample.xyz
  printf "1 0.5 0.1\n6 4 2\n7 5 3\n8 6 4\n16 12 8\n" > "$d/f0.dat"
  printf "0 1 2\n" > "$d/Q.dat"
done
"#,
    )
}

/// Stand-in for XMDYN that fails with status 3
#[cfg(unix)]
pub fn failing_xmdyn(dir: &Path) -> PathBuf {
    write_script(&dir.join("xmdyn_failing"), "#!/bin/sh\necho 'no luck' >&2\nexit 3\n")
}

/// Stand-in for pattern_sim: copies `template` to every pattern file it is
/// asked for and records its arguments in `args.txt` next to the output
#[cfg(unix)]
pub fn fake_pattern_sim(dir: &Path, template: &Path) -> PathBuf {
    let body = format!(
        r#"#!/bin/sh
out=""
n=1
for a in "$@"; do
  case "$a" in
    --output=*) out="${{a#--output=}}" ;;
    --number=*) n="${{a#--number=}}" ;;
  esac
done
echo "$@" > "$(dirname "$out")/args.txt"
if [ "$n" -eq 1 ]; then
  cp "{template}" "$out"
else
  i=1
  while [ "$i" -le "$n" ]; do
    cp "{template}" "${{out%.h5}}-$i.h5"
    i=$((i + 1))
  done
fi
"#,
        template = template.display()
    );
    write_script(&dir.join("pattern_sim"), &body)
}

/// Native pattern_sim output holding a 16 x 16 pattern
pub fn write_pattern_template(path: &Path) {
    let mut pattern = Group::new();
    let data = ndarray::Array2::from_shape_fn((16, 16), |(i, j)| (i * 16 + j) as f64);
    pattern.insert_float("data/data", data.into_dyn()).unwrap();
    write_tree(path, &pattern, ContainerFormat::Json).unwrap();
}
