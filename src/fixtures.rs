//! Fixture generation.
//!
//! Every input the verification program and the hardcore suite read is written here, in one pass, before anything
//! is compiled. Deterministic fixtures come from the shared catalog; the binary and fuzz fixtures are drawn from an
//! RNG that is seeded only when the caller asks for reproducibility.

use std::fs;
use std::path::PathBuf;

use linecheck_core::catalog::{
    self, BINARY_FILE, BINARY_LEN, FUZZ_FILE, FUZZ_MAX_SEGMENT, FUZZ_MIN_SEGMENT, FUZZ_SEGMENTS, HUGE_FILE,
    HUGE_FILE_LINES, HUGE_LINE_CHAR, HUGE_LINE_FILE, HUGE_LINE_LEN, PRINTABLE,
};
use linecheck_core::{DETERMINISTIC_FIXTURES, Variant};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::errors::{HarnessError, HarnessResult};

/// Line statistics of a fixture, as a correct line reader would report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FixtureStats {
    /// Lines returned before end-of-stream, counting an unterminated last line.
    pub lines: u64,
    pub bytes: u64,
    pub longest_line: u64,
}

impl FixtureStats {
    pub fn of(content: &[u8]) -> Self {
        let mut stats = FixtureStats {
            bytes: content.len() as u64,
            ..FixtureStats::default()
        };
        let mut current = 0u64;
        for &byte in content {
            current += 1;
            if byte == b'\n' {
                stats.lines += 1;
                stats.longest_line = stats.longest_line.max(current);
                current = 0;
            }
        }
        if current > 0 {
            stats.lines += 1;
            stats.longest_line = stats.longest_line.max(current);
        }
        stats
    }
}

/// How the fuzz fixture was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FuzzRecord {
    pub segments: usize,
    /// Sum of all segment lengths.
    pub segment_bytes: usize,
    /// Newlines appended after segments.
    pub terminators: usize,
}

impl FuzzRecord {
    /// Size the fuzz file must have.
    pub fn total_bytes(&self) -> usize {
        self.segment_bytes + self.terminators
    }
}

/// One file written by [`FixtureStore::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFixture {
    pub name: String,
    pub path: PathBuf,
    /// `None` for content with no meaningful line structure (the binary fixture).
    pub stats: Option<FixtureStats>,
}

/// Everything a run generated, in generation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureManifest {
    pub dir: PathBuf,
    pub fixtures: Vec<GeneratedFixture>,
    pub fuzz: FuzzRecord,
    /// Stress fixture paths, index order; empty for the single variant.
    pub stress_files: Vec<PathBuf>,
    pub seed: Option<u64>,
}

impl FixtureManifest {
    pub fn get(&self, name: &str) -> Option<&GeneratedFixture> {
        self.fixtures.iter().find(|f| f.name == name)
    }

    pub fn stats(&self, name: &str) -> Option<FixtureStats> {
        self.get(name).and_then(|f| f.stats)
    }
}

/// Writes fixtures into a single directory.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    dir: PathBuf,
}

impl FixtureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Generate every fixture `variant` needs.
    ///
    /// Deterministic fixtures are byte-identical on every call. The randomized ones are reproducible only when
    /// `seed` is given.
    #[tracing::instrument(skip_all, fields(dir = %self.dir.display(), variant = %variant))]
    pub fn generate(
        &self,
        variant: Variant,
        stress_descriptors: usize,
        seed: Option<u64>,
    ) -> HarnessResult<FixtureManifest> {
        let manifest = match seed {
            Some(seed) => {
                let mut rng = ChaCha20Rng::seed_from_u64(seed);
                self.generate_with(&mut rng, variant, stress_descriptors)?
            }
            None => self.generate_with(&mut rand::thread_rng(), variant, stress_descriptors)?,
        };
        tracing::info!(count = manifest.fixtures.len(), "fixtures generated");
        Ok(FixtureManifest { seed, ..manifest })
    }

    /// Generate every fixture, drawing randomized content from `rng`.
    pub fn generate_with<R: Rng>(
        &self,
        rng: &mut R,
        variant: Variant,
        stress_descriptors: usize,
    ) -> HarnessResult<FixtureManifest> {
        fs::create_dir_all(&self.dir).map_err(|source| HarnessError::Fixture {
            path: self.dir.clone(),
            source,
        })?;

        let mut fixtures = Vec::new();
        for spec in DETERMINISTIC_FIXTURES {
            fixtures.push(self.write(spec.name, spec.content.as_bytes(), true)?);
        }

        let mut huge_line = vec![HUGE_LINE_CHAR; HUGE_LINE_LEN];
        huge_line.push(b'\n');
        fixtures.push(self.write(HUGE_LINE_FILE, &huge_line, true)?);

        let huge_file: String = (0..HUGE_FILE_LINES).map(catalog::huge_file_line).collect();
        fixtures.push(self.write(HUGE_FILE, huge_file.as_bytes(), true)?);

        let mut binary = vec![0u8; BINARY_LEN];
        rng.fill(binary.as_mut_slice());
        fixtures.push(self.write(BINARY_FILE, &binary, false)?);

        let (fuzz, fuzz_record) = fuzz_content(rng);
        fixtures.push(self.write(FUZZ_FILE, &fuzz, true)?);

        let mut stress_files = Vec::new();
        if variant.is_multi() {
            for index in 0..stress_descriptors {
                let name = catalog::stress_file_name(index);
                let generated = self.write(&name, catalog::stress_content(index).as_bytes(), true)?;
                stress_files.push(generated.path.clone());
                fixtures.push(generated);
            }
        }

        Ok(FixtureManifest {
            dir: self.dir.clone(),
            fixtures,
            fuzz: fuzz_record,
            stress_files,
            seed: None,
        })
    }

    fn write(&self, name: &str, content: &[u8], line_oriented: bool) -> HarnessResult<GeneratedFixture> {
        let path = self.dir.join(name);
        fs::write(&path, content).map_err(|source| HarnessError::Fixture {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote fixture");
        Ok(GeneratedFixture {
            name: name.to_string(),
            path,
            stats: line_oriented.then(|| FixtureStats::of(content)),
        })
    }
}

/// Random printable segments, each followed by a newline with probability one half.
pub fn fuzz_content<R: Rng>(rng: &mut R) -> (Vec<u8>, FuzzRecord) {
    let mut content = Vec::new();
    let mut record = FuzzRecord {
        segments: FUZZ_SEGMENTS,
        ..FuzzRecord::default()
    };
    for _ in 0..FUZZ_SEGMENTS {
        let len = rng.gen_range(FUZZ_MIN_SEGMENT..=FUZZ_MAX_SEGMENT);
        content.extend((0..len).map(|_| PRINTABLE[rng.gen_range(0..PRINTABLE.len())]));
        record.segment_bytes += len;
        if rng.gen_bool(0.5) {
            content.push(b'\n');
            record.terminators += 1;
        }
    }
    (content, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_stats_of_terminated_and_unterminated() {
        assert_eq!(
            FixtureStats::of(b"Hello\nWorld\n"),
            FixtureStats {
                lines: 2,
                bytes: 12,
                longest_line: 6
            }
        );
        assert_eq!(
            FixtureStats::of(b"LastLine"),
            FixtureStats {
                lines: 1,
                bytes: 8,
                longest_line: 8
            }
        );
        assert_eq!(FixtureStats::of(b""), FixtureStats::default());
        assert_eq!(FixtureStats::of(b"\n\n").lines, 2);
    }

    #[test]
    fn test_generate_writes_catalog() {
        let dir = tempdir().unwrap();
        let store = FixtureStore::new(dir.path());
        let manifest = store.generate(Variant::Single, 30, Some(7)).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("test1.txt")).unwrap(), "Hello\nWorld\n");
        assert_eq!(fs::read_to_string(dir.path().join("test2.txt")).unwrap(), "LastLine");
        assert_eq!(fs::read(dir.path().join("empty.txt")).unwrap().len(), 0);
        assert_eq!(fs::read_to_string(dir.path().join("small.txt")).unwrap(), "ABC\n");
        assert!(manifest.stress_files.is_empty());
        assert!(!dir.path().join("stress0.txt").exists());
        assert_eq!(manifest.seed, Some(7));
    }

    #[test]
    fn test_huge_fixtures() {
        let dir = tempdir().unwrap();
        let manifest = FixtureStore::new(dir.path()).generate(Variant::Single, 1, None).unwrap();

        let huge_line = fs::read(dir.path().join(HUGE_LINE_FILE)).unwrap();
        assert_eq!(huge_line.len(), 1_000_001);
        assert!(huge_line[..1_000_000].iter().all(|&b| b == b'A'));
        assert_eq!(huge_line.last(), Some(&b'\n'));

        let stats = manifest.stats(HUGE_FILE).unwrap();
        assert_eq!(stats.lines, 100_000);
        let huge_file = fs::read_to_string(dir.path().join(HUGE_FILE)).unwrap();
        assert!(huge_file.starts_with("Line0\nLine1\n"));
        assert!(huge_file.ends_with("Line99999\n"));
        assert_eq!(stats.bytes, huge_file.len() as u64);
    }

    #[test]
    fn test_binary_and_fuzz_shape() {
        let dir = tempdir().unwrap();
        let manifest = FixtureStore::new(dir.path()).generate(Variant::Single, 1, Some(1)).unwrap();

        assert_eq!(fs::read(dir.path().join(BINARY_FILE)).unwrap().len(), 1024);
        assert_eq!(manifest.stats(BINARY_FILE), None);

        let fuzz = fs::read(dir.path().join(FUZZ_FILE)).unwrap();
        assert_eq!(fuzz.len(), manifest.fuzz.total_bytes());
        assert_eq!(manifest.fuzz.segments, 5000);
        assert!(fuzz.iter().all(|b| PRINTABLE.contains(b)));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        FixtureStore::new(a.path()).generate(Variant::Single, 1, Some(99)).unwrap();
        FixtureStore::new(b.path()).generate(Variant::Single, 1, Some(99)).unwrap();
        for name in [BINARY_FILE, FUZZ_FILE] {
            assert_eq!(fs::read(a.path().join(name)).unwrap(), fs::read(b.path().join(name)).unwrap());
        }
    }

    #[test]
    fn test_regeneration_overwrites_deterministic_fixtures() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test1.txt"), "tampered").unwrap();
        FixtureStore::new(dir.path()).generate(Variant::Single, 1, None).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("test1.txt")).unwrap(), "Hello\nWorld\n");
    }

    #[test]
    fn test_deterministic_fixtures_are_byte_identical_across_generations() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let a = FixtureStore::new(first.path()).generate(Variant::Multi, 4, None).unwrap();
        let b = FixtureStore::new(second.path()).generate(Variant::Multi, 4, None).unwrap();
        assert_eq!(a.stress_files.len(), 4);
        assert_eq!(b.stress_files.len(), 4);

        let mut names: Vec<String> = DETERMINISTIC_FIXTURES.iter().map(|f| f.name.to_string()).collect();
        names.push(HUGE_LINE_FILE.to_string());
        names.push(HUGE_FILE.to_string());
        names.extend((0..4).map(catalog::stress_file_name));
        for name in &names {
            let left = fs::read(first.path().join(name)).unwrap();
            let right = fs::read(second.path().join(name)).unwrap();
            assert!(left == right, "{name} differs between generations");
        }

        // A second pass over the same directory leaves the same bytes behind.
        FixtureStore::new(first.path()).generate(Variant::Multi, 4, None).unwrap();
        for name in &names {
            assert!(
                fs::read(first.path().join(name)).unwrap() == fs::read(second.path().join(name)).unwrap(),
                "{name} changed on regeneration"
            );
        }
    }

    #[test]
    fn test_multi_writes_stress_files() {
        let dir = tempdir().unwrap();
        let manifest = FixtureStore::new(dir.path()).generate(Variant::Multi, 3, None).unwrap();
        assert_eq!(manifest.stress_files.len(), 3);
        assert_eq!(fs::read_to_string(dir.path().join("stress2.txt")).unwrap(), "Stress2\nOK2\n");
        assert_eq!(fs::read_to_string(dir.path().join("multi2.txt")).unwrap(), "AAA\nBBB\n");
    }

    #[test]
    fn test_unwritable_dir_is_fixture_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();
        let err = FixtureStore::new(blocker.join("fixtures"))
            .generate(Variant::Single, 1, None)
            .unwrap_err();
        assert!(matches!(err, HarnessError::Fixture { .. }));
    }
}
