//! Batch planning for the upload set.
//!
//! Partitions files into batches that honor the per-batch byte and
//! file-count ceilings, packing larger files first so a failed batch
//! retries its most expensive transfers early.

use sitedeploy_assets::{FileRecord, PlatformLimits};

use crate::types::UploadBatch;

/// Packs the upload set into capacity-bounded batches.
///
/// Files are sorted by descending size (ties broken by path, keeping the
/// plan deterministic), and `limits.concurrency` empty batches are
/// pre-allocated so small deployments still spread across the worker
/// pool. Each file scans candidate batches from a rotating offset —
/// round-robin-like, to avoid skewing everything into batch 0 — and lands
/// in the first one with room under both ceilings. When nothing fits, a
/// new batch is appended seeded with that file.
///
/// An empty upload set yields zero batches.
pub fn plan_batches(mut files: Vec<FileRecord>, limits: &PlatformLimits) -> Vec<UploadBatch> {
    files.sort_by(|a, b| {
        b.size
            .cmp(&a.size)
            .then_with(|| a.logical_path.cmp(&b.logical_path))
    });

    let mut batches: Vec<UploadBatch> = (0..limits.concurrency)
        .map(|_| UploadBatch::new(limits.max_batch_bytes))
        .collect();

    let mut offset = 0usize;
    for file in files {
        // The indexer's per-file ceiling is below the batch byte ceiling,
        // so a file that fits no batch at all means inconsistent limits.
        debug_assert!(
            file.size <= limits.max_batch_bytes,
            "file {} ({} bytes) exceeds the batch byte ceiling",
            file.logical_path,
            file.size
        );
        let slot = (0..batches.len())
            .map(|i| (offset + i) % batches.len())
            .find(|&idx| batches[idx].fits(file.size, limits.max_batch_files));

        match slot {
            Some(idx) => batches[idx].push(file),
            None => {
                let mut batch = UploadBatch::new(limits.max_batch_bytes);
                batch.push(file);
                batches.push(batch);
            }
        }
        offset += 1;
    }

    batches.retain(|b| !b.is_empty());
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn record(path: &str, size: u64) -> FileRecord {
        let bytes = vec![0u8; size as usize];
        FileRecord {
            logical_path: path.into(),
            size,
            content_type: "application/octet-stream",
            fingerprint: sitedeploy_assets::fingerprint_bytes(path.as_bytes(), "bin"),
            bytes,
        }
    }

    fn tiny_limits() -> PlatformLimits {
        PlatformLimits {
            max_batch_bytes: 100,
            max_batch_files: 3,
            concurrency: 3,
            ..Default::default()
        }
    }

    #[test]
    fn empty_upload_set_yields_zero_batches() {
        let batches = plan_batches(Vec::new(), &tiny_limits());
        assert!(batches.is_empty());
    }

    #[test]
    fn every_file_lands_in_exactly_one_batch() {
        let files: Vec<FileRecord> = (0..20)
            .map(|i| record(&format!("f{i}.bin"), 10 + i))
            .collect();
        let total_bytes: u64 = files.iter().map(|f| f.size).sum();

        let batches = plan_batches(files, &tiny_limits());

        let planned_bytes: u64 = batches.iter().map(|b| b.byte_size()).sum();
        assert_eq!(planned_bytes, total_bytes);

        let mut seen = HashSet::new();
        for batch in &batches {
            for file in batch.files() {
                assert!(seen.insert(file.logical_path.clone()), "duplicate file");
            }
        }
        assert_eq!(seen.len(), 20);
    }

    #[test]
    fn no_batch_violates_the_ceilings() {
        let limits = tiny_limits();
        let files: Vec<FileRecord> = (0..30)
            .map(|i| record(&format!("f{i}.bin"), 5 + (i % 7) * 13))
            .collect();

        for batch in plan_batches(files, &limits) {
            assert!(batch.byte_size() <= limits.max_batch_bytes);
            assert!(batch.len() <= limits.max_batch_files);
        }
    }

    #[test]
    fn small_deployments_spread_across_preallocated_batches() {
        // Three tiny files with concurrency 3: the rotating offset puts
        // one in each batch instead of piling them into the first.
        let files = vec![record("a.bin", 1), record("b.bin", 1), record("c.bin", 1)];
        let batches = plan_batches(files, &tiny_limits());

        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 1));
    }

    #[test]
    fn larger_files_come_first_within_a_batch() {
        let limits = PlatformLimits {
            max_batch_bytes: 1000,
            max_batch_files: 100,
            concurrency: 1,
            ..Default::default()
        };
        let files = vec![record("small.bin", 5), record("big.bin", 90), record("mid.bin", 40)];

        let batches = plan_batches(files, &limits);
        assert_eq!(batches.len(), 1);
        let sizes: Vec<u64> = batches[0].files().iter().map(|f| f.size).collect();
        assert_eq!(sizes, vec![90, 40, 5]);
    }

    #[test]
    fn overflow_appends_a_new_batch() {
        let limits = PlatformLimits {
            max_batch_bytes: 100,
            max_batch_files: 10,
            concurrency: 1,
            ..Default::default()
        };
        // Two files that cannot share a 100-byte batch.
        let files = vec![record("a.bin", 80), record("b.bin", 70)];

        let batches = plan_batches(files, &limits);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds the batch byte ceiling")]
    fn file_over_the_batch_byte_ceiling_is_rejected() {
        let limits = PlatformLimits {
            max_batch_bytes: 10,
            max_batch_files: 10,
            concurrency: 1,
            ..Default::default()
        };
        plan_batches(vec![record("huge.bin", 50)], &limits);
    }

    #[test]
    fn plan_is_deterministic() {
        let make = || {
            vec![
                record("x.bin", 30),
                record("y.bin", 30),
                record("z.bin", 60),
                record("w.bin", 10),
            ]
        };
        let a = plan_batches(make(), &tiny_limits());
        let b = plan_batches(make(), &tiny_limits());

        let layout = |batches: &[UploadBatch]| -> Vec<Vec<String>> {
            batches
                .iter()
                .map(|b| b.files().iter().map(|f| f.logical_path.clone()).collect())
                .collect()
        };
        assert_eq!(layout(&a), layout(&b));
    }
}
