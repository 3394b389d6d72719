//! Random binary row generation.

use rand::Rng;
use uuid::{Builder, Uuid};

use crate::config::{KEY_LEN, ProvisionConfig};

/// Generated row ready for database insertion.
#[derive(Debug, Clone)]
pub struct GeneratedRow {
    pub id: Uuid,
    pub data: Vec<u8>,
}

impl GeneratedRow {
    /// Raw key bytes as stored in the `uuid` column.
    pub fn key(&self) -> &[u8] {
        self.id.as_bytes()
    }
}

/// Configuration for row generation.
#[derive(Debug, Clone)]
pub struct RowGenConfig {
    /// Smallest payload, in bytes (inclusive).
    pub min_payload: usize,
    /// Largest payload, in bytes (inclusive).
    pub max_payload: usize,
}

impl Default for RowGenConfig {
    fn default() -> Self {
        Self {
            min_payload: 1024,
            max_payload: 32 * 1024,
        }
    }
}

impl From<&ProvisionConfig> for RowGenConfig {
    fn from(config: &ProvisionConfig) -> Self {
        Self {
            min_payload: config.min_payload,
            max_payload: config.max_payload,
        }
    }
}

/// Generates random rows for load testing.
pub struct RowGenerator {
    config: RowGenConfig,
}

impl RowGenerator {
    /// Creates a new row generator with default configuration.
    pub fn new() -> Self {
        Self {
            config: RowGenConfig::default(),
        }
    }

    /// Creates a generator with custom configuration.
    pub fn with_config(config: RowGenConfig) -> Self {
        Self { config }
    }

    /// Generates a single row.
    ///
    /// The key is a version 4 UUID built from `rng`, so a seeded RNG yields the
    /// same keys on every run.
    pub fn generate(&self, rng: &mut impl Rng) -> GeneratedRow {
        let id = Builder::from_random_bytes(rng.r#gen::<[u8; KEY_LEN]>()).into_uuid();

        let len = rng.gen_range(self.config.min_payload..=self.config.max_payload);
        let mut data = vec![0u8; len];
        rng.fill(&mut data[..]);

        GeneratedRow { id, data }
    }

    /// Generates multiple rows.
    pub fn generate_batch(&self, count: usize, rng: &mut impl Rng) -> Vec<GeneratedRow> {
        (0..count).map(|_| self.generate(rng)).collect()
    }
}

impl Default for RowGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generate_row_bounds() {
        let row_gen = RowGenerator::new();
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let row = row_gen.generate(&mut rng);
            assert_eq!(row.key().len(), 16);
            assert!((1024..=32 * 1024).contains(&row.data.len()));
        }
    }

    #[test]
    fn test_generate_batch() {
        let row_gen = RowGenerator::new();
        let mut rng = rand::thread_rng();
        let rows = row_gen.generate_batch(10, &mut rng);

        assert_eq!(rows.len(), 10);

        // All keys should be unique
        let ids: std::collections::HashSet<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_keys_are_v4_uuids() {
        let row_gen = RowGenerator::new();
        let mut rng = rand::thread_rng();
        let row = row_gen.generate(&mut rng);

        assert_eq!(row.id.get_version_num(), 4);
    }

    #[test]
    fn test_fixed_payload_size() {
        let row_gen = RowGenerator::with_config(RowGenConfig {
            min_payload: 7,
            max_payload: 7,
        });
        let mut rng = rand::thread_rng();

        assert!(
            row_gen
                .generate_batch(20, &mut rng)
                .iter()
                .all(|r| r.data.len() == 7)
        );
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let row_gen = RowGenerator::new();
        let a = row_gen.generate_batch(3, &mut StdRng::seed_from_u64(12345));
        let b = row_gen.generate_batch(3, &mut StdRng::seed_from_u64(12345));

        for (left, right) in a.iter().zip(&b) {
            assert_eq!(left.id, right.id);
            assert_eq!(left.data, right.data);
        }
    }

    #[test]
    fn test_payload_is_not_zero_filled() {
        let row_gen = RowGenerator::new();
        let row = row_gen.generate(&mut StdRng::seed_from_u64(7));

        assert!(row.data.iter().any(|b| *b != 0));
    }
}
