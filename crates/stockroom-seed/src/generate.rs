//! Random test items drawn from the location catalog.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use stockroom_core::{
    GeneratorConfig, Item, LocationCatalog, LocationPath, NewItem, StatusKind, StorageLocation,
};

use crate::error::{Result, SeedError};

/// Syllables product names are built from.
pub const SYLLABLES: &[&str] = &[
    "가", "나", "다", "라", "마", "바", "사", "아", "자", "차", "카", "타", "파", "하",
    "강", "명", "민", "박", "백", "서", "석", "신", "안", "양", "엄", "오", "우", "원", "유", "윤",
    "이", "임", "정", "조", "주", "지", "진", "최", "한", "홍",
    "약", "정", "산", "액", "dispersible", "과립", "시럽", "주사", "연고", "크림", "로션", "패치",
];

/// Root whose children are used for storage locations.
const STORAGE_ROOT: &str = "storage";

pub struct TestDataGenerator {
    rng: StdRng,
    catalog: Arc<LocationCatalog>,
    config: GeneratorConfig,
}

impl TestDataGenerator {
    /// A generator seeded from OS entropy.
    pub fn new(catalog: Arc<LocationCatalog>) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            catalog,
            config: GeneratorConfig::default(),
        }
    }

    /// A reproducible generator.
    pub fn seeded(catalog: Arc<LocationCatalog>, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            catalog,
            config: GeneratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Result<Self> {
        for p in [config.low_stock_probability, config.order_placed_probability] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SeedError::InvalidOption(format!(
                    "probability {} is outside 0.0..=1.0",
                    p
                )));
            }
        }
        if config.min_syllables == 0 || config.min_syllables > config.max_syllables {
            return Err(SeedError::InvalidOption(format!(
                "syllable range {}..={} is empty",
                config.min_syllables, config.max_syllables
            )));
        }
        self.config = config;
        Ok(self)
    }

    /// The syllables of one random name.
    pub fn name_parts(&mut self) -> Vec<&'static str> {
        let len = self
            .rng
            .gen_range(self.config.min_syllables..=self.config.max_syllables);
        (0..len)
            .filter_map(|_| SYLLABLES.choose(&mut self.rng).copied())
            .collect()
    }

    pub fn name(&mut self) -> String {
        self.name_parts().concat()
    }

    /// A random main, then a random child at each level that has children.
    pub fn sales_location(&mut self) -> LocationPath {
        let mut path = LocationPath::default();
        let Some(main) = self.catalog.main_options().choose(&mut self.rng) else {
            return path;
        };
        path.main = main.id.clone();
        if let Some(sub) = main.children.choose(&mut self.rng) {
            path.sub = sub.id.clone();
            if let Some(fin) = sub.children.choose(&mut self.rng) {
                path.final_ = fin.id.clone();
            }
        }
        path
    }

    /// The storage root with a random sub and no final.
    pub fn storage_location(&mut self) -> StorageLocation {
        let Some(root) = self.catalog.resolve(&[STORAGE_ROOT]) else {
            return StorageLocation::default();
        };
        let sub = root
            .children
            .choose(&mut self.rng)
            .map(|n| n.id.as_str())
            .unwrap_or("");
        StorageLocation::new(STORAGE_ROOT, sub, "")
    }

    /// One item with random flags stamped at `now`.
    pub fn item(&mut self, now: DateTime<Utc>) -> Item {
        let mut item = Item::from_new(NewItem {
            name: self.name(),
            location: self.sales_location(),
            storage_location: self.storage_location(),
        });
        if self.rng.gen_bool(self.config.low_stock_probability) {
            item.set_status(StatusKind::LowStock, true, now);
        }
        if self.rng.gen_bool(self.config.order_placed_probability) {
            item.set_status(StatusKind::OrderPlaced, true, now);
        }
        item
    }

    pub fn items(&mut self, count: usize, now: DateTime<Utc>) -> Vec<Item> {
        (0..count).map(|_| self.item(now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u64) -> TestDataGenerator {
        TestDataGenerator::seeded(Arc::new(LocationCatalog::builtin()), seed)
    }

    #[test]
    fn test_generated_items_are_valid() {
        let catalog = LocationCatalog::builtin();
        let mut data = generator(7);
        for item in data.items(300, Utc::now()) {
            assert!(!item.name.is_empty());
            assert!(item.status_consistent());
            catalog.validate(&item.location).unwrap();
            catalog.validate(&item.storage_location.as_path()).unwrap();
            assert_eq!(item.storage_location.storage_main, "storage");
            assert_eq!(item.storage_location.storage_final, "");
        }
    }

    #[test]
    fn test_sales_location_goes_as_deep_as_the_tree() {
        let catalog = LocationCatalog::builtin();
        let mut data = generator(11);
        for _ in 0..200 {
            let path = data.sales_location();
            let main = catalog.resolve(&[&path.main]).unwrap();
            assert_eq!(main.has_children(), !path.sub.is_empty());
            if let Some(sub) = main.child(&path.sub) {
                assert_eq!(sub.has_children(), !path.final_.is_empty());
            }
        }
    }

    #[test]
    fn test_name_length_in_syllables() {
        let mut data = generator(3);
        let mut seen = [false; 5];
        for _ in 0..200 {
            let parts = data.name_parts();
            assert!((2..=4).contains(&parts.len()));
            assert!(parts.iter().all(|p| SYLLABLES.contains(p)));
            seen[parts.len()] = true;
        }
        assert_eq!(seen, [false, false, true, true, true]);
    }

    #[test]
    fn test_same_seed_same_output() {
        let now = Utc::now();
        assert_eq!(generator(42).items(20, now), generator(42).items(20, now));
    }

    #[test]
    fn test_status_rates_roughly_match() {
        let mut data = generator(99);
        let items = data.items(5000, Utc::now());
        let low = items.iter().filter(|i| i.low_stock).count() as f64 / 5000.0;
        let ordered = items.iter().filter(|i| i.order_placed).count() as f64 / 5000.0;
        assert!((low - 0.2).abs() < 0.03, "low stock rate {low}");
        assert!((ordered - 0.1).abs() < 0.03, "order rate {ordered}");
    }

    #[test]
    fn test_config_bounds() {
        let catalog = Arc::new(LocationCatalog::builtin());
        let config = GeneratorConfig {
            low_stock_probability: 1.0,
            order_placed_probability: 0.0,
            ..Default::default()
        };
        let mut data = TestDataGenerator::seeded(catalog.clone(), 1)
            .with_config(config)
            .unwrap();
        assert!(data.items(10, Utc::now()).iter().all(|i| i.low_stock && !i.order_placed));

        let bad = GeneratorConfig {
            min_syllables: 3,
            max_syllables: 2,
            ..Default::default()
        };
        assert!(TestDataGenerator::seeded(catalog, 1).with_config(bad).is_err());
    }
}
