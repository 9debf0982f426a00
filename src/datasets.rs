use crate::error::{RecError, Result};
use crate::types::{ItemFeatures, Rating, UNKNOWN_CATEGORY};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

pub const RATINGS_FILE: &str = "rating_final.csv";
pub const PLACES_FILE: &str = "geoplaces2.csv";
pub const CUISINES_FILE: &str = "chefmozcuisine.csv";

/// Sorted, de-duplicated labels for one matrix axis, with position lookup both ways.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdIndex {
    labels: Vec<String>,
    map: HashMap<String, usize>,
}

impl IdIndex {
    pub fn new<'a>(ids: impl Iterator<Item = &'a String>) -> Self {
        let mut labels: Vec<String> = ids.cloned().collect();
        labels.sort_by(|a, b| compare_ids(a, b));
        labels.dedup();
        let map = labels
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        Self { labels, map }
    }

    pub fn from_labels<S: AsRef<str>>(ids: &[S]) -> Self {
        let owned: Vec<String> = ids.iter().map(|s| s.as_ref().to_string()).collect();
        Self::new(owned.iter())
    }

    pub fn encode(&self, id: &str) -> Option<usize> {
        self.map.get(id).copied()
    }

    pub fn decode(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(|s| s.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Label order for matrix axes: ids that both parse as integers compare by value,
/// so "99" sorts before "100". Numeric ids come before any other id, and the rest
/// compare as strings.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[derive(Debug, Deserialize)]
struct PlaceRow {
    #[serde(rename = "placeID")]
    place_id: String,
    price: Option<String>,
    alcohol: Option<String>,
    #[serde(rename = "Rambience")]
    ambience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CuisineRow {
    #[serde(rename = "placeID")]
    pub place_id: String,
    #[serde(rename = "Rcuisine")]
    pub cuisine: Option<String>,
}

/// Source files are not guaranteed to be UTF-8, so bytes are decoded lossily first.
fn read_records<T: DeserializeOwned>(mut reader: impl Read) -> Result<Vec<T>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn read_ratings(reader: impl Read) -> Result<Vec<Rating>> {
    read_records(reader)
}

pub fn read_cuisines(reader: impl Read) -> Result<Vec<CuisineRow>> {
    read_records(reader)
}

/// Places without their cuisine; see [`assemble_item_features`].
pub fn read_places(reader: impl Read) -> Result<Vec<ItemFeatures>> {
    let rows: Vec<PlaceRow> = read_records(reader)?;
    Ok(rows
        .into_iter()
        .map(|row| ItemFeatures {
            item_id: row.place_id,
            price: row.price,
            alcohol: row.alcohol,
            ambience: row.ambience,
            cuisine: None,
        })
        .collect())
}

/// Left-joins cuisines onto places. Each place keeps exactly one row and takes the
/// first cuisine listed for it, or `Unknown` when it has none.
pub fn assemble_item_features(places: Vec<ItemFeatures>, cuisines: &[CuisineRow]) -> Vec<ItemFeatures> {
    let mut first_cuisine: HashMap<&str, &str> = HashMap::new();
    for row in cuisines {
        if let Some(cuisine) = row.cuisine.as_deref() {
            first_cuisine.entry(row.place_id.as_str()).or_insert(cuisine);
        }
    }

    let mut seen = BTreeSet::new();
    places
        .into_iter()
        .filter(|place| seen.insert(place.item_id.clone()))
        .map(|mut place| {
            let cuisine = first_cuisine
                .get(place.item_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN_CATEGORY);
            place.cuisine = Some(cuisine.to_string());
            place
        })
        .collect()
}

/// Clean input records for one load cycle.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub ratings: Vec<Rating>,
    pub items: Vec<ItemFeatures>,
}

impl Dataset {
    pub fn new(ratings: Vec<Rating>, items: Vec<ItemFeatures>) -> Self {
        Self { ratings, items }
    }

    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let open = |name: &str| -> Result<File> {
            let path: PathBuf = dir.join(name);
            Ok(File::open(path)?)
        };

        let ratings = read_ratings(open(RATINGS_FILE)?)?;
        let places = read_places(open(PLACES_FILE)?)?;
        let cuisines = read_cuisines(open(CUISINES_FILE)?)?;
        let items = assemble_item_features(places, &cuisines);

        info!(
            ratings = ratings.len(),
            items = items.len(),
            cuisines = cuisines.len(),
            dir = %dir.display(),
            "Dataset loaded"
        );
        if ratings.is_empty() {
            return Err(RecError::EmptyInput("ratings"));
        }
        Ok(Self { ratings, items })
    }
}

/// Seeded random holdout: `holdout_fraction` of the records (rounded down) become
/// the test split, the rest the training split. Input order is preserved in both.
pub fn split_holdout(data: &[Rating], holdout_fraction: f32, seed: u64) -> (Vec<Rating>, Vec<Rating>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut shuffled_indices = (0..data.len()).collect::<Vec<usize>>();
    shuffled_indices.shuffle(&mut rng);

    let test_size = ((data.len() as f32 * holdout_fraction) as usize).min(data.len());
    let mut is_test = vec![false; data.len()];
    for &idx in &shuffled_indices[..test_size] {
        is_test[idx] = true;
    }

    let mut train = Vec::with_capacity(data.len() - test_size);
    let mut test = Vec::with_capacity(test_size);
    for (record, held_out) in data.iter().zip(is_test) {
        if held_out {
            test.push(record.clone());
        } else {
            train.push(record.clone());
        }
    }
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings(n: usize) -> Vec<Rating> {
        (0..n)
            .map(|i| Rating::new(&format!("U{}", i % 7), &format!("{}", 100 + i), (i % 3) as f32))
            .collect()
    }

    #[test]
    fn test_id_index_is_sorted_and_unique() {
        let ids = vec!["b".to_string(), "a".to_string(), "b".to_string(), "c".to_string()];
        let index = IdIndex::new(ids.iter());
        assert_eq!(index.len(), 3);
        assert_eq!(index.labels(), &["a", "b", "c"]);
        assert_eq!(index.encode("b"), Some(1));
        assert_eq!(index.decode(2), Some("c"));
        assert_eq!(index.encode("z"), None);
        assert_eq!(index.decode(3), None);
    }

    #[test]
    fn test_numeric_ids_sort_by_value() {
        let index = IdIndex::from_labels(&["100", "99", "b", "135085", "a", "99"]);
        assert_eq!(index.labels(), &["99", "100", "135085", "a", "b"]);
        assert_eq!(compare_ids("99", "100"), Ordering::Less);
        assert_eq!(compare_ids("U10", "U9"), Ordering::Less);
    }

    #[test]
    fn test_id_index_json_roundtrip() {
        let ids = vec!["U2".to_string(), "U1".to_string()];
        let index = IdIndex::new(ids.iter());
        let json = serde_json::to_string(&index).unwrap();
        let restored: IdIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, index);
    }

    #[test]
    fn test_read_ratings_csv() {
        let csv = "userID,placeID,rating,food_rating,service_rating\n\
                   U1077,135085,2,2,2\n\
                   U1077,135038,2,2,1\n\
                   U1068,132825,0,1,0\n";
        let ratings = read_ratings(csv.as_bytes()).unwrap();
        assert_eq!(ratings.len(), 3);
        assert_eq!(ratings[0].user_id, "U1077");
        assert_eq!(ratings[0].item_id, "135085");
        assert_eq!(ratings[2].rating, 0.0);
        assert_eq!(ratings[1].service_rating, Some(1));
    }

    #[test]
    fn test_assemble_item_features_takes_first_cuisine() {
        let places = "placeID,latitude,name,price,alcohol,Rambience\n\
                      1,22.1,\"A, B\",low,No_Alcohol_Served,familiar\n\
                      2,22.2,C,high,Wine-Beer,quiet\n\
                      3,22.3,D,,Full_Bar,quiet\n";
        let cuisines = "placeID,Rcuisine\n1,Mexican\n1,Bar\n3,Cafeteria\n";
        let places = read_places(places.as_bytes()).unwrap();
        let cuisines = read_cuisines(cuisines.as_bytes()).unwrap();

        let items = assemble_item_features(places, &cuisines);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].cuisine.as_deref(), Some("Mexican"));
        assert_eq!(items[1].cuisine.as_deref(), Some(UNKNOWN_CATEGORY));
        assert_eq!(items[2].cuisine.as_deref(), Some("Cafeteria"));
        assert_eq!(items[2].price, None);
    }

    #[test]
    fn test_split_holdout_sizes() {
        let data = ratings(50);
        let (train, test) = split_holdout(&data, 0.2, 42);
        assert_eq!(test.len(), 10);
        assert_eq!(train.len(), 40);
        for record in &test {
            assert!(!train.contains(record));
        }
    }

    #[test]
    fn test_split_holdout_is_deterministic() {
        let data = ratings(30);
        let (train_a, test_a) = split_holdout(&data, 0.2, 7);
        let (train_b, test_b) = split_holdout(&data, 0.2, 7);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
    }

    #[test]
    fn test_split_holdout_rounds_down() {
        let data = ratings(4);
        let (train, test) = split_holdout(&data, 0.2, 42);
        assert!(test.is_empty());
        assert_eq!(train.len(), 4);
    }
}
