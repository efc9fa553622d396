use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::info;
use uuid::Uuid;

use reviewlens_common::{Fragment, Review, ReviewLensError};

/// Column lookup over a CSV header row. Absent columns read as empty strings
/// for every row, which keeps files with partial schemas loadable.
struct Columns {
    indices: BTreeMap<String, usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let indices = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        Self { indices }
    }

    fn get<'a>(&self, record: &'a StringRecord, name: &str) -> &'a str {
        // Values are kept verbatim; only missing cells normalize to "".
        self.indices
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    /// `rate` historically also appears as `nota_media`.
    fn rate<'a>(&self, record: &'a StringRecord) -> &'a str {
        let rate = self.get(record, "rate");
        if rate.is_empty() {
            self.get(record, "nota_media")
        } else {
            rate
        }
    }
}

/// Identity key for grouping raw rows into one review. Metadata columns are
/// excluded because per-row variations in them would split a review apart.
type GroupKey = (String, String, String, String, String);

struct ReviewGroup {
    image: String,
    review_title: String,
    review_url: String,
    rate: String,
    idiom: String,
    num_reviews_usuario: String,
    fragments: Vec<Fragment>,
}

/// Load and group reviews from a CSV file on disk.
///
/// A missing file is an explicit error rather than an empty collection, so
/// startup can distinguish "no data" from "wrong path".
pub fn load_reviews(path: &Path) -> Result<Vec<Review>, ReviewLensError> {
    if !path.exists() {
        return Err(ReviewLensError::Ingest(format!(
            "data file not found at {}",
            path.display()
        )));
    }
    info!(path = %path.display(), "Loading review data");
    let file = std::fs::File::open(path)?;
    read_reviews(file)
}

/// Group raw CSV rows into `Review` records.
///
/// Rows sharing the identity key (review, translated_review, name, sex, date)
/// merge into one review: metadata takes the first row's value, and each row
/// with a non-empty fragment text contributes one `Fragment` in row order.
/// Output is sorted by the group key; ids are assigned at load.
pub fn read_reviews<R: Read>(input: R) -> Result<Vec<Review>, ReviewLensError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);
    let columns = Columns::from_headers(reader.headers()?);

    let mut groups: BTreeMap<GroupKey, ReviewGroup> = BTreeMap::new();
    for result in reader.records() {
        let record = result?;
        let key = (
            columns.get(&record, "review").to_string(),
            columns.get(&record, "translated_review").to_string(),
            columns.get(&record, "name").to_string(),
            columns.get(&record, "sex").to_string(),
            columns.get(&record, "date").to_string(),
        );

        let group = groups.entry(key).or_insert_with(|| ReviewGroup {
            image: columns.get(&record, "image").to_string(),
            review_title: columns.get(&record, "review_title").to_string(),
            review_url: columns.get(&record, "review_url").to_string(),
            rate: columns.rate(&record).to_string(),
            idiom: columns.get(&record, "idiom").to_string(),
            num_reviews_usuario: columns.get(&record, "num_reviews_usuario").to_string(),
            fragments: Vec::new(),
        });

        let fragment_text = columns.get(&record, "subcategory_fragment");
        if !fragment_text.is_empty() {
            group.fragments.push(Fragment {
                text: fragment_text.to_string(),
                sentiment: columns.get(&record, "subcategory_sentiment").to_string(),
                category: columns.get(&record, "category").to_string(),
                subcategory: columns.get(&record, "subcategory").to_string(),
            });
        }
    }

    let reviews: Vec<Review> = groups
        .into_iter()
        .map(|((review, translated_review, name, sex, date), group)| Review {
            id: Uuid::new_v4(),
            name,
            sex,
            idiom: group.idiom,
            image: group.image,
            review_title: group.review_title,
            review,
            translated_review,
            review_url: group.review_url,
            rate: group.rate,
            date,
            num_reviews_usuario: group.num_reviews_usuario,
            fragments: group.fragments,
        })
        .collect();

    info!(reviews = reviews.len(), "Successfully loaded reviews");
    Ok(reviews)
}
